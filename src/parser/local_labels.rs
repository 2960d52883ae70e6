/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Numeric local labels (`1:`) may be defined any number of times; `1b` and
//! `1f` bind to the nearest definition backward / forward. This pass runs
//! right after parsing and rewrites both the definitions and the references
//! into unique synthetic symbols, so every later pass only ever sees ordinary
//! named labels.

use crate::ast::{AssemblyLine, BindValue, Directive, Expr, Label, LocalDir};
use crate::errors::AsmError;
use std::collections::HashMap;

pub fn rewrite(lines: &mut [AssemblyLine]) -> Result<(), AsmError> {
    // Each definition of `1:` becomes `1@0`, `1@1`, ... in source order. '@'
    // cannot occur in user identifiers, so the names can never collide.
    let mut counters: HashMap<u32, u32> = HashMap::new();
    let mut defs: Vec<Option<(u32, String)>> = vec![None; lines.len()];

    for (i, line) in lines.iter_mut().enumerate() {
        if let Some(Label::Numeric(number)) = &line.label {
            let number = *number;
            let occurrence = counters.entry(number).or_insert(0);
            let name = format!("{}@{}", number, occurrence);
            *occurrence += 1;
            defs[i] = Some((number, name.clone()));
            line.label = Some(Label::Named(name));
        }
    }

    // Backward references see the most recent definition, including one on
    // the referencing line itself (`1: rjmp 1b`).
    let mut nearest: HashMap<u32, String> = HashMap::new();
    for (i, line) in lines.iter_mut().enumerate() {
        if let Some((number, name)) = &defs[i] {
            nearest.insert(*number, name.clone());
        }
        rewrite_line(line, LocalDir::Backward, &nearest)?;
    }

    // Forward references see the next definition strictly after their line.
    nearest.clear();
    for i in (0..lines.len()).rev() {
        rewrite_line(&mut lines[i], LocalDir::Forward, &nearest)?;
        if let Some((number, name)) = &defs[i] {
            nearest.insert(*number, name.clone());
        }
    }

    Ok(())
}

fn rewrite_line(
    line: &mut AssemblyLine,
    dir: LocalDir,
    nearest: &HashMap<u32, String>,
) -> Result<(), AsmError> {
    let line_number = line.line_number;

    if let Some(instruction) = &mut line.instruction {
        for operand in &mut instruction.operands {
            match operand {
                crate::ast::Operand::Expr(expr) => {
                    rewrite_expr(expr, dir, nearest, line_number)?;
                }
                crate::ast::Operand::Indirect {
                    mode: crate::ast::IndirectMode::Disp(expr),
                    ..
                } => {
                    rewrite_expr(expr, dir, nearest, line_number)?;
                }
                _ => {}
            }
        }
    }

    if let Some(directive) = &mut line.directive {
        match directive {
            Directive::Byte(exprs) | Directive::Word(exprs) => {
                for expr in exprs {
                    rewrite_expr(expr, dir, nearest, line_number)?;
                }
            }
            Directive::Equ(_, BindValue::Num(expr))
            | Directive::Default(_, BindValue::Num(expr)) => {
                rewrite_expr(expr, dir, nearest, line_number)?;
            }
            _ => {}
        }
    }

    Ok(())
}

fn rewrite_expr(
    expr: &mut Expr,
    dir: LocalDir,
    nearest: &HashMap<u32, String>,
    line: usize,
) -> Result<(), AsmError> {
    match expr {
        Expr::LocalRef { number, dir: d } if *d == dir => {
            let suffix = match dir {
                LocalDir::Backward => 'b',
                LocalDir::Forward => 'f',
            };
            let name = nearest
                .get(number)
                .ok_or_else(|| AsmError::SymbolError {
                    line,
                    reason: format!("No matching numeric label for reference {}{}.", number, suffix),
                })?;
            *expr = Expr::Symbol(name.clone());
        }
        Expr::Unary(_, inner) => rewrite_expr(inner, dir, nearest, line)?,
        Expr::Binary(_, lhs, rhs) => {
            rewrite_expr(lhs, dir, nearest, line)?;
            rewrite_expr(rhs, dir, nearest, line)?;
        }
        _ => {}
    }
    Ok(())
}

// ------------- unit tests -------------
