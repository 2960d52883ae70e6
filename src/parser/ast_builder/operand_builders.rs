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

use crate::ast::{IndirectMode, Operand, PtrReg};
use crate::errors::AsmError;
use crate::parser::Rule;
use crate::parser::ast_builder::expression::build_expr;
use pest::iterators::Pair;

// Helper to build an Operand from a pest Pair
pub fn build_operand(pair: Pair<Rule>) -> Result<Operand, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| AsmError::ParseError {
            line,
            reason: "Expected an inner operand rule.".to_string(),
        })?;

    match inner.as_rule() {
        Rule::reg_pair => build_reg_pair(inner),
        Rule::register => Ok(Operand::Register(build_register(inner)?)),
        Rule::indirect => build_indirect(inner),
        Rule::expr => Ok(Operand::Expr(build_expr(inner)?)),
        _ => unreachable!("Unknown operand rule: {:?}", inner.as_rule()),
    }
}

// translate an rN token to its register number
pub fn build_register(pair: Pair<Rule>) -> Result<u8, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let text = pair.as_str();

    let number = text[1..].parse::<u8>().map_err(|_| AsmError::ParseError {
        line,
        reason: format!("Invalid register: {}", text),
    })?;
    if number > 31 {
        return Err(AsmError::RangeError {
            line,
            reason: format!("No such register {}, must be r0-r31.", text),
        });
    }

    Ok(number)
}

// rN:rM, written high:low; the low half must be even and adjacent
pub fn build_reg_pair(pair: Pair<Rule>) -> Result<Operand, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let text = pair.as_str().to_string();
    let mut inner = pair.into_inner();

    let hi_pair = inner.next().ok_or_else(|| AsmError::ParseError {
        line,
        reason: "Expected the high half of a register pair.".to_string(),
    })?;
    let lo_pair = inner.next().ok_or_else(|| AsmError::ParseError {
        line,
        reason: "Expected the low half of a register pair.".to_string(),
    })?;

    let hi = build_register(hi_pair)?;
    let lo = build_register(lo_pair)?;
    if lo % 2 != 0 || hi != lo + 1 {
        return Err(AsmError::RangeError {
            line,
            reason: format!(
                "Invalid register pair {}, must be an adjacent odd:even pair like r1:r0.",
                text
            ),
        });
    }

    Ok(Operand::Pair { hi, lo })
}

fn build_indirect(pair: Pair<Rule>) -> Result<Operand, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| AsmError::ParseError {
            line,
            reason: "Expected an indirect addressing form.".to_string(),
        })?;

    let rule = inner.as_rule();
    let mut parts = inner.into_inner();
    let ptr_pair = parts.next().ok_or_else(|| AsmError::ParseError {
        line,
        reason: "Expected a pointer register.".to_string(),
    })?;
    let ptr = build_ptr(&ptr_pair);

    match rule {
        Rule::displaced => {
            if ptr == PtrReg::X {
                return Err(AsmError::ParseError {
                    line,
                    reason: "X does not support displacement, use Y or Z.".to_string(),
                });
            }
            let disp_pair = parts.next().ok_or_else(|| AsmError::ParseError {
                line,
                reason: "Expected a displacement expression.".to_string(),
            })?;
            Ok(Operand::Indirect {
                ptr,
                mode: IndirectMode::Disp(build_expr(disp_pair)?),
            })
        }
        Rule::postinc => Ok(Operand::Indirect {
            ptr,
            mode: IndirectMode::PostInc,
        }),
        Rule::predec => Ok(Operand::Indirect {
            ptr,
            mode: IndirectMode::PreDec,
        }),
        Rule::ptr_plain => Ok(Operand::Indirect {
            ptr,
            mode: IndirectMode::Plain,
        }),
        _ => unreachable!("Unknown indirect rule: {:?}", rule),
    }
}

fn build_ptr(pair: &Pair<Rule>) -> PtrReg {
    match pair.as_str() {
        "X" => PtrReg::X,
        "Y" => PtrReg::Y,
        "Z" => PtrReg::Z,
        other => unreachable!("Unknown pointer register: {}", other),
    }
}
