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

use crate::ast::{BinOp, Expr, LocalDir, UnaryOp};
use crate::errors::AsmError;
use crate::parser::Rule;
use pest::iterators::Pair;

// Build an expression tree from any rule in the precedence chain. The
// grammar layers the binary operators by precedence, so each level folds
// left-to-right and recursion handles the rest.
pub fn build_expr(pair: Pair<Rule>) -> Result<Expr, AsmError> {
    match pair.as_rule() {
        Rule::expr => {
            let line = pair.as_span().start_pos().line_col().0;
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| AsmError::ParseError {
                    line,
                    reason: "Expected an expression body.".to_string(),
                })?;
            build_expr(inner)
        }
        Rule::bit_or
        | Rule::bit_xor
        | Rule::bit_and
        | Rule::shift
        | Rule::sum
        | Rule::product => fold_binary(pair),
        Rule::unary => build_unary(pair),
        Rule::atom => build_atom(pair),
        _ => unreachable!("Unknown expression rule: {:?}", pair.as_rule()),
    }
}

fn fold_binary(pair: Pair<Rule>) -> Result<Expr, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let mut inner = pair.into_inner();

    let first = inner.next().ok_or_else(|| AsmError::ParseError {
        line,
        reason: "Expected an operand in expression.".to_string(),
    })?;
    let mut lhs = build_expr(first)?;

    while let Some(op_pair) = inner.next() {
        let rhs_pair = inner.next().ok_or_else(|| AsmError::ParseError {
            line,
            reason: format!("Expected an operand after '{}'.", op_pair.as_str()),
        })?;
        let op = binop_from_str(op_pair.as_str());
        lhs = Expr::Binary(op, Box::new(lhs), Box::new(build_expr(rhs_pair)?));
    }

    Ok(lhs)
}

fn binop_from_str(text: &str) -> BinOp {
    match text {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "%" => BinOp::Rem,
        "&" => BinOp::And,
        "|" => BinOp::Or,
        "^" => BinOp::Xor,
        "<<" => BinOp::Shl,
        ">>" => BinOp::Shr,
        _ => unreachable!("Unknown binary operator: {}", text),
    }
}

fn build_unary(pair: Pair<Rule>) -> Result<Expr, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let mut ops: Vec<UnaryOp> = Vec::new();
    let mut atom_pair = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::unary_op => ops.push(match inner.as_str() {
                "-" => UnaryOp::Neg,
                "~" => UnaryOp::BitNot,
                "!" => UnaryOp::LogNot,
                other => unreachable!("Unknown unary operator: {}", other),
            }),
            _ => atom_pair = Some(inner),
        }
    }

    let atom_pair = atom_pair.ok_or_else(|| AsmError::ParseError {
        line,
        reason: "Expected an operand after unary operator.".to_string(),
    })?;
    let mut expr = build_expr(atom_pair)?;

    // Innermost operator binds first, so wrap in reverse order.
    for op in ops.into_iter().rev() {
        expr = Expr::Unary(op, Box::new(expr));
    }

    Ok(expr)
}

fn build_atom(pair: Pair<Rule>) -> Result<Expr, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| AsmError::ParseError {
            line,
            reason: "Expected an inner atom rule.".to_string(),
        })?;

    match inner.as_rule() {
        Rule::byte_fn => build_byte_fn(inner),
        Rule::local_ref => build_local_ref(inner),
        Rule::int_literal => Ok(Expr::Int(build_int_literal(inner)?)),
        Rule::symbol => Ok(Expr::Symbol(inner.as_str().to_string())),
        Rule::expr => build_expr(inner),
        _ => unreachable!("Unknown atom rule: {:?}", inner.as_rule()),
    }
}

// lo8(e) / hi8(e)
fn build_byte_fn(pair: Pair<Rule>) -> Result<Expr, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let mut inner = pair.into_inner();

    let name_pair = inner.next().ok_or_else(|| AsmError::ParseError {
        line,
        reason: "Expected a byte-extraction function name.".to_string(),
    })?;
    let op = match name_pair.as_str().to_ascii_lowercase().as_str() {
        "lo8" => UnaryOp::Lo8,
        "hi8" => UnaryOp::Hi8,
        other => unreachable!("Unknown byte-extraction function: {}", other),
    };

    let arg_pair = inner.next().ok_or_else(|| AsmError::ParseError {
        line,
        reason: "Expected an argument expression.".to_string(),
    })?;

    Ok(Expr::Unary(op, Box::new(build_expr(arg_pair)?)))
}

// `1b` / `1f` style numeric local label references.
fn build_local_ref(pair: Pair<Rule>) -> Result<Expr, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let text = pair.as_str();
    let (digits, suffix) = text.split_at(text.len() - 1);

    let number = digits.parse::<u32>().map_err(|_| AsmError::ParseError {
        line,
        reason: format!("Invalid numeric label reference: {}", text),
    })?;
    let dir = match suffix.to_ascii_lowercase().as_str() {
        "b" => LocalDir::Backward,
        "f" => LocalDir::Forward,
        _ => unreachable!("Unknown local reference suffix: {}", suffix),
    };

    Ok(Expr::LocalRef { number, dir })
}

// Integer literals: 0x / $ hex, 0b binary, leading-zero octal, decimal.
pub fn build_int_literal(pair: Pair<Rule>) -> Result<i64, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| AsmError::ParseError {
            line,
            reason: "Expected an integer literal body.".to_string(),
        })?;

    let text = inner.as_str();
    let parsed = match inner.as_rule() {
        Rule::hex_literal => i64::from_str_radix(&text[2..], 16),
        Rule::dollar_literal => i64::from_str_radix(&text[1..], 16),
        Rule::bin_literal => i64::from_str_radix(&text[2..], 2),
        Rule::oct_literal => i64::from_str_radix(&text[1..], 8),
        Rule::dec_literal => i64::from_str_radix(text, 10),
        _ => unreachable!("Unknown integer literal rule: {:?}", inner.as_rule()),
    };

    parsed.map_err(|_| AsmError::ParseError {
        line,
        reason: format!("Integer literal out of range: {}", text),
    })
}
