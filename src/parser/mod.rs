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

mod ast_builder;
pub mod local_labels;

use crate::ast::*;
use crate::errors::AsmError;
use ast_builder::AstBuilder;
use ast_builder::expression::build_int_literal;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

// Expanding a .rept with an absurd count is almost certainly a typo, and
// would otherwise allocate without bound.
const MAX_REPT_COUNT: i64 = 0x10000;

// Derive the parser from our grammar file.
#[derive(Parser)]
#[grammar = "./grammar.pest"]
pub struct RasmParser;

// Main parsing function that takes the entire source code string. `.rept`
// blocks are expanded here, so the returned list is a flat sequence of lines.
pub fn parse_source(source: &str) -> Result<Vec<AssemblyLine>, AsmError> {
    let pairs = RasmParser::parse(Rule::program, source)?;
    let mut lines = Vec::new();

    for pair in pairs {
        if pair.as_rule() == Rule::line {
            collect_line(pair, &mut lines)?;
        }
    }

    Ok(lines)
}

// Turn one `line` (or `rept_line`) pair into an AssemblyLine and push it. A
// nested .rept block flushes the pending line and expands in place.
fn collect_line(pair: Pair<Rule>, out: &mut Vec<AssemblyLine>) -> Result<(), AsmError> {
    let mut line = AssemblyLine::default();

    for part in pair.into_inner() {
        if line.line_number == 0 {
            line.line_number = part.as_span().start_pos().line_col().0;
        }
        match part.as_rule() {
            Rule::label => {
                line.label = Some(build_label(part)?);
            }
            Rule::instruction => {
                line.instruction = Some(AstBuilder::new(part).build_instruction()?);
            }
            Rule::directive => {
                let line_number = part.as_span().start_pos().line_col().0;
                let inner =
                    part.into_inner()
                        .next()
                        .ok_or_else(|| AsmError::ParseError {
                            line: line_number,
                            reason: "Expected an inner directive rule.".to_string(),
                        })?;

                if inner.as_rule() == Rule::rept_block {
                    if line.label.is_some() {
                        out.push(line.clone());
                        line = AssemblyLine::default();
                    }
                    expand_rept(inner, out)?;
                } else {
                    line.directive = Some(AstBuilder::new(inner).build_directive()?);
                }
            }
            _ => {}
        }
    }

    // Only keep non-empty lines.
    if line.label.is_some() || line.instruction.is_some() || line.directive.is_some() {
        out.push(line);
    }

    Ok(())
}

// Duplicate the body of a .rept block `count` times. Labels inside the body
// would be defined once per repetition, so they are rejected outright.
fn expand_rept(pair: Pair<Rule>, out: &mut Vec<AssemblyLine>) -> Result<(), AsmError> {
    let line_number = pair.as_span().start_pos().line_col().0;
    let mut inner = pair.into_inner();

    let count_pair = inner
        .find(|pair| pair.as_rule() == Rule::int_literal)
        .ok_or_else(|| AsmError::DirectiveError {
            line: line_number,
            reason: "Expected a repetition count after .rept.".to_string(),
        })?;
    let count = build_int_literal(count_pair)?;

    if count > MAX_REPT_COUNT {
        return Err(AsmError::DirectiveError {
            line: line_number,
            reason: format!(".rept count must be at most {}.", MAX_REPT_COUNT),
        });
    }

    let mut body: Vec<AssemblyLine> = Vec::new();
    for body_line in inner {
        if body_line.as_rule() == Rule::rept_line {
            collect_line(body_line, &mut body)?;
        }
    }

    for body_item in &body {
        if body_item.label.is_some() {
            return Err(AsmError::DirectiveError {
                line: body_item.line_number,
                reason: "Labels are not allowed inside a .rept block.".to_string(),
            });
        }
    }

    for _ in 0..count {
        out.extend(body.iter().cloned());
    }

    Ok(())
}

fn build_label(pair: Pair<Rule>) -> Result<Label, AsmError> {
    let line_number = pair.as_span().start_pos().line_col().0;
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| AsmError::ParseError {
            line: line_number,
            reason: "Expected a label name.".to_string(),
        })?;

    match inner.as_rule() {
        Rule::numeric_label => {
            let number = inner
                .as_str()
                .parse::<u32>()
                .map_err(|_| AsmError::ParseError {
                    line: line_number,
                    reason: format!("Invalid numeric label: {}", inner.as_str()),
                })?;
            Ok(Label::Numeric(number))
        }
        Rule::ident => Ok(Label::Named(inner.as_str().to_string())),
        _ => unreachable!("Unknown label rule: {:?}", inner.as_rule()),
    }
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nop() {
        let lines = parse_source("nop\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].instruction,
            Some(Instruction {
                mnemonic: "nop".to_string(),
                operands: vec![],
            })
        );
        assert_eq!(lines[0].label, None);
    }

    #[test]
    fn test_parse_mnemonic_case_insensitive() {
        let lines = parse_source("NoP\n").unwrap();
        assert_eq!(lines[0].instruction.as_ref().unwrap().mnemonic, "nop");
    }

    #[test]
    fn test_parse_reg_reg() {
        let lines = parse_source("add r1, r2\n").unwrap();
        assert_eq!(
            lines[0].instruction,
            Some(Instruction {
                mnemonic: "add".to_string(),
                operands: vec![Operand::Register(1), Operand::Register(2)],
            })
        );
    }

    #[test]
    fn test_parse_ldi_immediate() {
        let lines = parse_source("ldi r16, 0xFF\n").unwrap();
        assert_eq!(
            lines[0].instruction,
            Some(Instruction {
                mnemonic: "ldi".to_string(),
                operands: vec![Operand::Register(16), Operand::Expr(Expr::Int(255))],
            })
        );
    }

    #[test]
    fn test_parse_integer_bases() {
        let lines = parse_source(".byte 0x10, $20, 0b101, 017, 9\n").unwrap();
        assert_eq!(
            lines[0].directive,
            Some(Directive::Byte(vec![
                Expr::Int(0x10),
                Expr::Int(0x20),
                Expr::Int(5),
                Expr::Int(15),
                Expr::Int(9),
            ]))
        );
    }

    #[test]
    fn test_parse_label_and_instruction() {
        let lines = parse_source("start: rjmp start\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].label, Some(Label::Named("start".to_string())));
        assert_eq!(
            lines[0].instruction,
            Some(Instruction {
                mnemonic: "rjmp".to_string(),
                operands: vec![Operand::Expr(Expr::Symbol("start".to_string()))],
            })
        );
    }

    #[test]
    fn test_parse_numeric_label_and_refs() {
        let lines = parse_source("1: dec r16\n brne 1b\n rjmp 2f\n2: nop\n").unwrap();
        assert_eq!(lines[0].label, Some(Label::Numeric(1)));
        assert_eq!(
            lines[1].instruction.as_ref().unwrap().operands[0],
            Operand::Expr(Expr::LocalRef {
                number: 1,
                dir: LocalDir::Backward,
            })
        );
        assert_eq!(
            lines[2].instruction.as_ref().unwrap().operands[0],
            Operand::Expr(Expr::LocalRef {
                number: 2,
                dir: LocalDir::Forward,
            })
        );
        assert_eq!(lines[3].label, Some(Label::Numeric(2)));
    }

    #[test]
    fn test_parse_register_pair() {
        let lines = parse_source("movw r1:r0, r3:r2\n").unwrap();
        assert_eq!(
            lines[0].instruction,
            Some(Instruction {
                mnemonic: "movw".to_string(),
                operands: vec![
                    Operand::Pair { hi: 1, lo: 0 },
                    Operand::Pair { hi: 3, lo: 2 },
                ],
            })
        );
    }

    #[test]
    fn test_parse_misordered_register_pair() {
        assert!(parse_source("movw r0:r1, r3:r2\n").is_err());
    }

    #[test]
    fn test_parse_indirect_forms() {
        let lines = parse_source("ld r0, X+\nld r1, -Y\nst Z, r2\nldd r3, Y+63\n").unwrap();
        assert_eq!(
            lines[0].instruction.as_ref().unwrap().operands[1],
            Operand::Indirect {
                ptr: PtrReg::X,
                mode: IndirectMode::PostInc,
            }
        );
        assert_eq!(
            lines[1].instruction.as_ref().unwrap().operands[1],
            Operand::Indirect {
                ptr: PtrReg::Y,
                mode: IndirectMode::PreDec,
            }
        );
        assert_eq!(
            lines[2].instruction.as_ref().unwrap().operands[0],
            Operand::Indirect {
                ptr: PtrReg::Z,
                mode: IndirectMode::Plain,
            }
        );
        assert_eq!(
            lines[3].instruction.as_ref().unwrap().operands[1],
            Operand::Indirect {
                ptr: PtrReg::Y,
                mode: IndirectMode::Disp(Expr::Int(63)),
            }
        );
    }

    #[test]
    fn test_parse_expression_precedence() {
        let lines = parse_source(".word 1 + 2 * 3\n").unwrap();
        assert_eq!(
            lines[0].directive,
            Some(Directive::Word(vec![Expr::Binary(
                BinOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    BinOp::Mul,
                    Box::new(Expr::Int(2)),
                    Box::new(Expr::Int(3)),
                )),
            )]))
        );
    }

    #[test]
    fn test_parse_lo8_hi8() {
        let lines = parse_source("ldi r30, lo8(table)\nldi r31, hi8(table)\n").unwrap();
        assert_eq!(
            lines[0].instruction.as_ref().unwrap().operands[1],
            Operand::Expr(Expr::Unary(
                UnaryOp::Lo8,
                Box::new(Expr::Symbol("table".to_string())),
            ))
        );
        assert_eq!(
            lines[1].instruction.as_ref().unwrap().operands[1],
            Operand::Expr(Expr::Unary(
                UnaryOp::Hi8,
                Box::new(Expr::Symbol("table".to_string())),
            ))
        );
    }

    #[test]
    fn test_parse_equ_directive() {
        let lines = parse_source(".equ answer = 42\n").unwrap();
        assert_eq!(
            lines[0].directive,
            Some(Directive::Equ(
                "answer".to_string(),
                BindValue::Num(Expr::Int(42)),
            ))
        );
    }

    #[test]
    fn test_parse_equ_register_pair_alias() {
        let lines = parse_source(".equ dstpair = r1:r0\n").unwrap();
        assert_eq!(
            lines[0].directive,
            Some(Directive::Equ(
                "dstpair".to_string(),
                BindValue::Pair { hi: 1, lo: 0 },
            ))
        );
    }

    #[test]
    fn test_parse_default_directive() {
        let lines = parse_source(".default blink_delay = 3\n").unwrap();
        assert_eq!(
            lines[0].directive,
            Some(Directive::Default(
                "blink_delay".to_string(),
                BindValue::Num(Expr::Int(3)),
            ))
        );
    }

    #[test]
    fn test_parse_rept_expansion() {
        let lines = parse_source(".rept 3\nnop\n.endr\n").unwrap();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.instruction.as_ref().unwrap().mnemonic, "nop");
        }
    }

    #[test]
    fn test_parse_rept_zero() {
        let lines = parse_source(".rept 0\nnop\n.endr\n").unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_parse_rept_rejects_labels() {
        let result = parse_source(".rept 2\nloop: nop\n.endr\n");
        assert!(matches!(result, Err(AsmError::DirectiveError { .. })));
    }

    #[test]
    fn test_parse_comments_and_blank_lines() {
        let lines = parse_source("; a comment\n\n  nop ; trailing\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_number, 3);
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let lines = parse_source("nop\r\ndec r16\r\n").unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_parse_unknown_directive() {
        let result = parse_source(".bogus 12\n");
        assert!(matches!(result, Err(AsmError::DirectiveError { .. })));
    }
}
