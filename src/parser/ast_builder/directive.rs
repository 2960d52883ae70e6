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

use crate::ast::{BindValue, Directive, Expr, Operand};
use crate::errors::AsmError;
use crate::parser::Rule;
use crate::parser::ast_builder::AstBuilder;
use crate::parser::ast_builder::expression::{build_expr, build_int_literal};
use crate::parser::ast_builder::operand_builders::{build_reg_pair, build_register};
use pest::iterators::Pair;

const KNOWN_DIRECTIVES: &[&str] = &[
    "equ", "default", "section", "global", "byte", "word", "align", "rept", "endr",
];

const MAX_ALIGNMENT: i64 = 0x10000;

impl<'a> AstBuilder<'a> {
    // build an .equ directive (strong binding)
    pub(super) fn build_equ_directive(mut self) -> Result<Directive, AsmError> {
        let name = self.next_pair("a symbol name")?.as_str().to_string();
        let value = build_bind_value(self.next_pair("a bound value")?)?;
        Ok(Directive::Equ(name, value))
    }

    // build a .default directive (weak binding)
    pub(super) fn build_default_directive(mut self) -> Result<Directive, AsmError> {
        let name = self.next_pair("a symbol name")?.as_str().to_string();
        let value = build_bind_value(self.next_pair("a bound value")?)?;
        Ok(Directive::Default(name, value))
    }

    pub(super) fn build_section_directive(mut self) -> Result<Directive, AsmError> {
        let name = self.next_pair("a section name")?.as_str().to_string();
        if name != ".text" && name != ".data" {
            return Err(AsmError::DirectiveError {
                line: self.line_number,
                reason: format!("Unknown section {}, only .text and .data exist.", name),
            });
        }
        Ok(Directive::Section(name))
    }

    pub(super) fn build_global_directive(mut self) -> Result<Directive, AsmError> {
        let name = self.next_pair("a symbol name")?.as_str().to_string();
        Ok(Directive::Global(name))
    }

    // build a byte data directive
    pub(super) fn build_byte_directive(self) -> Result<Directive, AsmError> {
        let mut bytes: Vec<Expr> = Vec::new();
        for pair in self.pairs {
            bytes.push(build_expr(pair)?);
        }
        Ok(Directive::Byte(bytes))
    }

    // build a word data directive
    pub(super) fn build_word_directive(self) -> Result<Directive, AsmError> {
        let mut words: Vec<Expr> = Vec::new();
        for pair in self.pairs {
            words.push(build_expr(pair)?);
        }
        Ok(Directive::Word(words))
    }

    pub(super) fn build_align_directive(mut self) -> Result<Directive, AsmError> {
        let literal = self.next_pair("an alignment value")?;
        let alignment = build_int_literal(literal)?;

        if alignment <= 0 || alignment > MAX_ALIGNMENT {
            return Err(AsmError::DirectiveError {
                line: self.line_number,
                reason: format!(
                    ".align value must be between 1 and {} inclusive.",
                    MAX_ALIGNMENT
                ),
            });
        }

        Ok(Directive::Align(alignment as u32))
    }

    // Anything the grammar could not match as a known directive lands here,
    // including known directives with malformed bodies.
    pub(super) fn build_unknown_directive(self) -> Result<Directive, AsmError> {
        let name: String = self.text[1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();

        if KNOWN_DIRECTIVES.contains(&name.to_ascii_lowercase().as_str()) {
            Err(AsmError::ParseError {
                line: self.line_number,
                reason: format!("Malformed .{} directive.", name.to_ascii_lowercase()),
            })
        } else {
            Err(AsmError::DirectiveError {
                line: self.line_number,
                reason: format!("Unknown directive .{}.", name),
            })
        }
    }
}

// An .equ / .default value: a register pair alias, a register alias, or an
// expression to be evaluated later.
fn build_bind_value(pair: Pair<Rule>) -> Result<BindValue, AsmError> {
    let line = pair.as_span().start_pos().line_col().0;
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| AsmError::ParseError {
            line,
            reason: "Expected a bound value.".to_string(),
        })?;

    match inner.as_rule() {
        Rule::reg_pair => match build_reg_pair(inner)? {
            Operand::Pair { hi, lo } => Ok(BindValue::Pair { hi, lo }),
            _ => unreachable!("build_reg_pair returned a non-pair operand"),
        },
        Rule::register => Ok(BindValue::Reg(build_register(inner)?)),
        Rule::expr => Ok(BindValue::Num(build_expr(inner)?)),
        _ => unreachable!("Unknown bind value rule: {:?}", inner.as_rule()),
    }
}
