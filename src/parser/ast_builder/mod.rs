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

mod directive;
pub mod expression;
mod operand_builders;

use crate::ast::{Directive, Instruction};
use crate::errors::AsmError;
use crate::parser::Rule;
use operand_builders::build_operand;
use pest::iterators::{Pair, Pairs};

pub struct AstBuilder<'a> {
    line_number: usize,
    rule: Rule,
    text: &'a str,
    pairs: Pairs<'a, Rule>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(pair: Pair<'a, Rule>) -> Self {
        Self {
            line_number: pair.as_span().start_pos().line_col().0,
            rule: pair.as_rule(),
            text: pair.as_str(),
            pairs: pair.into_inner(),
        }
    }

    fn next_pair(&mut self, what: &str) -> Result<Pair<'a, Rule>, AsmError> {
        self.pairs.next().ok_or_else(|| AsmError::ParseError {
            line: self.line_number,
            reason: format!("Expected {}.", what),
        })
    }

    // Helper to build an Instruction from a pest Pair. Mnemonics are folded
    // to lower case here; all table lookups work on the folded form.
    pub fn build_instruction(mut self) -> Result<Instruction, AsmError> {
        let mnemonic = self.next_pair("an instruction mnemonic")?;
        let mnemonic = mnemonic.as_str().to_ascii_lowercase();

        let mut operands = Vec::new();
        for pair in self.pairs {
            operands.push(build_operand(pair)?);
        }

        Ok(Instruction { mnemonic, operands })
    }

    pub fn build_directive(mut self) -> Result<Directive, AsmError> {
        // Every known directive rule leads with its atomic keyword token.
        if self.rule != Rule::unknown_directive {
            let _ = self.pairs.next();
        }
        match self.rule {
            Rule::equ_directive => self.build_equ_directive(),
            Rule::default_directive => self.build_default_directive(),
            Rule::section_directive => self.build_section_directive(),
            Rule::global_directive => self.build_global_directive(),
            Rule::byte_directive => self.build_byte_directive(),
            Rule::word_directive => self.build_word_directive(),
            Rule::align_directive => self.build_align_directive(),
            Rule::unknown_directive => self.build_unknown_directive(),
            _ => unreachable!("Unknown directive rule: {:?}", self.rule),
        }
    }
}
