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

use crate::assembler::encoder::Encoder;
use crate::ast::Operand;
use crate::errors::AsmError;

impl<'a> Encoder<'a> {
    // Conditional branch with the flag-select bits already in the base.
    pub fn encode_branch(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 1, "k")?;
        let target = self.expect_const(&ops[0])?;
        let k = self.relative_words(target, 7)?;
        Ok(vec![base | ((k as u16 & 0x7F) << 3)])
    }

    // BRBS / BRBC with an explicit flag number.
    pub fn encode_flag_branch(&self, set: bool, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "s, k")?;
        let s = self.const_in_range(&ops[0], 0, 7, "Flag number")? as u16;
        let target = self.expect_const(&ops[1])?;
        let k = self.relative_words(target, 7)?;

        let base: u16 = if set { 0xF000 } else { 0xF400 };
        Ok(vec![base | s | ((k as u16 & 0x7F) << 3)])
    }

    pub fn encode_rel12(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 1, "k")?;
        let target = self.expect_const(&ops[0])?;
        let k = self.relative_words(target, 12)?;
        Ok(vec![base | (k as u16 & 0x0FFF)])
    }

    // JMP / CALL carry an absolute word address split over two words.
    pub fn encode_abs22(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 1, "k")?;
        let target = self.expect_const(&ops[0])?;

        if target < 0 || target % 2 != 0 {
            return Err(self.range_err(format!(
                "Jump target {:#x} is not an even byte address.",
                target
            )));
        }
        let k = target / 2;
        if k > 0x3F_FFFF {
            return Err(self.range_err(format!(
                "Jump target {:#x} does not fit in 22 bits.",
                target
            )));
        }

        let high = base | (((k >> 17) as u16 & 0x1F) << 4) | ((k >> 16) as u16 & 1);
        Ok(vec![high, (k & 0xFFFF) as u16])
    }
}
