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
use crate::assembler::encoder::operand_resolvers::pack_reg_reg;
use crate::ast::Operand;
use crate::errors::AsmError;

impl<'a> Encoder<'a> {
    pub fn encode_reg_reg(
        &self,
        base: u16,
        ops: &[Operand],
    ) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, Rr")?;
        let d = self.expect_reg(&ops[0])?;
        let r = self.expect_reg(&ops[1])?;
        Ok(vec![pack_reg_reg(base, d, r)])
    }

    // Aliases like LSL and TST repeat the one register in both fields.
    pub fn encode_reg_reg_same(
        &self,
        base: u16,
        ops: &[Operand],
    ) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 1, "Rd")?;
        let d = self.expect_reg(&ops[0])?;
        Ok(vec![pack_reg_reg(base, d, d)])
    }

    pub fn encode_muls(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, Rr")?;
        let d = self.expect_reg_in(&ops[0], 16, 31)?;
        let r = self.expect_reg_in(&ops[1], 16, 31)?;
        Ok(vec![base | ((d as u16 - 16) << 4) | (r as u16 - 16)])
    }

    pub fn encode_mul_group(
        &self,
        base: u16,
        ops: &[Operand],
    ) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, Rr")?;
        let d = self.expect_reg_in(&ops[0], 16, 23)?;
        let r = self.expect_reg_in(&ops[1], 16, 23)?;
        Ok(vec![base | ((d as u16 - 16) << 4) | (r as u16 - 16)])
    }

    pub fn encode_reg_imm8(
        &self,
        base: u16,
        ops: &[Operand],
        invert: bool,
    ) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, K")?;
        let d = self.expect_reg_in(&ops[0], 16, 31)?;
        let value = self.const_in_range(&ops[1], -128, 255, "Immediate")?;

        let mut k = value as u16 & 0xFF;
        if invert {
            k = !k & 0xFF;
        }

        Ok(vec![
            base | ((k & 0xF0) << 4) | ((d as u16 - 16) << 4) | (k & 0x0F),
        ])
    }

    pub fn encode_ser(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 1, "Rd")?;
        let d = self.expect_reg_in(&ops[0], 16, 31)?;
        Ok(vec![0xEF0F | ((d as u16 - 16) << 4)])
    }

    pub fn encode_reg(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 1, "Rd")?;
        let d = self.expect_reg(&ops[0])?;
        Ok(vec![base | ((d as u16) << 4)])
    }

    // ADIW / SBIW take one of the four upper pairs and a 6-bit constant.
    pub fn encode_pair_imm6(
        &self,
        base: u16,
        ops: &[Operand],
    ) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd+1:Rd, K")?;
        let low = self.expect_pair(&ops[0])?;
        if !(24..=30).contains(&low) {
            return Err(self.range_err(format!(
                "Register pair r{}:r{} not allowed, must be one of r25:r24, r27:r26, r29:r28, r31:r30.",
                low + 1,
                low
            )));
        }
        let k = self.const_in_range(&ops[1], 0, 63, "Immediate")? as u16;

        let dd = (low as u16 - 24) / 2;
        Ok(vec![base | ((k & 0x30) << 2) | (dd << 4) | (k & 0x0F)])
    }
}
