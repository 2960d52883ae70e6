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
    // CBI / SBI / SBIC / SBIS reach only the low half of the I/O space.
    pub fn encode_io_bit(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "A, b")?;
        let a = self.const_in_range(&ops[0], 0, 31, "I/O address")? as u16;
        let b = self.const_in_range(&ops[1], 0, 7, "Bit number")? as u16;
        Ok(vec![base | (a << 3) | b])
    }

    // SBRC / SBRS / BLD / BST share the 1111 1xxr rrrr 0bbb layout.
    pub fn encode_reg_bit(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rr, b")?;
        let r = self.expect_reg(&ops[0])?;
        let b = self.const_in_range(&ops[1], 0, 7, "Bit number")? as u16;
        Ok(vec![base | ((r as u16) << 4) | b])
    }

    pub fn encode_flag_op(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 1, "s")?;
        let s = self.const_in_range(&ops[0], 0, 7, "Flag number")? as u16;
        Ok(vec![base | (s << 4)])
    }
}
