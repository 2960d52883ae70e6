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
use crate::ast::{IndirectMode, Operand, PtrReg};
use crate::errors::AsmError;

impl<'a> Encoder<'a> {
    pub fn encode_movw(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd+1:Rd, Rr+1:Rr")?;
        let d = self.expect_pair(&ops[0])? as u16;
        let r = self.expect_pair(&ops[1])? as u16;
        Ok(vec![base | ((d / 2) << 4) | (r / 2)])
    }

    pub fn encode_lds(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, k")?;
        let d = self.expect_reg(&ops[0])?;
        let k = self.const_in_range(&ops[1], 0, 0xFFFF, "Data address")?;
        Ok(vec![0x9000 | ((d as u16) << 4), k as u16])
    }

    pub fn encode_sts(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "k, Rr")?;
        let k = self.const_in_range(&ops[0], 0, 0xFFFF, "Data address")?;
        let r = self.expect_reg(&ops[1])?;
        Ok(vec![0x9200 | ((r as u16) << 4), k as u16])
    }

    pub fn encode_io_in(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, A")?;
        let d = self.expect_reg(&ops[0])?;
        let a = self.const_in_range(&ops[1], 0, 63, "I/O address")? as u16;
        Ok(vec![base | ((a & 0x30) << 5) | ((d as u16) << 4) | (a & 0x0F)])
    }

    pub fn encode_io_out(&self, base: u16, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "A, Rr")?;
        let a = self.const_in_range(&ops[0], 0, 63, "I/O address")? as u16;
        let r = self.expect_reg(&ops[1])?;
        Ok(vec![base | ((a & 0x30) << 5) | ((r as u16) << 4) | (a & 0x0F)])
    }

    pub fn encode_load(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, X/Y/Z")?;
        let d = self.expect_reg(&ops[0])?;
        let (ptr, mode) = self.expect_indirect(&ops[1])?;
        let base = self.indirect_base(ptr, mode, LOAD_BASES, "LD")?;
        Ok(vec![base | ((d as u16) << 4)])
    }

    pub fn encode_store(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "X/Y/Z, Rr")?;
        let (ptr, mode) = self.expect_indirect(&ops[0])?;
        let r = self.expect_reg(&ops[1])?;
        let base = self.indirect_base(ptr, mode, STORE_BASES, "ST")?;
        Ok(vec![base | ((r as u16) << 4)])
    }

    pub fn encode_load_disp(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Rd, Y+q / Z+q")?;
        let d = self.expect_reg(&ops[0])?;
        let (ptr, mode) = self.expect_indirect(&ops[1])?;
        let base = match ptr {
            PtrReg::Y => 0x8008,
            PtrReg::Z => 0x8000,
            PtrReg::X => {
                return Err(self.encode_err("LDD works through Y or Z, not X.".to_string()));
            }
        };
        let q = self.displacement(mode, "LDD")?;
        Ok(vec![pack_displacement(base, d, q)])
    }

    pub fn encode_store_disp(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        self.expect_operands(ops, 2, "Y+q / Z+q, Rr")?;
        let (ptr, mode) = self.expect_indirect(&ops[0])?;
        let r = self.expect_reg(&ops[1])?;
        let base = match ptr {
            PtrReg::Y => 0x8208,
            PtrReg::Z => 0x8200,
            PtrReg::X => {
                return Err(self.encode_err("STD works through Y or Z, not X.".to_string()));
            }
        };
        let q = self.displacement(mode, "STD")?;
        Ok(vec![pack_displacement(base, r, q)])
    }

    pub fn encode_lpm(&self, ops: &[Operand]) -> Result<Vec<u16>, AsmError> {
        if ops.is_empty() {
            return Ok(vec![0x95C8]);
        }
        self.expect_operands(ops, 2, "Rd, Z / Z+")?;
        let d = self.expect_reg(&ops[0])?;
        let (ptr, mode) = self.expect_indirect(&ops[1])?;
        let base = match (ptr, mode) {
            (PtrReg::Z, IndirectMode::Plain) => 0x9004,
            (PtrReg::Z, IndirectMode::PostInc) => 0x9005,
            _ => return Err(self.encode_err("LPM reads through Z or Z+.".to_string())),
        };
        Ok(vec![base | ((d as u16) << 4)])
    }

    fn indirect_base(
        &self,
        ptr: PtrReg,
        mode: &IndirectMode,
        bases: [[u16; 3]; 3],
        mnemonic: &str,
    ) -> Result<u16, AsmError> {
        let mode_index = match mode {
            IndirectMode::Plain => 0,
            IndirectMode::PostInc => 1,
            IndirectMode::PreDec => 2,
            IndirectMode::Disp(_) => {
                return Err(self.encode_err(format!(
                    "{} does not take a displacement, use {}D.",
                    mnemonic, mnemonic
                )));
            }
        };
        Ok(bases[ptr as usize][mode_index])
    }

    fn displacement(&self, mode: &IndirectMode, mnemonic: &str) -> Result<u16, AsmError> {
        match mode {
            IndirectMode::Disp(expr) => {
                let q = self.env.eval(expr, self.line)?;
                if !(0..=63).contains(&q) {
                    return Err(self.range_err(format!(
                        "Displacement {} out of range 0..63.",
                        q
                    )));
                }
                Ok(q as u16)
            }
            _ => Err(self.encode_err(format!(
                "{} requires a displaced operand like Y+4 or Z+4.",
                mnemonic
            ))),
        }
    }
}

// Indexed by [pointer][plain / post-increment / pre-decrement].
const LOAD_BASES: [[u16; 3]; 3] = [
    [0x900C, 0x900D, 0x900E], // X
    [0x8008, 0x9009, 0x900A], // Y
    [0x8000, 0x9001, 0x9002], // Z
];

const STORE_BASES: [[u16; 3]; 3] = [
    [0x920C, 0x920D, 0x920E], // X
    [0x8208, 0x9209, 0x920A], // Y
    [0x8200, 0x9201, 0x9202], // Z
];

// q is six bits scattered over the word: bit 13, bits 11:10, bits 2:0.
fn pack_displacement(base: u16, reg: u8, q: u16) -> u16 {
    base | ((reg as u16) << 4) | (q & 0x07) | ((q & 0x18) << 7) | ((q & 0x20) << 8)
}
