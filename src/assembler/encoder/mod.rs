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

mod instruction_encoders;
mod operand_resolvers;
pub mod table;

pub use operand_resolvers::relative_displacement;

use crate::assembler::symbol_env::SymbolEnv;
use crate::ast::Instruction;
use crate::errors::AsmError;
use table::Shape;

/// Encodes one instruction at a known byte address against a completed
/// symbol environment.
pub struct Encoder<'a> {
    pub env: &'a SymbolEnv,
    pub address: u32,
    pub line: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(env: &'a SymbolEnv, address: u32, line: usize) -> Self {
        Self { env, address, line }
    }

    /// Translate a single instruction into bytes during Pass 2. Words are
    /// emitted little-endian.
    pub fn encode(&self, instruction: &Instruction) -> Result<Vec<u8>, AsmError> {
        let spec = table::lookup(&instruction.mnemonic).ok_or_else(|| AsmError::EncodeError {
            line: self.line,
            reason: format!("Unknown instruction mnemonic {}.", instruction.mnemonic),
        })?;
        let ops = &instruction.operands;

        let words = match spec.shape {
            Shape::Implied(word) => {
                self.expect_operands(ops, 0, "no operands")?;
                vec![word]
            }
            Shape::RegReg(base) => self.encode_reg_reg(base, ops)?,
            Shape::RegRegSame(base) => self.encode_reg_reg_same(base, ops)?,
            Shape::RegRegUpper(base) => self.encode_muls(base, ops)?,
            Shape::RegRegMul(base) => self.encode_mul_group(base, ops)?,
            Shape::RegImm8(base) => self.encode_reg_imm8(base, ops, false)?,
            Shape::RegImm8Inv(base) => self.encode_reg_imm8(base, ops, true)?,
            Shape::Reg(base) => self.encode_reg(base, ops)?,
            Shape::Ser => self.encode_ser(ops)?,
            Shape::Movw(base) => self.encode_movw(base, ops)?,
            Shape::PairImm6(base) => self.encode_pair_imm6(base, ops)?,
            Shape::IoIn(base) => self.encode_io_in(base, ops)?,
            Shape::IoOut(base) => self.encode_io_out(base, ops)?,
            Shape::IoBit(base) => self.encode_io_bit(base, ops)?,
            Shape::Branch(base) => self.encode_branch(base, ops)?,
            Shape::FlagBranch { set } => self.encode_flag_branch(set, ops)?,
            Shape::RegBit(base) => self.encode_reg_bit(base, ops)?,
            Shape::FlagOp(base) => self.encode_flag_op(base, ops)?,
            Shape::Rel12(base) => self.encode_rel12(base, ops)?,
            Shape::Abs22(base) => self.encode_abs22(base, ops)?,
            Shape::Lds => self.encode_lds(ops)?,
            Shape::Sts => self.encode_sts(ops)?,
            Shape::Load => self.encode_load(ops)?,
            Shape::Store => self.encode_store(ops)?,
            Shape::LoadDisp => self.encode_load_disp(ops)?,
            Shape::StoreDisp => self.encode_store_disp(ops)?,
            Shape::Lpm => self.encode_lpm(ops)?,
        };

        let mut bytes = Vec::with_capacity(words.len() * 2);
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        Ok(bytes)
    }
}

// ------------- unit tests -------------
