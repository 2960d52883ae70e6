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
use crate::assembler::symbol_env::Resolved;
use crate::ast::{Expr, IndirectMode, Operand, PtrReg};
use crate::errors::AsmError;

impl<'a> Encoder<'a> {
    pub(super) fn encode_err(&self, reason: String) -> AsmError {
        AsmError::EncodeError {
            line: self.line,
            reason,
        }
    }

    pub(super) fn range_err(&self, reason: String) -> AsmError {
        AsmError::RangeError {
            line: self.line,
            reason,
        }
    }

    pub(super) fn expect_operands(
        &self,
        ops: &[Operand],
        count: usize,
        usage: &str,
    ) -> Result<(), AsmError> {
        if ops.len() != count {
            return Err(self.encode_err(format!(
                "Expected {} operand(s) ({}), found {}.",
                count,
                usage,
                ops.len()
            )));
        }
        Ok(())
    }

    /// A single register operand; symbol aliases bound to registers resolve
    /// through any number of links.
    pub(super) fn expect_reg(&self, op: &Operand) -> Result<u8, AsmError> {
        match op {
            Operand::Register(number) => Ok(*number),
            Operand::Expr(Expr::Symbol(name)) => {
                match self.env.resolve_operand_symbol(name, self.line)? {
                    Resolved::Reg(number) => Ok(number),
                    Resolved::Pair { .. } => Err(self.encode_err(format!(
                        "Expected a single register, {} names a register pair.",
                        name
                    ))),
                    Resolved::Num => Err(self.encode_err(format!(
                        "Expected a register, {} names a constant.",
                        name
                    ))),
                }
            }
            _ => Err(self.encode_err("Expected a register operand.".to_string())),
        }
    }

    pub(super) fn expect_reg_in(&self, op: &Operand, min: u8, max: u8) -> Result<u8, AsmError> {
        let number = self.expect_reg(op)?;
        if number < min || number > max {
            return Err(self.range_err(format!(
                "Register r{} not allowed here, must be r{}-r{}.",
                number, min, max
            )));
        }
        Ok(number)
    }

    /// A register pair, given as rH:rL, as its even low register, or as an
    /// alias of either. Returns the low register number.
    pub(super) fn expect_pair(&self, op: &Operand) -> Result<u8, AsmError> {
        let low = match op {
            Operand::Pair { lo, .. } => *lo,
            Operand::Register(number) => *number,
            Operand::Expr(Expr::Symbol(name)) => {
                match self.env.resolve_operand_symbol(name, self.line)? {
                    Resolved::Pair { lo, .. } => lo,
                    Resolved::Reg(number) => number,
                    Resolved::Num => {
                        return Err(self.encode_err(format!(
                            "Expected a register pair, {} names a constant.",
                            name
                        )));
                    }
                }
            }
            _ => return Err(self.encode_err("Expected a register pair operand.".to_string())),
        };

        if low % 2 != 0 {
            return Err(self.range_err(format!(
                "Register pairs start at an even register, r{} is odd.",
                low
            )));
        }
        Ok(low)
    }

    pub(super) fn expect_const(&self, op: &Operand) -> Result<i64, AsmError> {
        match op {
            Operand::Expr(expr) => self.env.eval(expr, self.line),
            _ => Err(self.encode_err("Expected a constant expression operand.".to_string())),
        }
    }

    pub(super) fn const_in_range(
        &self,
        op: &Operand,
        min: i64,
        max: i64,
        what: &str,
    ) -> Result<i64, AsmError> {
        let value = self.expect_const(op)?;
        if value < min || value > max {
            return Err(self.range_err(format!(
                "{} {} out of range {}..{}.",
                what, value, min, max
            )));
        }
        Ok(value)
    }

    pub(super) fn expect_indirect<'b>(
        &self,
        op: &'b Operand,
    ) -> Result<(PtrReg, &'b IndirectMode), AsmError> {
        match op {
            Operand::Indirect { ptr, mode } => Ok((*ptr, mode)),
            _ => Err(self.encode_err(
                "Expected an X/Y/Z pointer operand for indirect addressing.".to_string(),
            )),
        }
    }

    /// PC-relative displacement of this instruction to `target`, in words.
    pub(super) fn relative_words(&self, target: i64, bits: u32) -> Result<i64, AsmError> {
        relative_displacement(target, self.address as i64, bits, self.line)
    }
}

/// `k = (target - (from + 2)) / 2`: the program counter has already advanced
/// past the branch word when the displacement is applied.
pub fn relative_displacement(
    target: i64,
    from: i64,
    bits: u32,
    line: usize,
) -> Result<i64, AsmError> {
    let delta = target - (from + 2);
    if delta % 2 != 0 {
        return Err(AsmError::RangeError {
            line,
            reason: format!("Branch target {:#x} is not word aligned.", target),
        });
    }

    let k = delta / 2;
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    if k < min || k > max {
        return Err(AsmError::RangeError {
            line,
            reason: format!(
                "Relative target out of range, displacement of {} words does not fit in {} bits.",
                k, bits
            ),
        });
    }

    Ok(k)
}

/// Pack d (5 bits) and r (5 bits, split) into a two-register opcode.
pub(super) fn pack_reg_reg(base: u16, d: u8, r: u8) -> u16 {
    base | ((r as u16 & 0x10) << 5) | ((d as u16) << 4) | (r as u16 & 0x0F)
}
