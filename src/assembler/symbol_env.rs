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

use crate::assembler::encoder::table;
use crate::assembler::sfr;
use crate::ast::{BinOp, BindValue, Expr, UnaryOp};
use crate::errors::AsmError;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strength {
    Strong,
    Weak,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: BindValue,
    pub strength: Strength,
    pub line: usize,
}

/// What a symbol used in operand position turned out to name.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolved {
    Num,
    Reg(u8),
    Pair { hi: u8, lo: u8 },
}

// The symbol environment maps names to unevaluated bound values. Bindings
// accumulate during parsing and layout; expressions are only evaluated once
// the environment is complete, which is what makes definition order among
// .equ/.default directives irrelevant.
pub struct SymbolEnv {
    bindings: HashMap<String, Binding>,
    cache: RefCell<HashMap<String, i64>>,
}

impl SymbolEnv {
    pub fn new() -> Self {
        let mut env = Self {
            bindings: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
        };
        sfr::seed(&mut env);
        env
    }

    // Built-ins install as weak so user sources may shadow them with .equ.
    pub(crate) fn seed_builtin(&mut self, name: &str, value: i64) {
        self.bindings.insert(
            name.to_string(),
            Binding {
                value: BindValue::Num(Expr::Int(value)),
                strength: Strength::Weak,
                line: 0,
            },
        );
    }

    pub fn define_strong(
        &mut self,
        name: &str,
        value: BindValue,
        line: usize,
    ) -> Result<(), AsmError> {
        check_definable(name, line)?;

        if let Some(existing) = self.bindings.get(name) {
            if existing.strength == Strength::Strong {
                return Err(AsmError::SymbolError {
                    line,
                    reason: format!(
                        "Duplicate definition of {} (first defined on line {}).",
                        name, existing.line
                    ),
                });
            }
        }

        self.bindings.insert(
            name.to_string(),
            Binding {
                value,
                strength: Strength::Strong,
                line,
            },
        );
        // Anything memoised may have gone through the displaced binding.
        self.cache.borrow_mut().clear();
        Ok(())
    }

    pub fn define_weak(
        &mut self,
        name: &str,
        value: BindValue,
        line: usize,
    ) -> Result<(), AsmError> {
        check_definable(name, line)?;

        // A .default never displaces an existing binding of either strength.
        if self.bindings.contains_key(name) {
            return Ok(());
        }

        self.bindings.insert(
            name.to_string(),
            Binding {
                value,
                strength: Strength::Weak,
                line,
            },
        );
        Ok(())
    }

    pub fn define_label(&mut self, name: &str, address: i64, line: usize) -> Result<(), AsmError> {
        self.define_strong(name, BindValue::Num(Expr::Int(address)), line)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn resolve_name(&self, name: &str, line: usize) -> Result<i64, AsmError> {
        self.eval(&Expr::Symbol(name.to_string()), line)
    }

    /// Evaluate an expression against the environment. `line` is the source
    /// line of the use site, for diagnostics.
    pub fn eval(&self, expr: &Expr, line: usize) -> Result<i64, AsmError> {
        let mut visiting = Vec::new();
        self.eval_inner(expr, line, &mut visiting)
    }

    fn eval_inner(
        &self,
        expr: &Expr,
        line: usize,
        visiting: &mut Vec<String>,
    ) -> Result<i64, AsmError> {
        match expr {
            Expr::Int(value) => Ok(*value),
            Expr::Symbol(name) => self.eval_symbol(name, line, visiting),
            Expr::LocalRef { .. } => {
                unreachable!("local references are rewritten before evaluation")
            }
            Expr::Unary(op, inner) => {
                let value = self.eval_inner(inner, line, visiting)?;
                Ok(match op {
                    UnaryOp::Neg => value.wrapping_neg(),
                    UnaryOp::BitNot => !value,
                    UnaryOp::LogNot => (value == 0) as i64,
                    UnaryOp::Lo8 => value & 0xFF,
                    UnaryOp::Hi8 => (value >> 8) & 0xFF,
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = self.eval_inner(lhs, line, visiting)?;
                let r = self.eval_inner(rhs, line, visiting)?;
                match op {
                    BinOp::Add => Ok(l.wrapping_add(r)),
                    BinOp::Sub => Ok(l.wrapping_sub(r)),
                    BinOp::Mul => Ok(l.wrapping_mul(r)),
                    BinOp::Div | BinOp::Rem => {
                        if r == 0 {
                            return Err(AsmError::RangeError {
                                line,
                                reason: "Division by zero in expression.".to_string(),
                            });
                        }
                        Ok(match op {
                            BinOp::Div => l.wrapping_div(r),
                            _ => l.wrapping_rem(r),
                        })
                    }
                    BinOp::And => Ok(l & r),
                    BinOp::Or => Ok(l | r),
                    BinOp::Xor => Ok(l ^ r),
                    BinOp::Shl | BinOp::Shr => {
                        if !(0..64).contains(&r) {
                            return Err(AsmError::RangeError {
                                line,
                                reason: format!("Shift amount {} out of range.", r),
                            });
                        }
                        Ok(match op {
                            BinOp::Shl => l << r,
                            _ => l >> r,
                        })
                    }
                }
            }
        }
    }

    fn eval_symbol(
        &self,
        name: &str,
        line: usize,
        visiting: &mut Vec<String>,
    ) -> Result<i64, AsmError> {
        if let Some(value) = self.cache.borrow().get(name) {
            return Ok(*value);
        }
        if visiting.iter().any(|n| n == name) {
            return Err(AsmError::SymbolError {
                line,
                reason: format!("Cyclic definition of {}.", name),
            });
        }

        let binding = self
            .bindings
            .get(name)
            .ok_or_else(|| AsmError::SymbolError {
                line,
                reason: format!("Use of undefined name {}.", name),
            })?;
        let value_expr = match &binding.value {
            BindValue::Num(expr) => expr,
            _ => {
                return Err(AsmError::SymbolError {
                    line,
                    reason: format!("Register alias {} cannot be used in an expression.", name),
                });
            }
        };

        // Errors inside the definition body point at the defining line.
        let def_line = if binding.line == 0 { line } else { binding.line };
        visiting.push(name.to_string());
        let value = self.eval_inner(value_expr, def_line, visiting)?;
        visiting.pop();

        self.cache.borrow_mut().insert(name.to_string(), value);
        Ok(value)
    }

    /// Chase a symbol used in operand position down to what it names. Alias
    /// chains (`.equ b = a` with `a` bound to a register) resolve through any
    /// number of links.
    pub fn resolve_operand_symbol(&self, name: &str, line: usize) -> Result<Resolved, AsmError> {
        let mut seen: Vec<&str> = Vec::new();
        let mut current = name;

        loop {
            if seen.contains(&current) {
                return Err(AsmError::SymbolError {
                    line,
                    reason: format!("Cyclic definition of {}.", name),
                });
            }
            seen.push(current);

            let binding = self
                .bindings
                .get(current)
                .ok_or_else(|| AsmError::SymbolError {
                    line,
                    reason: format!("Use of undefined name {}.", current),
                })?;
            match &binding.value {
                BindValue::Reg(number) => return Ok(Resolved::Reg(*number)),
                BindValue::Pair { hi, lo } => return Ok(Resolved::Pair { hi: *hi, lo: *lo }),
                BindValue::Num(Expr::Symbol(next)) => current = next.as_str(),
                BindValue::Num(_) => return Ok(Resolved::Num),
            }
        }
    }
}

impl Default for SymbolEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn check_definable(name: &str, line: usize) -> Result<(), AsmError> {
    if is_register_name(name) {
        return Err(AsmError::SymbolError {
            line,
            reason: format!("{} is a reserved register name.", name),
        });
    }
    if table::lookup(&name.to_ascii_lowercase()).is_some() {
        return Err(AsmError::SymbolError {
            line,
            reason: format!("{} collides with an instruction mnemonic.", name),
        });
    }
    Ok(())
}

/// r0-r31 (any case) and the uppercase pointer names X/Y/Z are operand
/// tokens, never symbols. Lowercase x/y/z are ordinary identifiers.
pub fn is_register_name(name: &str) -> bool {
    if matches!(name, "X" | "Y" | "Z") {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    if let Some(digits) = lower.strip_prefix('r') {
        if !digits.is_empty() && digits.len() <= 2 && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = digits.parse::<u8>() {
                return number <= 31;
            }
        }
    }
    false
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    fn num(value: i64) -> BindValue {
        BindValue::Num(Expr::Int(value))
    }

    fn sym(name: &str) -> BindValue {
        BindValue::Num(Expr::Symbol(name.to_string()))
    }

    #[test]
    fn test_strong_overrides_weak() {
        let mut env = SymbolEnv::new();
        env.define_weak("x", num(3), 1).unwrap();
        env.define_strong("x", num(5), 2).unwrap();
        assert_eq!(env.resolve_name("x", 3).unwrap(), 5);
    }

    #[test]
    fn test_weak_does_not_displace_strong() {
        let mut env = SymbolEnv::new();
        env.define_strong("x", num(5), 1).unwrap();
        env.define_weak("x", num(3), 2).unwrap();
        assert_eq!(env.resolve_name("x", 3).unwrap(), 5);
    }

    #[test]
    fn test_first_weak_wins() {
        let mut env = SymbolEnv::new();
        env.define_weak("x", num(3), 1).unwrap();
        env.define_weak("x", num(7), 2).unwrap();
        assert_eq!(env.resolve_name("x", 3).unwrap(), 3);
    }

    #[test]
    fn test_duplicate_strong_is_an_error() {
        let mut env = SymbolEnv::new();
        env.define_strong("x", num(5), 1).unwrap();
        let result = env.define_strong("x", num(6), 2);
        assert!(matches!(result, Err(AsmError::SymbolError { .. })));
    }

    #[test]
    fn test_definition_order_is_irrelevant() {
        let mut env = SymbolEnv::new();
        env.define_strong("a", sym("b"), 1).unwrap();
        env.define_strong("b", num(9), 2).unwrap();
        assert_eq!(env.resolve_name("a", 3).unwrap(), 9);
    }

    #[test]
    fn test_cycle_detection() {
        let mut env = SymbolEnv::new();
        env.define_strong("a", sym("b"), 1).unwrap();
        env.define_strong("b", sym("a"), 2).unwrap();
        let result = env.resolve_name("a", 3);
        assert!(matches!(result, Err(AsmError::SymbolError { .. })));
    }

    #[test]
    fn test_self_cycle_detection() {
        let mut env = SymbolEnv::new();
        env.define_strong("a", sym("a"), 1).unwrap();
        let result = env.resolve_name("a", 2);
        assert!(matches!(result, Err(AsmError::SymbolError { .. })));
    }

    #[test]
    fn test_undefined_name() {
        let env = SymbolEnv::new();
        let result = env.resolve_name("nowhere", 1);
        assert!(matches!(result, Err(AsmError::SymbolError { .. })));
    }

    #[test]
    fn test_lo8_hi8() {
        let env = SymbolEnv::new();
        let lo = Expr::Unary(UnaryOp::Lo8, Box::new(Expr::Int(0x1234)));
        let hi = Expr::Unary(UnaryOp::Hi8, Box::new(Expr::Int(0x1234)));
        assert_eq!(env.eval(&lo, 1).unwrap(), 0x34);
        assert_eq!(env.eval(&hi, 1).unwrap(), 0x12);
    }

    #[test]
    fn test_division_by_zero() {
        let env = SymbolEnv::new();
        let expr = Expr::Binary(BinOp::Div, Box::new(Expr::Int(1)), Box::new(Expr::Int(0)));
        assert!(matches!(
            env.eval(&expr, 1),
            Err(AsmError::RangeError { .. })
        ));
    }

    #[test]
    fn test_negative_shift() {
        let env = SymbolEnv::new();
        let expr = Expr::Binary(BinOp::Shl, Box::new(Expr::Int(1)), Box::new(Expr::Int(-2)));
        assert!(matches!(
            env.eval(&expr, 1),
            Err(AsmError::RangeError { .. })
        ));
    }

    #[test]
    fn test_reserved_register_names() {
        let mut env = SymbolEnv::new();
        assert!(matches!(
            env.define_strong("r0", num(1), 1),
            Err(AsmError::SymbolError { .. })
        ));
        assert!(matches!(
            env.define_strong("Z", num(1), 1),
            Err(AsmError::SymbolError { .. })
        ));
        // r32 is not a register, and lowercase z is not a pointer token.
        env.define_strong("r32", num(1), 1).unwrap();
        env.define_strong("z", num(1), 1).unwrap();
    }

    #[test]
    fn test_mnemonic_names_are_reserved() {
        let mut env = SymbolEnv::new();
        assert!(matches!(
            env.define_strong("rjmp", num(1), 1),
            Err(AsmError::SymbolError { .. })
        ));
    }

    #[test]
    fn test_builtin_sfr_can_be_shadowed() {
        let mut env = SymbolEnv::new();
        assert_eq!(env.resolve_name("PORTB", 1).unwrap(), 0x05);
        env.define_strong("PORTB", num(0x25), 2).unwrap();
        assert_eq!(env.resolve_name("PORTB", 3).unwrap(), 0x25);
    }

    #[test]
    fn test_register_alias_chain() {
        let mut env = SymbolEnv::new();
        env.define_strong("counter", BindValue::Reg(16), 1).unwrap();
        env.define_strong("also_counter", sym("counter"), 2).unwrap();
        assert_eq!(
            env.resolve_operand_symbol("also_counter", 3).unwrap(),
            Resolved::Reg(16)
        );
    }

    #[test]
    fn test_register_alias_rejected_in_expression() {
        let mut env = SymbolEnv::new();
        env.define_strong("counter", BindValue::Reg(16), 1).unwrap();
        let result = env.resolve_name("counter", 2);
        assert!(matches!(result, Err(AsmError::SymbolError { .. })));
    }
}
