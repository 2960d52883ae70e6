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

pub mod encoder;
pub mod sfr;
pub mod symbol_env;
pub mod vector_table;

use crate::ast::{AssemblyLine, Directive, Label};
use crate::errors::AsmError;
use encoder::{Encoder, table};
use symbol_env::SymbolEnv;

/// Assembly options from the driver.
#[derive(Debug, Clone)]
pub struct Options {
    pub vectors: bool,
    pub vector_count: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            vectors: true,
            vector_count: vector_table::DEFAULT_VECTOR_COUNT,
        }
    }
}

// .data reservations land at the ATmega328 SRAM base. Nothing from .data is
// emitted; the addresses only exist so LDS/STS against .data labels resolve.
const DATA_BASE: u32 = 0x0100;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Section {
    Text,
    Data,
}

struct Cursors {
    section: Section,
    text: u32,
    data: u32,
}

impl Cursors {
    fn new(options: &Options) -> Self {
        Self {
            section: Section::Text,
            text: text_base(options),
            data: DATA_BASE,
        }
    }

    fn current(&self) -> u32 {
        match self.section {
            Section::Text => self.text,
            Section::Data => self.data,
        }
    }

    fn advance(&mut self, amount: u32) {
        match self.section {
            Section::Text => self.text += amount,
            Section::Data => self.data += amount,
        }
    }

    fn align(&mut self, alignment: u32) {
        let rem = self.current() % alignment;
        if rem != 0 {
            self.advance(alignment - rem);
        }
    }

    fn switch(&mut self, name: &str) {
        self.section = if name == ".data" {
            Section::Data
        } else {
            Section::Text
        };
    }
}

/// Byte address where .text begins in the output image.
fn text_base(options: &Options) -> u32 {
    if options.vectors {
        options.vector_count as u32 * 2
    } else {
        0
    }
}

/// Pass 0: collect every .equ / .default binding, in source order. Labels
/// are not known yet; expressions stay unevaluated until encoding.
pub fn build_symbol_env(lines: &[AssemblyLine]) -> Result<SymbolEnv, AsmError> {
    let mut env = SymbolEnv::new();

    for line in lines {
        match &line.directive {
            Some(Directive::Equ(name, value)) => {
                env.define_strong(name, value.clone(), line.line_number)?;
            }
            Some(Directive::Default(name, value)) => {
                env.define_weak(name, value.clone(), line.line_number)?;
            }
            _ => {}
        }
    }

    Ok(env)
}

/// Pass 1: walk the lines assigning byte addresses. Label addresses install
/// into the environment as strong bindings; widths come straight from the
/// mnemonic table, so a single sweep settles every address.
pub fn run_layout(
    lines: &[AssemblyLine],
    env: &mut SymbolEnv,
    options: &Options,
) -> Result<(), AsmError> {
    let mut cursors = Cursors::new(options);
    let mut globals: Vec<(String, usize)> = Vec::new();

    for line in lines {
        if let Some(label) = &line.label {
            let name = match label {
                Label::Named(name) => name,
                Label::Numeric(_) => unreachable!("numeric labels are rewritten before layout"),
            };
            env.define_label(name, cursors.current() as i64, line.line_number)?;
        }

        if let Some(directive) = &line.directive {
            match directive {
                Directive::Section(name) => cursors.switch(name),
                Directive::Byte(exprs) => cursors.advance(exprs.len() as u32),
                Directive::Word(exprs) => cursors.advance(exprs.len() as u32 * 2),
                Directive::Align(alignment) => cursors.align(*alignment),
                Directive::Global(name) => globals.push((name.clone(), line.line_number)),
                Directive::Equ(..) | Directive::Default(..) => {}
            }
        }

        if let Some(instruction) = &line.instruction {
            if cursors.section != Section::Text {
                return Err(AsmError::DirectiveError {
                    line: line.line_number,
                    reason: "Instructions are only allowed in the .text section.".to_string(),
                });
            }
            if cursors.text % 2 != 0 {
                return Err(AsmError::RangeError {
                    line: line.line_number,
                    reason: format!(
                        "Instruction at unaligned address {:#x}, pad with .align 2.",
                        cursors.text
                    ),
                });
            }

            let size = table::instruction_size(&instruction.mnemonic).ok_or_else(|| {
                AsmError::EncodeError {
                    line: line.line_number,
                    reason: format!("Unknown instruction mnemonic {}.", instruction.mnemonic),
                }
            })?;
            cursors.advance(size);
        }
    }

    for (name, line_number) in globals {
        if !env.contains(&name) {
            return Err(AsmError::SymbolError {
                line: line_number,
                reason: format!(".global name {} is never defined.", name),
            });
        }
    }

    Ok(())
}

/// Pass 2: emit the .text byte image. The walk mirrors pass 1, so every
/// instruction encodes at exactly the address its labels were given.
pub fn generate_text(
    lines: &[AssemblyLine],
    env: &SymbolEnv,
    options: &Options,
) -> Result<Vec<u8>, AsmError> {
    let base = text_base(options);
    let mut section = Section::Text;
    let mut text: Vec<u8> = Vec::new();

    for line in lines {
        if let Some(directive) = &line.directive {
            match directive {
                Directive::Section(name) => {
                    section = if name == ".data" {
                        Section::Data
                    } else {
                        Section::Text
                    };
                }
                Directive::Byte(exprs) if section == Section::Text => {
                    for expr in exprs {
                        let value = data_value(env, expr, line.line_number, -128, 255)?;
                        text.push(value as u8);
                    }
                }
                Directive::Word(exprs) if section == Section::Text => {
                    for expr in exprs {
                        let value = data_value(env, expr, line.line_number, -32768, 65535)?;
                        text.extend_from_slice(&(value as u16).to_le_bytes());
                    }
                }
                Directive::Align(alignment) if section == Section::Text => {
                    while (base + text.len() as u32) % alignment != 0 {
                        text.push(0x00);
                    }
                }
                _ => {}
            }
        }

        if let Some(instruction) = &line.instruction {
            let address = base + text.len() as u32;
            let bytes = Encoder::new(env, address, line.line_number).encode(instruction)?;
            text.extend(bytes);
        }
    }

    Ok(text)
}

fn data_value(
    env: &SymbolEnv,
    expr: &crate::ast::Expr,
    line: usize,
    min: i64,
    max: i64,
) -> Result<i64, AsmError> {
    let value = env.eval(expr, line)?;
    if value < min || value > max {
        return Err(AsmError::RangeError {
            line,
            reason: format!("Data value {} out of range {}..{}.", value, min, max),
        });
    }
    Ok(value)
}

// ------------- unit tests -------------
