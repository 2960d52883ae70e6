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

use crate::assembler::Options;
use crate::assembler::encoder::relative_displacement;
use crate::assembler::symbol_env::SymbolEnv;
use crate::errors::AsmError;

/// ATmega328-class devices have 26 interrupt vectors.
pub const DEFAULT_VECTOR_COUNT: usize = 26;

// rjmp .-2, the conventional catch-all for unused vectors.
const SELF_LOOP: u16 = 0xCFFF;

/// Handler label per vector slot, ATmega328P ordering. Slots past the end of
/// this table (with a raised --vector-count) always get the self-loop.
pub const HANDLERS: [&str; DEFAULT_VECTOR_COUNT] = [
    "RESET",
    "INT0_vect",
    "INT1_vect",
    "PCINT0_vect",
    "PCINT1_vect",
    "PCINT2_vect",
    "WDT_vect",
    "TIMER2_COMPA_vect",
    "TIMER2_COMPB_vect",
    "TIMER2_OVF_vect",
    "TIMER1_CAPT_vect",
    "TIMER1_COMPA_vect",
    "TIMER1_COMPB_vect",
    "TIMER1_OVF_vect",
    "TIMER0_COMPA_vect",
    "TIMER0_COMPB_vect",
    "TIMER0_OVF_vect",
    "SPI_STC_vect",
    "USART_RX_vect",
    "USART_UDRE_vect",
    "USART_TX_vect",
    "ADC_vect",
    "EE_READY_vect",
    "ANALOG_COMP_vect",
    "TWI_vect",
    "SPM_READY_vect",
];

/// Emit the vector table: one RJMP per slot to its handler label when the
/// source defines it, else a self-loop.
pub fn emit(env: &SymbolEnv, options: &Options) -> Result<Vec<u8>, AsmError> {
    let mut table = Vec::with_capacity(options.vector_count * 2);

    for slot in 0..options.vector_count {
        let slot_address = (slot * 2) as i64;
        let word = match HANDLERS.get(slot) {
            Some(name) if env.contains(name) => {
                let target =
                    env.resolve_name(name, 0)
                        .map_err(|_| AsmError::SymbolErrorNoLine {
                            reason: format!(
                                "Vector handler {} does not resolve to an address.",
                                name
                            ),
                        })?;
                let k = relative_displacement(target, slot_address, 12, 0).map_err(|_| {
                    AsmError::SymbolErrorNoLine {
                        reason: format!("Vector handler {} is out of RJMP range.", name),
                    }
                })?;
                0xC000 | (k as u16 & 0x0FFF)
            }
            _ => SELF_LOOP,
        };
        table.extend_from_slice(&word.to_le_bytes());
    }

    Ok(table)
}

// ------------- unit tests -------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_environment_yields_all_self_loops() {
        let env = SymbolEnv::new();
        let table = emit(&env, &Options::default()).unwrap();
        assert_eq!(table.len(), 52);
        for pair in table.chunks(2) {
            assert_eq!(pair, [0xFF, 0xCF]);
        }
    }

    #[test]
    fn test_reset_vector_jumps_to_handler() {
        let mut env = SymbolEnv::new();
        // first address after the 26-slot table
        env.define_label("RESET", 52, 1).unwrap();
        let table = emit(&env, &Options::default()).unwrap();
        // k = (52 - 2) / 2 = 25
        assert_eq!(&table[0..2], [0x19, 0xC0]);
        assert_eq!(&table[2..4], [0xFF, 0xCF]);
    }

    #[test]
    fn test_interrupt_slot_position() {
        let mut env = SymbolEnv::new();
        // TIMER1_COMPB_vect sits in slot 12
        env.define_label("TIMER1_COMPB_vect", 60, 1).unwrap();
        let table = emit(&env, &Options::default()).unwrap();
        // k = (60 - (24 + 2)) / 2 = 17
        assert_eq!(&table[24..26], [0x11, 0xC0]);
    }

    #[test]
    fn test_raised_vector_count_pads_with_self_loops() {
        let env = SymbolEnv::new();
        let options = Options {
            vectors: true,
            vector_count: 30,
        };
        let table = emit(&env, &options).unwrap();
        assert_eq!(table.len(), 60);
        assert_eq!(&table[58..60], [0xFF, 0xCF]);
    }
}
