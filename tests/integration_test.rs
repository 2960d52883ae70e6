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

use rasm::errors::AsmError;
use rasm::{Options, assemble, assemble_file};
use std::io::Write;

const VECTOR_TABLE_BYTES: usize = 52;

fn no_vectors() -> Options {
    Options {
        vectors: false,
        ..Options::default()
    }
}

fn assemble_flat(source: &str) -> Vec<u8> {
    assemble(source, &no_vectors()).unwrap()
}

fn assemble_err(source: &str) -> AsmError {
    let err = assemble(source, &no_vectors()).unwrap_err();
    err.downcast::<AsmError>().expect("expected an AsmError")
}

#[test]
fn test_empty_source() {
    assert_eq!(assemble_flat(""), Vec::<u8>::new());
}

#[test]
fn test_rjmp_to_self() {
    // k12 = -1, word 0xCFFF
    assert_eq!(assemble_flat("start: rjmp start\n"), vec![0xFF, 0xCF]);
}

#[test]
fn test_ldi_with_forward_referenced_constant() {
    let rom = assemble_flat("        ldi r17, defined_later\n.equ defined_later = 2\n");
    assert_eq!(rom, vec![0x12, 0xE0]);
}

#[test]
fn test_movw_of_register_pair_aliases() {
    let rom = assemble_flat(
        ".equ dstpair = r1:r0\n.equ srcpair = r3:r2\n        movw dstpair, srcpair\n",
    );
    assert_eq!(rom, vec![0x01, 0x01]);
}

#[test]
fn test_default_shadowed_by_equ() {
    let rom = assemble_flat(".default x = 3\n.equ x = 5\n        ldi r17, x\n");
    assert_eq!(rom, vec![0x15, 0xE0]);
}

#[test]
fn test_default_alone_uses_the_default() {
    let rom = assemble_flat(".default x = 3\n        ldi r17, x\n");
    assert_eq!(rom, vec![0x13, 0xE0]);
}

#[test]
fn test_backward_local_label_loop() {
    let rom = assemble_flat("1: ldi r16, 165\n2: dec r16\n   brne 2b\n");
    assert_eq!(
        rom,
        vec![
            0x05, 0xEA, // ldi r16, 165
            0x0A, 0x95, // dec r16
            0xF1, 0xF7, // brne .-4 (k = -2)
        ]
    );
}

#[test]
fn test_forward_local_label() {
    let rom = assemble_flat("   rjmp 1f\n   nop\n1: nop\n");
    // rjmp over one word: k = 1
    assert_eq!(rom[0..2], [0x01, 0xC0]);
}

#[test]
fn test_equ_order_is_irrelevant() {
    let forward = assemble_flat(".equ a = b\n.equ b = 7\n   ldi r16, a\n");
    let backward = assemble_flat(".equ b = 7\n.equ a = b\n   ldi r16, a\n");
    assert_eq!(forward, backward);
    assert_eq!(forward, vec![0x07, 0xE0]);
}

#[test]
fn test_label_arithmetic() {
    let rom = assemble_flat(
        "   ldi r24, pattern_rom_end-pattern_rom\n   rjmp done\npattern_rom:\n.byte 1, 2, 3, 4\npattern_rom_end:\ndone: nop\n",
    );
    // pattern length is 4
    assert_eq!(rom[0..2], [0x84, 0xE0]);
}

#[test]
fn test_lo8_hi8_of_label() {
    let rom = assemble_flat(
        "   ldi r30, lo8(table)\n   ldi r31, hi8(table)\n   rjmp table\n.align 2\ntable: nop\n",
    );
    // table sits at byte 6
    assert_eq!(rom[0..2], [0xE6, 0xE0]); // ldi r30, 0x06
    assert_eq!(rom[2..4], [0xF0, 0xE0]); // ldi r31, 0x00
}

#[test]
fn test_sfr_aliases_in_io_ops() {
    let rom = assemble_flat("   sbi DDRB, PB5\n   cbi PORTB, PB5\n   in r16, SREG\n");
    assert_eq!(
        rom,
        vec![
            0x25, 0x9A, // sbi 0x04, 5
            0x2D, 0x98, // cbi 0x05, 5
            0x0F, 0xB7, // in r16, 0x3f
        ]
    );
}

#[test]
fn test_sfr_aliases_in_lds_sts() {
    let rom = assemble_flat("   lds r16, UDR0\n   sts TIMSK1, r17\n");
    assert_eq!(
        rom,
        vec![
            0x00, 0x91, 0xC6, 0x00, // lds r16, 0x00C6
            0x10, 0x93, 0x6F, 0x00, // sts 0x006F, r17
        ]
    );
}

#[test]
fn test_two_word_instructions_and_layout() {
    let rom = assemble_flat("   jmp over\n   nop\nover: nop\n");
    assert_eq!(
        rom,
        vec![
            0x0C, 0x94, 0x03, 0x00, // jmp 0x6 (word address 3)
            0x00, 0x00, // nop
            0x00, 0x00, // nop (over:)
        ]
    );
}

#[test]
fn test_rept_emits_repeated_instructions() {
    let rom = assemble_flat(".rept 3\n   nop\n.endr\n   dec r16\n");
    assert_eq!(
        rom,
        vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x95]
    );
}

#[test]
fn test_rept_zero_expands_to_nothing() {
    assert_eq!(assemble_flat(".rept 0\n   nop\n.endr\n"), Vec::<u8>::new());
}

#[test]
fn test_word_directive_with_label() {
    let rom = assemble_flat("entry: nop\n.word entry, 0xBEEF\n");
    assert_eq!(rom, vec![0x00, 0x00, 0x00, 0x00, 0xEF, 0xBE]);
}

// --- vector table mode ---

#[test]
fn test_vector_table_all_unused() {
    let rom = assemble("", &Options::default()).unwrap();
    assert_eq!(rom.len(), VECTOR_TABLE_BYTES);
    for pair in rom.chunks(2) {
        assert_eq!(pair, [0xFF, 0xCF]); // rjmp .-2
    }
}

#[test]
fn test_vector_table_reset_handler() {
    let rom = assemble("RESET: rjmp RESET\n", &Options::default()).unwrap();
    assert_eq!(rom.len(), VECTOR_TABLE_BYTES + 2);
    // slot 0 jumps 25 words forward to byte 52
    assert_eq!(rom[0..2], [0x19, 0xC0]);
    assert_eq!(rom[2..4], [0xFF, 0xCF]);
    // the handler loops on itself at byte 52
    assert_eq!(rom[52..54], [0xFF, 0xCF]);
}

#[test]
fn test_vector_table_interrupt_handler_slot() {
    let source = "RESET: rjmp RESET\nTIMER1_COMPB_vect: reti\n";
    let rom = assemble(source, &Options::default()).unwrap();
    // TIMER1_COMPB_vect is slot 12 at byte 24, handler at byte 54:
    // k = (54 - 26) / 2 = 14
    assert_eq!(rom[24..26], [0x0E, 0xC0]);
    assert_eq!(rom[54..56], [0x18, 0x95]); // reti
}

#[test]
fn test_custom_vector_count() {
    let options = Options {
        vectors: true,
        vector_count: 4,
    };
    let rom = assemble("RESET: nop\n", &options).unwrap();
    assert_eq!(rom.len(), 8 + 2);
    // k = (8 - 2) / 2 = 3
    assert_eq!(rom[0..2], [0x03, 0xC0]);
}

// --- error paths ---

#[test]
fn test_ldi_low_register_is_rejected() {
    assert!(matches!(
        assemble_err("   ldi r15, 1\n"),
        AsmError::RangeError { .. }
    ));
}

#[test]
fn test_branch_target_out_of_range() {
    let source = "   brne far\n.rept 64\n   nop\n.endr\nfar: nop\n";
    assert!(matches!(
        assemble_err(source),
        AsmError::RangeError { .. }
    ));
}

#[test]
fn test_branch_target_just_in_range() {
    let source = "   brne far\n.rept 63\n   nop\n.endr\nfar: nop\n";
    let rom = assemble(source, &no_vectors()).unwrap();
    // k = +63, the last displacement that fits
    assert_eq!(rom[0..2], [0xF9, 0xF5]);
}

#[test]
fn test_cbi_bit_out_of_range() {
    assert!(matches!(
        assemble_err("   cbi PORTB, 8\n"),
        AsmError::RangeError { .. }
    ));
}

#[test]
fn test_self_referential_equ_cycle() {
    assert!(matches!(
        assemble_err(".equ a = a\n   ldi r16, a\n"),
        AsmError::SymbolError { .. }
    ));
}

#[test]
fn test_equ_on_register_name_is_rejected() {
    assert!(matches!(
        assemble_err(".equ r0 = 1\n"),
        AsmError::SymbolError { .. }
    ));
}

#[test]
fn test_duplicate_equ_is_rejected() {
    assert!(matches!(
        assemble_err(".equ a = 1\n.equ a = 2\n"),
        AsmError::SymbolError { .. }
    ));
}

#[test]
fn test_undefined_symbol_is_rejected() {
    assert!(matches!(
        assemble_err("   ldi r16, missing\n"),
        AsmError::SymbolError { .. }
    ));
}

#[test]
fn test_unknown_mnemonic_is_rejected() {
    assert!(matches!(
        assemble_err("   blorp r1, r2\n"),
        AsmError::EncodeError { .. }
    ));
}

#[test]
fn test_no_output_written_through_file_entry_point() {
    let mut source_file = tempfile::NamedTempFile::new().unwrap();
    write!(source_file, "   ldi r15, 1\n").unwrap();
    assert!(assemble_file(source_file.path(), &no_vectors()).is_err());
}

#[test]
fn test_assemble_file_round_trip() {
    let mut source_file = tempfile::NamedTempFile::new().unwrap();
    write!(source_file, "start: rjmp start\n").unwrap();
    let rom = assemble_file(source_file.path(), &no_vectors()).unwrap();
    assert_eq!(rom, vec![0xFF, 0xCF]);
}
