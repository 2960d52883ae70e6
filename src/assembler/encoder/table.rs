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

//! The instruction set as one data structure: every mnemonic maps to its
//! width in 16-bit words, its operand shape, and the base opcode the shape's
//! encoder fills in. Width never depends on operands, which is what lets the
//! layout pass run in a single sweep.

/// Operand shape of a mnemonic. The base opcode carried by most variants has
/// the operand fields zeroed; for branch aliases it already contains the
/// flag-select bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shape {
    /// No operands, the word is the full opcode.
    Implied(u16),
    /// Rd, Rr with d and r in 0..31.
    RegReg(u16),
    /// One register encoded into both the d and r fields (LSL, TST, ...).
    RegRegSame(u16),
    /// Rd, Rr with both in r16..r31 (MULS).
    RegRegUpper(u16),
    /// Rd, Rr with both in r16..r23 (MULSU, FMUL family).
    RegRegMul(u16),
    /// Rd, K with d in r16..r31 and an 8-bit immediate.
    RegImm8(u16),
    /// Like RegImm8 but the immediate is complemented (CBR).
    RegImm8Inv(u16),
    /// Single Rd in 0..31.
    Reg(u16),
    /// SER Rd with d in r16..r31.
    Ser,
    /// Two even register pairs (MOVW).
    Movw(u16),
    /// Upper register pair plus 6-bit immediate (ADIW, SBIW).
    PairImm6(u16),
    /// IN Rd, A with A in 0..63.
    IoIn(u16),
    /// OUT A, Rr with A in 0..63.
    IoOut(u16),
    /// I/O bit ops: A in 0..31, bit in 0..7 (CBI, SBI, SBIC, SBIS).
    IoBit(u16),
    /// Conditional branch with a 7-bit word displacement; the base carries
    /// the flag-select bits of the alias.
    Branch(u16),
    /// BRBS / BRBC with an explicit flag number operand.
    FlagBranch { set: bool },
    /// Register bit ops: SBRC, SBRS, BLD, BST.
    RegBit(u16),
    /// BSET / BCLR with a flag number operand.
    FlagOp(u16),
    /// RJMP / RCALL with a 12-bit word displacement.
    Rel12(u16),
    /// JMP / CALL with a 22-bit absolute word address (two words).
    Abs22(u16),
    /// LDS Rd, k16 (two words).
    Lds,
    /// STS k16, Rr (two words).
    Sts,
    /// LD Rd through X/Y/Z with optional post-increment / pre-decrement.
    Load,
    /// ST through X/Y/Z, register last.
    Store,
    /// LDD Rd, Y+q / Z+q.
    LoadDisp,
    /// STD Y+q / Z+q, Rr.
    StoreDisp,
    /// LPM, bare or Rd, Z / Z+.
    Lpm,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OpSpec {
    pub words: u8,
    pub shape: Shape,
}

/// Look up a mnemonic (already folded to lower case). Returns None for
/// anything that is not an AVR instruction.
pub fn lookup(mnemonic: &str) -> Option<OpSpec> {
    use Shape::*;

    let one = |shape: Shape| OpSpec { words: 1, shape };
    let two = |shape: Shape| OpSpec { words: 2, shape };

    let spec = match mnemonic {
        // Rd, Rr arithmetic and logic
        "add" => one(RegReg(0x0C00)),
        "adc" => one(RegReg(0x1C00)),
        "sub" => one(RegReg(0x1800)),
        "sbc" => one(RegReg(0x0800)),
        "and" => one(RegReg(0x2000)),
        "or" => one(RegReg(0x2800)),
        "eor" => one(RegReg(0x2400)),
        "cp" => one(RegReg(0x1400)),
        "cpc" => one(RegReg(0x0400)),
        "cpse" => one(RegReg(0x1000)),
        "mov" => one(RegReg(0x2C00)),
        "mul" => one(RegReg(0x9C00)),
        "lsl" => one(RegRegSame(0x0C00)),
        "rol" => one(RegRegSame(0x1C00)),
        "tst" => one(RegRegSame(0x2000)),
        "clr" => one(RegRegSame(0x2400)),
        "muls" => one(RegRegUpper(0x0200)),
        "mulsu" => one(RegRegMul(0x0300)),
        "fmul" => one(RegRegMul(0x0308)),
        "fmuls" => one(RegRegMul(0x0380)),
        "fmulsu" => one(RegRegMul(0x0388)),

        // immediate arithmetic, upper registers only
        "ldi" => one(RegImm8(0xE000)),
        "andi" => one(RegImm8(0x7000)),
        "ori" => one(RegImm8(0x6000)),
        "subi" => one(RegImm8(0x5000)),
        "sbci" => one(RegImm8(0x4000)),
        "cpi" => one(RegImm8(0x3000)),
        "sbr" => one(RegImm8(0x6000)),
        "cbr" => one(RegImm8Inv(0x7000)),
        "ser" => one(Ser),

        // single register
        "com" => one(Reg(0x9400)),
        "neg" => one(Reg(0x9401)),
        "swap" => one(Reg(0x9402)),
        "inc" => one(Reg(0x9403)),
        "asr" => one(Reg(0x9405)),
        "lsr" => one(Reg(0x9406)),
        "ror" => one(Reg(0x9407)),
        "dec" => one(Reg(0x940A)),
        "pop" => one(Reg(0x900F)),
        "push" => one(Reg(0x920F)),

        // register pairs
        "movw" => one(Movw(0x0100)),
        "adiw" => one(PairImm6(0x9600)),
        "sbiw" => one(PairImm6(0x9700)),

        // I/O space
        "in" => one(IoIn(0xB000)),
        "out" => one(IoOut(0xB800)),
        "cbi" => one(IoBit(0x9800)),
        "sbic" => one(IoBit(0x9900)),
        "sbi" => one(IoBit(0x9A00)),
        "sbis" => one(IoBit(0x9B00)),

        // register bit ops
        "bld" => one(RegBit(0xF800)),
        "bst" => one(RegBit(0xFA00)),
        "sbrc" => one(RegBit(0xFC00)),
        "sbrs" => one(RegBit(0xFE00)),
        "bset" => one(FlagOp(0x9408)),
        "bclr" => one(FlagOp(0x9488)),

        // conditional branches; the base carries the flag-select bits
        "brbs" => one(FlagBranch { set: true }),
        "brbc" => one(FlagBranch { set: false }),
        "brcs" => one(Branch(0xF000)),
        "brlo" => one(Branch(0xF000)),
        "breq" => one(Branch(0xF001)),
        "brmi" => one(Branch(0xF002)),
        "brvs" => one(Branch(0xF003)),
        "brlt" => one(Branch(0xF004)),
        "brhs" => one(Branch(0xF005)),
        "brts" => one(Branch(0xF006)),
        "brie" => one(Branch(0xF007)),
        "brcc" => one(Branch(0xF400)),
        "brsh" => one(Branch(0xF400)),
        "brne" => one(Branch(0xF401)),
        "brpl" => one(Branch(0xF402)),
        "brvc" => one(Branch(0xF403)),
        "brge" => one(Branch(0xF404)),
        "brhc" => one(Branch(0xF405)),
        "brtc" => one(Branch(0xF406)),
        "brid" => one(Branch(0xF407)),

        // jumps and calls
        "rjmp" => one(Rel12(0xC000)),
        "rcall" => one(Rel12(0xD000)),
        "ijmp" => one(Implied(0x9409)),
        "icall" => one(Implied(0x9509)),
        "jmp" => two(Abs22(0x940C)),
        "call" => two(Abs22(0x940E)),
        "ret" => one(Implied(0x9508)),
        "reti" => one(Implied(0x9518)),

        // data transfer
        "lds" => two(Lds),
        "sts" => two(Sts),
        "ld" => one(Load),
        "st" => one(Store),
        "ldd" => one(LoadDisp),
        "std" => one(StoreDisp),
        "lpm" => one(Lpm),

        // flag shorthands (BSET/BCLR with the flag baked in)
        "sec" => one(Implied(0x9408)),
        "sez" => one(Implied(0x9418)),
        "sen" => one(Implied(0x9428)),
        "sev" => one(Implied(0x9438)),
        "ses" => one(Implied(0x9448)),
        "seh" => one(Implied(0x9458)),
        "set" => one(Implied(0x9468)),
        "sei" => one(Implied(0x9478)),
        "clc" => one(Implied(0x9488)),
        "clz" => one(Implied(0x9498)),
        "cln" => one(Implied(0x94A8)),
        "clv" => one(Implied(0x94B8)),
        "cls" => one(Implied(0x94C8)),
        "clh" => one(Implied(0x94D8)),
        "clt" => one(Implied(0x94E8)),
        "cli" => one(Implied(0x94F8)),

        // MCU control
        "nop" => one(Implied(0x0000)),
        "sleep" => one(Implied(0x9588)),
        "break" => one(Implied(0x9598)),
        "wdr" => one(Implied(0x95A8)),
        "spm" => one(Implied(0x95E8)),

        _ => return None,
    };

    Some(spec)
}

/// Byte width of a mnemonic, for the layout pass.
pub fn instruction_size(mnemonic: &str) -> Option<u32> {
    lookup(mnemonic).map(|spec| spec.words as u32 * 2)
}
