//! Deterministic opcode and operand-field classification tables.
//!
//! The instruction word layout follows the classic MIPS conventions: the top
//! 6 bits select between R-type (opcode 0, operation in the low 6 function
//! bits) and I/J-type (operation in the opcode field itself).

use crate::bits::{grab_left, grab_right};

/// Number of bits in the primary opcode and function fields.
pub const OPCODE_BITS: u32 = 6;

/// R-type function-field encodings (primary opcode 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum RFunction {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Not,
    Slt,
}

/// Single source-of-truth function-field table for R-type instructions.
///
/// Any function value not present here is an unknown instruction.
pub const R_FUNCTION_TABLE: &[(u32, RFunction)] = &[
    (0b10_0000, RFunction::Add),
    (0b10_0010, RFunction::Sub),
    (0b01_1000, RFunction::Mul),
    (0b10_0100, RFunction::And),
    (0b10_0101, RFunction::Or),
    (0b10_0110, RFunction::Xor),
    (0b10_0111, RFunction::Not),
    (0b10_1010, RFunction::Slt),
];

/// I-type and J-type primary opcode encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum IOpcode {
    Lw,
    Sw,
    J,
    Jal,
    Slti,
    Beq,
    Bne,
    Blez,
    Bgtz,
    Addi,
    Andi,
    Ori,
}

/// Single source-of-truth primary opcode table for I/J-type instructions.
///
/// Any nonzero opcode value not present here is an unknown instruction.
pub const I_OPCODE_TABLE: &[(u32, IOpcode)] = &[
    (0b10_0011, IOpcode::Lw),
    (0b10_1011, IOpcode::Sw),
    (0b00_0010, IOpcode::J),
    (0b00_0011, IOpcode::Jal),
    (0b00_1010, IOpcode::Slti),
    (0b00_0100, IOpcode::Beq),
    (0b00_0101, IOpcode::Bne),
    (0b00_0110, IOpcode::Blez),
    (0b00_0001, IOpcode::Bgtz),
    (0b00_1000, IOpcode::Addi),
    (0b00_1100, IOpcode::Andi),
    (0b00_1101, IOpcode::Ori),
];

/// Returns the primary opcode field (bits 31..26) of an instruction word.
#[must_use]
pub const fn opcode_field(word: u32) -> u32 {
    grab_left(word, OPCODE_BITS)
}

/// Returns the function field (bits 5..0) of an R-type instruction word.
#[must_use]
pub const fn function_field(word: u32) -> u32 {
    grab_right(word, OPCODE_BITS)
}

/// Returns true when the word uses the R-type encoding.
#[must_use]
pub const fn is_r_type(word: u32) -> bool {
    opcode_field(word) == 0
}

/// Looks up the R-type operation for a function-field value.
#[must_use]
pub fn classify_function(function: u32) -> Option<RFunction> {
    R_FUNCTION_TABLE
        .iter()
        .find_map(|(bits, op)| (*bits == function).then_some(*op))
}

/// Looks up the I/J-type operation for a primary opcode value.
#[must_use]
pub fn classify_opcode(opcode: u32) -> Option<IOpcode> {
    I_OPCODE_TABLE
        .iter()
        .find_map(|(bits, op)| (*bits == opcode).then_some(*op))
}

/// Extracts the first source register field, bits 25..21.
#[must_use]
pub const fn rs_field(word: u32) -> u32 {
    grab_right(grab_left(word, 11), 5)
}

/// Extracts the second source / I-type destination register field, bits 20..16.
#[must_use]
pub const fn rt_field(word: u32) -> u32 {
    grab_right(grab_left(word, 16), 5)
}

/// Extracts the R-type destination register field, bits 15..11.
#[must_use]
pub const fn rd_field(word: u32) -> u32 {
    grab_right(grab_left(word, 21), 5)
}

/// Extracts the raw 16-bit immediate/offset field, bits 15..0.
#[must_use]
pub const fn imm16_field(word: u32) -> u32 {
    grab_right(word, 16)
}

/// Extracts the 26-bit jump target field, bits 25..0.
#[must_use]
pub const fn target26_field(word: u32) -> u32 {
    grab_right(word, 26)
}
