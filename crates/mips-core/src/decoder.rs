//! Instruction decode: classifies a fetched word and extracts its operands.
//!
//! Decoding is recomputed on every fetch and produces a tagged value matched
//! exhaustively by the executor, so an unknown opcode is a reachable,
//! reportable condition instead of a silent fallthrough.

use crate::bits::sign_extend16;
use crate::encoding::{
    classify_function, classify_opcode, function_field, imm16_field, is_r_type, opcode_field,
    rd_field, rs_field, rt_field, target26_field, IOpcode, RFunction,
};
use crate::fault::Fault;
use crate::state::Register;

/// A fully decoded instruction with its extracted operand fields.
///
/// Arithmetic immediates (`addi`, `slti`) and memory/branch offsets are
/// stored sign-extended; logical immediates (`andi`, `ori`) are stored
/// zero-extended, matching their bitwise no-sign-effect semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Instruction {
    Add { rs: Register, rt: Register, rd: Register },
    Sub { rs: Register, rt: Register, rd: Register },
    /// 64-bit signed product of `rs` and `rt`, split into HI/LO.
    Mul { rs: Register, rt: Register },
    And { rs: Register, rt: Register, rd: Register },
    Or { rs: Register, rt: Register, rd: Register },
    Xor { rs: Register, rt: Register, rd: Register },
    /// Single-operand bitwise complement of `rs` into `rd`.
    Not { rs: Register, rd: Register },
    Slt { rs: Register, rt: Register, rd: Register },
    Lw { base: Register, rt: Register, offset: i32 },
    Sw { base: Register, rt: Register, offset: i32 },
    J { target: u32 },
    Jal { target: u32 },
    Slti { rs: Register, rt: Register, imm: i32 },
    Beq { rs: Register, rt: Register, offset: i32 },
    Bne { rs: Register, rt: Register, offset: i32 },
    Blez { rs: Register, offset: i32 },
    Bgtz { rs: Register, offset: i32 },
    Addi { rs: Register, rt: Register, imm: i32 },
    Andi { rs: Register, rt: Register, imm: u32 },
    Ori { rs: Register, rt: Register, imm: u32 },
}

/// Result of classifying one fetched word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// The all-zero word: the normal end-of-instructions signal.
    Exhausted,
    /// A decoded, executable instruction.
    Instruction(Instruction),
}

/// Decodes a fetched 32-bit instruction word.
///
/// The all-zero word is the terminal "no more instructions" sentinel and
/// decodes to [`Decoded::Exhausted`].
///
/// # Errors
///
/// Returns [`Fault::UnknownOpcode`] when the opcode or function field
/// matches no known instruction.
pub fn decode(word: u32) -> Result<Decoded, Fault> {
    if word == 0 {
        return Ok(Decoded::Exhausted);
    }

    let instruction = if is_r_type(word) {
        decode_r_type(word)
    } else {
        decode_i_type(word)
    };

    instruction
        .map(Decoded::Instruction)
        .ok_or(Fault::UnknownOpcode { word })
}

fn decode_r_type(word: u32) -> Option<Instruction> {
    let rs = Register::from_field(rs_field(word));
    let rt = Register::from_field(rt_field(word));
    let rd = Register::from_field(rd_field(word));

    let instruction = match classify_function(function_field(word))? {
        RFunction::Add => Instruction::Add { rs, rt, rd },
        RFunction::Sub => Instruction::Sub { rs, rt, rd },
        RFunction::Mul => Instruction::Mul { rs, rt },
        RFunction::And => Instruction::And { rs, rt, rd },
        RFunction::Or => Instruction::Or { rs, rt, rd },
        RFunction::Xor => Instruction::Xor { rs, rt, rd },
        RFunction::Not => Instruction::Not { rs, rd },
        RFunction::Slt => Instruction::Slt { rs, rt, rd },
    };
    Some(instruction)
}

fn decode_i_type(word: u32) -> Option<Instruction> {
    let rs = Register::from_field(rs_field(word));
    let rt = Register::from_field(rt_field(word));
    let imm = imm16_field(word);
    let signed = sign_extend16(imm);

    let instruction = match classify_opcode(opcode_field(word))? {
        IOpcode::Lw => Instruction::Lw {
            base: rs,
            rt,
            offset: signed,
        },
        IOpcode::Sw => Instruction::Sw {
            base: rs,
            rt,
            offset: signed,
        },
        IOpcode::J => Instruction::J {
            target: target26_field(word),
        },
        IOpcode::Jal => Instruction::Jal {
            target: target26_field(word),
        },
        IOpcode::Slti => Instruction::Slti { rs, rt, imm: signed },
        IOpcode::Beq => Instruction::Beq {
            rs,
            rt,
            offset: signed,
        },
        IOpcode::Bne => Instruction::Bne {
            rs,
            rt,
            offset: signed,
        },
        IOpcode::Blez => Instruction::Blez { rs, offset: signed },
        IOpcode::Bgtz => Instruction::Bgtz { rs, offset: signed },
        IOpcode::Addi => Instruction::Addi { rs, rt, imm: signed },
        IOpcode::Andi => Instruction::Andi { rs, rt, imm },
        IOpcode::Ori => Instruction::Ori { rs, rt, imm },
    };
    Some(instruction)
}
