//! The machine value: register file, memory, and the microstep executor.
//!
//! Each instruction executes over a fixed sequence of observable microsteps
//! (operand dispatch, ALU selection, result retrieval, commit). State-changing
//! effects happen only at their designated commit microstep, so driving the
//! machine one microstep at a time never re-applies an effect, and a faulting
//! instruction aborts without partial commits.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use crate::decoder::{decode, Decoded, Instruction};
use crate::fault::Fault;
use crate::loader::parse_program;
use crate::memory::{Memory, WORD_BYTES};
use crate::snapshot;
use crate::state::{Register, RegisterFile};
use crate::trace::{TraceEvent, TraceSink};

/// Default memory size when none is configured.
pub const DEFAULT_MEMORY_BYTES: usize = 4096;

/// Construction-time machine policy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Memory size in bytes; `$sp` starts at the top word.
    pub memory_size: usize,
    /// Discard writes to `$zero` (real-MIPS semantics). The reference
    /// machine leaves register 0 writable, so this defaults to off.
    pub hardwired_zero: bool,
    /// Consult the direct-mapped cache hierarchy on every byte read.
    /// Defaults to off, matching the reference machine's behavior.
    pub cache_enabled: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_BYTES,
            hardwired_zero: false,
            cache_enabled: false,
        }
    }
}

/// Result of driving the machine by one microstep or one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// A microstep ran; the current instruction has more to go.
    Progressed,
    /// The current instruction retired on this call.
    Retired,
    /// The word at PC is zero: no more instructions.
    Exhausted,
}

/// Aggregate result of a run-to-completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of instructions retired before exhaustion.
    pub instructions: u64,
}

/// ALU operations shared by the two-operand instruction families.
#[derive(Debug, Clone, Copy)]
enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Slt,
}

impl AluOp {
    const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Slt => "slt",
        }
    }

    const fn apply(self, a: i32, b: i32) -> i32 {
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::And => a & b,
            Self::Or => a | b,
            Self::Xor => a ^ b,
            Self::Slt => {
                if a < b {
                    1
                } else {
                    0
                }
            }
        }
    }
}

/// Whether the instruction has further microsteps or retired on this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Micro {
    Continue,
    Retired,
}

/// A complete MIPS-like machine driven by one caller at a time.
///
/// All mutable state (registers, memory, the in-flight microstep counter)
/// lives in this one value; two machines never share anything.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Machine {
    config: MachineConfig,
    registers: RegisterFile,
    memory: Memory,
    mstep: u8,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    /// Constructs a fresh machine: zeroed registers and memory, PC at 0,
    /// `$sp` at the top word of memory.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        let memory = if config.cache_enabled {
            Memory::with_cache(config.memory_size)
        } else {
            Memory::new(config.memory_size)
        };
        let mut registers = RegisterFile::new(config.hardwired_zero);
        registers.set_gpr(Register::SP, sp_init(config.memory_size));
        Self {
            config,
            registers,
            memory,
            mstep: 0,
        }
    }

    /// Constructs a machine with the given memory size and default policy.
    #[must_use]
    pub fn with_memory_size(memory_size: usize) -> Self {
        Self::new(MachineConfig {
            memory_size,
            ..MachineConfig::default()
        })
    }

    /// The policy this machine was constructed with.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Read-only view of the register file (all 32 registers, HI, LO).
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Host-side register edit; subject to the `$zero` policy.
    pub const fn set_register(&mut self, reg: Register, value: i32) {
        self.registers.set_gpr(reg, value);
    }

    /// Host-side `HI` edit.
    pub const fn set_hi(&mut self, value: i32) {
        self.registers.set_hi(value);
    }

    /// Host-side `LO` edit.
    pub const fn set_lo(&mut self, value: i32) {
        self.registers.set_lo(value);
    }

    /// The program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.registers.pc()
    }

    /// Host-side PC edit. The core keeps the PC word-aligned on its own;
    /// an unaligned value set here is the caller's responsibility.
    pub const fn set_pc(&mut self, pc: u32) {
        self.registers.set_pc(pc);
    }

    /// Read-only view of memory, for caller-side formatters.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Host-side memory edit (memory dialog path).
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryOutOfBounds`] when `addr` is outside memory.
    pub fn write_memory_byte(&mut self, addr: i64, value: u8) -> Result<(), Fault> {
        self.memory.store_byte(addr, value)
    }

    /// Host-side word write, big-endian like every other word access.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryOutOfBounds`] when any of the 4 bytes falls
    /// outside memory; nothing is written on failure.
    pub fn write_memory_word(&mut self, addr: i64, value: u32) -> Result<(), Fault> {
        self.memory.store_word(addr, value)
    }

    /// Loads a textual machine-code program into memory.
    ///
    /// All lines are parsed and validated before any byte is placed, so a
    /// malformed program leaves memory untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MalformedProgramText`] for the first unparsable
    /// line, or [`Fault::MemoryOutOfBounds`] when a placement falls outside
    /// memory.
    pub fn load_program(&mut self, source: &str) -> Result<(), Fault> {
        let placements = parse_program(source)?;
        for placement in &placements {
            let addr = i64::from(placement.addr);
            if addr >= self.memory.len() as i64 {
                return Err(Fault::MemoryOutOfBounds {
                    addr,
                    len: self.memory.len(),
                });
            }
        }
        for placement in placements {
            self.memory
                .store_byte(i64::from(placement.addr), placement.byte)?;
        }
        Ok(())
    }

    /// Serializes the full machine state to the binary artifact format.
    #[must_use]
    pub fn save_state(&self) -> Vec<u8> {
        snapshot::encode(&self.registers, &self.memory)
    }

    /// Atomically replaces this machine's state from a persisted artifact.
    ///
    /// The machine's construction-time policy (hardwired `$zero`, cache) is
    /// retained; registers, PC, HI, LO, and memory come from the artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MalformedState`] on truncated or length-inconsistent
    /// input; the existing state is untouched on failure.
    pub fn load_state(&mut self, bytes: &[u8]) -> Result<(), Fault> {
        let persisted = snapshot::decode(bytes)?;
        let (registers, memory) = persisted.into_machine_parts(self.config.hardwired_zero)?;
        self.config.memory_size = memory.len();
        self.registers = registers;
        self.memory = if self.config.cache_enabled {
            memory.into_cached()
        } else {
            memory
        };
        self.mstep = 0;
        Ok(())
    }

    /// Constructs a machine with default policy from a persisted artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MalformedState`] on truncated or length-inconsistent
    /// input.
    pub fn from_state(bytes: &[u8]) -> Result<Self, Fault> {
        let persisted = snapshot::decode(bytes)?;
        let (registers, memory) = persisted.into_machine_parts(false)?;
        Ok(Self {
            config: MachineConfig {
                memory_size: memory.len(),
                ..MachineConfig::default()
            },
            registers,
            memory,
            mstep: 0,
        })
    }

    /// Advances the in-flight instruction by exactly one microstep.
    ///
    /// Fetch and decode are recomputed on every call; the microstep counter
    /// is the only state carried between calls, so already-committed
    /// microsteps are never re-applied.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryOutOfBounds`] on a bad fetch or data access
    /// and [`Fault::UnknownOpcode`] for an undecodable word. Either way the
    /// in-flight instruction is abandoned without partial commits.
    pub fn run_microstep(&mut self, trace: &mut dyn TraceSink) -> Result<StepOutcome, Fault> {
        let result = self.microstep_inner(trace);
        match result {
            Ok(StepOutcome::Progressed) => self.mstep += 1,
            Ok(StepOutcome::Retired | StepOutcome::Exhausted) | Err(_) => self.mstep = 0,
        }
        result
    }

    /// Runs the current instruction to retirement (or reports exhaustion).
    ///
    /// The whole instruction commits atomically with respect to visible
    /// state before this call returns.
    ///
    /// # Errors
    ///
    /// Propagates the first fault from [`Self::run_microstep`].
    pub fn run_instruction(&mut self, trace: &mut dyn TraceSink) -> Result<StepOutcome, Fault> {
        loop {
            match self.run_microstep(trace)? {
                StepOutcome::Progressed => {}
                outcome => return Ok(outcome),
            }
        }
    }

    /// Runs instructions until the terminal zero word.
    ///
    /// # Errors
    ///
    /// Propagates the first fault from [`Self::run_instruction`].
    pub fn run_to_completion(&mut self, trace: &mut dyn TraceSink) -> Result<RunSummary, Fault> {
        let mut instructions = 0_u64;
        loop {
            match self.run_instruction(trace)? {
                StepOutcome::Retired => instructions += 1,
                StepOutcome::Exhausted => return Ok(RunSummary { instructions }),
                StepOutcome::Progressed => unreachable!("run_instruction never returns Progressed"),
            }
        }
    }

    fn microstep_inner(&mut self, trace: &mut dyn TraceSink) -> Result<StepOutcome, Fault> {
        let word = self.memory.load_word(i64::from(self.registers.pc()))?;
        let instruction = match decode(word)? {
            Decoded::Exhausted => return Ok(StepOutcome::Exhausted),
            Decoded::Instruction(instruction) => instruction,
        };

        let micro = self.exec_microstep(&instruction, trace)?;
        Ok(match micro {
            Micro::Continue => StepOutcome::Progressed,
            Micro::Retired => StepOutcome::Retired,
        })
    }

    fn exec_microstep(
        &mut self,
        instruction: &Instruction,
        trace: &mut dyn TraceSink,
    ) -> Result<Micro, Fault> {
        match *instruction {
            Instruction::Add { rs, rt, rd } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.alu_binary(a, b, AluOp::Add, rd, trace))
            }
            Instruction::Sub { rs, rt, rd } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.alu_binary(a, b, AluOp::Sub, rd, trace))
            }
            Instruction::And { rs, rt, rd } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.alu_binary(a, b, AluOp::And, rd, trace))
            }
            Instruction::Or { rs, rt, rd } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.alu_binary(a, b, AluOp::Or, rd, trace))
            }
            Instruction::Xor { rs, rt, rd } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.alu_binary(a, b, AluOp::Xor, rd, trace))
            }
            Instruction::Slt { rs, rt, rd } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.alu_binary(a, b, AluOp::Slt, rd, trace))
            }
            Instruction::Addi { rs, rt, imm } => {
                let a = self.registers.gpr(rs);
                Ok(self.alu_binary(a, imm, AluOp::Add, rt, trace))
            }
            Instruction::Andi { rs, rt, imm } => {
                let a = self.registers.gpr(rs);
                Ok(self.alu_binary(a, imm as i32, AluOp::And, rt, trace))
            }
            Instruction::Ori { rs, rt, imm } => {
                let a = self.registers.gpr(rs);
                Ok(self.alu_binary(a, imm as i32, AluOp::Or, rt, trace))
            }
            Instruction::Mul { rs, rt } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.mul(a, b, trace))
            }
            Instruction::Not { rs, rd } => {
                let a = self.registers.gpr(rs);
                Ok(self.not(a, rd, trace))
            }
            Instruction::Slti { rs, rt, imm } => {
                let a = self.registers.gpr(rs);
                Ok(self.slti(a, imm, rt, trace))
            }
            Instruction::Lw { base, rt, offset } => {
                let base = self.registers.gpr(base);
                self.lw(base, offset, rt, trace)
            }
            Instruction::Sw { base, rt, offset } => {
                let (base, value) = (self.registers.gpr(base), self.registers.gpr(rt));
                self.sw(base, offset, value, trace)
            }
            Instruction::Beq { rs, rt, offset } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.branch(a, b, "beq", a == b, offset, trace))
            }
            Instruction::Bne { rs, rt, offset } => {
                let (a, b) = (self.registers.gpr(rs), self.registers.gpr(rt));
                Ok(self.branch(a, b, "bne", a != b, offset, trace))
            }
            Instruction::Blez { rs, offset } => {
                let a = self.registers.gpr(rs);
                Ok(self.branch(a, 0, "blez", a <= 0, offset, trace))
            }
            Instruction::Bgtz { rs, offset } => {
                let a = self.registers.gpr(rs);
                Ok(self.branch(a, 0, "bgtz", a > 0, offset, trace))
            }
            Instruction::J { target } => Ok(self.jump(target, trace)),
            Instruction::Jal { target } => Ok(self.jump_and_link(target, trace)),
        }
    }

    /// Six-step template shared by the two-operand register and immediate
    /// ALU instructions.
    fn alu_binary(
        &mut self,
        a: i32,
        b: i32,
        op: AluOp,
        dest: Register,
        trace: &mut dyn TraceSink,
    ) -> Micro {
        match self.mstep {
            0 => {
                trace.on_event(TraceEvent::SendOperand { value: a });
                Micro::Continue
            }
            1 => {
                trace.on_event(TraceEvent::SendOperand { value: b });
                Micro::Continue
            }
            2 => {
                trace.on_event(TraceEvent::SendAluOp { op: op.name() });
                Micro::Continue
            }
            3 => {
                trace.on_event(TraceEvent::AluResult {
                    value: i64::from(op.apply(a, b)),
                });
                Micro::Continue
            }
            4 => {
                let value = op.apply(a, b);
                trace.on_event(TraceEvent::PlaceRegister {
                    value,
                    register: dest,
                });
                self.registers.set_gpr(dest, value);
                Micro::Continue
            }
            _ => self.advance_pc(trace),
        }
    }

    /// Seven steps: the 64-bit product splits into HI and LO on separate
    /// commit microsteps. The split is arithmetic, so a negative product
    /// carries its sign into HI.
    fn mul(&mut self, a: i32, b: i32, trace: &mut dyn TraceSink) -> Micro {
        let product = i64::from(a) * i64::from(b);
        match self.mstep {
            0 => {
                trace.on_event(TraceEvent::SendOperand { value: a });
                Micro::Continue
            }
            1 => {
                trace.on_event(TraceEvent::SendOperand { value: b });
                Micro::Continue
            }
            2 => {
                trace.on_event(TraceEvent::SendAluOp { op: "mult" });
                Micro::Continue
            }
            3 => {
                trace.on_event(TraceEvent::AluResult { value: product });
                Micro::Continue
            }
            4 => {
                let hi = (product >> 32) as i32;
                trace.on_event(TraceEvent::PlaceHi { value: hi });
                self.registers.set_hi(hi);
                Micro::Continue
            }
            5 => {
                let lo = product as i32;
                trace.on_event(TraceEvent::PlaceLo { value: lo });
                self.registers.set_lo(lo);
                Micro::Continue
            }
            _ => self.advance_pc(trace),
        }
    }

    /// Four steps for the single-operand complement.
    fn not(&mut self, a: i32, dest: Register, trace: &mut dyn TraceSink) -> Micro {
        match self.mstep {
            0 => {
                trace.on_event(TraceEvent::SendOperand { value: a });
                Micro::Continue
            }
            1 => {
                trace.on_event(TraceEvent::SendAluOp { op: "not" });
                Micro::Continue
            }
            2 => {
                trace.on_event(TraceEvent::AluResult { value: i64::from(!a) });
                Micro::Continue
            }
            _ => {
                trace.on_event(TraceEvent::PlaceRegister {
                    value: !a,
                    register: dest,
                });
                self.registers.set_gpr(dest, !a);
                self.advance_pc(trace)
            }
        }
    }

    /// Five steps: the register commit fuses with the PC advance.
    fn slti(&mut self, a: i32, imm: i32, dest: Register, trace: &mut dyn TraceSink) -> Micro {
        let value = i32::from(a < imm);
        match self.mstep {
            0 => {
                trace.on_event(TraceEvent::SendOperand { value: a });
                Micro::Continue
            }
            1 => {
                trace.on_event(TraceEvent::SendOperand { value: imm });
                Micro::Continue
            }
            2 => {
                trace.on_event(TraceEvent::SendAluOp { op: "slt" });
                Micro::Continue
            }
            3 => {
                trace.on_event(TraceEvent::AluResult {
                    value: i64::from(value),
                });
                Micro::Continue
            }
            _ => {
                trace.on_event(TraceEvent::PlaceRegister {
                    value,
                    register: dest,
                });
                self.registers.set_gpr(dest, value);
                self.advance_pc(trace)
            }
        }
    }

    /// Three steps: address dispatch, memory read, register commit.
    fn lw(
        &mut self,
        base: i32,
        offset: i32,
        dest: Register,
        trace: &mut dyn TraceSink,
    ) -> Result<Micro, Fault> {
        let addr = i64::from(base.wrapping_add(offset));
        match self.mstep {
            0 => {
                trace.on_event(TraceEvent::SendAddress { addr });
                Ok(Micro::Continue)
            }
            1 => {
                let value = self.memory.load_word(addr)? as i32;
                trace.on_event(TraceEvent::MemoryRead { addr, value });
                Ok(Micro::Continue)
            }
            _ => {
                let value = self.memory.load_word(addr)? as i32;
                trace.on_event(TraceEvent::PlaceRegister {
                    value,
                    register: dest,
                });
                self.registers.set_gpr(dest, value);
                Ok(self.advance_pc(trace))
            }
        }
    }

    /// Three steps: address dispatch, memory commit, PC advance.
    fn sw(
        &mut self,
        base: i32,
        offset: i32,
        value: i32,
        trace: &mut dyn TraceSink,
    ) -> Result<Micro, Fault> {
        let addr = i64::from(base.wrapping_add(offset));
        match self.mstep {
            0 => {
                trace.on_event(TraceEvent::SendAddress { addr });
                Ok(Micro::Continue)
            }
            1 => {
                self.memory.store_word(addr, value as u32)?;
                trace.on_event(TraceEvent::MemoryWrite { addr, value });
                Ok(Micro::Continue)
            }
            _ => Ok(self.advance_pc(trace)),
        }
    }

    /// Five steps. The taken target is relative to the PC value at decode
    /// time, not PC+4; this preserves the reference machine's contract.
    fn branch(
        &mut self,
        a: i32,
        b: i32,
        op: &'static str,
        taken: bool,
        offset: i32,
        trace: &mut dyn TraceSink,
    ) -> Micro {
        match self.mstep {
            0 => {
                trace.on_event(TraceEvent::SendOperand { value: a });
                Micro::Continue
            }
            1 => {
                trace.on_event(TraceEvent::SendOperand { value: b });
                Micro::Continue
            }
            2 => {
                trace.on_event(TraceEvent::SendAluOp { op });
                Micro::Continue
            }
            3 => {
                trace.on_event(TraceEvent::AluResult {
                    value: i64::from(taken),
                });
                Micro::Continue
            }
            _ => {
                if taken {
                    let target = self
                        .registers
                        .pc()
                        .wrapping_add(offset.wrapping_shl(2) as u32);
                    self.registers.set_pc(target);
                    trace.on_event(TraceEvent::SetPc { target });
                    Micro::Retired
                } else {
                    self.advance_pc(trace)
                }
            }
        }
    }

    /// One step: word-aligned target formed from the current PC's top nibble.
    fn jump(&mut self, target26: u32, trace: &mut dyn TraceSink) -> Micro {
        let target = (self.registers.pc() & 0xF000_0000) | (target26 << 2);
        self.registers.set_pc(target);
        trace.on_event(TraceEvent::SetPc { target });
        Micro::Retired
    }

    /// Two steps: the link register commits before the PC moves.
    fn jump_and_link(&mut self, target26: u32, trace: &mut dyn TraceSink) -> Micro {
        match self.mstep {
            0 => {
                let link = self.registers.pc().wrapping_add(WORD_BYTES as u32) as i32;
                trace.on_event(TraceEvent::PlaceRegister {
                    value: link,
                    register: Register::RA,
                });
                self.registers.set_gpr(Register::RA, link);
                Micro::Continue
            }
            _ => self.jump(target26, trace),
        }
    }

    /// Terminal microstep shared by every non-branching instruction.
    fn advance_pc(&mut self, trace: &mut dyn TraceSink) -> Micro {
        trace.on_event(TraceEvent::AdvancePc);
        let pc = self.registers.pc().wrapping_add(WORD_BYTES as u32);
        self.registers.set_pc(pc);
        Micro::Retired
    }
}

/// Number of microsteps a decoded instruction takes to retire.
#[must_use]
pub const fn microstep_count(instruction: &Instruction) -> u8 {
    match instruction {
        Instruction::Add { .. }
        | Instruction::Sub { .. }
        | Instruction::And { .. }
        | Instruction::Or { .. }
        | Instruction::Xor { .. }
        | Instruction::Slt { .. }
        | Instruction::Addi { .. }
        | Instruction::Andi { .. }
        | Instruction::Ori { .. } => 6,
        Instruction::Mul { .. } => 7,
        Instruction::Not { .. } => 4,
        Instruction::Lw { .. } | Instruction::Sw { .. } => 3,
        Instruction::Slti { .. }
        | Instruction::Beq { .. }
        | Instruction::Bne { .. }
        | Instruction::Blez { .. }
        | Instruction::Bgtz { .. } => 5,
        Instruction::J { .. } => 1,
        Instruction::Jal { .. } => 2,
    }
}

fn sp_init(memory_size: usize) -> i32 {
    i32::try_from(memory_size.saturating_sub(WORD_BYTES)).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{Machine, MachineConfig, StepOutcome};
    use crate::fault::Fault;
    use crate::state::Register;
    use crate::trace::{NullTrace, RecordingTrace};

    const fn r_type(rs: u32, rt: u32, rd: u32, funct: u32) -> u32 {
        (rs << 21) | (rt << 16) | (rd << 11) | funct
    }

    const fn i_type(opcode: u32, rs: u32, rt: u32, imm: u32) -> u32 {
        (opcode << 26) | (rs << 21) | (rt << 16) | (imm & 0xFFFF)
    }

    fn machine_with_words(words: &[u32]) -> Machine {
        let mut machine = Machine::with_memory_size(256);
        for (index, word) in words.iter().enumerate() {
            machine
                .write_memory_word(index as i64 * 4, *word)
                .expect("program fits");
        }
        machine
    }

    #[test]
    fn sp_starts_at_the_top_word() {
        let machine = Machine::with_memory_size(256);
        assert_eq!(machine.registers().gpr(Register::SP), 252);
    }

    #[test]
    fn addi_then_terminating_zero_word() {
        // addi $t0, $zero, 5
        let mut machine = machine_with_words(&[i_type(0b00_1000, 0, 8, 5)]);
        let summary = machine
            .run_to_completion(&mut NullTrace)
            .expect("program runs");
        assert_eq!(summary.instructions, 1);
        assert_eq!(machine.registers().gpr(Register::T0), 5);
        assert_eq!(machine.pc(), 4);
    }

    #[test]
    fn add_commits_only_on_its_designated_microstep() {
        let mut machine = machine_with_words(&[r_type(8, 9, 10, 0b10_0000)]);
        machine.set_register(Register::T0, 2);
        machine.set_register(Register::new(9).expect("valid"), 3);

        let dest = Register::new(10).expect("valid");
        let mut trace = RecordingTrace::new();
        for _ in 0..4 {
            assert_eq!(
                machine.run_microstep(&mut trace).expect("no fault"),
                StepOutcome::Progressed
            );
            assert_eq!(machine.registers().gpr(dest), 0, "no early commit");
            assert_eq!(machine.pc(), 0, "no early PC change");
        }
        assert_eq!(
            machine.run_microstep(&mut trace).expect("no fault"),
            StepOutcome::Progressed
        );
        assert_eq!(machine.registers().gpr(dest), 5, "commit at step 4");
        assert_eq!(
            machine.run_microstep(&mut trace).expect("no fault"),
            StepOutcome::Retired
        );
        assert_eq!(machine.pc(), 4);
        assert_eq!(trace.events.len(), 6);
    }

    #[test]
    fn mul_splits_a_negative_product_arithmetically() {
        let mut machine = machine_with_words(&[r_type(8, 9, 0, 0b01_1000)]);
        machine.set_register(Register::T0, -1);
        machine.set_register(Register::new(9).expect("valid"), 1);
        machine.run_instruction(&mut NullTrace).expect("no fault");
        assert_eq!(machine.registers().hi(), -1);
        assert_eq!(machine.registers().lo(), -1);
    }

    #[test]
    fn unknown_opcode_is_reported_not_treated_as_exhaustion() {
        let mut machine = machine_with_words(&[0xFC00_0000]);
        let fault = machine
            .run_instruction(&mut NullTrace)
            .expect_err("unknown opcode");
        assert_eq!(fault, Fault::UnknownOpcode { word: 0xFC00_0000 });
    }

    #[test]
    fn fetch_past_end_of_memory_faults() {
        let mut machine = Machine::with_memory_size(64);
        machine.set_pc(64);
        let fault = machine
            .run_microstep(&mut NullTrace)
            .expect_err("fetch out of bounds");
        assert!(matches!(fault, Fault::MemoryOutOfBounds { .. }));
    }

    #[test]
    fn faulted_store_leaves_registers_and_mstep_clean() {
        // sw $t0, 4($sp) with $sp pointed past the end of memory.
        let mut machine = machine_with_words(&[i_type(0b10_1011, 29, 8, 4)]);
        machine.set_register(Register::SP, 260);
        machine.set_register(Register::T0, 7);

        let fault = machine
            .run_instruction(&mut NullTrace)
            .expect_err("store out of bounds");
        assert!(matches!(fault, Fault::MemoryOutOfBounds { .. }));
        assert_eq!(machine.pc(), 0, "instruction did not retire");

        // The machine restarts the instruction from microstep 0.
        let mut trace = RecordingTrace::new();
        machine.set_register(Register::SP, 128);
        machine.run_instruction(&mut trace).expect("now in bounds");
        assert_eq!(trace.events.len(), 3);
    }

    #[test]
    fn hardwired_zero_config_discards_zero_writes() {
        let mut machine = Machine::new(MachineConfig {
            memory_size: 256,
            hardwired_zero: true,
            cache_enabled: false,
        });
        // addi $zero, $zero, 9
        machine
            .write_memory_word(0, i_type(0b00_1000, 0, 0, 9))
            .expect("program fits");
        machine.run_instruction(&mut NullTrace).expect("no fault");
        assert_eq!(machine.registers().gpr(Register::ZERO), 0);
    }
}
