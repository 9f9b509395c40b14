//! Micro-stepped MIPS-like emulator core.
//!
//! The crate models a small 32-bit machine: a 32-entry register file with
//! PC, HI, and LO, a flat big-endian byte memory, and a decoder/executor
//! for a MIPS-like subset (arithmetic, logic, loads and stores, branches,
//! and jumps). Execution is deliberately observable: every instruction runs
//! as a fixed chain of microsteps (operand dispatch, ALU selection, result
//! retrieval, commit) reported through a [`trace::TraceSink`], so a host
//! can animate the datapath one phase at a time.
//!
//! The full machine state round-trips through a compact binary artifact
//! (see [`snapshot`]), and programs load from a plain-text format of
//! addressed binary byte groups (see [`loader`]).
//!
//! # Example
//!
//! ```
//! use mips_core::{Machine, NullTrace, Register};
//!
//! let mut machine = Machine::with_memory_size(256);
//! // addi $t0, $zero, 5
//! machine.load_program("0x0: 00100000 00001000 00000000 00000101")?;
//! machine.run_to_completion(&mut NullTrace)?;
//! assert_eq!(machine.registers().gpr(Register::T0), 5);
//! # Ok::<(), mips_core::Fault>(())
//! ```

/// Bit-range extraction primitives.
pub mod bits;
pub use bits::{grab_left, grab_right, sign_extend16};

/// Fault taxonomy shared by the executor, loader, and state codec.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Deterministic opcode and operand-field classification tables.
pub mod encoding;
pub use encoding::{
    classify_function, classify_opcode, IOpcode, RFunction, I_OPCODE_TABLE, OPCODE_BITS,
    R_FUNCTION_TABLE,
};

/// Instruction decode with field extraction.
pub mod decoder;
pub use decoder::{decode, Decoded, Instruction};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{Register, RegisterFile, REGISTER_COUNT};

/// Byte-addressable memory with big-endian word access.
pub mod memory;
pub use memory::{Memory, WORD_BYTES};

/// Optional direct-mapped cache hierarchy.
pub mod cache;
pub use cache::{CacheStats, LEVEL_BLOCK_COUNTS};

/// Observable micro-events and the sink trait hosts implement.
pub mod trace;
pub use trace::{NullTrace, RecordingTrace, TraceEvent, TraceSink};

/// Textual machine-code program loader.
pub mod loader;
pub use loader::{parse_program, Placement};

/// The machine value and its microstep executor.
pub mod machine;
pub use machine::{
    microstep_count, Machine, MachineConfig, RunSummary, StepOutcome, DEFAULT_MEMORY_BYTES,
};

/// Binary state artifact codec.
pub mod snapshot;
pub use snapshot::PersistedState;
