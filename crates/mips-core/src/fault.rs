//! Fault taxonomy shared by the executor, loader, and state codec.

use thiserror::Error;

/// Fault classes used for host-side diagnostics grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder rejected an instruction word.
    Decode,
    /// Load, store, or fetch address outside the memory bounds.
    Memory,
    /// Program text loader rejected an input line.
    ProgramText,
    /// State codec rejected a persisted artifact.
    Persistence,
}

/// Fault taxonomy surfaced by the core to its callers.
///
/// Every fault is local to the operation that raised it: an in-flight
/// instruction aborts without committing partial effects, and a rejected
/// state load leaves the existing machine untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// A load, store, or fetch address fell outside `[0, len)`.
    #[error("memory access at address {addr:#x} outside {len} bytes of memory")]
    MemoryOutOfBounds {
        /// The offending address, as computed (may be negative pre-cast).
        addr: i64,
        /// Size of the machine's memory in bytes.
        len: usize,
    },
    /// A nonzero word matched no known opcode or function field.
    #[error("unknown instruction word {word:#010x}")]
    UnknownOpcode {
        /// The fetched instruction word.
        word: u32,
    },
    /// A program text line did not parse as `0xADDR: <binary groups>`.
    #[error("malformed program text on line {line}: {reason}")]
    MalformedProgramText {
        /// 1-based line number of the first malformed line.
        line: usize,
        /// Human-readable parse failure description.
        reason: String,
    },
    /// A persisted state artifact was truncated or length-inconsistent.
    #[error("malformed state artifact: {0}")]
    MalformedState(String),
}

impl Fault {
    /// Returns the diagnostics class for this fault.
    #[must_use]
    pub const fn class(&self) -> FaultClass {
        match self {
            Self::MemoryOutOfBounds { .. } => FaultClass::Memory,
            Self::UnknownOpcode { .. } => FaultClass::Decode,
            Self::MalformedProgramText { .. } => FaultClass::ProgramText,
            Self::MalformedState(_) => FaultClass::Persistence,
        }
    }
}
