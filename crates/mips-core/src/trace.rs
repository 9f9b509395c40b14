//! Observable micro-events emitted while an instruction executes.
//!
//! These exist purely for caller-side display (the original machine printed
//! them to an instruction panel); they carry no semantic weight and a host
//! that does not care attaches [`NullTrace`].

use std::fmt;

use crate::state::Register;

/// One observable sub-phase of executing an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// An operand value was handed to the ALU.
    SendOperand {
        /// The operand value.
        value: i32,
    },
    /// The operation selector was handed to the ALU.
    SendAluOp {
        /// Mnemonic of the operation.
        op: &'static str,
    },
    /// A result came back from the ALU (64-bit wide to cover `mul`).
    AluResult {
        /// The computed result.
        value: i64,
    },
    /// A value was committed to a general-purpose register.
    PlaceRegister {
        /// The committed value.
        value: i32,
        /// The destination register.
        register: Register,
    },
    /// The high half of a product was committed to `HI`.
    PlaceHi {
        /// The committed value.
        value: i32,
    },
    /// The low half of a product was committed to `LO`.
    PlaceLo {
        /// The committed value.
        value: i32,
    },
    /// An effective address was handed to the memory unit.
    SendAddress {
        /// The effective byte address.
        addr: i64,
    },
    /// A word came back from memory.
    MemoryRead {
        /// The accessed byte address.
        addr: i64,
        /// The assembled word.
        value: i32,
    },
    /// A word was committed to memory.
    MemoryWrite {
        /// The accessed byte address.
        addr: i64,
        /// The stored word.
        value: i32,
    },
    /// The program counter advanced past a retiring instruction.
    AdvancePc,
    /// The program counter was set to a branch or jump target.
    SetPc {
        /// The new program counter.
        target: u32,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendOperand { value } => write!(f, "Sending {value} to ALU"),
            Self::SendAluOp { op } => write!(f, "Sending \"{op}\" to ALU"),
            Self::AluResult { value } => write!(f, "Retrieved {value} from ALU"),
            Self::PlaceRegister { value, register } => {
                write!(f, "Placing {value} in register {}", register.index())
            }
            Self::PlaceHi { value } => write!(f, "Placing {value} in HI"),
            Self::PlaceLo { value } => write!(f, "Placing {value} in LO"),
            Self::SendAddress { addr } => write!(f, "Sending address {addr} to memory"),
            Self::MemoryRead { addr, value } => {
                write!(f, "Retrieved {value} from memory at {addr}")
            }
            Self::MemoryWrite { addr, value } => {
                write!(f, "Placing {value} in memory at {addr}")
            }
            Self::AdvancePc => write!(f, "Increasing PC by 4"),
            Self::SetPc { target } => write!(f, "Setting PC to {target}"),
        }
    }
}

/// Sink for micro-events in execution order.
pub trait TraceSink {
    /// Records one event.
    fn on_event(&mut self, event: TraceEvent);
}

/// Discards every event; for hosts without a display.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Buffers events for later rendering; used by hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingTrace {
    /// Events in the order they were emitted.
    pub events: Vec<TraceEvent>,
}

impl RecordingTrace {
    /// Creates an empty recording.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Renders every recorded event as its display string.
    #[must_use]
    pub fn rendered(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }
}

impl TraceSink for RecordingTrace {
    fn on_event(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
