//! Architectural CPU state model primitives.

mod registers;

pub use registers::{Register, RegisterFile, REGISTER_COUNT};
