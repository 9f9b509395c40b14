//! Binary state artifact codec.
//!
//! The artifact is the `State` header followed by big-endian fields in a
//! fixed order: the 32 general-purpose registers, PC, HI, LO, the total
//! memory size, then the text and stack segments each prefixed by its byte
//! length. Only the written segments are persisted; the zero-filled middle
//! of memory is reconstructed on load. Decoding validates the whole
//! artifact before anything is applied, so a malformed input never leaves a
//! machine half-restored.

use crate::fault::Fault;
use crate::memory::Memory;
use crate::state::{RegisterFile, REGISTER_COUNT};

/// Leading artifact header bytes.
pub const MAGIC: &[u8; 5] = b"State";

/// A decoded artifact, not yet bound to a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PersistedState {
    /// All 32 general-purpose register values in index order.
    pub gpr: [i32; REGISTER_COUNT],
    /// Program counter.
    pub pc: u32,
    /// `HI` register.
    pub hi: i32,
    /// `LO` register.
    pub lo: i32,
    /// Total memory size in bytes.
    pub memory_size: usize,
    /// Text segment bytes, placed from address 0.
    pub text: Vec<u8>,
    /// Stack segment bytes, placed up to the top of memory.
    pub stack: Vec<u8>,
}

impl PersistedState {
    /// Builds the machine-side state this artifact describes.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MalformedState`] when the segments do not fit in
    /// the declared memory size.
    pub fn into_machine_parts(self, hardwired_zero: bool) -> Result<(RegisterFile, Memory), Fault> {
        let memory = Memory::from_segments(self.memory_size, &self.text, &self.stack)?;
        let mut registers = RegisterFile::new(hardwired_zero);
        registers.set_all_gpr(self.gpr);
        registers.set_pc(self.pc);
        registers.set_hi(self.hi);
        registers.set_lo(self.lo);
        Ok((registers, memory))
    }
}

/// Serializes registers and memory into the artifact format.
#[must_use]
pub fn encode(registers: &RegisterFile, memory: &Memory) -> Vec<u8> {
    let text = memory.text_segment();
    let stack = memory.stack_segment();
    let mut out = Vec::with_capacity(MAGIC.len() + 4 * (REGISTER_COUNT + 6) + text.len() + stack.len());

    out.extend_from_slice(MAGIC);
    for value in registers.all_gpr() {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend_from_slice(&registers.pc().to_be_bytes());
    out.extend_from_slice(&registers.hi().to_be_bytes());
    out.extend_from_slice(&registers.lo().to_be_bytes());
    push_len(&mut out, memory.len());
    push_len(&mut out, text.len());
    out.extend_from_slice(text);
    push_len(&mut out, stack.len());
    out.extend_from_slice(stack);
    out
}

/// Decodes and fully validates an artifact.
///
/// # Errors
///
/// Returns [`Fault::MalformedState`] for a missing header, truncation,
/// length fields that disagree with the payload, or trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<PersistedState, Fault> {
    let mut reader = Reader { bytes, offset: 0 };

    let header = reader.take(MAGIC.len(), "header")?;
    if header != MAGIC {
        return Err(Fault::MalformedState(
            "missing \"State\" artifact header".to_owned(),
        ));
    }

    let mut gpr = [0_i32; REGISTER_COUNT];
    for (index, slot) in gpr.iter_mut().enumerate() {
        *slot = reader.read_i32(&format!("register {index}"))?;
    }
    let pc = reader.read_u32("PC")?;
    let hi = reader.read_i32("HI")?;
    let lo = reader.read_i32("LO")?;

    let memory_size = reader.read_len("memory size")?;
    let text_len = reader.read_len("text length")?;
    let text = reader.take(text_len, "text segment")?.to_vec();
    let stack_len = reader.read_len("stack length")?;
    let stack = reader.take(stack_len, "stack segment")?.to_vec();

    if reader.offset != bytes.len() {
        return Err(Fault::MalformedState(format!(
            "{} trailing bytes after the stack segment",
            bytes.len() - reader.offset,
        )));
    }
    if text_len + stack_len > memory_size {
        return Err(Fault::MalformedState(format!(
            "segments ({text_len} text + {stack_len} stack bytes) exceed declared memory size {memory_size}",
        )));
    }

    Ok(PersistedState {
        gpr,
        pc,
        hi,
        lo,
        memory_size,
        text,
        stack,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn push_len(out: &mut Vec<u8>, len: usize) {
    // Memory sizes are far below 4 GiB; the length fields are 32-bit.
    out.extend_from_slice(&(len as u32).to_be_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, count: usize, what: &str) -> Result<&'a [u8], Fault> {
        let end = self.offset.checked_add(count).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(Fault::MalformedState(format!(
                "truncated while reading {what} at offset {}",
                self.offset,
            )));
        };
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &str) -> Result<u32, Fault> {
        let raw = self.take(4, what)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_i32(&mut self, what: &str) -> Result<i32, Fault> {
        let raw = self.take(4, what)?;
        Ok(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_len(&mut self, what: &str) -> Result<usize, Fault> {
        let value = self.read_u32(what)?;
        usize::try_from(value)
            .map_err(|_| Fault::MalformedState(format!("{what} {value} does not fit this platform")))
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, MAGIC};
    use crate::fault::Fault;
    use crate::memory::Memory;
    use crate::state::{Register, RegisterFile};

    fn sample() -> (RegisterFile, Memory) {
        let mut registers = RegisterFile::default();
        registers.set_gpr(Register::T0, -5);
        registers.set_gpr(Register::SP, 60);
        registers.set_pc(8);
        registers.set_hi(-1);
        registers.set_lo(7);
        let mut memory = Memory::new(64);
        memory.store_word(0, 0x2009_0005).expect("text write");
        memory.store_word(60, 0xDEAD_BEEF).expect("stack write");
        (registers, memory)
    }

    #[test]
    fn artifact_starts_with_the_header() {
        let (registers, memory) = sample();
        let bytes = encode(&registers, &memory);
        assert_eq!(&bytes[..5], MAGIC);
    }

    #[test]
    fn encode_then_decode_preserves_every_field() {
        let (registers, memory) = sample();
        let persisted = decode(&encode(&registers, &memory)).expect("valid artifact");

        assert_eq!(persisted.gpr, *registers.all_gpr());
        assert_eq!(persisted.pc, 8);
        assert_eq!(persisted.hi, -1);
        assert_eq!(persisted.lo, 7);
        assert_eq!(persisted.memory_size, 64);
        assert_eq!(persisted.text, [0x20, 0x09, 0x00, 0x05]);
        assert_eq!(persisted.stack, [0xDE, 0xAD, 0xBE, 0xEF]);

        let (restored_regs, restored_mem) = persisted
            .into_machine_parts(false)
            .expect("segments fit");
        assert_eq!(restored_regs, registers);
        assert_eq!(restored_mem.as_bytes(), memory.as_bytes());
        assert_eq!(restored_mem.text_end(), memory.text_end());
        assert_eq!(restored_mem.stack_start(), memory.stack_start());
    }

    #[test]
    fn untouched_memory_encodes_empty_segments() {
        let registers = RegisterFile::default();
        let memory = Memory::new(64);
        let persisted = decode(&encode(&registers, &memory)).expect("valid artifact");
        assert!(persisted.text.is_empty());
        assert!(persisted.stack.is_empty());
        assert_eq!(persisted.memory_size, 64);
    }

    #[test]
    fn wrong_header_is_rejected() {
        let (registers, memory) = sample();
        let mut bytes = encode(&registers, &memory);
        bytes[0] = b's';
        assert!(matches!(decode(&bytes), Err(Fault::MalformedState(_))));
    }

    #[test]
    fn every_truncation_point_is_rejected() {
        let (registers, memory) = sample();
        let bytes = encode(&registers, &memory);
        for cut in 0..bytes.len() {
            assert!(
                matches!(decode(&bytes[..cut]), Err(Fault::MalformedState(_))),
                "prefix of {cut} bytes decoded",
            );
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let (registers, memory) = sample();
        let mut bytes = encode(&registers, &memory);
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(Fault::MalformedState(_))));
    }

    #[test]
    fn inconsistent_segment_lengths_are_rejected() {
        let (registers, memory) = sample();
        let mut bytes = encode(&registers, &memory);
        // Shrink the declared memory size below the segment total.
        let size_at = MAGIC.len() + 4 * 35;
        bytes[size_at..size_at + 4].copy_from_slice(&4_u32.to_be_bytes());
        assert!(matches!(decode(&bytes), Err(Fault::MalformedState(_))));
    }
}
