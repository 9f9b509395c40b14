//! Flat byte-addressable memory with bounds-checked big-endian word access.
//!
//! Two logical regions share the one array: a text region growing up from
//! address 0 and a stack region growing down from the top. Rather than
//! re-deriving segment sizes with a scan at save time, the store tracks
//! explicit write watermarks (`text_end`, `stack_start`) which the state
//! codec persists directly.

use crate::cache::{CacheHierarchy, CacheStats};
use crate::fault::Fault;

/// Byte width of one instruction or data word.
pub const WORD_BYTES: usize = 4;

/// The machine's byte-addressable memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    bytes: Box<[u8]>,
    text_end: usize,
    stack_start: usize,
    cache: Option<CacheHierarchy>,
}

impl Memory {
    /// Allocates a zeroed store of `size` bytes with the cache disabled.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
            text_end: 0,
            stack_start: size,
            cache: None,
        }
    }

    /// Allocates a zeroed store with the direct-mapped cache hierarchy
    /// consulted on every byte read.
    #[must_use]
    pub fn with_cache(size: usize) -> Self {
        Self {
            cache: Some(CacheHierarchy::new()),
            ..Self::new(size)
        }
    }

    /// Attaches an empty cache hierarchy to an existing store.
    ///
    /// Used when restoring persisted state into a cache-enabled machine;
    /// the counters start from zero.
    #[must_use]
    pub fn into_cached(mut self) -> Self {
        self.cache = Some(CacheHierarchy::new());
        self
    }

    /// Rebuilds a store of `size` bytes from persisted segments: `text`
    /// placed at the low end, `stack` at the high end, zero-filled between.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MalformedState`] when the segments do not fit in
    /// `size` bytes.
    pub fn from_segments(size: usize, text: &[u8], stack: &[u8]) -> Result<Self, Fault> {
        if text.len() + stack.len() > size {
            return Err(Fault::MalformedState(format!(
                "segments ({} text + {} stack bytes) exceed declared memory size {size}",
                text.len(),
                stack.len(),
            )));
        }

        let mut memory = Self::new(size);
        memory.bytes[..text.len()].copy_from_slice(text);
        memory.bytes[size - stack.len()..].copy_from_slice(stack);
        memory.text_end = text.len();
        memory.stack_start = size - stack.len();
        Ok(memory)
    }

    /// Total size of the store in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for a zero-size store.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw view of the whole store, for caller-side formatters.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// One past the highest text-region address written so far.
    #[must_use]
    pub const fn text_end(&self) -> usize {
        self.text_end
    }

    /// The lowest stack-region address written so far (`len` when untouched).
    #[must_use]
    pub const fn stack_start(&self) -> usize {
        self.stack_start
    }

    /// The text segment bytes, `0..text_end`.
    #[must_use]
    pub fn text_segment(&self) -> &[u8] {
        &self.bytes[..self.text_end]
    }

    /// The stack segment bytes, `stack_start..len`.
    #[must_use]
    pub fn stack_segment(&self) -> &[u8] {
        &self.bytes[self.stack_start..]
    }

    /// Cache counters, when the cache hierarchy is enabled.
    #[must_use]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(CacheHierarchy::stats)
    }

    fn index_for(&self, addr: i64, span: usize) -> Result<usize, Fault> {
        let len = self.bytes.len();
        let oob = Fault::MemoryOutOfBounds { addr, len };
        if addr < 0 {
            return Err(oob);
        }
        let index = usize::try_from(addr).map_err(|_| oob.clone())?;
        if index.checked_add(span).is_none_or(|end| end > len) {
            return Err(oob);
        }
        Ok(index)
    }

    /// Reads one byte, through the cache when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryOutOfBounds`] when `addr` is outside the store.
    pub fn load_byte(&mut self, addr: i64) -> Result<u8, Fault> {
        let index = self.index_for(addr, 1)?;
        match self.cache.as_mut() {
            Some(cache) => Ok(cache.read(index, &self.bytes)),
            None => Ok(self.bytes[index]),
        }
    }

    /// Writes one byte, updating the segment watermark and (when enabled)
    /// the write-through cache.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryOutOfBounds`] when `addr` is outside the store.
    pub fn store_byte(&mut self, addr: i64, value: u8) -> Result<(), Fault> {
        let index = self.index_for(addr, 1)?;
        self.bytes[index] = value;
        if let Some(cache) = self.cache.as_mut() {
            cache.write(index, value);
        }
        self.note_write(index);
        Ok(())
    }

    /// Assembles 4 consecutive bytes big-endian into a word.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryOutOfBounds`] when any of the 4 bytes is
    /// outside the store; the bounds check happens before any cache traffic.
    pub fn load_word(&mut self, addr: i64) -> Result<u32, Fault> {
        self.index_for(addr, WORD_BYTES)?;
        let mut word = 0_u32;
        for offset in 0_i64..4 {
            word = (word << 8) | u32::from(self.load_byte(addr + offset)?);
        }
        Ok(word)
    }

    /// Disassembles a word into 4 consecutive bytes big-endian.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MemoryOutOfBounds`] when any of the 4 bytes is
    /// outside the store; no byte is written on failure.
    pub fn store_word(&mut self, addr: i64, value: u32) -> Result<(), Fault> {
        self.index_for(addr, WORD_BYTES)?;
        for (offset, byte) in (0_i64..).zip(value.to_be_bytes()) {
            self.store_byte(addr + offset, byte)?;
        }
        Ok(())
    }

    /// Classifies a write as text (lower half) or stack (upper half) and
    /// advances the matching watermark.
    const fn note_write(&mut self, index: usize) {
        if index < self.bytes.len() / 2 {
            if index + 1 > self.text_end {
                self.text_end = index + 1;
            }
        } else if index < self.stack_start {
            self.stack_start = index;
        }
    }
}
