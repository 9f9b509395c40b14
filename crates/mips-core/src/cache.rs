//! Optional direct-mapped cache hierarchy in front of the byte store.
//!
//! Three levels of one-byte blocks (8, 16, and 32 blocks). The hierarchy is
//! write-through: stores update the backing memory and every level, so a
//! cached read can never observe a stale byte. Disabled by default to match
//! the reference machine's observable behavior.

/// One direct-mapped cache block holding a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
struct CacheBlock {
    tag: usize,
    data: u8,
    valid: bool,
}

/// Hit/attempt counters for the host's hit-rate display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheStats {
    /// Number of per-level lookups that found a valid matching tag.
    pub hits: u64,
    /// Total number of per-level lookups.
    pub attempts: u64,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`; zero when no lookups have happened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.hits as f64 / self.attempts as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
struct CacheLevel {
    blocks: Vec<CacheBlock>,
}

impl CacheLevel {
    fn new(block_count: usize) -> Self {
        Self {
            blocks: vec![CacheBlock::default(); block_count],
        }
    }

    const fn slot(&self, addr: usize) -> (usize, usize) {
        (addr % self.blocks.len(), addr / self.blocks.len())
    }

    fn lookup(&self, addr: usize) -> Option<u8> {
        let (index, tag) = self.slot(addr);
        let block = self.blocks[index];
        (block.valid && block.tag == tag).then_some(block.data)
    }

    fn fill(&mut self, addr: usize, data: u8) {
        let (index, tag) = self.slot(addr);
        self.blocks[index] = CacheBlock {
            tag,
            data,
            valid: true,
        };
    }

    /// Updates the block only if it currently holds `addr` (write-through).
    fn refresh(&mut self, addr: usize, data: u8) {
        let (index, tag) = self.slot(addr);
        let block = &mut self.blocks[index];
        if block.valid && block.tag == tag {
            block.data = data;
        }
    }
}

/// The three-level direct-mapped hierarchy with hit accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CacheHierarchy {
    levels: [CacheLevel; 3],
    stats: CacheStats,
}

/// Block counts for levels L1, L2, and L3.
pub const LEVEL_BLOCK_COUNTS: [usize; 3] = [8, 16, 32];

impl Default for CacheHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheHierarchy {
    /// Creates an empty hierarchy with all blocks invalid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: [
                CacheLevel::new(LEVEL_BLOCK_COUNTS[0]),
                CacheLevel::new(LEVEL_BLOCK_COUNTS[1]),
                CacheLevel::new(LEVEL_BLOCK_COUNTS[2]),
            ],
            stats: CacheStats::default(),
        }
    }

    /// Reads the byte at `addr`, consulting each level before falling back
    /// to `backing`. A miss fills every level on the way out.
    pub fn read(&mut self, addr: usize, backing: &[u8]) -> u8 {
        for level in &self.levels {
            self.stats.attempts += 1;
            if let Some(data) = level.lookup(addr) {
                self.stats.hits += 1;
                return data;
            }
        }

        let data = backing[addr];
        for level in &mut self.levels {
            level.fill(addr, data);
        }
        data
    }

    /// Write-through update: refreshes any level currently holding `addr`.
    ///
    /// The caller writes `backing` itself; this keeps cached copies in sync.
    pub fn write(&mut self, addr: usize, data: u8) {
        for level in &mut self.levels {
            level.refresh(addr, data);
        }
    }

    /// Current hit/attempt counters.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}
