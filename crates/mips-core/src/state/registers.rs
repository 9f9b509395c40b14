/// Number of architecturally visible general-purpose registers.
pub const REGISTER_COUNT: usize = 32;

/// A validated general-purpose register index (`$0..$31`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Register(u8);

impl Register {
    /// `$zero`, conventionally the constant zero.
    pub const ZERO: Self = Self(0);
    /// `$at`, the assembler temporary.
    pub const AT: Self = Self(1);
    /// `$v0`, the first result register.
    pub const V0: Self = Self(2);
    /// `$a0`, the first argument register.
    pub const A0: Self = Self(4);
    /// `$t0`, the first temporary register.
    pub const T0: Self = Self(8);
    /// `$s0`, the first saved register.
    pub const S0: Self = Self(16);
    /// `$gp`, the global pointer.
    pub const GP: Self = Self(28);
    /// `$sp`, the stack pointer, initialized to the top word of memory.
    pub const SP: Self = Self(29);
    /// `$fp`, the frame pointer.
    pub const FP: Self = Self(30);
    /// `$ra`, the link register written by `jal`.
    pub const RA: Self = Self(31);

    /// Creates a register from an index, rejecting values outside `0..32`.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < 32 {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Creates a register from an extracted 5-bit instruction field.
    ///
    /// Only the low 5 bits are significant; extraction guarantees the rest
    /// are zero already.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_field(bits: u32) -> Self {
        Self((bits & 0x1F) as u8)
    }

    /// Returns the array index for this register (`0..32`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The 32-entry register file plus PC, HI, and LO.
///
/// Register values are signed 32-bit integers with two's-complement
/// wraparound arithmetic; the PC is a byte address kept word-aligned by the
/// executor (external [`RegisterFile::set_pc`] edits can violate that).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    gpr: [i32; REGISTER_COUNT],
    pc: u32,
    hi: i32,
    lo: i32,
    hardwired_zero: bool,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RegisterFile {
    /// Creates a zeroed register file.
    ///
    /// With `hardwired_zero` set, writes to `$zero` are silently discarded
    /// (real-MIPS semantics); unset preserves the reference machine's
    /// writable `$zero`.
    #[must_use]
    pub const fn new(hardwired_zero: bool) -> Self {
        Self {
            gpr: [0; REGISTER_COUNT],
            pc: 0,
            hi: 0,
            lo: 0,
            hardwired_zero,
        }
    }

    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> i32 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register, honoring the `$zero` policy.
    pub const fn set_gpr(&mut self, reg: Register, value: i32) {
        if self.hardwired_zero && reg.index() == 0 {
            return;
        }
        self.gpr[reg.index()] = value;
    }

    /// Returns all 32 register values in index order.
    #[must_use]
    pub const fn all_gpr(&self) -> &[i32; REGISTER_COUNT] {
        &self.gpr
    }

    /// Replaces all 32 register values at once (state restore path).
    pub const fn set_all_gpr(&mut self, values: [i32; REGISTER_COUNT]) {
        self.gpr = values;
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    /// Reads the `HI` register.
    #[must_use]
    pub const fn hi(&self) -> i32 {
        self.hi
    }

    /// Writes the `HI` register.
    pub const fn set_hi(&mut self, value: i32) {
        self.hi = value;
    }

    /// Reads the `LO` register.
    #[must_use]
    pub const fn lo(&self) -> i32 {
        self.lo
    }

    /// Writes the `LO` register.
    pub const fn set_lo(&mut self, value: i32) {
        self.lo = value;
    }
}
