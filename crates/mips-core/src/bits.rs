//! Bit-range extraction primitives every decode rule is built from.
//!
//! All functions here are pure and total: they operate on the raw 32-bit
//! pattern, so a negative two's-complement value behaves identically to the
//! unsigned value with the same bits.

/// Returns the low `n` bits of `data` as an unsigned quantity.
///
/// Defined for `n` in `0..=32`; `n == 0` yields 0 and `n >= 32` yields
/// `data` unchanged.
#[must_use]
pub const fn grab_right(data: u32, n: u32) -> u32 {
    if n == 0 {
        0
    } else if n >= 32 {
        data
    } else {
        data & ((1 << n) - 1)
    }
}

/// Returns the high `n` bits of `data`, right-justified.
///
/// Defined for `n` in `0..=32`; `n == 0` yields 0 and `n >= 32` yields
/// `data` unchanged.
#[must_use]
pub const fn grab_left(data: u32, n: u32) -> u32 {
    if n == 0 {
        0
    } else if n >= 32 {
        data
    } else {
        data >> (32 - n)
    }
}

/// Sign-extends the low 16 bits of `imm` to a signed 32-bit value.
///
/// Bit 15 is the sign bit; if set, the upper half is filled with ones.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn sign_extend16(imm: u32) -> i32 {
    let low = grab_right(imm, 16);
    if low & 0x8000 != 0 {
        (low | 0xFFFF_0000) as i32
    } else {
        low as i32
    }
}
