//! SM83 flag register bits.
//!
//! Only the high nibble of F exists. The low nibble always reads as zero.

/// Zero flag (bit 7) - set if result is zero.
pub const ZF: u8 = 0b1000_0000;

/// Subtract flag (bit 6) - set if last operation was a subtraction.
pub const NF: u8 = 0b0100_0000;

/// Half-carry flag (bit 5) - carry from bit 3 to bit 4 (bit 11 to 12 for
/// 16-bit adds).
pub const HF: u8 = 0b0010_0000;

/// Carry flag (bit 4) - carry out of bit 7, or the bit shifted out.
pub const CF: u8 = 0b0001_0000;

/// Bits of F that physically exist.
pub const FLAG_MASK: u8 = 0xF0;

/// Build a flags byte from individual bits.
#[must_use]
pub const fn pack(z: bool, n: bool, h: bool, c: bool) -> u8 {
    let mut f = 0;
    if z {
        f |= ZF;
    }
    if n {
        f |= NF;
    }
    if h {
        f |= HF;
    }
    if c {
        f |= CF;
    }
    f
}
