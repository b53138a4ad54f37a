//! ALU operations for the SM83.
//!
//! Every function is pure: operands and the incoming flags in, result and
//! outgoing flags out. Flags a given operation leaves alone are copied from
//! the input.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::verbose_bit_mask)] // Clearer to read mask comparisons.

use crate::flags::{CF, HF, NF, ZF, pack};

/// Result of an 8-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// Result of a 16-bit ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult16 {
    pub value: u16,
    pub flags: u8,
}

/// Add two bytes with optional carry.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let value = wide as u8;
    let half = (a & 0x0F) + (b & 0x0F) + c > 0x0F;
    AluResult {
        value,
        flags: pack(value == 0, false, half, wide > 0xFF),
    }
}

/// Subtract two bytes with optional borrow.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let value = a.wrapping_sub(b).wrapping_sub(c);
    let half = (a & 0x0F) < (b & 0x0F) + c;
    let borrow = u16::from(a) < u16::from(b) + u16::from(c);
    AluResult {
        value,
        flags: pack(value == 0, true, half, borrow),
    }
}

/// AND. H is always set.
#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let value = a & b;
    AluResult {
        value,
        flags: pack(value == 0, false, true, false),
    }
}

/// OR.
#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let value = a | b;
    AluResult {
        value,
        flags: pack(value == 0, false, false, false),
    }
}

/// XOR.
#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let value = a ^ b;
    AluResult {
        value,
        flags: pack(value == 0, false, false, false),
    }
}

/// Compare: flags of `a - b`, value is `a` unchanged.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    AluResult {
        value: a,
        flags: sub8(a, b, false).flags,
    }
}

/// Increment. C is preserved.
#[must_use]
pub fn inc8(value: u8, flags: u8) -> AluResult {
    let result = value.wrapping_add(1);
    AluResult {
        value: result,
        flags: pack(result == 0, false, value & 0x0F == 0x0F, flags & CF != 0),
    }
}

/// Decrement. C is preserved.
#[must_use]
pub fn dec8(value: u8, flags: u8) -> AluResult {
    let result = value.wrapping_sub(1);
    AluResult {
        value: result,
        flags: pack(result == 0, true, value & 0x0F == 0x00, flags & CF != 0),
    }
}

fn shifted(value: u8, carry_out: bool) -> AluResult {
    AluResult {
        value,
        flags: pack(value == 0, false, false, carry_out),
    }
}

/// Rotate left, bit 7 into carry and bit 0.
#[must_use]
pub fn rlc(value: u8) -> AluResult {
    shifted(value.rotate_left(1), value & 0x80 != 0)
}

/// Rotate right, bit 0 into carry and bit 7.
#[must_use]
pub fn rrc(value: u8) -> AluResult {
    shifted(value.rotate_right(1), value & 0x01 != 0)
}

/// Rotate left through carry.
#[must_use]
pub fn rl(value: u8, flags: u8) -> AluResult {
    let carry_in = u8::from(flags & CF != 0);
    shifted((value << 1) | carry_in, value & 0x80 != 0)
}

/// Rotate right through carry.
#[must_use]
pub fn rr(value: u8, flags: u8) -> AluResult {
    let carry_in = if flags & CF != 0 { 0x80 } else { 0 };
    shifted((value >> 1) | carry_in, value & 0x01 != 0)
}

/// Arithmetic shift left.
#[must_use]
pub fn sla(value: u8) -> AluResult {
    shifted(value << 1, value & 0x80 != 0)
}

/// Arithmetic shift right, bit 7 kept.
#[must_use]
pub fn sra(value: u8) -> AluResult {
    shifted((value >> 1) | (value & 0x80), value & 0x01 != 0)
}

/// Swap nibbles. C is cleared.
#[must_use]
pub fn swap(value: u8) -> AluResult {
    shifted(value.rotate_left(4), false)
}

/// Logical shift right.
#[must_use]
pub fn srl(value: u8) -> AluResult {
    shifted(value >> 1, value & 0x01 != 0)
}

/// Test bit `n`. Z is the complement of the bit, C is preserved.
#[must_use]
pub fn bit(n: u8, value: u8, flags: u8) -> u8 {
    pack(value & (1 << n) == 0, false, true, flags & CF != 0)
}

/// Set bit `n`. Flags are untouched.
#[must_use]
pub const fn set(n: u8, value: u8) -> u8 {
    value | (1 << n)
}

/// Clear bit `n`. Flags are untouched.
#[must_use]
pub const fn res(n: u8, value: u8) -> u8 {
    value & !(1 << n)
}

/// Decimal adjust after a BCD add or subtract.
///
/// N says which one happened. H and C from that operation pick the
/// correction; C can only be set here, never cleared, after an add.
#[must_use]
pub fn daa(a: u8, flags: u8) -> AluResult {
    let subtract = flags & NF != 0;
    let half = flags & HF != 0;
    let mut carry = flags & CF != 0;
    let mut value = a;

    if subtract {
        if carry {
            value = value.wrapping_sub(0x60);
        }
        if half {
            value = value.wrapping_sub(0x06);
        }
    } else {
        if carry || a > 0x99 {
            value = value.wrapping_add(0x60);
            carry = true;
        }
        if half || a & 0x0F > 0x09 {
            value = value.wrapping_add(0x06);
        }
    }

    AluResult {
        value,
        flags: pack(value == 0, subtract, false, carry),
    }
}

/// Complement A. Z and C are preserved.
#[must_use]
pub const fn cpl(a: u8, flags: u8) -> AluResult {
    AluResult {
        value: !a,
        flags: (flags & (ZF | CF)) | NF | HF,
    }
}

/// Set carry. Z is preserved.
#[must_use]
pub const fn scf(flags: u8) -> u8 {
    (flags & ZF) | CF
}

/// Complement carry. Z is preserved.
#[must_use]
pub const fn ccf(flags: u8) -> u8 {
    (flags & ZF) | ((flags & CF) ^ CF)
}

/// 16-bit add for `ADD HL,rr`. H from bit 11, C from bit 15, Z preserved.
#[must_use]
pub fn add16(a: u16, b: u16, flags: u8) -> AluResult16 {
    let wide = u32::from(a) + u32::from(b);
    let half = (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF;
    AluResult16 {
        value: wide as u16,
        flags: pack(flags & ZF != 0, false, half, wide > 0xFFFF),
    }
}

/// `SP + e8` for `ADD SP,e8` and `LD HL,SP+e8`.
///
/// H and C come from the unsigned add of the low byte, whatever the sign of
/// the offset. Z and N are always clear.
#[must_use]
pub fn add_sp_e8(sp: u16, offset: i8) -> AluResult16 {
    let e = u16::from(offset as u8);
    let half = (sp & 0x000F) + (e & 0x000F) > 0x000F;
    let carry = (sp & 0x00FF) + e > 0x00FF;
    AluResult16 {
        value: sp.wrapping_add_signed(i16::from(offset)),
        flags: pack(false, false, half, carry),
    }
}

/// Two-operand accumulator operations, in opcode order (bits 5-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub const ALL: [AluOp; 8] = [
        AluOp::Add,
        AluOp::Adc,
        AluOp::Sub,
        AluOp::Sbc,
        AluOp::And,
        AluOp::Xor,
        AluOp::Or,
        AluOp::Cp,
    ];

    #[must_use]
    pub fn apply(self, a: u8, b: u8, flags: u8) -> AluResult {
        let carry = flags & CF != 0;
        match self {
            AluOp::Add => add8(a, b, false),
            AluOp::Adc => add8(a, b, carry),
            AluOp::Sub => sub8(a, b, false),
            AluOp::Sbc => sub8(a, b, carry),
            AluOp::And => and8(a, b),
            AluOp::Xor => xor8(a, b),
            AluOp::Or => or8(a, b),
            AluOp::Cp => cp8(a, b),
        }
    }

    /// Mnemonic prefix, including the implied `a, ` where the assembler
    /// syntax spells it.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "add a,",
            AluOp::Adc => "adc a,",
            AluOp::Sub => "sub",
            AluOp::Sbc => "sbc a,",
            AluOp::And => "and",
            AluOp::Xor => "xor",
            AluOp::Or => "or",
            AluOp::Cp => "cp",
        }
    }
}

/// Rotate and shift operations of the 0xCB page, in opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

impl ShiftOp {
    pub const ALL: [ShiftOp; 8] = [
        ShiftOp::Rlc,
        ShiftOp::Rrc,
        ShiftOp::Rl,
        ShiftOp::Rr,
        ShiftOp::Sla,
        ShiftOp::Sra,
        ShiftOp::Swap,
        ShiftOp::Srl,
    ];

    #[must_use]
    pub fn apply(self, value: u8, flags: u8) -> AluResult {
        match self {
            ShiftOp::Rlc => rlc(value),
            ShiftOp::Rrc => rrc(value),
            ShiftOp::Rl => rl(value, flags),
            ShiftOp::Rr => rr(value, flags),
            ShiftOp::Sla => sla(value),
            ShiftOp::Sra => sra(value),
            ShiftOp::Swap => swap(value),
            ShiftOp::Srl => srl(value),
        }
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            ShiftOp::Rlc => "rlc",
            ShiftOp::Rrc => "rrc",
            ShiftOp::Rl => "rl",
            ShiftOp::Rr => "rr",
            ShiftOp::Sla => "sla",
            ShiftOp::Sra => "sra",
            ShiftOp::Swap => "swap",
            ShiftOp::Srl => "srl",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_half_carry_from_low_nibble() {
        let r = add8(0x0F, 0x01, false);
        assert_eq!(r.value, 0x10);
        assert_eq!(r.flags, HF);
    }

    #[test]
    fn add_wraps_to_zero_with_carry() {
        let r = add8(0xFF, 0x01, false);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | HF | CF);
    }

    #[test]
    fn adc_counts_incoming_carry_in_half_carry() {
        let r = add8(0x0E, 0x01, true);
        assert_eq!(r.value, 0x10);
        assert_eq!(r.flags & HF, HF);
    }

    #[test]
    fn sub_borrow_flags() {
        let r = sub8(0x10, 0x01, false);
        assert_eq!(r.value, 0x0F);
        assert_eq!(r.flags, NF | HF);

        let r = sub8(0x00, 0x01, false);
        assert_eq!(r.value, 0xFF);
        assert_eq!(r.flags, NF | HF | CF);
    }

    #[test]
    fn sbc_with_borrow_to_zero() {
        let r = sub8(0x01, 0x00, true);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | NF);
    }

    #[test]
    fn cp_leaves_value() {
        let r = cp8(0x42, 0x42);
        assert_eq!(r.value, 0x42);
        assert_eq!(r.flags, ZF | NF);
    }

    #[test]
    fn inc_dec_preserve_carry() {
        let r = inc8(0xFF, CF);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | HF | CF);

        let r = dec8(0x01, 0);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | NF);

        let r = dec8(0x10, CF);
        assert_eq!(r.value, 0x0F);
        assert_eq!(r.flags, NF | HF | CF);
    }

    #[test]
    fn rotates_through_carry() {
        assert_eq!(rl(0x80, 0), AluResult { value: 0x00, flags: ZF | CF });
        assert_eq!(rl(0x00, CF), AluResult { value: 0x01, flags: 0 });
        assert_eq!(rr(0x01, 0), AluResult { value: 0x00, flags: ZF | CF });
        assert_eq!(rr(0x00, CF), AluResult { value: 0x80, flags: 0 });
    }

    #[test]
    fn shifts() {
        assert_eq!(sra(0x81).value, 0xC0);
        assert_eq!(sra(0x81).flags, CF);
        assert_eq!(srl(0x81).value, 0x40);
        assert_eq!(swap(0xF1).value, 0x1F);
        assert_eq!(swap(0x00).flags, ZF);
    }

    #[test]
    fn bit_test_keeps_carry() {
        assert_eq!(bit(7, 0x7F, CF), ZF | HF | CF);
        assert_eq!(bit(0, 0x01, 0), HF);
    }

    #[test]
    fn daa_after_bcd_add() {
        // 0x15 + 0x27 = 0x3C, adjusted to 42.
        let sum = add8(0x15, 0x27, false);
        let r = daa(sum.value, sum.flags);
        assert_eq!(r.value, 0x42);
        assert_eq!(r.flags & CF, 0);

        // 0x99 + 0x01 = 0x9A, adjusted to 00 with carry.
        let sum = add8(0x99, 0x01, false);
        let r = daa(sum.value, sum.flags);
        assert_eq!(r.value, 0x00);
        assert_eq!(r.flags, ZF | CF);
    }

    #[test]
    fn daa_after_bcd_subtract() {
        // 0x42 - 0x15 = 0x2D with half borrow, adjusted to 27.
        let diff = sub8(0x42, 0x15, false);
        let r = daa(diff.value, diff.flags);
        assert_eq!(r.value, 0x27);
        assert_eq!(r.flags, NF);
    }

    #[test]
    fn cpl_scf_ccf() {
        assert_eq!(cpl(0x0F, ZF | CF), AluResult { value: 0xF0, flags: ZF | NF | HF | CF });
        assert_eq!(scf(ZF | NF | HF), ZF | CF);
        assert_eq!(ccf(CF), 0);
        assert_eq!(ccf(NF), CF);
    }

    #[test]
    fn add16_half_carry_from_bit_11() {
        let r = add16(0x0FFF, 0x0001, ZF);
        assert_eq!(r.value, 0x1000);
        assert_eq!(r.flags, ZF | HF);

        let r = add16(0xFFFF, 0x0001, 0);
        assert_eq!(r.value, 0x0000);
        assert_eq!(r.flags, HF | CF);
    }

    #[test]
    fn add_sp_negative_offset_uses_unsigned_low_byte() {
        let r = add_sp_e8(0xFFF8, -8);
        assert_eq!(r.value, 0xFFF0);
        assert_eq!(r.flags, HF | CF);

        let r = add_sp_e8(0x0000, -1);
        assert_eq!(r.value, 0xFFFF);
        assert_eq!(r.flags, 0);
    }
}
