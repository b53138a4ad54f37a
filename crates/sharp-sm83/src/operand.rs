//! Operand descriptors shared by the instruction generators.
//!
//! Opcodes name their register operands with 3-bit and 2-bit fields. These
//! enums turn a field value into something that can be read and written, so
//! one generator serves a whole block of opcodes.

use emu_core::Bus;

use crate::cpu::Sm83;

/// 8-bit operand, in opcode field order (`r` = 0..=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand8 {
    B,
    C,
    D,
    E,
    H,
    L,
    /// Memory at HL. Each access costs a machine cycle.
    HlIndirect,
    A,
}

impl Operand8 {
    pub const ALL: [Operand8; 8] = [
        Operand8::B,
        Operand8::C,
        Operand8::D,
        Operand8::E,
        Operand8::H,
        Operand8::L,
        Operand8::HlIndirect,
        Operand8::A,
    ];

    /// Descriptor for a 3-bit register field.
    #[must_use]
    pub const fn from_field(field: usize) -> Self {
        Self::ALL[field & 7]
    }

    #[must_use]
    pub const fn is_memory(self) -> bool {
        matches!(self, Operand8::HlIndirect)
    }

    pub(crate) fn read(self, cpu: &mut Sm83, bus: &mut dyn Bus) -> u8 {
        match self {
            Operand8::B => cpu.regs.b,
            Operand8::C => cpu.regs.c,
            Operand8::D => cpu.regs.d,
            Operand8::E => cpu.regs.e,
            Operand8::H => cpu.regs.h,
            Operand8::L => cpu.regs.l,
            Operand8::HlIndirect => {
                let addr = cpu.regs.hl();
                cpu.read(bus, addr)
            }
            Operand8::A => cpu.regs.a,
        }
    }

    pub(crate) fn write(self, cpu: &mut Sm83, bus: &mut dyn Bus, value: u8) {
        match self {
            Operand8::B => cpu.regs.b = value,
            Operand8::C => cpu.regs.c = value,
            Operand8::D => cpu.regs.d = value,
            Operand8::E => cpu.regs.e = value,
            Operand8::H => cpu.regs.h = value,
            Operand8::L => cpu.regs.l = value,
            Operand8::HlIndirect => {
                let addr = cpu.regs.hl();
                cpu.write(bus, addr, value);
            }
            Operand8::A => cpu.regs.a = value,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operand8::B => "b",
            Operand8::C => "c",
            Operand8::D => "d",
            Operand8::E => "e",
            Operand8::H => "h",
            Operand8::L => "l",
            Operand8::HlIndirect => "(hl)",
            Operand8::A => "a",
        }
    }
}

/// 16-bit operand.
///
/// `HlInc` and `HlDec` read as HL; the adjustment happens in
/// [`Operand16::post_access`] once the memory access is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand16 {
    BC,
    DE,
    HL,
    SP,
    AF,
    HlInc,
    HlDec,
}

impl Operand16 {
    /// `rr` field of the 16-bit load/arithmetic block.
    pub const ARITH: [Operand16; 4] = [Operand16::BC, Operand16::DE, Operand16::HL, Operand16::SP];

    /// `rr` field of `LD (rr),A` and `LD A,(rr)`.
    pub const INDIRECT: [Operand16; 4] = [
        Operand16::BC,
        Operand16::DE,
        Operand16::HlInc,
        Operand16::HlDec,
    ];

    /// `rr` field of PUSH and POP.
    pub const STACK: [Operand16; 4] = [Operand16::BC, Operand16::DE, Operand16::HL, Operand16::AF];

    pub(crate) fn read(self, cpu: &Sm83) -> u16 {
        match self {
            Operand16::BC => cpu.regs.bc(),
            Operand16::DE => cpu.regs.de(),
            Operand16::HL | Operand16::HlInc | Operand16::HlDec => cpu.regs.hl(),
            Operand16::SP => cpu.regs.sp,
            Operand16::AF => cpu.regs.af(),
        }
    }

    pub(crate) fn write(self, cpu: &mut Sm83, value: u16) {
        match self {
            Operand16::BC => cpu.regs.set_bc(value),
            Operand16::DE => cpu.regs.set_de(value),
            Operand16::HL | Operand16::HlInc | Operand16::HlDec => cpu.regs.set_hl(value),
            Operand16::SP => cpu.regs.sp = value,
            Operand16::AF => cpu.regs.set_af(value),
        }
    }

    /// Apply the auto increment/decrement, if any.
    pub(crate) fn post_access(self, cpu: &mut Sm83) {
        match self {
            Operand16::HlInc => cpu.regs.set_hl(cpu.regs.hl().wrapping_add(1)),
            Operand16::HlDec => cpu.regs.set_hl(cpu.regs.hl().wrapping_sub(1)),
            _ => {}
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operand16::BC => "bc",
            Operand16::DE => "de",
            Operand16::HL => "hl",
            Operand16::SP => "sp",
            Operand16::AF => "af",
            Operand16::HlInc => "hl+",
            Operand16::HlDec => "hl-",
        }
    }
}

/// Branch conditions, in opcode field order (`cc` = 0..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::NotZero,
        Condition::Zero,
        Condition::NotCarry,
        Condition::Carry,
    ];

    #[must_use]
    pub const fn holds(self, flags: u8) -> bool {
        use crate::flags::{CF, ZF};
        match self {
            Condition::NotZero => flags & ZF == 0,
            Condition::Zero => flags & ZF != 0,
            Condition::NotCarry => flags & CF == 0,
            Condition::Carry => flags & CF != 0,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Condition::NotZero => "nz",
            Condition::Zero => "z",
            Condition::NotCarry => "nc",
            Condition::Carry => "c",
        }
    }
}
