//! Interrupt sources and the memory-mapped request/enable registers.
//!
//! The CPU never owns these registers. Peripherals raise a request by setting
//! a bit in IF; software enables sources through IE; the CPU reads both at
//! every step boundary.

use std::fmt;

use emu_core::Bus;

/// Interrupt enable register.
pub const IE: u16 = 0xFFFF;

/// Interrupt request (flag) register.
pub const IF: u16 = 0xFF0F;

/// Only five request lines exist.
pub const LINE_MASK: u8 = 0x1F;

/// Interrupt sources, in priority order (lowest bit wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interrupt {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    /// Bit position in IE and IF.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self.index()
    }

    /// Dispatch address.
    #[must_use]
    pub const fn vector(self) -> u16 {
        0x40 + (self.index() as u16) * 8
    }

    /// Highest-priority source in a pending mask.
    #[must_use]
    pub const fn highest(pending: u8) -> Option<Self> {
        let lines = pending & LINE_MASK;
        if lines == 0 {
            return None;
        }
        Some(Self::ALL[lines.trailing_zeros() as usize])
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Interrupt::VBlank => "vblank",
            Interrupt::LcdStat => "stat",
            Interrupt::Timer => "timer",
            Interrupt::Serial => "serial",
            Interrupt::Joypad => "joypad",
        }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raise an interrupt request by setting its IF bit.
pub fn request<B: Bus + ?Sized>(bus: &mut B, source: Interrupt) {
    let flags = bus.read(IF);
    bus.write(IF, flags | source.mask());
}

/// Requested and enabled lines.
pub fn pending<B: Bus + ?Sized>(bus: &mut B) -> u8 {
    bus.read(IF) & bus.read(IE) & LINE_MASK
}

/// Snapshot of the interrupt controller for debuggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterruptState {
    pub ime: bool,
    pub ime_next: bool,
    pub requested: u8,
    pub enabled: u8,
}

impl fmt::Display for InterruptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IME={} IF={:02X} IE={:02X}",
            u8::from(self.ime),
            self.requested,
            self.enabled
        )?;
        if self.ime_next && !self.ime {
            write!(f, " (EI pending)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;

    #[test]
    fn vectors() {
        assert_eq!(Interrupt::VBlank.vector(), 0x40);
        assert_eq!(Interrupt::LcdStat.vector(), 0x48);
        assert_eq!(Interrupt::Timer.vector(), 0x50);
        assert_eq!(Interrupt::Serial.vector(), 0x58);
        assert_eq!(Interrupt::Joypad.vector(), 0x60);
    }

    #[test]
    fn lowest_bit_has_priority() {
        assert_eq!(Interrupt::highest(0b1_0100), Some(Interrupt::Timer));
        assert_eq!(Interrupt::highest(0xE0), None);
    }

    #[test]
    fn request_sets_flag_bit() {
        let mut bus = SimpleBus::new();
        bus.write(IF, 0x01);
        request(&mut bus, Interrupt::Joypad);
        assert_eq!(bus.read(IF), 0x11);
    }
}
