//! Memory bus interface.

/// Memory bus seen by the CPU.
///
/// The CPU never owns memory. It borrows the bus for the duration of a step,
/// reads and writes through it, and reports every cycle it spends through
/// [`Bus::tick`]. That last hook is how peripherals (video, timer, audio)
/// stay in lockstep with the CPU without the CPU knowing they exist.
pub trait Bus {
    /// Read a byte. May have side effects on I/O registers.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte.
    fn write(&mut self, address: u16, value: u8);

    /// Advance attached peripherals by `cycles` clock cycles.
    ///
    /// Called synchronously, in issue order, once per clock advance.
    fn tick(&mut self, cycles: u32) {
        let _ = cycles;
    }

    /// Read a byte without side effects.
    ///
    /// Must return what [`Bus::read`] would. The disassembler uses it, and so
    /// do read/write breakpoints on immediate-addressed loads and stores,
    /// which locate their target before the instruction spends a cycle.
    fn peek(&self, address: u16) -> u8;
}

/// Flat 64 KiB RAM with no I/O mapping.
///
/// Counts the cycles reported through [`Bus::tick`] so tests can check that
/// the CPU and its observer agree on elapsed time.
#[derive(Debug, Clone)]
pub struct SimpleBus {
    memory: Box<[u8; 0x10000]>,
    cycles: u64,
}

impl SimpleBus {
    /// Create a bus with all memory zeroed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            cycles: 0,
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at 0xFFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.memory[usize::from(addr)] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Total cycles reported by the CPU.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }

    fn tick(&mut self, cycles: u32) {
        self.cycles += u64::from(cycles);
    }

    fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_wraps_at_top_of_memory() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFF, &[0x12, 0x34]);
        assert_eq!(bus.peek(0xFFFF), 0x12);
        assert_eq!(bus.peek(0x0000), 0x34);
    }

    #[test]
    fn tick_accumulates_cycles() {
        let mut bus = SimpleBus::new();
        bus.tick(4);
        bus.tick(8);
        assert_eq!(bus.cycles(), 12);
    }
}
