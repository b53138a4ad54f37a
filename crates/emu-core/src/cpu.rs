//! CPU core trait.

use crate::Bus;

/// An instruction-stepped CPU.
///
/// Each `step` runs one whole instruction (or one idle cycle while the CPU is
/// suspended) and reports every cycle it spends to the bus. The bus is passed
/// in, not owned, so the machine can keep peripherals behind it.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// What a single step did.
    type Step;

    /// Execute one instruction, interrupt dispatch or idle cycle.
    fn step<B: Bus>(&mut self, bus: &mut B) -> Self::Step;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted waiting for an interrupt.
    fn is_halted(&self) -> bool;

    /// Reset the CPU to its power-on state.
    fn reset(&mut self);
}
