//! Core traits and types for instruction-stepped emulation.
//!
//! The CPU is the clock source. Every cycle it spends is reported to the
//! bus, and the bus forwards it to whatever peripherals live behind it.

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
