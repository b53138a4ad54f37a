//! Sharp SM83 CPU emulator (the Game Boy CPU).
//!
//! Each call to `step()` runs one instruction, reporting every machine cycle
//! to the bus as it goes. Opcodes are decoded through two 256-entry tables
//! compiled once from bit-pattern rules (see [`dispatch`]).

mod alu;
mod config;
mod cpu;
pub mod debug;
pub mod dispatch;
mod flags;
pub mod interrupt;
mod operand;
mod registers;

pub use alu::{AluOp, AluResult, AluResult16, ShiftOp};
pub use config::{Model, Sm83Config};
pub use cpu::{
    MCYCLE, Sm83, Step, disassemble_at, instruction_length, mnemonic, prefixed_mnemonic,
    validate_tables,
};
pub use debug::{Breakpoint, Debugger, TraceEntry, TraceKind};
pub use flags::{CF, HF, NF, ZF};
pub use interrupt::{Interrupt, InterruptState};
pub use operand::{Condition, Operand16, Operand8};
pub use registers::Registers;
