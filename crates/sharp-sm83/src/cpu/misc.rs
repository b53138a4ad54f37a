//! Control instructions, the 0xCB prefix and the unused opcodes.

use super::table::{self, Instruction};
use crate::dispatch::Fields;

pub(super) fn nop(_: &Fields) -> Instruction {
    Instruction::new("nop", 1, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.advance(pc, 1);
    })
}

/// `HALT`: suspend until an enabled interrupt is requested. Execution
/// resumes at the next instruction.
pub(super) fn halt(_: &Fields) -> Instruction {
    Instruction::new("halt", 1, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.halted = true;
        cpu.advance(pc, 1);
    })
}

/// `STOP`: two bytes, the second ignored. Only the machine can wake the
/// CPU, through [`super::Sm83::wake_from_stop`].
pub(super) fn stop(_: &Fields) -> Instruction {
    Instruction::new("stop", 2, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.stopped = true;
        cpu.advance(pc, 2);
    })
}

pub(super) fn di(_: &Fields) -> Instruction {
    Instruction::new("di", 1, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.ime = false;
        cpu.ime_next = false;
        cpu.advance(pc, 1);
    })
}

/// `EI`: interrupts are enabled after the following instruction.
pub(super) fn ei(_: &Fields) -> Instruction {
    Instruction::new("ei", 1, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.ime_next = true;
        cpu.advance(pc, 1);
    })
}

/// 0xCB: fetch the second opcode byte and run it from the prefixed table.
pub(super) fn prefix(_: &Fields) -> Instruction {
    Instruction::new("prefix cb", 2, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let opcode = bus.read(pc.wrapping_add(1));
        (table::prefixed(opcode).exec)(cpu, bus, pc);
    })
}

/// Opcodes with no instruction behind them.
pub(super) const ILLEGAL_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

/// One of [`ILLEGAL_OPCODES`]. Real hardware locks up; here they are
/// skipped as one-byte, one-cycle no-ops.
pub(super) fn illegal(opcode: u8) -> Instruction {
    Instruction::new(format!("illegal ${opcode:02x}"), 1, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.advance(pc, 1);
    })
}
