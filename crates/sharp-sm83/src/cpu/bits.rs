//! The 0xCB page: rotates, shifts and single-bit operations.
//!
//! Handlers receive the address of the 0xCB byte. The prefix handler has
//! already spent its machine cycle; each of these spends the second fetch.

use super::table::Instruction;
use crate::alu::{self, ShiftOp};
use crate::dispatch::Fields;
use crate::operand::Operand8;

/// `RLC/RRC/RL/RR/SLA/SRA/SWAP/SRL r`: 8 cycles, 16 for (HL).
pub(super) fn shift(f: &Fields) -> Instruction {
    let op = ShiftOp::ALL[f.get('o')];
    let reg = Operand8::from_field(f.get('r'));
    Instruction::new(format!("{} {}", op.mnemonic(), reg.name()), 2, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let value = reg.read(cpu, bus);
        let result = op.apply(value, cpu.regs.f);
        reg.write(cpu, bus, result.value);
        cpu.set_flags(result.flags);
        cpu.advance(pc, 2);
    })
}

/// `BIT n,r`: 8 cycles, 12 for (HL).
pub(super) fn bit(f: &Fields) -> Instruction {
    let n = f.get('n') as u8;
    let reg = Operand8::from_field(f.get('r'));
    Instruction::new(format!("bit {n}, {}", reg.name()), 2, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let value = reg.read(cpu, bus);
        cpu.set_flags(alu::bit(n, value, cpu.regs.f));
        cpu.advance(pc, 2);
    })
}

/// `RES n,r`: 8 cycles, 16 for (HL).
pub(super) fn res(f: &Fields) -> Instruction {
    let n = f.get('n') as u8;
    let reg = Operand8::from_field(f.get('r'));
    Instruction::new(format!("res {n}, {}", reg.name()), 2, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let value = reg.read(cpu, bus);
        reg.write(cpu, bus, alu::res(n, value));
        cpu.advance(pc, 2);
    })
}

/// `SET n,r`: 8 cycles, 16 for (HL).
pub(super) fn set(f: &Fields) -> Instruction {
    let n = f.get('n') as u8;
    let reg = Operand8::from_field(f.get('r'));
    Instruction::new(format!("set {n}, {}", reg.name()), 2, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let value = reg.read(cpu, bus);
        reg.write(cpu, bus, alu::set(n, value));
        cpu.advance(pc, 2);
    })
}
