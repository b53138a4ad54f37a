//! 8-bit and 16-bit arithmetic.

use super::table::Instruction;
use crate::alu::{self, AluOp, ShiftOp};
use crate::dispatch::Fields;
use crate::flags::ZF;
use crate::operand::{Operand16, Operand8};

/// `ADD/ADC/SUB/SBC/AND/XOR/OR/CP r`: 4 cycles, 8 with (HL).
pub(super) fn alu_r(f: &Fields) -> Instruction {
    let op = AluOp::ALL[f.get('o')];
    let src = Operand8::from_field(f.get('r'));
    Instruction::new(
        format!("{} {}", op.mnemonic(), src.name()),
        1,
        move |cpu, bus, pc| {
            cpu.fetch_cycle(bus);
            let value = src.read(cpu, bus);
            let result = op.apply(cpu.regs.a, value, cpu.regs.f);
            cpu.regs.a = result.value;
            cpu.set_flags(result.flags);
            cpu.advance(pc, 1);
        },
    )
}

/// Accumulator operation with an immediate: 8 cycles.
pub(super) fn alu_d8(f: &Fields) -> Instruction {
    let op = AluOp::ALL[f.get('o')];
    Instruction::new(format!("{} d8", op.mnemonic()), 2, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let value = cpu.imm8(bus, pc);
        let result = op.apply(cpu.regs.a, value, cpu.regs.f);
        cpu.regs.a = result.value;
        cpu.set_flags(result.flags);
        cpu.advance(pc, 2);
    })
}

/// `INC r`: 4 cycles, 12 for (HL).
pub(super) fn inc_r(f: &Fields) -> Instruction {
    let reg = Operand8::from_field(f.get('r'));
    Instruction::new(format!("inc {}", reg.name()), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let value = reg.read(cpu, bus);
        let result = alu::inc8(value, cpu.regs.f);
        reg.write(cpu, bus, result.value);
        cpu.set_flags(result.flags);
        cpu.advance(pc, 1);
    })
}

/// `DEC r`: 4 cycles, 12 for (HL).
pub(super) fn dec_r(f: &Fields) -> Instruction {
    let reg = Operand8::from_field(f.get('r'));
    Instruction::new(format!("dec {}", reg.name()), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let value = reg.read(cpu, bus);
        let result = alu::dec8(value, cpu.regs.f);
        reg.write(cpu, bus, result.value);
        cpu.set_flags(result.flags);
        cpu.advance(pc, 1);
    })
}

/// `INC rr`: 8 cycles, no flags.
pub(super) fn inc_rr(f: &Fields) -> Instruction {
    let reg = Operand16::ARITH[f.get('r')];
    Instruction::new(format!("inc {}", reg.name()), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.idle(bus);
        let value = reg.read(cpu).wrapping_add(1);
        reg.write(cpu, value);
        cpu.advance(pc, 1);
    })
}

/// `DEC rr`: 8 cycles, no flags.
pub(super) fn dec_rr(f: &Fields) -> Instruction {
    let reg = Operand16::ARITH[f.get('r')];
    Instruction::new(format!("dec {}", reg.name()), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.idle(bus);
        let value = reg.read(cpu).wrapping_sub(1);
        reg.write(cpu, value);
        cpu.advance(pc, 1);
    })
}

/// `ADD HL,rr`: 8 cycles.
pub(super) fn add_hl_rr(f: &Fields) -> Instruction {
    let src = Operand16::ARITH[f.get('r')];
    Instruction::new(format!("add hl, {}", src.name()), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.idle(bus);
        let result = alu::add16(cpu.regs.hl(), src.read(cpu), cpu.regs.f);
        cpu.regs.set_hl(result.value);
        cpu.set_flags(result.flags);
        cpu.advance(pc, 1);
    })
}

/// `ADD SP,e8`: 16 cycles.
pub(super) fn add_sp_e8(_: &Fields) -> Instruction {
    Instruction::new("add sp, e8", 2, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let offset = cpu.imm8(bus, pc) as i8;
        let result = alu::add_sp_e8(cpu.regs.sp, offset);
        cpu.idle(bus);
        cpu.idle(bus);
        cpu.regs.sp = result.value;
        cpu.set_flags(result.flags);
        cpu.advance(pc, 2);
    })
}

/// `RLCA/RRCA/RLA/RRA`: the 0xCB rotates applied to A, but Z is always
/// cleared. 4 cycles.
pub(super) fn rotate_a(f: &Fields) -> Instruction {
    let op = ShiftOp::ALL[f.get('o')];
    Instruction::new(format!("{}a", op.mnemonic()), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let result = op.apply(cpu.regs.a, cpu.regs.f);
        cpu.regs.a = result.value;
        cpu.set_flags(result.flags & !ZF);
        cpu.advance(pc, 1);
    })
}

/// `DAA/CPL/SCF/CCF`: 4 cycles.
pub(super) fn adjust_a(f: &Fields) -> Instruction {
    let which = f.get('o');
    let name = ["daa", "cpl", "scf", "ccf"][which];
    Instruction::new(name, 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let (a, flags) = (cpu.regs.a, cpu.regs.f);
        match which {
            0 => {
                let result = alu::daa(a, flags);
                cpu.regs.a = result.value;
                cpu.set_flags(result.flags);
            }
            1 => {
                let result = alu::cpl(a, flags);
                cpu.regs.a = result.value;
                cpu.set_flags(result.flags);
            }
            2 => cpu.set_flags(alu::scf(flags)),
            _ => cpu.set_flags(alu::ccf(flags)),
        }
        cpu.advance(pc, 1);
    })
}
