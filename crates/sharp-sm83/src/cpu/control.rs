//! Jumps, calls, returns and restarts.
//!
//! Conditional forms test the flags after reading their operand; not taking
//! the branch skips the internal cycle (and the stack traffic for calls and
//! returns).

use super::table::Instruction;
use crate::dispatch::Fields;
use crate::operand::Condition;

/// Target of a relative jump whose offset byte follows the opcode at `pc`.
fn relative(pc: u16, offset: u8) -> u16 {
    pc.wrapping_add(2).wrapping_add_signed(i16::from(offset as i8))
}

/// `JP a16`: 16 cycles.
pub(super) fn jp(_: &Fields) -> Instruction {
    Instruction::new("jp a16", 3, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let target = cpu.imm16(bus, pc);
        cpu.idle(bus);
        cpu.regs.pc = target;
    })
}

/// `JP cc,a16`: 16 cycles taken, 12 not.
pub(super) fn jp_cc(f: &Fields) -> Instruction {
    let cond = Condition::ALL[f.get('c')];
    Instruction::new(format!("jp {}, a16", cond.name()), 3, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let target = cpu.imm16(bus, pc);
        if cond.holds(cpu.regs.f) {
            cpu.idle(bus);
            cpu.regs.pc = target;
        } else {
            cpu.advance(pc, 3);
        }
    })
}

/// `JP HL`: 4 cycles.
pub(super) fn jp_hl(_: &Fields) -> Instruction {
    Instruction::new("jp hl", 1, |cpu, bus, _| {
        cpu.fetch_cycle(bus);
        cpu.regs.pc = cpu.regs.hl();
    })
}

/// `JR r8`: 12 cycles.
pub(super) fn jr(_: &Fields) -> Instruction {
    Instruction::new("jr r8", 2, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let offset = cpu.imm8(bus, pc);
        cpu.idle(bus);
        cpu.regs.pc = relative(pc, offset);
    })
}

/// `JR cc,r8`: 12 cycles taken, 8 not.
pub(super) fn jr_cc(f: &Fields) -> Instruction {
    let cond = Condition::ALL[f.get('c')];
    Instruction::new(format!("jr {}, r8", cond.name()), 2, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let offset = cpu.imm8(bus, pc);
        if cond.holds(cpu.regs.f) {
            cpu.idle(bus);
            cpu.regs.pc = relative(pc, offset);
        } else {
            cpu.advance(pc, 2);
        }
    })
}

/// `CALL a16`: 24 cycles.
pub(super) fn call(_: &Fields) -> Instruction {
    Instruction::new("call a16", 3, |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let target = cpu.imm16(bus, pc);
        cpu.idle(bus);
        cpu.push16(bus, pc.wrapping_add(3));
        cpu.regs.pc = target;
    })
}

/// `CALL cc,a16`: 24 cycles taken, 12 not.
pub(super) fn call_cc(f: &Fields) -> Instruction {
    let cond = Condition::ALL[f.get('c')];
    Instruction::new(format!("call {}, a16", cond.name()), 3, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        let target = cpu.imm16(bus, pc);
        if cond.holds(cpu.regs.f) {
            cpu.idle(bus);
            cpu.push16(bus, pc.wrapping_add(3));
            cpu.regs.pc = target;
        } else {
            cpu.advance(pc, 3);
        }
    })
}

/// `RET`: 16 cycles.
pub(super) fn ret(_: &Fields) -> Instruction {
    Instruction::new("ret", 1, |cpu, bus, _| {
        cpu.fetch_cycle(bus);
        let target = cpu.pop16(bus);
        cpu.idle(bus);
        cpu.regs.pc = target;
    })
}

/// `RET cc`: 20 cycles taken, 8 not.
pub(super) fn ret_cc(f: &Fields) -> Instruction {
    let cond = Condition::ALL[f.get('c')];
    Instruction::new(format!("ret {}", cond.name()), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.idle(bus);
        if cond.holds(cpu.regs.f) {
            let target = cpu.pop16(bus);
            cpu.idle(bus);
            cpu.regs.pc = target;
        } else {
            cpu.advance(pc, 1);
        }
    })
}

/// `RETI`: 16 cycles. Interrupts are enabled at once, with no EI delay.
pub(super) fn reti(_: &Fields) -> Instruction {
    Instruction::new("reti", 1, |cpu, bus, _| {
        cpu.fetch_cycle(bus);
        let target = cpu.pop16(bus);
        cpu.idle(bus);
        cpu.regs.pc = target;
        cpu.ime = true;
        cpu.ime_next = true;
    })
}

/// `RST n`: 16 cycles.
pub(super) fn rst(f: &Fields) -> Instruction {
    let vector = (f.get('n') as u16) << 3;
    Instruction::new(format!("rst ${vector:02x}"), 1, move |cpu, bus, pc| {
        cpu.fetch_cycle(bus);
        cpu.idle(bus);
        cpu.push16(bus, pc.wrapping_add(1));
        cpu.regs.pc = vector;
    })
}
