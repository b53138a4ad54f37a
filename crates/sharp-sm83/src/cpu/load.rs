//! Loads, stores and stack transfers.
//!
//! Handlers that touch memory other than the stack check read/write
//! breakpoints before anything else happens, so a trapped instruction has
//! spent no time and changed nothing.

use emu_core::Bus;

use super::table::Instruction;
use crate::alu;
use crate::dispatch::Fields;
use crate::operand::{Operand16, Operand8};

/// Address of a high-page access through an immediate byte.
fn high_page(offset: u8) -> u16 {
    0xFF00 | u16::from(offset)
}

/// The word following the opcode, read without side effects, to know where a
/// load or store is going to land before it happens.
fn peek_word(bus: &dyn Bus, pc: u16) -> u16 {
    u16::from_le_bytes([bus.peek(pc.wrapping_add(1)), bus.peek(pc.wrapping_add(2))])
}

/// `LD r,r'`: 4 cycles, 8 with (HL).
pub(super) fn ld_r_r(f: &Fields) -> Instruction {
    let dst = Operand8::from_field(f.get('d'));
    let src = Operand8::from_field(f.get('s'));
    Instruction::new(
        format!("ld {}, {}", dst.name(), src.name()),
        1,
        move |cpu, bus, pc| {
            let hl = cpu.regs.hl();
            if src.is_memory() && !cpu.may_read(hl) {
                return;
            }
            if dst.is_memory() && !cpu.may_write(hl) {
                return;
            }
            cpu.fetch_cycle(bus);
            let value = src.read(cpu, bus);
            dst.write(cpu, bus, value);
            cpu.advance(pc, 1);
        },
    )
}

/// `LD r,d8`: 8 cycles, 12 for (HL).
pub(super) fn ld_r_d8(f: &Fields) -> Instruction {
    let dst = Operand8::from_field(f.get('r'));
    Instruction::new(
        format!("ld {}, d8", dst.name()),
        2,
        move |cpu, bus, pc| {
            if dst.is_memory() && !cpu.may_write(cpu.regs.hl()) {
                return;
            }
            cpu.fetch_cycle(bus);
            let value = cpu.imm8(bus, pc);
            dst.write(cpu, bus, value);
            cpu.advance(pc, 2);
        },
    )
}

/// `LD rr,d16`: 12 cycles.
pub(super) fn ld_rr_d16(f: &Fields) -> Instruction {
    let dst = Operand16::ARITH[f.get('r')];
    Instruction::new(
        format!("ld {}, d16", dst.name()),
        3,
        move |cpu, bus, pc| {
            cpu.fetch_cycle(bus);
            let value = cpu.imm16(bus, pc);
            dst.write(cpu, value);
            cpu.advance(pc, 3);
        },
    )
}

/// `LD (rr),A`: 8 cycles. HL+ and HL- adjust HL after the store.
pub(super) fn ld_ind_a(f: &Fields) -> Instruction {
    let ptr = Operand16::INDIRECT[f.get('r')];
    Instruction::new(
        format!("ld ({}), a", ptr.name()),
        1,
        move |cpu, bus, pc| {
            let addr = ptr.read(cpu);
            if !cpu.may_write(addr) {
                return;
            }
            cpu.fetch_cycle(bus);
            cpu.write(bus, addr, cpu.regs.a);
            ptr.post_access(cpu);
            cpu.advance(pc, 1);
        },
    )
}

/// `LD A,(rr)`: 8 cycles.
pub(super) fn ld_a_ind(f: &Fields) -> Instruction {
    let ptr = Operand16::INDIRECT[f.get('r')];
    Instruction::new(
        format!("ld a, ({})", ptr.name()),
        1,
        move |cpu, bus, pc| {
            let addr = ptr.read(cpu);
            if !cpu.may_read(addr) {
                return;
            }
            cpu.fetch_cycle(bus);
            cpu.regs.a = cpu.read(bus, addr);
            ptr.post_access(cpu);
            cpu.advance(pc, 1);
        },
    )
}

/// `LDH (a8),A`: 12 cycles.
pub(super) fn ldh_a8_a(_: &Fields) -> Instruction {
    Instruction::new(
        "ldh (a8), a",
        2,
        |cpu, bus, pc| {
            if !cpu.may_write(high_page(bus.peek(pc.wrapping_add(1)))) {
                return;
            }
            cpu.fetch_cycle(bus);
            let addr = high_page(cpu.imm8(bus, pc));
            cpu.write(bus, addr, cpu.regs.a);
            cpu.advance(pc, 2);
        },
    )
}

/// `LDH A,(a8)`: 12 cycles.
pub(super) fn ldh_a_a8(_: &Fields) -> Instruction {
    Instruction::new(
        "ldh a, (a8)",
        2,
        |cpu, bus, pc| {
            if !cpu.may_read(high_page(bus.peek(pc.wrapping_add(1)))) {
                return;
            }
            cpu.fetch_cycle(bus);
            let addr = high_page(cpu.imm8(bus, pc));
            cpu.regs.a = cpu.read(bus, addr);
            cpu.advance(pc, 2);
        },
    )
}

/// `LD (C),A`: 8 cycles.
pub(super) fn ld_c_a(_: &Fields) -> Instruction {
    Instruction::new(
        "ld (c), a",
        1,
        |cpu, bus, pc| {
            let addr = high_page(cpu.regs.c);
            if !cpu.may_write(addr) {
                return;
            }
            cpu.fetch_cycle(bus);
            cpu.write(bus, addr, cpu.regs.a);
            cpu.advance(pc, 1);
        },
    )
}

/// `LD A,(C)`: 8 cycles.
pub(super) fn ld_a_c(_: &Fields) -> Instruction {
    Instruction::new(
        "ld a, (c)",
        1,
        |cpu, bus, pc| {
            let addr = high_page(cpu.regs.c);
            if !cpu.may_read(addr) {
                return;
            }
            cpu.fetch_cycle(bus);
            cpu.regs.a = cpu.read(bus, addr);
            cpu.advance(pc, 1);
        },
    )
}

/// `LD (a16),A`: 16 cycles.
pub(super) fn ld_a16_a(_: &Fields) -> Instruction {
    Instruction::new(
        "ld (a16), a",
        3,
        |cpu, bus, pc| {
            if !cpu.may_write(peek_word(bus, pc)) {
                return;
            }
            cpu.fetch_cycle(bus);
            let addr = cpu.imm16(bus, pc);
            cpu.write(bus, addr, cpu.regs.a);
            cpu.advance(pc, 3);
        },
    )
}

/// `LD A,(a16)`: 16 cycles.
pub(super) fn ld_a_a16(_: &Fields) -> Instruction {
    Instruction::new(
        "ld a, (a16)",
        3,
        |cpu, bus, pc| {
            if !cpu.may_read(peek_word(bus, pc)) {
                return;
            }
            cpu.fetch_cycle(bus);
            let addr = cpu.imm16(bus, pc);
            cpu.regs.a = cpu.read(bus, addr);
            cpu.advance(pc, 3);
        },
    )
}

/// `LD (a16),SP`: 20 cycles, low byte first.
pub(super) fn ld_a16_sp(_: &Fields) -> Instruction {
    Instruction::new(
        "ld (a16), sp",
        3,
        |cpu, bus, pc| {
            let target = peek_word(bus, pc);
            if !cpu.may_write(target) || !cpu.may_write(target.wrapping_add(1)) {
                return;
            }
            cpu.fetch_cycle(bus);
            let addr = cpu.imm16(bus, pc);
            let [lo, hi] = cpu.regs.sp.to_le_bytes();
            cpu.write(bus, addr, lo);
            cpu.write(bus, addr.wrapping_add(1), hi);
            cpu.advance(pc, 3);
        },
    )
}

/// `LD SP,HL`: 8 cycles.
pub(super) fn ld_sp_hl(_: &Fields) -> Instruction {
    Instruction::new(
        "ld sp, hl",
        1,
        |cpu, bus, pc| {
            cpu.fetch_cycle(bus);
            cpu.idle(bus);
            cpu.regs.sp = cpu.regs.hl();
            cpu.advance(pc, 1);
        },
    )
}

/// `LD HL,SP+e8`: 12 cycles. Flags as for `ADD SP,e8`.
pub(super) fn ld_hl_sp_e8(_: &Fields) -> Instruction {
    Instruction::new(
        "ld hl, sp+e8",
        2,
        |cpu, bus, pc| {
            cpu.fetch_cycle(bus);
            let offset = cpu.imm8(bus, pc) as i8;
            let result = alu::add_sp_e8(cpu.regs.sp, offset);
            cpu.idle(bus);
            cpu.regs.set_hl(result.value);
            cpu.set_flags(result.flags);
            cpu.advance(pc, 2);
        },
    )
}

/// `PUSH rr`: 16 cycles.
pub(super) fn push(f: &Fields) -> Instruction {
    let src = Operand16::STACK[f.get('r')];
    Instruction::new(
        format!("push {}", src.name()),
        1,
        move |cpu, bus, pc| {
            cpu.fetch_cycle(bus);
            cpu.idle(bus);
            let value = src.read(cpu);
            cpu.push16(bus, value);
            cpu.advance(pc, 1);
        },
    )
}

/// `POP rr`: 12 cycles. `POP AF` drops the low nibble of F.
pub(super) fn pop(f: &Fields) -> Instruction {
    let dst = Operand16::STACK[f.get('r')];
    Instruction::new(
        format!("pop {}", dst.name()),
        1,
        move |cpu, bus, pc| {
            cpu.fetch_cycle(bus);
            let value = cpu.pop16(bus);
            dst.write(cpu, value);
            cpu.advance(pc, 1);
        },
    )
}
