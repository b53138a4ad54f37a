//! SM83 CPU core with instruction-level stepping.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

mod arith;
mod bits;
mod control;
mod load;
mod misc;
mod table;

use std::fmt;

use emu_core::{Bus, Cpu, Observable, Ticks, Value};

use crate::config::{Model, Sm83Config};
use crate::debug::{Debugger, TraceEntry, TraceKind};
use crate::flags::{CF, HF, NF, ZF};
use crate::interrupt::{self, IE, IF, Interrupt, InterruptState};
use crate::registers::Registers;

pub use table::{disassemble_at, instruction_length, mnemonic, prefixed_mnemonic, validate_tables};

/// Clock cycles in one machine cycle.
pub const MCYCLE: u32 = 4;

/// What one call to [`Cpu::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One instruction ran.
    Executed,
    /// An interrupt was dispatched instead of an instruction.
    Interrupted(Interrupt),
    /// Halted with nothing pending; one idle machine cycle passed.
    Halted,
    /// Stopped; one idle machine cycle passed.
    Stopped,
    /// Held off the bus by an external transfer; one idle machine cycle passed.
    Blocked,
    /// A breakpoint holds the CPU. Nothing ran and no time passed.
    Trapped,
}

/// Sharp SM83 CPU.
///
/// The CPU does not own the bus. Each step borrows it, and every machine
/// cycle spent is reported back through [`Bus::tick`] so the machine can run
/// its peripherals in lockstep.
pub struct Sm83 {
    pub(crate) regs: Registers,
    model: Model,
    skip_boot: bool,

    /// Total clock cycles elapsed since creation.
    clock: Ticks,

    pub(crate) halted: bool,
    pub(crate) stopped: bool,
    /// Set by the machine while DMA owns the bus.
    blocked: bool,

    /// Interrupts enabled now.
    pub(crate) ime: bool,
    /// Interrupts enabled from the next instruction on. EI only sets this.
    pub(crate) ime_next: bool,

    /// Length of the instruction last decoded at each address (0 = never).
    opcode_sizes: Box<[u8; 0x10000]>,

    debugger: Debugger,
}

impl Sm83 {
    /// Create a DMG CPU in the post-boot state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Sm83Config::default())
    }

    #[must_use]
    pub fn with_config(config: Sm83Config) -> Self {
        let mut debugger = Debugger::new();
        debugger.set_tracing(config.trace);
        let mut cpu = Self {
            regs: Registers::default(),
            model: config.model,
            skip_boot: config.skip_boot,
            clock: Ticks::ZERO,
            halted: false,
            stopped: false,
            blocked: false,
            ime: false,
            ime_next: false,
            opcode_sizes: Box::new([0; 0x10000]),
            debugger,
        };
        cpu.reset();
        cpu
    }

    #[must_use]
    pub const fn model(&self) -> Model {
        self.model
    }

    /// Total clock cycles elapsed since creation.
    #[must_use]
    pub const fn clock(&self) -> Ticks {
        self.clock
    }

    /// Load a register set and clear every suspension and interrupt flag.
    ///
    /// The clock, trace, breakpoints and opcode-size map are kept.
    pub fn reset_to(&mut self, registers: Registers) {
        self.regs = registers.masked();
        self.halted = false;
        self.stopped = false;
        self.blocked = false;
        self.ime = false;
        self.ime_next = false;
    }

    /// Continue execution at `address`.
    pub fn jump(&mut self, address: u16) {
        self.regs.pc = address;
        self.halted = false;
    }

    /// Hold the CPU off the bus (or release it).
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.blocked
    }

    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Leave STOP mode. The machine calls this on a joypad edge.
    pub fn wake_from_stop(&mut self) {
        if self.stopped {
            self.stopped = false;
            self.debugger.event(Some(self.regs.pc), "wake from stop".to_string());
        }
    }

    /// True when the CPU would fetch an instruction on the next step.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.halted && !self.stopped && !self.blocked && !self.debugger.is_trapped()
    }

    #[must_use]
    pub const fn ime(&self) -> bool {
        self.ime
    }

    #[must_use]
    pub const fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }

    /// Length of the instruction last decoded at `address`.
    #[must_use]
    pub fn opcode_size(&self, address: u16) -> Option<u8> {
        match self.opcode_sizes[usize::from(address)] {
            0 => None,
            n => Some(n),
        }
    }

    /// IME and the IF/IE lines as the CPU would see them now.
    pub fn interrupt_state<B: Bus + ?Sized>(&self, bus: &mut B) -> InterruptState {
        InterruptState {
            ime: self.ime,
            ime_next: self.ime_next,
            requested: bus.read(IF) & interrupt::LINE_MASK,
            enabled: bus.read(IE) & interrupt::LINE_MASK,
        }
    }

    /// True if an enabled interrupt is requested, i.e. HALT would end on
    /// the next step. Always false while stopped.
    pub fn accepts_interrupt<B: Bus + ?Sized>(&self, bus: &mut B) -> bool {
        !self.stopped && interrupt::pending(bus) != 0
    }

    /// Step until halted, stopped or trapped, or `limit` steps have run.
    ///
    /// Returns the number of steps taken.
    pub fn run_until_halt<B: Bus>(&mut self, bus: &mut B, limit: usize) -> usize {
        let mut steps = 0;
        while steps < limit && self.is_running() {
            self.step(bus);
            steps += 1;
        }
        steps
    }

    /// Step until at least `cycles` clock cycles have passed or a breakpoint
    /// traps. Returns the cycles actually consumed, which may overshoot by
    /// the tail of the last instruction.
    pub fn run_for<B: Bus>(&mut self, bus: &mut B, cycles: u64) -> u64 {
        let start = self.clock;
        while self.clock.since(start) < cycles {
            if self.step(bus) == Step::Trapped {
                break;
            }
        }
        self.clock.since(start)
    }

    /// Step with a type-erased bus.
    pub fn execute(&mut self, bus: &mut dyn Bus) -> Step {
        if self.blocked {
            self.idle(bus);
            return Step::Blocked;
        }
        if self.stopped {
            self.idle(bus);
            return Step::Stopped;
        }
        if self.debugger.is_trapped() {
            return Step::Trapped;
        }

        if let Some(source) = self.service_interrupts(bus) {
            // The pass from `resume` belonged to the instruction at the old PC.
            self.debugger.instruction_done();
            return Step::Interrupted(source);
        }
        if self.halted {
            self.idle(bus);
            return Step::Halted;
        }

        // EI lands here, one instruction late. A trapped instruction has not
        // run, so the commit is undone until it does.
        let ime_before = self.ime;
        self.ime = self.ime_next;

        let pc = self.regs.pc;
        if self.debugger.hit_exec(pc) {
            self.ime = ime_before;
            return Step::Trapped;
        }

        let opcode = bus.read(pc);
        let instruction = table::primary(opcode);
        self.opcode_sizes[usize::from(pc)] = instruction.length;
        let text = self
            .debugger
            .is_tracing()
            .then(|| table::disassemble(&*bus, pc, opcode));

        (instruction.exec)(self, bus, pc);

        if self.debugger.is_trapped() {
            self.ime = ime_before;
            return Step::Trapped;
        }
        self.debugger.instruction_done();

        if let Some(text) = text {
            let comment = Some(self.state_summary());
            self.debugger.record(TraceEntry {
                kind: TraceKind::Op,
                address: Some(pc),
                text,
                comment,
            });
        }
        Step::Executed
    }

    /// Wake from HALT and dispatch, as the IE/IF lines and IME dictate.
    fn service_interrupts(&mut self, bus: &mut dyn Bus) -> Option<Interrupt> {
        if !self.ime && !self.halted {
            return None;
        }
        let source = Interrupt::highest(interrupt::pending(bus))?;

        if self.halted {
            self.halted = false;
            self.debugger
                .event(Some(self.regs.pc), "wake from halt".to_string());
        }
        if !self.ime {
            return None;
        }

        let requested = bus.read(IF);
        bus.write(IF, requested & !source.mask());
        self.ime = false;
        self.ime_next = false;

        let ret = self.regs.pc;
        self.idle(bus);
        self.idle(bus);
        self.push16(bus, ret);
        self.idle(bus);
        self.regs.pc = source.vector();

        self.debugger.event(
            Some(source.vector()),
            format!("interrupt {source} from ${ret:04x}"),
        );
        Some(source)
    }

    fn state_summary(&self) -> String {
        let r = &self.regs;
        format!(
            "a={:02x} f={} bc={:04x} de={:04x} hl={:04x} sp={:04x}",
            r.a,
            flag_string(r.f),
            r.bc(),
            r.de(),
            r.hl(),
            r.sp
        )
    }

    // === Clock and bus primitives used by the instruction generators ===

    /// Advance the clock and notify the bus.
    pub(crate) fn tick(&mut self, bus: &mut dyn Bus, cycles: u32) {
        self.clock += cycles;
        bus.tick(cycles);
    }

    /// The opcode fetch cycle. `execute` reads the opcode untimed so that a
    /// handler can still trap on a memory breakpoint before any time passes;
    /// every handler starts its timing here.
    pub(crate) fn fetch_cycle(&mut self, bus: &mut dyn Bus) {
        self.tick(bus, MCYCLE);
    }

    /// One machine cycle with no bus activity.
    pub(crate) fn idle(&mut self, bus: &mut dyn Bus) {
        self.tick(bus, MCYCLE);
    }

    /// Read memory: one machine cycle.
    pub(crate) fn read(&mut self, bus: &mut dyn Bus, addr: u16) -> u8 {
        let value = bus.read(addr);
        self.tick(bus, MCYCLE);
        value
    }

    /// Write memory: one machine cycle.
    pub(crate) fn write(&mut self, bus: &mut dyn Bus, addr: u16, value: u8) {
        bus.write(addr, value);
        self.tick(bus, MCYCLE);
    }

    /// Byte following the opcode at `pc`.
    pub(crate) fn imm8(&mut self, bus: &mut dyn Bus, pc: u16) -> u8 {
        self.read(bus, pc.wrapping_add(1))
    }

    /// Little-endian word following the opcode at `pc`.
    pub(crate) fn imm16(&mut self, bus: &mut dyn Bus, pc: u16) -> u16 {
        let lo = self.read(bus, pc.wrapping_add(1));
        let hi = self.read(bus, pc.wrapping_add(2));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn push16(&mut self, bus: &mut dyn Bus, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write(bus, self.regs.sp, lo);
    }

    pub(crate) fn pop16(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.read(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    /// Move PC past an instruction of `length` bytes fetched at `pc`.
    pub(crate) fn advance(&mut self, pc: u16, length: u8) {
        self.regs.pc = pc.wrapping_add(u16::from(length));
    }

    pub(crate) fn set_flags(&mut self, flags: u8) {
        self.regs.set_f(flags);
    }

    /// False (and trapped) if a load from `addr` hits a read breakpoint.
    pub(crate) fn may_read(&mut self, addr: u16) -> bool {
        !self.debugger.hit_read(addr)
    }

    /// False (and trapped) if a store to `addr` hits a write breakpoint.
    pub(crate) fn may_write(&mut self, addr: u16) -> bool {
        !self.debugger.hit_write(addr)
    }
}

impl Default for Sm83 {
    fn default() -> Self {
        Self::new()
    }
}

/// Test utilities. These poke state directly and bypass execution.
#[cfg(feature = "test-utils")]
impl Sm83 {
    pub fn set_pc(&mut self, value: u16) {
        self.regs.pc = value;
    }

    pub fn set_sp(&mut self, value: u16) {
        self.regs.sp = value;
    }

    pub fn set_a(&mut self, value: u8) {
        self.regs.a = value;
    }

    pub fn set_f(&mut self, value: u8) {
        self.regs.set_f(value);
    }

    pub fn set_af(&mut self, value: u16) {
        self.regs.set_af(value);
    }

    pub fn set_bc(&mut self, value: u16) {
        self.regs.set_bc(value);
    }

    pub fn set_de(&mut self, value: u16) {
        self.regs.set_de(value);
    }

    pub fn set_hl(&mut self, value: u16) {
        self.regs.set_hl(value);
    }

    pub fn set_ime(&mut self, value: bool) {
        self.ime = value;
        self.ime_next = value;
    }

    pub fn set_halted(&mut self, value: bool) {
        self.halted = value;
    }

    #[must_use]
    pub const fn a(&self) -> u8 {
        self.regs.a
    }

    #[must_use]
    pub const fn f(&self) -> u8 {
        self.regs.f
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        self.regs.bc()
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        self.regs.de()
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        self.regs.hl()
    }

    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.regs.sp
    }
}

impl Cpu for Sm83 {
    type Registers = Registers;
    type Step = Step;

    fn step<B: Bus>(&mut self, bus: &mut B) -> Step {
        self.execute(bus)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn reset(&mut self) {
        let registers = if self.skip_boot {
            Registers::power_on(self.model)
        } else {
            Registers::default()
        };
        self.reset_to(registers);
    }
}

fn flag_string(f: u8) -> String {
    [(ZF, 'z'), (NF, 'n'), (HF, 'h'), (CF, 'c')]
        .iter()
        .map(|&(mask, name)| if f & mask != 0 { name } else { '-' })
        .collect()
}

impl fmt::Display for Sm83 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.regs;
        write!(
            f,
            "AF={:04X} BC={:04X} DE={:04X} HL={:04X} SP={:04X} PC={:04X} [{}] IME={}",
            r.af(),
            r.bc(),
            r.de(),
            r.hl(),
            r.sp,
            r.pc,
            flag_string(r.f),
            u8::from(self.ime)
        )?;
        if self.halted {
            write!(f, " HALT")?;
        }
        if self.stopped {
            write!(f, " STOP")?;
        }
        if self.debugger.is_trapped() {
            write!(f, " TRAP")?;
        }
        Ok(())
    }
}

const QUERY_PATHS: &[&str] = &[
    "a",
    "f",
    "b",
    "c",
    "d",
    "e",
    "h",
    "l",
    "af",
    "bc",
    "de",
    "hl",
    "sp",
    "pc",
    "flags.z",
    "flags.n",
    "flags.h",
    "flags.c",
    "ime",
    "ime_next",
    "halted",
    "stopped",
    "blocked",
    "trapped",
    "tracing",
    "ticks",
    "model",
    "breakpoints",
];

impl Observable for Sm83 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        match path {
            "a" => Some(r.a.into()),
            "f" => Some(r.f.into()),
            "b" => Some(r.b.into()),
            "c" => Some(r.c.into()),
            "d" => Some(r.d.into()),
            "e" => Some(r.e.into()),
            "h" => Some(r.h.into()),
            "l" => Some(r.l.into()),

            "af" => Some(r.af().into()),
            "bc" => Some(r.bc().into()),
            "de" => Some(r.de().into()),
            "hl" => Some(r.hl().into()),
            "sp" => Some(r.sp.into()),
            "pc" => Some(r.pc.into()),

            "flags.z" => Some(r.flag(ZF).into()),
            "flags.n" => Some(r.flag(NF).into()),
            "flags.h" => Some(r.flag(HF).into()),
            "flags.c" => Some(r.flag(CF).into()),

            "ime" => Some(self.ime.into()),
            "ime_next" => Some(self.ime_next.into()),
            "halted" => Some(self.halted.into()),
            "stopped" => Some(self.stopped.into()),
            "blocked" => Some(self.blocked.into()),
            "trapped" => Some(self.debugger.is_trapped().into()),
            "tracing" => Some(self.debugger.is_tracing().into()),

            "ticks" => Some(self.clock.get().into()),
            "model" => Some(format!("{:?}", self.model).into()),
            "breakpoints" => Some(Value::Array(
                self.debugger
                    .breakpoints()
                    .into_iter()
                    .map(|bp| Value::String(bp.to_string()))
                    .collect(),
            )),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
