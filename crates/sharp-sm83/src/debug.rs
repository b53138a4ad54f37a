//! Execution trace and breakpoints.
//!
//! Tracing is off by default; when on, every executed instruction and every
//! notable event (interrupt dispatch, HALT wake, breakpoint hit) lands in a
//! bounded ring buffer. Breakpoints trap the CPU at an instruction boundary,
//! or before the memory access of a load/store, and stay trapped until the
//! driver calls [`Debugger::resume`].

use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Entries kept before the oldest is evicted.
pub const TRACE_CAPACITY: usize = 1000;

/// What produced a trace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TraceKind {
    /// An executed instruction.
    Op,
    /// Something that happened between instructions.
    Event,
}

/// One line of the execution trace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub address: Option<u16>,
    pub text: String,
    pub comment: Option<String>,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(addr) => write!(f, "${addr:04x}  ")?,
            None => write!(f, "       ")?,
        }
        match self.kind {
            TraceKind::Op => write!(f, "{}", self.text)?,
            TraceKind::Event => write!(f, "-- {}", self.text)?,
        }
        if let Some(comment) = &self.comment {
            write!(f, "  ; {comment}")?;
        }
        Ok(())
    }
}

/// A place to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Breakpoint {
    /// Before the instruction at this address is fetched.
    Execute(u16),
    /// Before a load reads this address.
    Read(u16),
    /// Before a store writes this address.
    Write(u16),
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakpoint::Execute(addr) => write!(f, "exec ${addr:04x}"),
            Breakpoint::Read(addr) => write!(f, "read ${addr:04x}"),
            Breakpoint::Write(addr) => write!(f, "write ${addr:04x}"),
        }
    }
}

/// Trace buffer, breakpoint sets and trap state.
#[derive(Debug, Default)]
pub struct Debugger {
    tracing: bool,
    trace: VecDeque<TraceEntry>,
    exec: HashSet<u16>,
    read: HashSet<u16>,
    write: HashSet<u16>,
    trapped: bool,
    trap_resolved: bool,
}

impl Debugger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn instruction tracing on or off. Existing entries are kept.
    pub fn set_tracing(&mut self, enabled: bool) {
        self.tracing = enabled;
    }

    #[must_use]
    pub const fn is_tracing(&self) -> bool {
        self.tracing
    }

    /// Trace entries, oldest first.
    pub fn trace(&self) -> impl Iterator<Item = &TraceEntry> {
        self.trace.iter()
    }

    #[must_use]
    pub fn trace_len(&self) -> usize {
        self.trace.len()
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Returns true if the breakpoint was not already set.
    pub fn add_breakpoint(&mut self, breakpoint: Breakpoint) -> bool {
        match breakpoint {
            Breakpoint::Execute(addr) => self.exec.insert(addr),
            Breakpoint::Read(addr) => self.read.insert(addr),
            Breakpoint::Write(addr) => self.write.insert(addr),
        }
    }

    /// Returns true if the breakpoint was set.
    pub fn remove_breakpoint(&mut self, breakpoint: Breakpoint) -> bool {
        match breakpoint {
            Breakpoint::Execute(addr) => self.exec.remove(&addr),
            Breakpoint::Read(addr) => self.read.remove(&addr),
            Breakpoint::Write(addr) => self.write.remove(&addr),
        }
    }

    pub fn clear_breakpoints(&mut self) {
        self.exec.clear();
        self.read.clear();
        self.write.clear();
    }

    /// All breakpoints, execution first, each group in address order.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        let mut out = Vec::with_capacity(self.exec.len() + self.read.len() + self.write.len());
        let sorted = |set: &HashSet<u16>| {
            let mut addrs: Vec<u16> = set.iter().copied().collect();
            addrs.sort_unstable();
            addrs
        };
        out.extend(sorted(&self.exec).into_iter().map(Breakpoint::Execute));
        out.extend(sorted(&self.read).into_iter().map(Breakpoint::Read));
        out.extend(sorted(&self.write).into_iter().map(Breakpoint::Write));
        out
    }

    /// True while a breakpoint holds the CPU.
    #[must_use]
    pub const fn is_trapped(&self) -> bool {
        self.trapped
    }

    /// Release a trap. The next instruction runs even if it sits on (or
    /// touches) a breakpoint; the one after that is checked again.
    pub fn resume(&mut self) {
        self.trapped = false;
        self.trap_resolved = true;
    }

    pub(crate) fn record(&mut self, entry: TraceEntry) {
        if self.trace.len() == TRACE_CAPACITY {
            self.trace.pop_front();
        }
        self.trace.push_back(entry);
    }

    pub(crate) fn event(&mut self, address: Option<u16>, text: String) {
        if self.tracing {
            self.record(TraceEntry {
                kind: TraceKind::Event,
                address,
                text,
                comment: None,
            });
        }
    }

    /// Trap if `pc` carries an execution breakpoint.
    pub(crate) fn hit_exec(&mut self, pc: u16) -> bool {
        self.hit(pc, Breakpoint::Execute(pc))
    }

    /// Trap if a load from `addr` should stop the CPU.
    pub(crate) fn hit_read(&mut self, addr: u16) -> bool {
        self.hit(addr, Breakpoint::Read(addr))
    }

    /// Trap if a store to `addr` should stop the CPU.
    pub(crate) fn hit_write(&mut self, addr: u16) -> bool {
        self.hit(addr, Breakpoint::Write(addr))
    }

    fn hit(&mut self, addr: u16, breakpoint: Breakpoint) -> bool {
        if self.trap_resolved {
            return false;
        }
        let set = match breakpoint {
            Breakpoint::Execute(_) => &self.exec,
            Breakpoint::Read(_) => &self.read,
            Breakpoint::Write(_) => &self.write,
        };
        if !set.contains(&addr) {
            return false;
        }
        self.trapped = true;
        let what = match breakpoint {
            Breakpoint::Execute(_) => "breakpoint",
            Breakpoint::Read(_) => "read breakpoint",
            Breakpoint::Write(_) => "write breakpoint",
        };
        self.event(Some(addr), format!("{what} ${addr:04x}"));
        true
    }

    /// An instruction completed, or an interrupt moved PC away from it.
    /// Either way the one-shot pass from `resume` is spent.
    pub(crate) fn instruction_done(&mut self) {
        self.trap_resolved = false;
    }
}
