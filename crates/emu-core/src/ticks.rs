//! Elapsed-time counter.

/// A count of CPU clock cycles (T-cycles, 4 per machine cycle).
///
/// Monotonic for the life of a CPU instance; `reset` does not rewind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Cycles elapsed since `earlier`, saturating at zero.
    #[must_use]
    pub const fn since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl core::ops::Add<u32> for Ticks {
    type Output = Self;

    fn add(self, rhs: u32) -> Self {
        Self(self.0 + u64::from(rhs))
    }
}

impl core::ops::AddAssign<u32> for Ticks {
    fn add_assign(&mut self, rhs: u32) {
        self.0 += u64::from(rhs);
    }
}

impl core::fmt::Display for Ticks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
