//! Logical simulation time
//!
//! [`TimeStamp`] is the scheduler's clock. [`MarketTime`] is the per-market
//! mutation sequence that information processors use to reject stale updates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

// ============================================================================
// TimeStamp
// ============================================================================

/// Integer logical tick with two sentinels.
///
/// `IMMEDIATE` orders before every finite tick and is never placed on the
/// event queue. `NEVER` orders after every finite tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct TimeStamp(i64);

impl TimeStamp {
    /// Execute now, inside the producing cascade
    pub const IMMEDIATE: TimeStamp = TimeStamp(-1);
    /// Start of the simulation
    pub const ZERO: TimeStamp = TimeStamp(0);
    /// Unbounded future
    pub const NEVER: TimeStamp = TimeStamp(i64::MAX);

    /// Finite timestamp at `ticks`; values that reach the sentinel saturate to `NEVER`
    pub const fn of(ticks: u64) -> Self {
        if ticks >= i64::MAX as u64 {
            Self::NEVER
        } else {
            Self(ticks as i64)
        }
    }

    /// Number of ticks, or `None` for a sentinel
    pub fn ticks(&self) -> Option<u64> {
        if self.is_finite() {
            Some(self.0 as u64)
        } else {
            None
        }
    }

    /// Returns true for `IMMEDIATE`
    pub fn is_immediate(&self) -> bool {
        *self == Self::IMMEDIATE
    }

    /// Returns true for `NEVER`
    pub fn is_never(&self) -> bool {
        *self == Self::NEVER
    }

    /// Returns true for any non-sentinel tick
    pub fn is_finite(&self) -> bool {
        !self.is_immediate() && !self.is_never()
    }

    /// Add two timestamps.
    ///
    /// `NEVER` absorbs finite operands and finite overflow saturates to
    /// `NEVER`. `IMMEDIATE` has no arithmetic.
    pub fn plus(self, other: TimeStamp) -> Result<TimeStamp> {
        if self.is_immediate() || other.is_immediate() {
            return Err(Error::TimeArithmetic {
                lhs: self,
                op: "+",
                rhs: other,
            });
        }
        if self.is_never() || other.is_never() {
            return Ok(Self::NEVER);
        }
        Ok(self
            .0
            .checked_add(other.0)
            .filter(|t| *t < i64::MAX)
            .map(TimeStamp)
            .unwrap_or(Self::NEVER))
    }

    /// Subtract a finite timestamp from a finite timestamp, never going below zero
    pub fn minus(self, other: TimeStamp) -> Result<TimeStamp> {
        if !self.is_finite() || !other.is_finite() || other.0 > self.0 {
            return Err(Error::TimeArithmetic {
                lhs: self,
                op: "-",
                rhs: other,
            });
        }
        Ok(TimeStamp(self.0 - other.0))
    }
}

impl Default for TimeStamp {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<i64> for TimeStamp {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Self::IMMEDIATE),
            v if v >= 0 => Ok(TimeStamp(v)),
            v => Err(Error::invalid_input(format!("timestamp out of range: {}", v))),
        }
    }
}

impl From<TimeStamp> for i64 {
    fn from(value: TimeStamp) -> Self {
        value.0
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::IMMEDIATE => write!(f, "immediate"),
            Self::NEVER => write!(f, "never"),
            TimeStamp(t) => write!(f, "{}", t),
        }
    }
}

// ============================================================================
// MarketTime
// ============================================================================

/// Position of one market mutation: the tick it happened at plus the
/// market's own sequence number.
///
/// Ordered by origin then sequence. Only comparable for the same market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketTime {
    /// Tick at which the mutation happened
    pub origin: TimeStamp,
    /// Per-market mutation counter
    pub sequence: u64,
}

impl MarketTime {
    /// Create a market time
    pub fn new(origin: TimeStamp, sequence: u64) -> Self {
        Self { origin, sequence }
    }
}

impl fmt::Display for MarketTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.origin, self.sequence)
    }
}

/// Per-market generator of strictly increasing [`MarketTime`]s
#[derive(Debug, Clone, Default)]
pub struct MarketClock {
    sequence: u64,
    last: Option<MarketTime>,
}

impl MarketClock {
    /// Create a clock that has not ticked yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance for one mutation at `now`
    pub fn advance(&mut self, now: TimeStamp) -> MarketTime {
        self.sequence += 1;
        let time = MarketTime::new(now, self.sequence);
        self.last = Some(time);
        time
    }

    /// Last issued market time
    pub fn last(&self) -> Option<MarketTime> {
        self.last
    }
}
