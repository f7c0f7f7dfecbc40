//! Clearing policies
//!
//! A market is built with one [`Policy`]. The policy decides when a clear
//! runs, how fills are priced, and whether book changes are visible between
//! clears.

use common::{Price, TimeStamp};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::MatchingError;
use crate::matching;
use crate::result::{Fill, MatchResult};
use crate::Result;

/// Behaviour that distinguishes market types
pub trait ClearingPolicy {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// When the clear triggered by a mutation at `now` should run
    fn next_clear(&self, now: TimeStamp) -> Result<TimeStamp>;

    /// Price a batch of fills
    fn price(&self, fills: Vec<Fill>, tick: u64) -> Result<MatchResult>;

    /// Whether withdrawals publish a quote immediately instead of waiting
    /// for the next clear
    fn publishes_between_clears(&self) -> bool;
}

// ============================================================================
// Continuous
// ============================================================================

/// Continuous double auction: clear on every mutation, trade at the
/// resting order's price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuous;

impl ClearingPolicy for Continuous {
    fn name(&self) -> &'static str {
        "continuous"
    }

    fn next_clear(&self, _now: TimeStamp) -> Result<TimeStamp> {
        Ok(TimeStamp::IMMEDIATE)
    }

    fn price(&self, fills: Vec<Fill>, _tick: u64) -> Result<MatchResult> {
        Ok(MatchResult {
            fills: fills
                .into_iter()
                .map(|fill| {
                    let price = matching::resting_price(&fill);
                    (fill, price)
                })
                .collect(),
            uniform_price: None,
        })
    }

    fn publishes_between_clears(&self) -> bool {
        true
    }
}

// ============================================================================
// Call
// ============================================================================

/// Periodic call market: accumulate orders, clear at multiples of
/// `interval` at one uniform price. An interval of zero is a continuous
/// market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    interval: u64,
    pricing: OrderedFloat<f64>,
}

impl Call {
    /// Create a call policy. `pricing` must lie in `[0, 1]`.
    pub fn new(interval: u64, pricing: f64) -> Result<Self> {
        if !pricing.is_finite() || !(0.0..=1.0).contains(&pricing) {
            return Err(MatchingError::InvalidConfiguration(format!(
                "pricing must be between 0 and 1 inclusive, was {}",
                pricing
            )));
        }
        Ok(Self {
            interval,
            pricing: OrderedFloat(pricing),
        })
    }

    /// Ticks between clears
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Position of the clearing price between sell and buy limits
    pub fn pricing(&self) -> f64 {
        self.pricing.into_inner()
    }

    fn is_continuous(&self) -> bool {
        self.interval == 0
    }
}

impl ClearingPolicy for Call {
    fn name(&self) -> &'static str {
        "call"
    }

    /// The multiple of the interval strictly after `now`
    fn next_clear(&self, now: TimeStamp) -> Result<TimeStamp> {
        if self.is_continuous() {
            return Continuous.next_clear(now);
        }
        let ticks = now.ticks().ok_or_else(|| {
            MatchingError::InvalidOrder(format!("cannot schedule a clear from {}", now))
        })?;
        Ok(TimeStamp::of((ticks / self.interval + 1).saturating_mul(self.interval)))
    }

    fn price(&self, fills: Vec<Fill>, tick: u64) -> Result<MatchResult> {
        if self.is_continuous() {
            return Continuous.price(fills, tick);
        }
        let Some(price) = matching::uniform_price(&fills, self.pricing(), tick)? else {
            return Ok(MatchResult::no_match());
        };
        Ok(MatchResult {
            fills: fills.into_iter().map(|fill| (fill, price)).collect(),
            uniform_price: Some(price),
        })
    }

    fn publishes_between_clears(&self) -> bool {
        self.is_continuous()
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Clearing policy selected at market construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Policy {
    /// Continuous double auction
    Continuous(Continuous),
    /// Periodic call market
    Call(Call),
}

impl Policy {
    /// Continuous double auction
    pub fn continuous() -> Self {
        Policy::Continuous(Continuous)
    }

    /// Call market clearing every `interval` ticks at `pricing`
    pub fn call(interval: u64, pricing: f64) -> Result<Self> {
        Call::new(interval, pricing).map(Policy::Call)
    }

    fn inner(&self) -> &dyn ClearingPolicy {
        match self {
            Policy::Continuous(p) => p,
            Policy::Call(p) => p,
        }
    }
}

impl ClearingPolicy for Policy {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn next_clear(&self, now: TimeStamp) -> Result<TimeStamp> {
        self.inner().next_clear(now)
    }

    fn price(&self, fills: Vec<Fill>, tick: u64) -> Result<MatchResult> {
        self.inner().price(fills, tick)
    }

    fn publishes_between_clears(&self) -> bool {
        self.inner().publishes_between_clears()
    }
}

/// Price every fill at `price`; used by tests that check uniform clears
#[cfg(test)]
pub(crate) fn all_at(result: &MatchResult, price: Price) -> bool {
    result.fills.iter().all(|(_, p)| *p == price)
}
