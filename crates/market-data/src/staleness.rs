//! Staleness gating and delivery latency
//!
//! Updates can overtake each other when latencies differ. Every update
//! carries the [`MarketTime`] of the mutation that produced it, so a
//! processor only needs to remember the newest one it has applied per
//! source.

use common::{MarketId, MarketTime, TimeStamp};
use std::collections::HashMap;

use crate::Result;

/// Last applied market time per source market
#[derive(Debug, Clone, Default)]
pub struct StalenessFilter {
    last: HashMap<MarketId, MarketTime>,
}

impl StalenessFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `market_time` if it is strictly newer than anything applied
    /// from `market`. Returns false for stale or repeated updates.
    pub fn admit(&mut self, market: MarketId, market_time: MarketTime) -> bool {
        match self.last.get(&market) {
            Some(last) if market_time <= *last => false,
            _ => {
                self.last.insert(market, market_time);
                true
            }
        }
    }

    /// Newest market time applied from `market`
    pub fn last(&self, market: MarketId) -> Option<MarketTime> {
        self.last.get(&market).copied()
    }
}

/// When an update published at `now` reaches a processor with `latency`.
///
/// `IMMEDIATE` latency delivers inside the publishing cascade; anything else
/// is added to `now`.
pub fn delivery_time(latency: TimeStamp, now: TimeStamp) -> Result<TimeStamp> {
    if latency.is_immediate() {
        return Ok(TimeStamp::IMMEDIATE);
    }
    Ok(now.plus(latency)?)
}
