//! Per-market quote processor
//!
//! Keeps the newest quote of one market as seen through one latency.

use common::{AgentId, MarketId, MarketUpdate, Quote, TimeStamp};
use tracing::debug;

use crate::error::MarketDataError;
use crate::staleness::StalenessFilter;
use crate::types::UpdateOutcome;
use crate::Result;

/// Latency-delayed view of one market's quote
#[derive(Debug, Clone)]
pub struct QuoteProcessor {
    market: MarketId,
    latency: TimeStamp,
    subscriber: Option<AgentId>,
    quote: Quote,
    filter: StalenessFilter,
    discarded: u64,
}

impl QuoteProcessor {
    /// Create a processor following `market`
    pub fn new(market: MarketId, latency: TimeStamp, subscriber: Option<AgentId>) -> Self {
        Self {
            market,
            latency,
            subscriber,
            quote: Quote::empty(market),
            filter: StalenessFilter::new(),
            discarded: 0,
        }
    }

    /// Market followed
    pub fn market(&self) -> MarketId {
        self.market
    }

    /// Delivery latency
    pub fn latency(&self) -> TimeStamp {
        self.latency
    }

    /// Agent notified on every applied update
    pub fn subscriber(&self) -> Option<AgentId> {
        self.subscriber
    }

    /// Newest applied quote
    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    /// Updates discarded as stale
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Apply `update` unless an update at least as new was already applied
    pub fn process(&mut self, update: &MarketUpdate) -> Result<UpdateOutcome> {
        if update.market != self.market {
            return Err(MarketDataError::WrongMarket {
                expected: self.market,
                got: update.market,
            });
        }
        if !self.filter.admit(update.market, update.market_time) {
            self.discarded += 1;
            debug!(
                market = %self.market,
                market_time = %update.market_time,
                last = ?self.filter.last(self.market),
                "Stale quote discarded"
            );
            return Ok(UpdateOutcome::Stale);
        }

        self.quote = update.quote.clone();
        Ok(UpdateOutcome::Applied {
            notify: self.subscriber,
        })
    }
}
