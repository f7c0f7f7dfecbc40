//! Securities information processor
//!
//! Consolidates the quotes of several markets into a national best bid and
//! offer, and their trades into a single tape. Each SIP sees the markets
//! through its own latency, so its view can lag the books it summarizes.

use common::{BestBidAsk, MarketId, MarketUpdate, Price, Quote, TimeStamp, Transaction, TransactionId};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::MarketDataError;
use crate::staleness::StalenessFilter;
use crate::types::{NbboAnomaly, UpdateOutcome};
use crate::Result;

/// Consolidated view across markets
#[derive(Debug, Clone)]
pub struct Sip {
    latency: TimeStamp,
    tick_size: u64,
    /// Latest quote per source, in registration order
    sources: Vec<(MarketId, Quote)>,
    filter: StalenessFilter,
    nbbo: BestBidAsk,
    tape: BTreeMap<(TimeStamp, TransactionId), Transaction>,
    anomalies: Vec<NbboAnomaly>,
    discarded: u64,
}

impl Sip {
    /// Create a SIP with no sources. Corrections for a crossed NBBO move
    /// each side one `tick_size` away from the midpoint.
    pub fn new(latency: TimeStamp, tick_size: u64) -> Self {
        Self {
            latency,
            tick_size: tick_size.max(1),
            sources: Vec::new(),
            filter: StalenessFilter::new(),
            nbbo: BestBidAsk::default(),
            tape: BTreeMap::new(),
            anomalies: Vec::new(),
            discarded: 0,
        }
    }

    /// Start tracking `market`. Registration order breaks NBBO ties.
    pub fn add_source(&mut self, market: MarketId) {
        if self.sources.iter().any(|(m, _)| *m == market) {
            return;
        }
        self.sources.push((market, Quote::empty(market)));
    }

    /// Delivery latency
    pub fn latency(&self) -> TimeStamp {
        self.latency
    }

    /// Markets tracked, in registration order
    pub fn sources(&self) -> impl Iterator<Item = MarketId> + '_ {
        self.sources.iter().map(|(m, _)| *m)
    }

    /// Latest quote received from `market`
    pub fn quote(&self, market: MarketId) -> Option<&Quote> {
        self.sources.iter().find(|(m, _)| *m == market).map(|(_, q)| q)
    }

    /// Current national best bid and offer; never crossed
    pub fn nbbo(&self) -> &BestBidAsk {
        &self.nbbo
    }

    /// Consolidated tape ordered by execution time
    pub fn tape(&self) -> impl Iterator<Item = &Transaction> {
        self.tape.values()
    }

    /// Crossed NBBOs that were corrected, oldest first
    pub fn anomalies(&self) -> &[NbboAnomaly] {
        &self.anomalies
    }

    /// Updates discarded as stale
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Apply an update from one of the sources at `now`
    pub fn process(&mut self, update: &MarketUpdate, now: TimeStamp) -> Result<UpdateOutcome> {
        let slot = self
            .sources
            .iter()
            .position(|(m, _)| *m == update.market)
            .ok_or(MarketDataError::UnknownSource(update.market))?;

        // trades are merged even from a stale update
        for transaction in &update.transactions {
            self.tape
                .entry((transaction.executed_at, transaction.id))
                .or_insert_with(|| transaction.clone());
        }

        if !self.filter.admit(update.market, update.market_time) {
            self.discarded += 1;
            debug!(
                market = %update.market,
                market_time = %update.market_time,
                "Stale quote discarded by SIP"
            );
            return Ok(UpdateOutcome::Stale);
        }

        self.sources[slot].1 = update.quote.clone();
        self.recompute(now)?;
        Ok(UpdateOutcome::Applied { notify: None })
    }

    fn recompute(&mut self, now: TimeStamp) -> Result<()> {
        let mut nbbo = BestBidAsk::default();
        for (market, quote) in &self.sources {
            if let Some(bid) = quote.bid {
                if nbbo.bid.map_or(true, |best| bid > best) {
                    nbbo.bid = Some(bid);
                    nbbo.bid_quantity = quote.bid_quantity;
                    nbbo.bid_market = Some(*market);
                }
            }
            if let Some(ask) = quote.ask {
                if nbbo.ask.map_or(true, |best| ask < best) {
                    nbbo.ask = Some(ask);
                    nbbo.ask_quantity = quote.ask_quantity;
                    nbbo.ask_market = Some(*market);
                }
            }
        }

        if let (Some(bid), Some(ask)) = (nbbo.bid, nbbo.ask) {
            if bid > ask {
                let mid = bid.midpoint(ask)?;
                let tick = Price::new(i64::try_from(self.tick_size).unwrap_or(i64::MAX));
                let anomaly = NbboAnomaly {
                    time: now,
                    raw_bid: bid,
                    raw_ask: ask,
                    corrected_bid: mid.checked_sub(tick)?,
                    corrected_ask: mid.checked_add(tick)?,
                };
                warn!(
                    %now,
                    raw_bid = %bid,
                    raw_ask = %ask,
                    bid_market = ?nbbo.bid_market,
                    ask_market = ?nbbo.ask_market,
                    corrected_bid = %anomaly.corrected_bid,
                    corrected_ask = %anomaly.corrected_ask,
                    "Crossed NBBO corrected"
                );
                nbbo.bid = Some(anomaly.corrected_bid);
                nbbo.ask = Some(anomaly.corrected_ask);
                self.anomalies.push(anomaly);
            }
        }

        self.nbbo = nbbo;
        Ok(())
    }
}
