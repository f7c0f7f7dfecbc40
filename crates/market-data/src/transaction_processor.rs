//! Per-market transaction processor
//!
//! Unlike quotes, trades are never superseded: an update that arrives late
//! may still carry trades nobody has seen. Updates are therefore merged by
//! transaction id, and the market time watermark only moves forward.

use common::{AgentId, MarketId, MarketTime, MarketUpdate, TimeStamp, Transaction, TransactionId};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::MarketDataError;
use crate::types::UpdateOutcome;
use crate::Result;

/// Latency-delayed log of one market's transactions
#[derive(Debug, Clone)]
pub struct TransactionProcessor {
    market: MarketId,
    latency: TimeStamp,
    subscriber: Option<AgentId>,
    log: Vec<Transaction>,
    seen: BTreeSet<TransactionId>,
    last_applied: Option<MarketTime>,
    discarded: u64,
}

impl TransactionProcessor {
    /// Create a processor following `market`
    pub fn new(market: MarketId, latency: TimeStamp, subscriber: Option<AgentId>) -> Self {
        Self {
            market,
            latency,
            subscriber,
            log: Vec::new(),
            seen: BTreeSet::new(),
            last_applied: None,
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

    /// Agent notified whenever the log grows
    pub fn subscriber(&self) -> Option<AgentId> {
        self.subscriber
    }

    /// Transactions in execution order
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Newest market time applied
    pub fn last_applied(&self) -> Option<MarketTime> {
        self.last_applied
    }

    /// Stale updates that brought nothing new
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Merge the trades of `update` into the log
    pub fn process(&mut self, update: &MarketUpdate) -> Result<UpdateOutcome> {
        if update.market != self.market {
            return Err(MarketDataError::WrongMarket {
                expected: self.market,
                got: update.market,
            });
        }

        let stale = self.last_applied.is_some_and(|last| update.market_time <= last);
        if !stale {
            self.last_applied = Some(update.market_time);
        }

        let before = self.log.len();
        for transaction in &update.transactions {
            if self.seen.insert(transaction.id) {
                self.log.push(transaction.clone());
            }
        }
        let added = self.log.len() - before;

        if added == 0 {
            if stale {
                self.discarded += 1;
                debug!(
                    market = %self.market,
                    market_time = %update.market_time,
                    "Stale transaction update discarded"
                );
                return Ok(UpdateOutcome::Stale);
            }
            return Ok(UpdateOutcome::Unchanged);
        }

        if stale {
            // late trades go back in execution order
            self.log.sort_by_key(|t| (t.executed_at, t.id));
        }
        debug!(market = %self.market, added, total = self.log.len(), "Transactions applied");
        Ok(UpdateOutcome::Applied {
            notify: self.subscriber,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, Price, Quote};

    fn trade(sequence: u64, at: u64) -> Transaction {
        Transaction {
            id: TransactionId {
                market: MarketId(0),
                sequence,
            },
            market: MarketId(0),
            buyer: AgentId(1),
            seller: AgentId(2),
            buy_order: OrderId(sequence * 2),
            sell_order: OrderId(sequence * 2 + 1),
            price: Price::new(100),
            quantity: 1,
            executed_at: TimeStamp::of(at),
            buy_submitted_at: TimeStamp::of(at),
            sell_submitted_at: TimeStamp::of(at),
        }
    }

    fn update(sequence: u64, transactions: Vec<Transaction>) -> MarketUpdate {
        MarketUpdate {
            market: MarketId(0),
            market_time: MarketTime::new(TimeStamp::of(sequence), sequence),
            quote: Quote::empty(MarketId(0)),
            transactions,
        }
    }

    #[test]
    fn test_late_update_still_delivers_trades() {
        let mut processor = TransactionProcessor::new(MarketId(0), TimeStamp::of(3), Some(AgentId(7)));

        let outcome = processor.process(&update(4, vec![trade(2, 4)])).unwrap();
        assert_eq!(outcome.notify(), Some(AgentId(7)));

        // older market time, unseen trade
        let outcome = processor.process(&update(2, vec![trade(1, 2)])).unwrap();
        assert_eq!(outcome.notify(), Some(AgentId(7)));

        let order: Vec<u64> = processor.transactions().iter().map(|t| t.id.sequence).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(processor.last_applied().map(|m| m.sequence), Some(4));
    }

    #[test]
    fn test_duplicates_and_stale_repeats_ignored() {
        let mut processor = TransactionProcessor::new(MarketId(0), TimeStamp::ZERO, None);
        processor.process(&update(2, vec![trade(1, 2)])).unwrap();

        assert_eq!(processor.process(&update(2, vec![trade(1, 2)])).unwrap(), UpdateOutcome::Stale);
        assert_eq!(processor.process(&update(3, Vec::new())).unwrap(), UpdateOutcome::Unchanged);
        assert_eq!(processor.transactions().len(), 1);
        assert_eq!(processor.discarded(), 1);
    }
}
