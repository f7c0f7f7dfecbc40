//! Processor arena entries

use common::{MarketUpdate, TimeStamp};
use market_data::{QuoteProcessor, Sip, TransactionProcessor, UpdateOutcome};

/// Any information processor a market can publish to
#[derive(Debug, Clone)]
pub enum Processor {
    /// Single-market quote view
    Quote(QuoteProcessor),
    /// Single-market trade log
    Transaction(TransactionProcessor),
    /// Cross-market consolidator
    Sip(Sip),
}

impl Processor {
    /// Delivery latency
    pub fn latency(&self) -> TimeStamp {
        match self {
            Processor::Quote(p) => p.latency(),
            Processor::Transaction(p) => p.latency(),
            Processor::Sip(p) => p.latency(),
        }
    }

    /// Updates discarded as stale
    pub fn discarded(&self) -> u64 {
        match self {
            Processor::Quote(p) => p.discarded(),
            Processor::Transaction(p) => p.discarded(),
            Processor::Sip(p) => p.discarded(),
        }
    }

    /// The SIP, if this is one
    pub fn as_sip(&self) -> Option<&Sip> {
        match self {
            Processor::Sip(sip) => Some(sip),
            Processor::Quote(_) | Processor::Transaction(_) => None,
        }
    }

    /// The quote processor, if this is one
    pub fn as_quote(&self) -> Option<&QuoteProcessor> {
        match self {
            Processor::Quote(p) => Some(p),
            Processor::Transaction(_) | Processor::Sip(_) => None,
        }
    }

    /// The transaction processor, if this is one
    pub fn as_transaction(&self) -> Option<&TransactionProcessor> {
        match self {
            Processor::Transaction(p) => Some(p),
            Processor::Quote(_) | Processor::Sip(_) => None,
        }
    }

    pub(crate) fn process(&mut self, update: &MarketUpdate, now: TimeStamp) -> market_data::Result<UpdateOutcome> {
        match self {
            Processor::Quote(p) => p.process(update),
            Processor::Transaction(p) => p.process(update),
            Processor::Sip(p) => p.process(update, now),
        }
    }
}
