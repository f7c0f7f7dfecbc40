//! Event log for a market
//!
//! Events are kept in sequence order for the lifetime of the market.

use tracing::trace;

use crate::event::MarketEvent;

/// In-memory event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Events stored in sequence order
    events: Vec<MarketEvent>,
    /// Sequence of the last appended event
    sequence: u64,
}

impl EventLog {
    /// Create a new event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number to stamp on an event
    pub fn next_sequence(&self) -> u64 {
        self.sequence + 1
    }

    /// Append an event to the log
    pub fn append(&mut self, event: MarketEvent) {
        self.sequence = event.sequence();
        self.events.push(event);
        trace!(sequence = self.sequence, "Event appended to log");
    }

    /// All events in order
    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    /// Get current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Get total number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{MarketTime, OrderId, TimeStamp};

    #[test]
    fn test_append_stamps_sequence() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        for _ in 0..3 {
            let sequence = log.next_sequence();
            log.append(MarketEvent::OrderWithdrawn {
                order_id: OrderId(sequence),
                quantity: 1,
                market_time: MarketTime::new(TimeStamp::ZERO, sequence),
                sequence,
            });
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.sequence(), 3);
        let sequences: Vec<u64> = log.events().iter().map(MarketEvent::sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }
}
