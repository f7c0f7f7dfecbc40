//! Agent-facing order tracking
//!
//! Markets know only what rests on their books. The ledger remembers, per
//! order, what the agent asked for and where the order actually went.

use common::{AgentId, MarketId, Order, OrderId, Price, Side, TimeStamp, Transaction};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;

/// Order an agent wants to place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Submitting agent
    pub agent: AgentId,
    /// Primary market
    pub market: MarketId,
    /// Buy or Sell
    pub side: Side,
    /// Limit price
    pub price: Price,
    /// Quantity
    pub quantity: u32,
    /// Withdraw any remainder this long after the order reaches its market
    pub expires_after: Option<TimeStamp>,
}

impl OrderRequest {
    /// Limit order without expiry
    pub fn limit(agent: AgentId, market: MarketId, side: Side, price: Price, quantity: u32) -> Self {
        Self {
            agent,
            market,
            side,
            price,
            quantity,
            expires_after: None,
        }
    }

    /// Set an expiry
    pub fn expiring_after(mut self, duration: TimeStamp) -> Self {
        self.expires_after = Some(duration);
        self
    }

    pub(crate) fn to_order(&self, id: OrderId, created_at: TimeStamp) -> Order {
        Order {
            id,
            agent: self.agent,
            market: self.market,
            side: self.side,
            price: self.price,
            quantity: self.quantity,
            created_at,
        }
    }
}

/// Mutable state of one live order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    /// Order ID
    pub order_id: OrderId,
    /// Owner
    pub agent: AgentId,
    /// Buy or Sell
    pub side: Side,
    /// Limit price as requested
    pub price: Price,
    /// Quantity when the record was created
    pub quantity: u32,
    /// Quantity still live
    pub remaining: u32,
    /// Market the agent addressed
    pub requested_market: MarketId,
    /// Market the order was sent to
    pub routed_market: MarketId,
    /// Time the market accepted the order, once it has
    pub confirmed_at: Option<TimeStamp>,
    /// Expiry duration
    pub expires_after: Option<TimeStamp>,
    /// Order this one was split from by routing
    pub split_from: Option<OrderId>,
}

impl OrderRecord {
    pub(crate) fn new(order: &Order, expires_after: Option<TimeStamp>) -> Self {
        Self {
            order_id: order.id,
            agent: order.agent,
            side: order.side,
            price: order.price,
            quantity: order.quantity,
            remaining: order.quantity,
            requested_market: order.market,
            routed_market: order.market,
            confirmed_at: None,
            expires_after,
            split_from: None,
        }
    }

    /// Returns true once the order was sent somewhere other than requested
    pub fn was_routed_away(&self) -> bool {
        self.requested_market != self.routed_market
    }
}

/// Live order records keyed by order id
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    records: BTreeMap<OrderId, OrderRecord>,
}

impl OrderLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new record
    pub fn insert(&mut self, record: OrderRecord) {
        self.records.insert(record.order_id, record);
    }

    /// Look up a live record
    pub fn get(&self, order_id: OrderId) -> Option<&OrderRecord> {
        self.records.get(&order_id)
    }

    pub(crate) fn get_mut(&mut self, order_id: OrderId) -> Option<&mut OrderRecord> {
        self.records.get_mut(&order_id)
    }

    /// Live records in order id order
    pub fn iter(&self) -> impl Iterator<Item = &OrderRecord> {
        self.records.values()
    }

    /// Live records of one agent
    pub fn for_agent(&self, agent: AgentId) -> impl Iterator<Item = &OrderRecord> {
        self.records.values().filter(move |r| r.agent == agent)
    }

    /// Live parts of `parent` that routing sent to other markets
    pub fn legs_of(&self, parent: OrderId) -> impl Iterator<Item = &OrderRecord> {
        self.records.values().filter(move |r| r.split_from == Some(parent))
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no order is live
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reduce an order by `quantity`, dropping the record when nothing
    /// remains. Returns the remaining quantity, or `None` for an unknown
    /// order.
    pub fn reduce(&mut self, order_id: OrderId, quantity: u32) -> Option<u32> {
        let record = self.records.get_mut(&order_id)?;
        record.remaining = record.remaining.saturating_sub(quantity);
        let remaining = record.remaining;
        if remaining == 0 {
            self.records.remove(&order_id);
            trace!(%order_id, "Order record closed");
        }
        Some(remaining)
    }

    /// Apply both sides of a trade
    pub fn apply_fill(&mut self, transaction: &Transaction) {
        self.reduce(transaction.buy_order, transaction.quantity);
        self.reduce(transaction.sell_order, transaction.quantity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::TransactionId;

    fn record(id: u64, quantity: u32) -> OrderRecord {
        let order = OrderRequest::limit(AgentId(1), MarketId(0), Side::Buy, Price::new(100), quantity)
            .to_order(OrderId(id), TimeStamp::ZERO);
        OrderRecord::new(&order, None)
    }

    #[test]
    fn test_reduce_closes_record() {
        let mut ledger = OrderLedger::new();
        ledger.insert(record(1, 10));

        assert_eq!(ledger.reduce(OrderId(1), 4), Some(6));
        assert_eq!(ledger.get(OrderId(1)).map(|r| r.remaining), Some(6));
        assert_eq!(ledger.reduce(OrderId(1), 6), Some(0));
        assert!(ledger.get(OrderId(1)).is_none());
        assert_eq!(ledger.reduce(OrderId(1), 1), None);
    }

    #[test]
    fn test_apply_fill_reduces_both_sides() {
        let mut ledger = OrderLedger::new();
        ledger.insert(record(1, 5));
        ledger.insert(record(2, 3));

        ledger.apply_fill(&Transaction {
            id: TransactionId {
                market: MarketId(0),
                sequence: 1,
            },
            market: MarketId(0),
            buyer: AgentId(1),
            seller: AgentId(1),
            buy_order: OrderId(1),
            sell_order: OrderId(2),
            price: Price::new(100),
            quantity: 3,
            executed_at: TimeStamp::of(1),
            buy_submitted_at: TimeStamp::ZERO,
            sell_submitted_at: TimeStamp::ZERO,
        });

        assert_eq!(ledger.get(OrderId(1)).map(|r| r.remaining), Some(2));
        assert!(ledger.get(OrderId(2)).is_none());
        assert_eq!(ledger.for_agent(AgentId(1)).count(), 1);
    }
}
