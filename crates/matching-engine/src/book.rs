//! Order book
//!
//! Price levels are kept in `BTreeMap`s so iteration is deterministic; each
//! level is a FIFO queue in arrival order.

use common::{AgentId, MarketId, MarketTime, OrderId, Price, Quote, Side, TimeStamp};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, VecDeque};

// ============================================================================
// Book Order
// ============================================================================

/// Resting order as the market sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOrder {
    /// Order ID
    pub order_id: OrderId,
    /// Owner
    pub agent: AgentId,
    /// Buy or Sell
    pub side: Side,
    /// Limit price, already quantized to the market tick
    pub price: Price,
    /// Remaining quantity to fill
    pub quantity: u32,
    /// Time the order reached the market
    pub submitted_at: TimeStamp,
    /// Arrival sequence within the market (breaks ties on `submitted_at`)
    pub sequence: u64,
}

impl BookOrder {
    /// Reduce quantity after partial fill
    pub fn fill(&mut self, qty: u32) {
        self.quantity = self.quantity.saturating_sub(qty);
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.quantity == 0
    }

    /// Time priority key: earlier submission first, then arrival sequence
    pub fn priority(&self) -> (TimeStamp, u64) {
        (self.submitted_at, self.sequence)
    }
}

// ============================================================================
// Order Book
// ============================================================================

/// Order book for a single market
///
/// - Bids iterate descending, asks ascending
/// - Each price level is a FIFO queue
/// - An index maps order ids to their level for withdrawal
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    bids: BTreeMap<Reverse<Price>, VecDeque<BookOrder>>,
    asks: BTreeMap<Price, VecDeque<BookOrder>>,
    index: HashMap<OrderId, (Side, Price)>,
}

impl OrderBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Get best bid price (highest buy)
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next().map(|k| k.0)
    }

    /// Get best ask price (lowest sell)
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Highest priority order on one side
    pub fn front(&self, side: Side) -> Option<&BookOrder> {
        self.level_iter(side).next().and_then(|level| level.front())
    }

    /// Total quantity resting at the best price of one side
    pub fn quantity_at_best(&self, side: Side) -> u32 {
        self.level_iter(side)
            .next()
            .map(|level| level.iter().map(|o| o.quantity).sum())
            .unwrap_or(0)
    }

    /// Total quantity resting on one side
    pub fn total_quantity(&self, side: Side) -> u64 {
        self.level_iter(side)
            .flat_map(|level| level.iter())
            .map(|o| u64::from(o.quantity))
            .sum()
    }

    /// Orders on one side in price-time priority
    pub fn orders(&self, side: Side) -> impl Iterator<Item = &BookOrder> {
        self.level_iter(side).flat_map(|level| level.iter())
    }

    /// Look up a resting order
    pub fn get(&self, order_id: OrderId) -> Option<&BookOrder> {
        let (side, price) = self.index.get(&order_id)?;
        self.level(*side, *price)?
            .iter()
            .find(|o| o.order_id == order_id)
    }

    /// Check whether an order is resting
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Number of resting orders
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Check if book is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Append an order at the back of its price level
    pub fn insert(&mut self, order: BookOrder) {
        self.index.insert(order.order_id, (order.side, order.price));
        match order.side {
            Side::Buy => self.bids.entry(Reverse(order.price)).or_default().push_back(order),
            Side::Sell => self.asks.entry(order.price).or_default().push_back(order),
        }
    }

    /// Remove `quantity` from a resting order (all of it when `None` or when
    /// it exceeds what remains). A partial removal keeps queue position.
    ///
    /// Returns the removed part, or `None` if the order is not resting.
    pub fn remove(&mut self, order_id: OrderId, quantity: Option<u32>) -> Option<BookOrder> {
        let (side, price) = *self.index.get(&order_id)?;
        let level = self.level_mut(side, price)?;
        let pos = level.iter().position(|o| o.order_id == order_id)?;

        let partial = quantity.is_some_and(|qty| qty < level[pos].quantity);
        let removed = if partial {
            let qty = quantity.unwrap_or_default();
            level[pos].fill(qty);
            BookOrder {
                quantity: qty,
                ..level[pos].clone()
            }
        } else {
            let order = level.remove(pos)?;
            self.index.remove(&order_id);
            order
        };
        self.cleanup_level(side, price);
        Some(removed)
    }

    /// Fill the highest priority order on one side by `qty`, removing it
    /// once nothing remains.
    pub fn fill_front(&mut self, side: Side, qty: u32) {
        let price = match side {
            Side::Buy => self.best_bid(),
            Side::Sell => self.best_ask(),
        };
        let Some(price) = price else { return };

        let mut finished = None;
        if let Some(level) = self.level_mut(side, price) {
            if let Some(front) = level.front_mut() {
                front.fill(qty);
                if front.is_filled() {
                    finished = level.pop_front().map(|o| o.order_id);
                }
            }
        }
        if let Some(order_id) = finished {
            self.index.remove(&order_id);
        }
        self.cleanup_level(side, price);
    }

    /// Snapshot of the best bid/ask
    pub fn quote(&self, market: MarketId, market_time: MarketTime, time: TimeStamp) -> Quote {
        Quote {
            market,
            bid: self.best_bid(),
            bid_quantity: self.quantity_at_best(Side::Buy),
            ask: self.best_ask(),
            ask_quantity: self.quantity_at_best(Side::Sell),
            market_time: Some(market_time),
            time,
        }
    }

    fn level_iter(&self, side: Side) -> Box<dyn Iterator<Item = &VecDeque<BookOrder>> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.values()),
            Side::Sell => Box::new(self.asks.values()),
        }
    }

    fn level(&self, side: Side, price: Price) -> Option<&VecDeque<BookOrder>> {
        match side {
            Side::Buy => self.bids.get(&Reverse(price)),
            Side::Sell => self.asks.get(&price),
        }
    }

    fn level_mut(&mut self, side: Side, price: Price) -> Option<&mut VecDeque<BookOrder>> {
        match side {
            Side::Buy => self.bids.get_mut(&Reverse(price)),
            Side::Sell => self.asks.get_mut(&price),
        }
    }

    fn cleanup_level(&mut self, side: Side, price: Price) {
        match side {
            Side::Buy => {
                if self.bids.get(&Reverse(price)).is_some_and(VecDeque::is_empty) {
                    self.bids.remove(&Reverse(price));
                }
            }
            Side::Sell => {
                if self.asks.get(&price).is_some_and(VecDeque::is_empty) {
                    self.asks.remove(&price);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: u64, side: Side, price: i64, quantity: u32, sequence: u64) -> BookOrder {
        BookOrder {
            order_id: OrderId(id),
            agent: AgentId(1),
            side,
            price: Price::new(price),
            quantity,
            submitted_at: TimeStamp::ZERO,
            sequence,
        }
    }

    #[test]
    fn test_best_prices_and_depth() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Buy, 99, 5, 1));
        book.insert(order(2, Side::Buy, 100, 3, 2));
        book.insert(order(3, Side::Buy, 100, 4, 3));
        book.insert(order(4, Side::Sell, 105, 2, 4));

        assert_eq!(book.best_bid(), Some(Price::new(100)));
        assert_eq!(book.best_ask(), Some(Price::new(105)));
        assert_eq!(book.quantity_at_best(Side::Buy), 7);
        assert_eq!(book.total_quantity(Side::Buy), 12);
        assert_eq!(book.front(Side::Buy).map(|o| o.order_id), Some(OrderId(2)));

        let priority: Vec<u64> = book.orders(Side::Buy).map(|o| o.order_id.0).collect();
        assert_eq!(priority, vec![2, 3, 1]);
    }

    #[test]
    fn test_partial_remove_keeps_position() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Sell, 100, 10, 1));
        book.insert(order(2, Side::Sell, 100, 10, 2));

        let removed = book.remove(OrderId(1), Some(4)).unwrap();
        assert_eq!(removed.quantity, 4);
        assert_eq!(book.front(Side::Sell).map(|o| (o.order_id, o.quantity)), Some((OrderId(1), 6)));

        let removed = book.remove(OrderId(1), Some(50)).unwrap();
        assert_eq!(removed.quantity, 6);
        assert!(!book.contains(OrderId(1)));
        assert_eq!(book.order_count(), 1);
        assert!(book.remove(OrderId(1), None).is_none());
    }

    #[test]
    fn test_fill_front_cleans_levels() {
        let mut book = OrderBook::new();
        book.insert(order(1, Side::Sell, 100, 3, 1));
        book.insert(order(2, Side::Sell, 101, 3, 2));

        book.fill_front(Side::Sell, 2);
        assert_eq!(book.get(OrderId(1)).map(|o| o.quantity), Some(1));

        book.fill_front(Side::Sell, 1);
        assert!(!book.contains(OrderId(1)));
        assert_eq!(book.best_ask(), Some(Price::new(101)));

        book.fill_front(Side::Sell, 3);
        assert!(book.is_empty());
        assert_eq!(book.best_ask(), None);
    }
}
