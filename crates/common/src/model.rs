//! Shared market data model
//!
//! Everything here is a value: orders, quotes and transactions are copied
//! between components, never shared by reference into a live book.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::price::Price;
use crate::time::{MarketTime, TimeStamp};
use crate::types::{AgentId, MarketId, OrderId, Side, TransactionId};

// ============================================================================
// Order
// ============================================================================

/// Immutable order submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: OrderId,
    /// Submitting agent
    pub agent: AgentId,
    /// Market the order is sent to
    pub market: MarketId,
    /// Buy or Sell
    pub side: Side,
    /// Limit price
    pub price: Price,
    /// Original quantity
    pub quantity: u32,
    /// Time the agent created the order
    pub created_at: TimeStamp,
}

impl Order {
    /// Reject orders that can never rest on a book
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(Error::invalid_input(format!(
                "{} has non-positive quantity",
                self.id
            )));
        }
        if !self.price.is_valid_limit() {
            return Err(Error::invalid_input(format!(
                "{} has price {} outside [{}, {}]",
                self.id,
                self.price,
                Price::MIN_LIMIT,
                Price::MAX_LIMIT
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Quote
// ============================================================================

/// Best bid/ask snapshot of one market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Market quoted
    pub market: MarketId,
    /// Best bid, absent when no buy orders rest
    pub bid: Option<Price>,
    /// Quantity at the best bid
    pub bid_quantity: u32,
    /// Best ask, absent when no sell orders rest
    pub ask: Option<Price>,
    /// Quantity at the best ask
    pub ask_quantity: u32,
    /// Mutation that produced this quote, absent for the initial empty quote
    pub market_time: Option<MarketTime>,
    /// Simulation time the quote was taken
    pub time: TimeStamp,
}

impl Quote {
    /// Quote of an empty book
    pub fn empty(market: MarketId) -> Self {
        Self {
            market,
            bid: None,
            bid_quantity: 0,
            ask: None,
            ask_quantity: 0,
            market_time: None,
            time: TimeStamp::ZERO,
        }
    }

    /// Best price on one side
    pub fn price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bid,
            Side::Sell => self.ask,
        }
    }

    /// Quantity at the best price on one side
    pub fn quantity(&self, side: Side) -> u32 {
        match side {
            Side::Buy => self.bid_quantity,
            Side::Sell => self.ask_quantity,
        }
    }

    /// Ask minus bid when both sides are present
    pub fn spread(&self) -> Option<i64> {
        spread(self.bid, self.ask)
    }

    /// Midpoint of bid and ask when both sides are present
    pub fn midquote(&self) -> Option<Price> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => bid.midpoint(ask).ok(),
            _ => None,
        }
    }

    /// Returns true when bid exceeds ask
    pub fn is_crossed(&self) -> bool {
        matches!((self.bid, self.ask), (Some(bid), Some(ask)) if bid > ask)
    }
}

fn spread(bid: Option<Price>, ask: Option<Price>) -> Option<i64> {
    match (bid, ask) {
        (Some(bid), Some(ask)) => ask.checked_sub(bid).ok().map(|p| p.ticks()),
        _ => None,
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// Matched trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID
    pub id: TransactionId,
    /// Market the trade executed in
    pub market: MarketId,
    /// Buying agent
    pub buyer: AgentId,
    /// Selling agent
    pub seller: AgentId,
    /// Buy order
    pub buy_order: OrderId,
    /// Sell order
    pub sell_order: OrderId,
    /// Execution price
    pub price: Price,
    /// Executed quantity
    pub quantity: u32,
    /// Execution time
    pub executed_at: TimeStamp,
    /// Time the buy order reached the market
    pub buy_submitted_at: TimeStamp,
    /// Time the sell order reached the market
    pub sell_submitted_at: TimeStamp,
}

// ============================================================================
// Best Bid/Ask
// ============================================================================

/// Best bid and offer across several markets. Each side may come from a
/// different market.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestBidAsk {
    /// Best bid across markets
    pub bid: Option<Price>,
    /// Quantity at the best bid
    pub bid_quantity: u32,
    /// Market offering the best bid
    pub bid_market: Option<MarketId>,
    /// Best ask across markets
    pub ask: Option<Price>,
    /// Quantity at the best ask
    pub ask_quantity: u32,
    /// Market offering the best ask
    pub ask_market: Option<MarketId>,
}

impl BestBidAsk {
    /// Best price on one side
    pub fn price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bid,
            Side::Sell => self.ask,
        }
    }

    /// Quantity at the best price on one side
    pub fn quantity(&self, side: Side) -> u32 {
        match side {
            Side::Buy => self.bid_quantity,
            Side::Sell => self.ask_quantity,
        }
    }

    /// Market supplying the best price on one side
    pub fn market(&self, side: Side) -> Option<MarketId> {
        match side {
            Side::Buy => self.bid_market,
            Side::Sell => self.ask_market,
        }
    }

    /// Ask minus bid when both sides are present
    pub fn spread(&self) -> Option<i64> {
        spread(self.bid, self.ask)
    }

    /// Returns true when bid exceeds ask
    pub fn is_crossed(&self) -> bool {
        matches!((self.bid, self.ask), (Some(bid), Some(ask)) if bid > ask)
    }
}

// ============================================================================
// Market Update
// ============================================================================

/// What a market publishes after one mutation: its new quote plus any
/// transactions the mutation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketUpdate {
    /// Publishing market
    pub market: MarketId,
    /// Mutation that produced this update
    pub market_time: MarketTime,
    /// Quote after the mutation
    pub quote: Quote,
    /// Transactions created by the mutation
    pub transactions: Vec<Transaction>,
}
