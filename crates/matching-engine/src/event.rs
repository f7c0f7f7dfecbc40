//! Event types for a market
//!
//! Every accepted mutation is recorded so a run can be audited and two runs
//! with the same seed can be compared event for event.

use common::{AgentId, MarketTime, OrderId, Price, Side, Transaction};
use serde::{Deserialize, Serialize};

/// Event in a market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    /// An order was accepted into the book
    OrderAccepted {
        /// Order ID
        order_id: OrderId,
        /// Owner
        agent: AgentId,
        /// Buy or Sell
        side: Side,
        /// Quantized limit price
        price: Price,
        /// Quantity
        quantity: u32,
        /// Market time of the submission
        market_time: MarketTime,
        /// Sequence number
        sequence: u64,
    },

    /// Some or all of a resting order was withdrawn
    OrderWithdrawn {
        /// Order ID
        order_id: OrderId,
        /// Quantity taken off the book
        quantity: u32,
        /// Market time of the withdrawal
        market_time: MarketTime,
        /// Sequence number
        sequence: u64,
    },

    /// A trade was executed
    TradeExecuted {
        /// Trade details
        transaction: Transaction,
        /// Sequence number
        sequence: u64,
    },

    /// A clear ran
    Cleared {
        /// Market time of the clear
        market_time: MarketTime,
        /// Uniform clearing price, for call markets that traded
        price: Option<Price>,
        /// Total quantity traded in the clear
        volume: u64,
        /// Sequence number
        sequence: u64,
    },
}

impl MarketEvent {
    /// Get the sequence number for this event
    pub fn sequence(&self) -> u64 {
        match self {
            MarketEvent::OrderAccepted { sequence, .. } => *sequence,
            MarketEvent::OrderWithdrawn { sequence, .. } => *sequence,
            MarketEvent::TradeExecuted { sequence, .. } => *sequence,
            MarketEvent::Cleared { sequence, .. } => *sequence,
        }
    }
}
