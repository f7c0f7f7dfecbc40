//! Activities and notifications
//!
//! Everything that happens in a run is one of these values sitting on the
//! scheduler. Components never call each other directly.

use common::{AgentId, MarketId, MarketUpdate, Order, OrderId, ProcessorId, TimeStamp};
use serde::Serialize;
use std::sync::Arc;

/// Unit of work for the scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
    /// Order reaches its market
    Submit {
        /// Order as submitted
        order: Order,
    },
    /// Order is routed against the consolidated quote, then submitted
    SubmitRouted {
        /// Order addressed to its primary market
        order: Order,
    },
    /// Take some or all of a resting order off the book
    Withdraw {
        /// Order to withdraw
        order_id: OrderId,
        /// Quantity, or everything that remains
        quantity: Option<u32>,
    },
    /// Withdraw whatever is left of an order, if anything
    Expire {
        /// Order to expire
        order_id: OrderId,
    },
    /// Run a clear
    Clear {
        /// Market to clear
        market: MarketId,
    },
    /// Hand a published update to a processor
    Deliver {
        /// Receiving processor
        processor: ProcessorId,
        /// Shared snapshot
        update: Arc<MarketUpdate>,
    },
    /// Tell an agent to re-strategize
    Notify(Notification),
}

/// Message to an agent that its view of a market changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A quote processor applied a new quote
    QuoteUpdated {
        /// Subscribed agent
        agent: AgentId,
        /// Market quoted
        market: MarketId,
        /// Processor that applied the quote
        processor: ProcessorId,
        /// Delivery time
        time: TimeStamp,
    },
    /// A transaction processor learned of new trades
    TransactionsUpdated {
        /// Subscribed agent
        agent: AgentId,
        /// Market traded
        market: MarketId,
        /// Processor that applied the trades
        processor: ProcessorId,
        /// Delivery time
        time: TimeStamp,
    },
}

impl Notification {
    /// Recipient
    pub fn agent(&self) -> AgentId {
        match self {
            Notification::QuoteUpdated { agent, .. } => *agent,
            Notification::TransactionsUpdated { agent, .. } => *agent,
        }
    }

    /// Delivery time
    pub fn time(&self) -> TimeStamp {
        match self {
            Notification::QuoteUpdated { time, .. } => *time,
            Notification::TransactionsUpdated { time, .. } => *time,
        }
    }
}
