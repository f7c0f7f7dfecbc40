//! Matching engine error types

use common::{MarketId, OrderId};
use thiserror::Error;

/// Errors that can occur during order matching
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchingError {
    /// Order can never rest on this market
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Withdrawal of an order the market does not hold
    #[error("Order not found in {market}: {order_id}")]
    OrderNotFound {
        /// Market asked to withdraw
        market: MarketId,
        /// Missing order
        order_id: OrderId,
    },

    /// Market constructed with unusable parameters
    #[error("Invalid market configuration: {0}")]
    InvalidConfiguration(String),

    /// Time or price arithmetic failed
    #[error(transparent)]
    Primitive(#[from] common::Error),
}
