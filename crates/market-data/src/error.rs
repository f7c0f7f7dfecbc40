//! Market data error types

use common::MarketId;
use thiserror::Error;

/// Errors that can occur while processing market updates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Update delivered to a processor that follows another market
    #[error("Update from {got} delivered to processor for {expected}")]
    WrongMarket {
        /// Market the processor follows
        expected: MarketId,
        /// Market that published the update
        got: MarketId,
    },

    /// Update from a market the consolidator was never told about
    #[error("Update from unregistered source {0}")]
    UnknownSource(MarketId),

    /// Time or price arithmetic failed
    #[error(transparent)]
    Primitive(#[from] common::Error),
}
