//! Common error types for the market simulator

use thiserror::Error;

use crate::price::Price;
use crate::time::TimeStamp;

/// Errors raised by the price/time primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Arithmetic attempted on a sentinel timestamp
    #[error("Invalid time arithmetic: {lhs} {op} {rhs}")]
    TimeArithmetic {
        /// Left operand
        lhs: TimeStamp,
        /// Operator
        op: &'static str,
        /// Right operand
        rhs: TimeStamp,
    },

    /// Arithmetic attempted on a sentinel price, or overflowed
    #[error("Invalid price arithmetic: {lhs} {op} {rhs}")]
    PriceArithmetic {
        /// Left operand
        lhs: Price,
        /// Operator
        op: &'static str,
        /// Right operand
        rhs: Price,
    },

    /// Invalid input was provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using the common Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
