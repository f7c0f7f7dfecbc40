//! Matching engines for the market simulator
//!
//! A [`Market`] holds one order book and clears it under a [`Policy`]:
//!
//! - **Continuous** double auction: every submission triggers an immediate
//!   clear and each fill trades at the price of the order that rested first.
//! - **Call** market: orders accumulate and clear together at the next
//!   multiple of the interval, all at one uniform price. An interval of zero
//!   behaves exactly like a continuous market.
//!
//! Markets are plain state machines. They report the clears and
//! publications they need as [`MarketEffect`]s and leave timing to the
//! caller.

pub mod book;
pub mod error;
pub mod event;
pub mod log;
pub mod market;
pub mod matching;
pub mod policy;
pub mod result;

pub use book::{BookOrder, OrderBook};
pub use error::MatchingError;
pub use event::MarketEvent;
pub use log::EventLog;
pub use market::{Market, MarketEffect};
pub use policy::{Call, ClearingPolicy, Continuous, Policy};
pub use result::{Fill, MatchResult};

/// Result type for matching operations
pub type Result<T> = std::result::Result<T, MatchingError>;
