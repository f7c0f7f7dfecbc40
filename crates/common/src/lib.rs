//! Common types for the market simulator
//!
//! This crate provides the primitives and data model shared by every other
//! crate in the workspace.
//!
//! # Modules
//!
//! - [`price`] - Fixed-point [`Price`] with infinite sentinels
//! - [`time`] - Logical [`TimeStamp`], per-market [`MarketTime`]
//! - [`types`] - Arena identifiers and [`Side`]
//! - [`model`] - Orders, quotes, transactions, NBBO snapshots
//! - [`error`] - Common error types

pub mod error;
pub mod model;
pub mod price;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use model::{BestBidAsk, MarketUpdate, Order, Quote, Transaction};
pub use price::Price;
pub use time::{MarketClock, MarketTime, TimeStamp};
pub use types::*;
