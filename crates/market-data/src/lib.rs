//! Information processors for the market simulator
//!
//! Markets publish [`common::MarketUpdate`]s; the processors in this crate
//! are the only way anyone else learns about them. Each processor sees its
//! markets through a delivery latency, so views lag and updates can arrive
//! out of order.
//!
//! # Core Components
//!
//! - [`quote_processor`] - Latest quote of one market
//! - [`transaction_processor`] - Trade log of one market
//! - [`sip`] - Consolidated NBBO and tape across markets
//! - [`staleness`] - Market-time gating and delivery times
//!
//! # Key Invariants
//!
//! - A processor never applies a quote older than one it already applied
//! - Trades are never lost to reordering
//! - A published NBBO is never crossed

pub mod error;
pub mod quote_processor;
pub mod sip;
pub mod staleness;
pub mod transaction_processor;
pub mod types;

pub use error::MarketDataError;
pub use quote_processor::QuoteProcessor;
pub use sip::Sip;
pub use staleness::{delivery_time, StalenessFilter};
pub use transaction_processor::TransactionProcessor;
pub use types::{NbboAnomaly, UpdateOutcome};

/// Result type for market data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;
