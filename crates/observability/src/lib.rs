//! Observability infrastructure for the market simulator
//!
//! This crate provides:
//! - Structured logging via tracing
//! - Prometheus metrics
//! - The simulation metric set
//!
//! # Quick Start
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! // Initialize logging
//! init_logging("marketsim", LogFormat::Pretty)?;
//!
//! // Initialize metrics (optional)
//! observability::metrics::init_metrics(9090)?;
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
pub use metrics::{init_metrics, RunMetricsGuard, SimulationMetrics};
