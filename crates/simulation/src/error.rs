//! Simulation error types

use common::{MarketId, OrderId, ProcessorId};
use market_data::MarketDataError;
use matching_engine::MatchingError;
use scheduler::SchedulerError;
use thiserror::Error;

/// Errors that abort a simulation run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Scheduling failure
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Market rejected an operation
    #[error(transparent)]
    Matching(#[from] MatchingError),

    /// Processor rejected an update
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Time or price arithmetic failed
    #[error(transparent)]
    Primitive(#[from] common::Error),

    /// Reference to a market that was never added
    #[error("Unknown market: {0}")]
    UnknownMarket(MarketId),

    /// Reference to a processor that was never attached
    #[error("Unknown processor: {0}")]
    UnknownProcessor(ProcessorId),

    /// Operation on an order with no live record
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Scenario description cannot be turned into a simulation
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}
