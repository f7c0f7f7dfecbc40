//! Market simulation
//!
//! Ties the scheduler, markets and information processors together:
//!
//! - [`Simulation`]: building a run, submitting orders, advancing time
//! - [`World`]: the arena every activity executes against
//! - [`router`]: redirecting orders using the consolidated quote
//! - [`RunSummary`]: serializable end-of-run report
//!
//! # Example
//!
//! ```ignore
//! use simulation::{OrderRequest, Simulation};
//!
//! let mut sim = Simulation::new(42);
//! let nyse = sim.add_market("nyse", 1, Policy::continuous())?;
//! sim.attach_sip(TimeStamp::of(5))?;
//! sim.submit_order(OrderRequest::limit(AgentId(1), nyse, Side::Buy, Price::new(100), 10), TimeStamp::of(1))?;
//! sim.run_until(TimeStamp::of(100))?;
//! ```

pub mod activity;
pub mod builder;
pub mod error;
pub mod processor;
pub mod records;
pub mod router;
pub mod simulation;
pub mod summary;
pub mod world;

pub use activity::{Activity, Notification};
pub use error::SimulationError;
pub use processor::Processor;
pub use records::{OrderLedger, OrderRecord, OrderRequest};
pub use router::{route, RoutingDecision};
pub use simulation::Simulation;
pub use summary::{MarketSummary, RunSummary};
pub use world::World;

/// Result type for simulation operations
pub type Result<T> = std::result::Result<T, SimulationError>;
