//! Discrete-event scheduler
//!
//! A single-threaded execution loop over logical time.
//!
//! # Ordering
//!
//! - `IMMEDIATE` follow-ups run depth-first, in production order, inside
//!   the cascade that produced them. They never touch the queue.
//! - Everything else waits in a min-priority queue keyed by [`TimeStamp`].
//! - Activities sharing a tick are ordered by a seeded random key, so a
//!   given seed always replays the same interleaving.
//!
//! [`TimeStamp`]: common::TimeStamp

pub mod error;
pub mod queue;
pub mod scheduler;

pub use error::SchedulerError;
pub use queue::EventQueue;
pub use scheduler::{Executor, Scheduled, Scheduler};

/// Result type for scheduling operations
pub type Result<T> = std::result::Result<T, SchedulerError>;
