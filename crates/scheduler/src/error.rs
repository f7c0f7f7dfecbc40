//! Scheduler error types

use common::TimeStamp;
use thiserror::Error;

/// Errors raised by the scheduler. All of them are programming errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Activity targeted a tick the clock has already passed
    #[error("Activity scheduled in the past: requested {requested}, now {now}")]
    ScheduledInPast {
        /// Requested execution time
        requested: TimeStamp,
        /// Scheduler clock
        now: TimeStamp,
    },
}
