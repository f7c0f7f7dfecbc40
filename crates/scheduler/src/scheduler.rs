//! Execution loop
//!
//! The scheduler owns the clock and the queue. Whatever an activity does is
//! up to the [`Executor`]; the scheduler only decides when it runs.

use common::TimeStamp;
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace};

use crate::error::SchedulerError;
use crate::queue::EventQueue;

/// An activity paired with the time it should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled<A> {
    /// Target time, possibly `IMMEDIATE`
    pub time: TimeStamp,
    /// Activity to run
    pub activity: A,
}

impl<A> Scheduled<A> {
    /// Run `activity` at `time`
    pub fn at(time: TimeStamp, activity: A) -> Self {
        Self { time, activity }
    }

    /// Run `activity` inside the current cascade
    pub fn immediate(activity: A) -> Self {
        Self::at(TimeStamp::IMMEDIATE, activity)
    }
}

/// Executes activities on behalf of the scheduler.
///
/// An execution returns its follow-ups rather than scheduling them, so no
/// component ever calls back into the scheduler while it runs.
pub trait Executor<A> {
    /// Error type; scheduler failures must convert into it
    type Error: From<SchedulerError>;

    /// Run one activity at `now`
    fn execute(&mut self, activity: A, now: TimeStamp) -> Result<Vec<Scheduled<A>>, Self::Error>;
}

/// Single-threaded discrete-event scheduler
pub struct Scheduler<A> {
    now: TimeStamp,
    queue: EventQueue<A>,
    /// Externally scheduled `IMMEDIATE` activities, run before the queue
    pending_immediate: VecDeque<A>,
    executed: u64,
}

impl<A: fmt::Debug> Scheduler<A> {
    /// Create a scheduler at tick zero
    pub fn new(seed: u64) -> Self {
        debug!(seed, "Scheduler created");
        Self {
            now: TimeStamp::ZERO,
            queue: EventQueue::new(seed),
            pending_immediate: VecDeque::new(),
            executed: 0,
        }
    }

    /// Current logical time
    pub fn now(&self) -> TimeStamp {
        self.now
    }

    /// Activities waiting to run
    pub fn pending(&self) -> usize {
        self.queue.len() + self.pending_immediate.len()
    }

    /// Activities executed so far, cascades included
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Queue an activity.
    ///
    /// `IMMEDIATE` runs first on the next call to [`Scheduler::run_until`];
    /// `NEVER` is dropped. Any finite time before the clock is an error.
    pub fn schedule(&mut self, activity: A, time: TimeStamp) -> Result<(), SchedulerError> {
        if time.is_immediate() {
            self.pending_immediate.push_back(activity);
            return Ok(());
        }
        if time < self.now {
            return Err(SchedulerError::ScheduledInPast {
                requested: time,
                now: self.now,
            });
        }
        if time.is_never() {
            trace!(?activity, "Dropping activity scheduled for never");
            return Ok(());
        }
        trace!(%time, ?activity, "Activity scheduled");
        self.queue.push(time, activity);
        Ok(())
    }

    /// Run `activity` now, together with its whole `IMMEDIATE` cascade
    pub fn execute_now<E: Executor<A>>(&mut self, activity: A, executor: &mut E) -> Result<(), E::Error> {
        self.cascade(activity, executor)
    }

    /// Execute every activity whose time is at or before `deadline`, then
    /// move the clock to `deadline`.
    pub fn run_until<E: Executor<A>>(&mut self, deadline: TimeStamp, executor: &mut E) -> Result<(), E::Error> {
        debug!(now = %self.now, %deadline, pending = self.pending(), "Running scheduler");
        loop {
            if let Some(activity) = self.pending_immediate.pop_front() {
                self.cascade(activity, executor)?;
                continue;
            }
            match self.queue.peek_time() {
                Some(time) if time <= deadline => {
                    if let Some((time, activity)) = self.queue.pop() {
                        if time > self.now {
                            self.now = time;
                        }
                        self.cascade(activity, executor)?;
                    }
                }
                _ => break,
            }
        }
        if deadline.is_finite() && deadline > self.now {
            self.now = deadline;
        }
        Ok(())
    }

    /// Depth-first expansion: the first `IMMEDIATE` follow-up runs (with its
    /// own follow-ups) before its siblings.
    fn cascade<E: Executor<A>>(&mut self, root: A, executor: &mut E) -> Result<(), E::Error> {
        let mut stack = vec![root];
        while let Some(activity) = stack.pop() {
            trace!(now = %self.now, ?activity, "Executing activity");
            let follow_ups = executor.execute(activity, self.now)?;
            self.executed += 1;

            let mut immediate = Vec::new();
            for Scheduled { time, activity } in follow_ups {
                if time.is_immediate() {
                    immediate.push(activity);
                } else {
                    self.schedule(activity, time)?;
                }
            }
            stack.extend(immediate.into_iter().rev());
        }
        Ok(())
    }
}

impl<A> fmt::Debug for Scheduler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field("queued", &self.queue.len())
            .field("pending_immediate", &self.pending_immediate.len())
            .field("executed", &self.executed)
            .finish()
    }
}
