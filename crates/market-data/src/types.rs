//! Shared types for market data processing

use common::{AgentId, Price, TimeStamp};
use serde::{Deserialize, Serialize};

/// What a processor did with a delivered update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// State changed; `notify` is the agent to re-strategize, if any
    Applied {
        /// Subscribed agent
        notify: Option<AgentId>,
    },
    /// Fresh update that changed nothing the processor keeps
    Unchanged,
    /// Older than what the processor already applied; discarded
    Stale,
}

impl UpdateOutcome {
    /// Agent to notify, if the update was applied
    pub fn notify(&self) -> Option<AgentId> {
        match self {
            UpdateOutcome::Applied { notify } => *notify,
            UpdateOutcome::Unchanged | UpdateOutcome::Stale => None,
        }
    }

    /// Returns true when the update was discarded as stale
    pub fn is_stale(&self) -> bool {
        matches!(self, UpdateOutcome::Stale)
    }
}

/// Crossed consolidated quote that was corrected before publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NbboAnomaly {
    /// Time the crossing was observed
    pub time: TimeStamp,
    /// Best bid across sources, as received
    pub raw_bid: Price,
    /// Best ask across sources, as received
    pub raw_ask: Price,
    /// Published bid
    pub corrected_bid: Price,
    /// Published ask
    pub corrected_ask: Price,
}
