//! End-of-run report

use chrono::{DateTime, Utc};
use common::{BestBidAsk, MarketId, Quote, TimeStamp, Transaction};
use market_data::NbboAnomaly;
use matching_engine::{ClearingPolicy, Market, Policy};
use serde::Serialize;

use crate::simulation::Simulation;

/// State of one market at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub id: MarketId,
    pub name: String,
    pub policy: Policy,
    pub transactions: usize,
    /// Units traded
    pub volume: u64,
    pub quote: Quote,
    pub resting_orders: usize,
}

impl MarketSummary {
    fn of(market: &Market) -> Self {
        Self {
            id: market.id(),
            name: market.name().to_string(),
            policy: *market.policy(),
            transactions: market.transactions().len(),
            volume: market.transactions().iter().map(|t| u64::from(t.quantity)).sum(),
            quote: market.current_quote().clone(),
            resting_orders: market.book().order_count(),
        }
    }
}

/// Serializable summary of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Wall-clock time the report was produced
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub end_time: TimeStamp,
    pub activities_executed: u64,
    pub markets: Vec<MarketSummary>,
    /// Consolidated quote of the primary SIP
    pub nbbo: BestBidAsk,
    pub anomalies: Vec<NbboAnomaly>,
    /// Updates discarded as stale, over all processors
    pub stale_discards: u64,
    pub notifications: usize,
    /// Every trade in every market by execution time
    pub tape: Vec<Transaction>,
}

impl Simulation {
    /// Summarize the run so far
    pub fn summary(&self) -> RunSummary {
        let mut tape: Vec<Transaction> = self
            .markets()
            .iter()
            .flat_map(|m| m.transactions().iter().cloned())
            .collect();
        tape.sort_by_key(|t| (t.executed_at, t.id));

        let anomalies = self
            .processors()
            .iter()
            .find_map(|p| p.as_sip())
            .map(|sip| sip.anomalies().to_vec())
            .unwrap_or_default();

        RunSummary {
            generated_at: Utc::now(),
            seed: self.seed(),
            end_time: self.now(),
            activities_executed: self.executed(),
            markets: self.markets().iter().map(MarketSummary::of).collect(),
            nbbo: self.nbbo(),
            anomalies,
            stale_discards: self.processors().iter().map(|p| p.discarded()).sum(),
            notifications: self.inbox().len(),
            tape,
        }
    }
}
