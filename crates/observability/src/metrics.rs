//! Prometheus metrics infrastructure
//!
//! This module provides utilities for initializing Prometheus metrics
//! and the metric set recorded by a simulation run.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Orders accepted by a market, labelled by market
pub const ORDERS_SUBMITTED: &str = "marketsim_orders_submitted_total";
/// Transactions executed, labelled by market
pub const TRANSACTIONS: &str = "marketsim_transactions_total";
/// Updates discarded as stale by any processor
pub const STALE_UPDATES: &str = "marketsim_stale_updates_total";
/// Crossed NBBOs corrected by a SIP
pub const NBBO_CROSSED: &str = "marketsim_nbbo_crossed_total";
/// Activities run by the scheduler
pub const ACTIVITIES_EXECUTED: &str = "marketsim_activities_executed_total";
/// Current logical time
pub const SIMULATION_TIME: &str = "marketsim_simulation_time_ticks";
/// Wall-clock duration of `run_until` calls
pub const RUN_DURATION: &str = "marketsim_run_duration_seconds";

/// Initialize the Prometheus metrics exporter
///
/// This starts an HTTP server on the specified port that exposes metrics
/// at the `/metrics` endpoint.
///
/// # Example
///
/// ```ignore
/// observability::metrics::init_metrics(9090)?;
/// // Metrics available at http://localhost:9090/metrics
/// ```
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(%addr, "Metrics server listening");
    Ok(())
}

/// Metrics recorded while a simulation runs
///
/// Without an installed recorder every call is a no-op, so simulations
/// can always hold one.
///
/// # Example
///
/// ```ignore
/// let metrics = SimulationMetrics::new();
/// metrics.order_submitted("nyse");
/// {
///     let _guard = RunMetricsGuard::new(&metrics);
///     // ... run the scheduler ...
/// } // Duration recorded when guard is dropped
/// ```
#[derive(Clone)]
pub struct SimulationMetrics {
    stale_updates: Counter,
    nbbo_crossed: Counter,
    activities_executed: Counter,
    simulation_time: Gauge,
    run_duration: Histogram,
}

impl SimulationMetrics {
    /// Register the simulation metric set
    pub fn new() -> Self {
        Self {
            stale_updates: counter!(STALE_UPDATES),
            nbbo_crossed: counter!(NBBO_CROSSED),
            activities_executed: counter!(ACTIVITIES_EXECUTED),
            simulation_time: gauge!(SIMULATION_TIME),
            run_duration: histogram!(RUN_DURATION),
        }
    }

    /// An order reached `market`
    pub fn order_submitted(&self, market: &str) {
        counter!(ORDERS_SUBMITTED, "market" => market.to_string()).increment(1);
    }

    /// `market` executed `count` transactions
    pub fn transactions(&self, market: &str, count: usize) {
        if count > 0 {
            counter!(TRANSACTIONS, "market" => market.to_string()).increment(count as u64);
        }
    }

    /// A processor discarded a stale update
    pub fn stale_update(&self) {
        self.stale_updates.increment(1);
    }

    /// A SIP corrected a crossed NBBO
    pub fn nbbo_crossed(&self) {
        self.nbbo_crossed.increment(1);
    }

    /// The scheduler ran `count` more activities
    pub fn activities_executed(&self, count: u64) {
        self.activities_executed.increment(count);
    }

    /// Logical clock moved to `ticks`
    pub fn set_simulation_time(&self, ticks: u64) {
        self.simulation_time.set(ticks as f64);
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimulationMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationMetrics").finish_non_exhaustive()
    }
}

/// Records the wall-clock duration of a run on drop
pub struct RunMetricsGuard<'a> {
    metrics: &'a SimulationMetrics,
    start: Instant,
}

impl<'a> RunMetricsGuard<'a> {
    /// Start timing
    pub fn new(metrics: &'a SimulationMetrics) -> Self {
        Self {
            metrics,
            start: Instant::now(),
        }
    }
}

impl Drop for RunMetricsGuard<'_> {
    fn drop(&mut self) {
        self.metrics.run_duration.record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder() {
        // Just verify it doesn't panic
        let metrics = SimulationMetrics::new();
        metrics.order_submitted("nyse");
        metrics.transactions("nyse", 3);
        metrics.stale_update();
        metrics.set_simulation_time(10);
        let _guard = RunMetricsGuard::new(&metrics);
    }
}
