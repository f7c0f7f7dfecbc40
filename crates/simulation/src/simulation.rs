//! Run orchestration
//!
//! [`Simulation`] wires markets and processors into a [`World`], feeds
//! requests to the [`Scheduler`] and drives it forward in logical time.

use common::{AgentId, BestBidAsk, MarketId, OrderId, ProcessorId, TimeStamp};
use market_data::{QuoteProcessor, Sip, TransactionProcessor};
use matching_engine::{ClearingPolicy, Market, MatchingError, Policy};
use observability::{RunMetricsGuard, SimulationMetrics};
use scheduler::{Scheduler, SchedulerError};
use tracing::{debug, info, info_span, Span};

use crate::activity::{Activity, Notification};
use crate::error::SimulationError;
use crate::processor::Processor;
use crate::records::{OrderLedger, OrderRecord, OrderRequest};
use crate::world::World;
use crate::Result;

/// A market simulation with its own clock
#[derive(Debug)]
pub struct Simulation {
    seed: u64,
    scheduler: Scheduler<Activity>,
    world: World,
    metrics: SimulationMetrics,
    span: Span,
}

impl Simulation {
    /// Create an empty simulation at tick zero. `seed` fixes the order of
    /// activities that share a tick.
    pub fn new(seed: u64) -> Self {
        let metrics = SimulationMetrics::new();
        Self {
            seed,
            scheduler: Scheduler::new(seed),
            world: World::new(metrics.clone()),
            metrics,
            span: info_span!("simulation", seed),
        }
    }

    /// Seed this run was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current logical time
    pub fn now(&self) -> TimeStamp {
        self.scheduler.now()
    }

    /// Activities waiting in the scheduler
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    /// Activities executed so far
    pub fn executed(&self) -> u64 {
        self.scheduler.executed()
    }

    /// Add a market. Every attached SIP starts consolidating it.
    pub fn add_market(&mut self, name: &str, tick_size: u64, policy: Policy) -> Result<MarketId> {
        let id = self.world.add_market(name, tick_size, policy)?;
        info!(market = %id, name, tick_size, policy = policy.name(), "Market added");
        Ok(id)
    }

    /// Attach a quote processor for `market`
    pub fn attach_quote_processor(
        &mut self,
        market: MarketId,
        latency: TimeStamp,
        subscriber: Option<AgentId>,
    ) -> Result<ProcessorId> {
        check_latency(latency)?;
        self.world.add_processor(
            Processor::Quote(QuoteProcessor::new(market, latency, subscriber)),
            &[market],
        )
    }

    /// Attach a transaction processor for `market`
    pub fn attach_transaction_processor(
        &mut self,
        market: MarketId,
        latency: TimeStamp,
        subscriber: Option<AgentId>,
    ) -> Result<ProcessorId> {
        check_latency(latency)?;
        self.world.add_processor(
            Processor::Transaction(TransactionProcessor::new(market, latency, subscriber)),
            &[market],
        )
    }

    /// Attach a SIP consolidating every market, present and future. The
    /// first SIP attached is the one routed orders consult.
    ///
    /// Crossed quotes are corrected by the smallest tick size among the
    /// markets known so far, or one tick without markets.
    pub fn attach_sip(&mut self, latency: TimeStamp) -> Result<ProcessorId> {
        let tick_size = self.world.markets().iter().map(Market::tick_size).min().unwrap_or(1);
        self.attach_sip_with_tick(latency, tick_size)
    }

    /// Attach a SIP that corrects crossed quotes by `tick_size`
    pub fn attach_sip_with_tick(&mut self, latency: TimeStamp, tick_size: u64) -> Result<ProcessorId> {
        check_latency(latency)?;
        if tick_size == 0 {
            return Err(SimulationError::Configuration(
                "SIP tick size must be positive".to_string(),
            ));
        }
        let markets: Vec<MarketId> = self.world.markets().iter().map(Market::id).collect();
        let mut sip = Sip::new(latency, tick_size);
        for market in &markets {
            sip.add_source(*market);
        }
        self.world.add_processor(Processor::Sip(sip), &markets)
    }

    /// Submit an order to its market at `time`
    pub fn submit_order(&mut self, request: OrderRequest, time: TimeStamp) -> Result<OrderRecord> {
        self.place(request, time, false)
    }

    /// Submit an order at `time`, letting the consolidated quote decide
    /// where it goes.
    ///
    /// The returned id stays with the part left at the requested market.
    /// Parts sent elsewhere are new orders, found with
    /// [`OrderLedger::legs_of`]. An order sent away whole keeps its id.
    pub fn submit_routed_order(&mut self, request: OrderRequest, time: TimeStamp) -> Result<OrderRecord> {
        self.place(request, time, true)
    }

    /// Withdraw `quantity` of a live order at `time`, or all of it for `None`
    pub fn withdraw_order(&mut self, order_id: OrderId, quantity: Option<u32>, time: TimeStamp) -> Result<()> {
        if self.world.ledger().get(order_id).is_none() {
            return Err(SimulationError::UnknownOrder(order_id));
        }
        if quantity == Some(0) {
            return Err(MatchingError::InvalidOrder("withdraw quantity must be positive".to_string()).into());
        }
        self.check_time(time)?;
        self.dispatch(Activity::Withdraw { order_id, quantity }, time)
    }

    /// Execute everything scheduled at or before `deadline`
    pub fn run_until(&mut self, deadline: TimeStamp) -> Result<()> {
        let _enter = self.span.enter();
        let _guard = RunMetricsGuard::new(&self.metrics);
        let before = self.scheduler.executed();

        self.scheduler.run_until(deadline, &mut self.world)?;

        let executed = self.scheduler.executed() - before;
        self.metrics.activities_executed(executed);
        if let Some(ticks) = self.scheduler.now().ticks() {
            self.metrics.set_simulation_time(ticks);
        }
        debug!(now = %self.scheduler.now(), executed, "Run complete");
        Ok(())
    }

    /// All markets in id order
    pub fn markets(&self) -> &[Market] {
        self.world.markets()
    }

    /// Look up a market
    pub fn market(&self, id: MarketId) -> Result<&Market> {
        self.world.market(id)
    }

    /// Look up a market by name
    pub fn market_by_name(&self, name: &str) -> Option<&Market> {
        self.world.markets().iter().find(|m| m.name() == name)
    }

    /// All processors in id order
    pub fn processors(&self) -> &[Processor] {
        self.world.processors()
    }

    /// Look up a processor
    pub fn processor(&self, id: ProcessorId) -> Result<&Processor> {
        self.world.processor(id)
    }

    /// Look up a SIP
    pub fn sip(&self, id: ProcessorId) -> Result<&Sip> {
        self.processor(id)?
            .as_sip()
            .ok_or(SimulationError::UnknownProcessor(id))
    }

    /// Consolidated quote routed orders currently see
    pub fn nbbo(&self) -> BestBidAsk {
        self.world.nbbo()
    }

    /// Live order records
    pub fn orders(&self) -> &OrderLedger {
        self.world.ledger()
    }

    /// Look up a live order
    pub fn order(&self, order_id: OrderId) -> Option<&OrderRecord> {
        self.world.ledger().get(order_id)
    }

    /// Notifications delivered so far
    pub fn inbox(&self) -> &[Notification] {
        self.world.inbox()
    }

    /// Take the delivered notifications, leaving the inbox empty
    pub fn take_inbox(&mut self) -> Vec<Notification> {
        self.world.drain_inbox()
    }

    /// Validate and track an order, then run or queue it. Nothing is
    /// mutated when validation fails.
    fn place(&mut self, request: OrderRequest, time: TimeStamp, routed: bool) -> Result<OrderRecord> {
        self.world.market(request.market)?;
        self.check_time(time)?;
        if let Some(duration) = request.expires_after {
            if !duration.is_finite() {
                return Err(common::Error::invalid_input(format!("expiry must be finite, got {duration}")).into());
            }
        }
        let created_at = if time.is_immediate() { self.now() } else { time };
        let order = request.to_order(self.world.next_order_id(), created_at);
        order.validate()?;

        let order = request.to_order(self.world.allocate_order_id(), created_at);
        let record = OrderRecord::new(&order, request.expires_after);
        self.world.track(record.clone());
        debug!(order_id = %order.id, market = %order.market, routed, %time, "Order placed");

        let activity = if routed {
            Activity::SubmitRouted { order }
        } else {
            Activity::Submit { order }
        };
        self.dispatch(activity, time)?;
        Ok(record)
    }

    fn check_time(&self, time: TimeStamp) -> Result<()> {
        if time.is_finite() && time < self.now() {
            return Err(SchedulerError::ScheduledInPast {
                requested: time,
                now: self.now(),
            }
            .into());
        }
        Ok(())
    }

    /// `IMMEDIATE` runs inside this call; anything else waits for the next
    /// `run_until`, so same-tick activities go through the seeded ordering.
    fn dispatch(&mut self, activity: Activity, time: TimeStamp) -> Result<()> {
        if time.is_immediate() {
            let _enter = self.span.enter();
            return self.scheduler.execute_now(activity, &mut self.world);
        }
        self.scheduler.schedule(activity, time)?;
        Ok(())
    }
}

fn check_latency(latency: TimeStamp) -> Result<()> {
    if latency.is_never() {
        return Err(SimulationError::Configuration(
            "processor latency must be finite or immediate".to_string(),
        ));
    }
    Ok(())
}
