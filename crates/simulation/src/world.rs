//! Simulation arena and activity dispatch
//!
//! The world owns every market, processor and order record, addressed by
//! id. It is the scheduler's [`Executor`]: each activity mutates the world
//! and answers with the activities it causes.

use common::{BestBidAsk, MarketId, MarketUpdate, Order, OrderId, ProcessorId, TimeStamp};
use market_data::{delivery_time, Sip};
use matching_engine::{Market, MarketEffect, Policy};
use observability::SimulationMetrics;
use scheduler::{Executor, Scheduled};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::activity::{Activity, Notification};
use crate::error::SimulationError;
use crate::processor::Processor;
use crate::records::{OrderLedger, OrderRecord};
use crate::router;
use crate::Result;

/// Everything a simulation run mutates
#[derive(Debug)]
pub struct World {
    markets: Vec<Market>,
    processors: Vec<Processor>,
    /// Processors subscribed to each market, indexed by market
    subscribers: Vec<Vec<ProcessorId>>,
    ledger: OrderLedger,
    inbox: Vec<Notification>,
    primary_sip: Option<ProcessorId>,
    next_order_id: u64,
    metrics: SimulationMetrics,
}

impl World {
    pub(crate) fn new(metrics: SimulationMetrics) -> Self {
        Self {
            markets: Vec::new(),
            processors: Vec::new(),
            subscribers: Vec::new(),
            ledger: OrderLedger::new(),
            inbox: Vec::new(),
            primary_sip: None,
            next_order_id: 0,
            metrics,
        }
    }

    /// All markets in id order
    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    /// Look up a market
    pub fn market(&self, id: MarketId) -> Result<&Market> {
        self.markets.get(id.index()).ok_or(SimulationError::UnknownMarket(id))
    }

    fn market_mut(&mut self, id: MarketId) -> Result<&mut Market> {
        self.markets.get_mut(id.index()).ok_or(SimulationError::UnknownMarket(id))
    }

    /// All processors in id order
    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    /// Look up a processor
    pub fn processor(&self, id: ProcessorId) -> Result<&Processor> {
        self.processors.get(id.index()).ok_or(SimulationError::UnknownProcessor(id))
    }

    fn processor_mut(&mut self, id: ProcessorId) -> Result<&mut Processor> {
        self.processors.get_mut(id.index()).ok_or(SimulationError::UnknownProcessor(id))
    }

    /// SIP used for routing
    pub fn primary_sip(&self) -> Option<&Sip> {
        self.primary_sip
            .and_then(|id| self.processors.get(id.index()))
            .and_then(Processor::as_sip)
    }

    /// Live order records
    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// Notifications delivered so far
    pub fn inbox(&self) -> &[Notification] {
        &self.inbox
    }

    pub(crate) fn drain_inbox(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.inbox)
    }

    /// Consolidated quote from the primary SIP; empty without one
    pub fn nbbo(&self) -> BestBidAsk {
        self.primary_sip().map(|sip| sip.nbbo().clone()).unwrap_or_default()
    }

    pub(crate) fn add_market(&mut self, name: &str, tick_size: u64, policy: Policy) -> Result<MarketId> {
        let id = MarketId(self.markets.len() as u32);
        self.markets.push(Market::new(id, name, tick_size, policy)?);
        self.subscribers.push(Vec::new());

        // existing SIPs consolidate every market
        let sips: Vec<ProcessorId> = self
            .processors
            .iter()
            .enumerate()
            .filter(|(_, p)| p.as_sip().is_some())
            .map(|(i, _)| ProcessorId(i as u32))
            .collect();
        for sip in sips {
            if let Some(Processor::Sip(s)) = self.processors.get_mut(sip.index()) {
                s.add_source(id);
            }
            self.subscribers[id.index()].push(sip);
        }
        Ok(id)
    }

    pub(crate) fn add_processor(&mut self, processor: Processor, markets: &[MarketId]) -> Result<ProcessorId> {
        for market in markets {
            self.market(*market)?;
        }
        let id = ProcessorId(self.processors.len() as u32);
        if processor.as_sip().is_some() && self.primary_sip.is_none() {
            self.primary_sip = Some(id);
        }
        self.processors.push(processor);
        for market in markets {
            self.subscribers[market.index()].push(id);
        }
        debug!(processor = %id, markets = markets.len(), "Processor attached");
        Ok(id)
    }

    pub(crate) fn next_order_id(&self) -> OrderId {
        OrderId(self.next_order_id + 1)
    }

    pub(crate) fn allocate_order_id(&mut self) -> OrderId {
        self.next_order_id += 1;
        OrderId(self.next_order_id)
    }

    pub(crate) fn track(&mut self, record: OrderRecord) {
        self.ledger.insert(record);
    }

    fn submit(&mut self, order: Order, now: TimeStamp) -> Result<Vec<Scheduled<Activity>>> {
        let effects = self.market_mut(order.market)?.submit(&order, now)?;
        self.metrics.order_submitted(self.market(order.market)?.name());

        let mut follow_ups = self.apply_effects(order.market, effects, now)?;
        if let Some(record) = self.ledger.get_mut(order.id) {
            record.confirmed_at = Some(now);
            record.routed_market = order.market;
            if let Some(duration) = record.expires_after {
                follow_ups.push(Scheduled::at(
                    now.plus(duration)?,
                    Activity::Expire { order_id: order.id },
                ));
            }
        }
        Ok(follow_ups)
    }

    fn route(&mut self, order: Order, now: TimeStamp) -> Result<Vec<Scheduled<Activity>>> {
        let decision = router::route(&order, &self.nbbo(), self.market(order.market)?.current_quote());
        let Some((market, quantity)) = decision.routed else {
            return Ok(vec![Scheduled::immediate(Activity::Submit { order })]);
        };

        // sent away whole, the order keeps its id
        if decision.remainder == 0 {
            return Ok(vec![Scheduled::immediate(Activity::Submit {
                order: Order { market, ..order },
            })]);
        }

        // split: the remainder keeps the id at the primary market and the
        // routed leg becomes a new order
        let expires_after = self.ledger.get(order.id).and_then(|r| r.expires_after);
        let leg = Order {
            id: self.allocate_order_id(),
            market,
            quantity,
            created_at: now,
            ..order.clone()
        };
        let mut record = OrderRecord::new(&leg, expires_after);
        record.requested_market = order.market;
        record.split_from = Some(order.id);
        self.ledger.insert(record);

        if let Some(parent) = self.ledger.get_mut(order.id) {
            parent.quantity = decision.remainder;
            parent.remaining = decision.remainder;
        }
        let rest = Order {
            quantity: decision.remainder,
            ..order
        };
        Ok(vec![
            Scheduled::immediate(Activity::Submit { order: leg }),
            Scheduled::immediate(Activity::Submit { order: rest }),
        ])
    }

    fn withdraw(
        &mut self,
        order_id: OrderId,
        quantity: Option<u32>,
        now: TimeStamp,
    ) -> Result<Vec<Scheduled<Activity>>> {
        let market = self
            .ledger
            .get(order_id)
            .ok_or(SimulationError::UnknownOrder(order_id))?
            .routed_market;
        let (removed, effects) = self.market_mut(market)?.withdraw(order_id, quantity, now)?;
        self.ledger.reduce(order_id, removed.quantity);
        self.apply_effects(market, effects, now)
    }

    fn expire(&mut self, order_id: OrderId, now: TimeStamp) -> Result<Vec<Scheduled<Activity>>> {
        let Some(record) = self.ledger.get(order_id) else {
            trace!(%order_id, "Expired order already closed");
            return Ok(Vec::new());
        };
        if !self.market(record.routed_market)?.book().contains(order_id) {
            return Ok(Vec::new());
        }
        debug!(%order_id, remaining = record.remaining, "Order expired");
        self.withdraw(order_id, None, now)
    }

    fn deliver(
        &mut self,
        id: ProcessorId,
        update: &MarketUpdate,
        now: TimeStamp,
    ) -> Result<Vec<Scheduled<Activity>>> {
        let processor = self.processor_mut(id)?;
        let anomalies = processor.as_sip().map_or(0, |sip| sip.anomalies().len());
        let outcome = processor.process(update, now)?;

        let notification = match (&*processor, outcome.notify()) {
            (Processor::Quote(_), Some(agent)) => Some(Notification::QuoteUpdated {
                agent,
                market: update.market,
                processor: id,
                time: now,
            }),
            (Processor::Transaction(_), Some(agent)) => Some(Notification::TransactionsUpdated {
                agent,
                market: update.market,
                processor: id,
                time: now,
            }),
            _ => None,
        };
        let crossed = processor.as_sip().map_or(0, |sip| sip.anomalies().len()) - anomalies;

        if outcome.is_stale() {
            self.metrics.stale_update();
        }
        for _ in 0..crossed {
            self.metrics.nbbo_crossed();
        }
        Ok(notification
            .map(|n| vec![Scheduled::immediate(Activity::Notify(n))])
            .unwrap_or_default())
    }

    /// Turn market effects into activities: clears are scheduled, and every
    /// publication is fanned out to the market's subscribers at their
    /// latencies.
    fn apply_effects(
        &mut self,
        market: MarketId,
        effects: Vec<MarketEffect>,
        now: TimeStamp,
    ) -> Result<Vec<Scheduled<Activity>>> {
        let mut follow_ups = Vec::new();
        for effect in effects {
            match effect {
                MarketEffect::Clear { at } => {
                    follow_ups.push(Scheduled::at(at, Activity::Clear { market }));
                }
                MarketEffect::Publish(update) => {
                    for transaction in &update.transactions {
                        self.ledger.apply_fill(transaction);
                    }
                    self.metrics
                        .transactions(self.market(market)?.name(), update.transactions.len());

                    for processor in &self.subscribers[market.index()] {
                        let latency = self.processor(*processor)?.latency();
                        follow_ups.push(Scheduled::at(
                            delivery_time(latency, now)?,
                            Activity::Deliver {
                                processor: *processor,
                                update: Arc::clone(&update),
                            },
                        ));
                    }
                }
            }
        }
        Ok(follow_ups)
    }
}

impl Executor<Activity> for World {
    type Error = SimulationError;

    fn execute(&mut self, activity: Activity, now: TimeStamp) -> Result<Vec<Scheduled<Activity>>> {
        match activity {
            Activity::Submit { order } => self.submit(order, now),
            Activity::SubmitRouted { order } => self.route(order, now),
            Activity::Withdraw { order_id, quantity } => self.withdraw(order_id, quantity, now),
            Activity::Expire { order_id } => self.expire(order_id, now),
            Activity::Clear { market } => {
                let effects = self.market_mut(market)?.clear(now)?;
                self.apply_effects(market, effects, now)
            }
            Activity::Deliver { processor, update } => self.deliver(processor, &update, now),
            Activity::Notify(notification) => {
                trace!(agent = %notification.agent(), "Agent notified");
                self.inbox.push(notification);
                Ok(Vec::new())
            }
        }
    }
}
