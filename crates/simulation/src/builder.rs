//! Building a simulation from a scenario file

use common::{AgentId, MarketId, Price, Side, TimeStamp};
use config::{LatencySetting, MarketType, OrderSide, SimulationConfig};
use matching_engine::Policy;
use tracing::info;

use crate::error::SimulationError;
use crate::records::OrderRequest;
use crate::simulation::Simulation;
use crate::Result;

impl Simulation {
    /// Build a simulation from a scenario: markets, the SIP, subscriptions
    /// and scheduled orders. The configuration is expected to be validated;
    /// anything that still cannot be built is an error.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let mut sim = Simulation::new(config.simulation.seed);

        for market in &config.markets {
            let tick_size = market.tick_size.unwrap_or(config.simulation.tick_size);
            let policy = match market.market_type {
                MarketType::Continuous => Policy::continuous(),
                MarketType::Call => {
                    let interval = u64::try_from(market.clear_interval).map_err(|_| {
                        SimulationError::Configuration(format!(
                            "market '{}': negative clear interval {}",
                            market.name, market.clear_interval
                        ))
                    })?;
                    Policy::call(interval, market.pricing)?
                }
            };
            sim.add_market(&market.name, tick_size, policy)?;
        }

        sim.attach_sip_with_tick(latency(&config.sip.latency, "sip.latency")?, config.simulation.tick_size)?;

        for subscription in &config.subscriptions {
            let market = market_id(&sim, &subscription.market)?;
            let agent = Some(AgentId(subscription.agent));
            if let Some(setting) = &subscription.quote_latency {
                sim.attach_quote_processor(market, latency(setting, "quote_latency")?, agent)?;
            }
            if let Some(setting) = &subscription.transaction_latency {
                sim.attach_transaction_processor(market, latency(setting, "transaction_latency")?, agent)?;
            }
        }

        for order in &config.orders {
            let side = match order.side {
                OrderSide::Buy => Side::Buy,
                OrderSide::Sell => Side::Sell,
            };
            let mut request = OrderRequest::limit(
                AgentId(order.agent),
                market_id(&sim, &order.market)?,
                side,
                Price::new(order.price),
                order.quantity,
            );
            if let Some(ticks) = order.expires_after {
                request = request.expiring_after(TimeStamp::of(ticks));
            }
            let at = TimeStamp::of(order.at);
            if order.routed {
                sim.submit_routed_order(request, at)?;
            } else {
                sim.submit_order(request, at)?;
            }
        }

        info!(
            markets = config.markets.len(),
            subscriptions = config.subscriptions.len(),
            orders = config.orders.len(),
            "Simulation built"
        );
        Ok(sim)
    }
}

fn market_id(sim: &Simulation, name: &str) -> Result<MarketId> {
    sim.market_by_name(name)
        .map(|m| m.id())
        .ok_or_else(|| SimulationError::Configuration(format!("unknown market '{name}'")))
}

fn latency(setting: &LatencySetting, field: &str) -> Result<TimeStamp> {
    match setting.ticks() {
        None => Ok(TimeStamp::IMMEDIATE),
        Some(ticks) => u64::try_from(ticks).map(TimeStamp::of).map_err(|_| {
            SimulationError::Configuration(format!("{field}: negative latency {ticks}"))
        }),
    }
}
