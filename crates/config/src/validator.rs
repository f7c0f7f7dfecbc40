use crate::*;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No markets defined")]
    NoMarkets,

    #[error("Market name is required (market #{index})")]
    MissingMarketName { index: usize },

    #[error("Duplicate market name '{0}'")]
    DuplicateMarket(String),

    #[error("{context}: unknown market '{market}'")]
    UnknownMarket { context: String, market: String },

    #[error("Market '{market}': pricing must be between 0 and 1, got {pricing}")]
    InvalidPricing { market: String, pricing: f64 },

    #[error("Market '{market}': clear_interval must not be negative, got {interval}")]
    NegativeClearInterval { market: String, interval: i64 },

    #[error("{field} must be a positive integer")]
    ZeroTickSize { field: String },

    #[error("{field}: latency must not be negative, got {ticks}")]
    NegativeLatency { field: String, ticks: i64 },

    #[error("Order #{index}: quantity must be a positive integer")]
    ZeroQuantity { index: usize },

    #[error("Order #{index}: submission time {at} is beyond the simulation duration {duration}")]
    OrderAfterDuration { index: usize, at: u64, duration: u64 },
}

#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct DefaultApplied {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub defaults_applied: Vec<DefaultApplied>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            defaults_applied: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_default(&mut self, field: &str, value: &str) {
        self.defaults_applied.push(DefaultApplied {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &SimulationConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_simulation(&config.simulation, &mut report);
    check_latency("sip.latency", &config.sip.latency, &mut report);
    let markets = validate_markets(config, &mut report);
    validate_subscriptions(&config.subscriptions, &markets, &mut report);
    validate_orders(config, &markets, &mut report);

    report
}

fn validate_simulation(settings: &SimulationSettings, report: &mut ValidationReport) {
    if settings.tick_size == 0 {
        report.add_error(ValidationError::ZeroTickSize {
            field: "simulation.tick_size".to_string(),
        });
    }
}

fn validate_markets<'a>(config: &'a SimulationConfig, report: &mut ValidationReport) -> HashSet<&'a str> {
    let mut names = HashSet::new();
    if config.markets.is_empty() {
        report.add_error(ValidationError::NoMarkets);
        return names;
    }

    for (index, market) in config.markets.iter().enumerate() {
        if market.name.is_empty() {
            report.add_error(ValidationError::MissingMarketName { index });
        } else if !names.insert(market.name.as_str()) {
            report.add_error(ValidationError::DuplicateMarket(market.name.clone()));
        }

        match market.tick_size {
            Some(0) => report.add_error(ValidationError::ZeroTickSize {
                field: format!("markets.{}.tick_size", market.name),
            }),
            Some(_) => {}
            None => report.add_default(
                &format!("markets.{}.tick_size", market.name),
                &config.simulation.tick_size.to_string(),
            ),
        }

        if market.market_type != MarketType::Call {
            continue;
        }
        if !market.pricing.is_finite() || !(0.0..=1.0).contains(&market.pricing) {
            report.add_error(ValidationError::InvalidPricing {
                market: market.name.clone(),
                pricing: market.pricing,
            });
        }
        if market.clear_interval < 0 {
            report.add_error(ValidationError::NegativeClearInterval {
                market: market.name.clone(),
                interval: market.clear_interval,
            });
        } else if market.clear_interval == 0 {
            report.add_warning(
                &format!("markets.{}.clear_interval", market.name),
                "Call market with interval 0 clears continuously",
            );
        }
    }

    names
}

fn validate_subscriptions(
    subscriptions: &[SubscriptionConfig],
    markets: &HashSet<&str>,
    report: &mut ValidationReport,
) {
    for (index, subscription) in subscriptions.iter().enumerate() {
        if !markets.contains(subscription.market.as_str()) {
            report.add_error(ValidationError::UnknownMarket {
                context: format!("Subscription #{}", index),
                market: subscription.market.clone(),
            });
        }
        if let Some(latency) = &subscription.quote_latency {
            check_latency(&format!("subscriptions.{}.quote_latency", index), latency, report);
        }
        if let Some(latency) = &subscription.transaction_latency {
            check_latency(&format!("subscriptions.{}.transaction_latency", index), latency, report);
        }
        if subscription.quote_latency.is_none() && subscription.transaction_latency.is_none() {
            report.add_warning(
                &format!("subscriptions.{}", index),
                "Subscription has neither a quote nor a transaction latency",
            );
        }
    }
}

fn validate_orders(config: &SimulationConfig, markets: &HashSet<&str>, report: &mut ValidationReport) {
    if !config.orders.is_empty() && config.subscriptions.is_empty() {
        report.add_warning("subscriptions", "Orders are submitted but no agent subscribes to any market");
    }

    for (index, order) in config.orders.iter().enumerate() {
        if !markets.contains(order.market.as_str()) {
            report.add_error(ValidationError::UnknownMarket {
                context: format!("Order #{}", index),
                market: order.market.clone(),
            });
        }
        if order.quantity == 0 {
            report.add_error(ValidationError::ZeroQuantity { index });
        }
        if order.at > config.simulation.duration {
            report.add_error(ValidationError::OrderAfterDuration {
                index,
                at: order.at,
                duration: config.simulation.duration,
            });
        }
    }
}

fn check_latency(field: &str, latency: &LatencySetting, report: &mut ValidationReport) {
    if let Some(ticks) = latency.ticks() {
        if ticks < 0 {
            report.add_error(ValidationError::NegativeLatency {
                field: field.to_string(),
                ticks,
            });
        }
    }
}
