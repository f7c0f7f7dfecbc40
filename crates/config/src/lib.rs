use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

/// Complete description of one simulation run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub sip: SipConfig,
    pub markets: Vec<MarketConfig>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionConfig>,
    #[serde(default)]
    pub orders: Vec<OrderConfig>,
}

impl SimulationConfig {
    pub fn market(&self, name: &str) -> Option<&MarketConfig> {
        self.markets.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationSettings {
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Ticks to run
    #[serde(default = "default_duration")]
    pub duration: u64,
    /// Tick size for markets that do not set their own
    #[serde(default = "default_tick_size")]
    pub tick_size: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            duration: default_duration(),
            tick_size: default_tick_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SipConfig {
    #[serde(default = "default_sip_latency")]
    pub latency: LatencySetting,
}

impl Default for SipConfig {
    fn default() -> Self {
        Self {
            latency: default_sip_latency(),
        }
    }
}

/// Delivery latency: a number of ticks, or `immediate` for delivery inside
/// the publishing cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LatencySetting {
    Ticks(i64),
    Keyword(LatencyKeyword),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyKeyword {
    Immediate,
}

impl LatencySetting {
    pub const IMMEDIATE: LatencySetting = LatencySetting::Keyword(LatencyKeyword::Immediate);

    /// Tick count, or `None` for immediate delivery
    pub fn ticks(&self) -> Option<i64> {
        match self {
            LatencySetting::Ticks(ticks) => Some(*ticks),
            LatencySetting::Keyword(LatencyKeyword::Immediate) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Continuous,
    Call,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub market_type: MarketType,
    /// Ticks between call-market clears; zero clears continuously
    #[serde(default)]
    pub clear_interval: i64,
    /// Position of the uniform call price between sell and buy limits
    #[serde(default = "default_pricing")]
    pub pricing: f64,
    #[serde(default)]
    pub tick_size: Option<u64>,
}

/// Processors attached to one market on behalf of one agent. A missing
/// latency means no processor of that kind.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubscriptionConfig {
    pub agent: u32,
    pub market: String,
    #[serde(default)]
    pub quote_latency: Option<LatencySetting>,
    #[serde(default)]
    pub transaction_latency: Option<LatencySetting>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderConfig {
    pub at: u64,
    pub agent: u32,
    pub market: String,
    pub side: OrderSide,
    pub price: i64,
    pub quantity: u32,
    /// Consult the SIP before choosing a market
    #[serde(default)]
    pub routed: bool,
    /// Withdraw whatever is left this many ticks after submission
    #[serde(default)]
    pub expires_after: Option<u64>,
}
