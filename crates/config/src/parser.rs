use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimulationConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());
    parse_config(&content)
}

/// Parse configuration text after environment substitution
pub fn parse_config(content: &str) -> Result<SimulationConfig> {
    let substituted = substitution::substitute_env_vars(content)?;
    if substitution::has_unresolved_env_vars(&substituted)? {
        warn!("Configuration still contains unresolved environment variables");
    }

    let config: SimulationConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!(
        markets = config.markets.len(),
        orders = config.orders.len(),
        "Configuration loaded successfully"
    );
    Ok(config)
}

/// Two markets, one of each type, with a pair of crossing orders and an
/// arbitrage opportunity for a routed buyer
#[instrument]
pub fn generate_default_config() -> SimulationConfig {
    SimulationConfig {
        simulation: SimulationSettings::default(),
        sip: SipConfig {
            latency: LatencySetting::Ticks(5),
        },
        markets: vec![
            MarketConfig {
                name: "nyse".to_string(),
                market_type: MarketType::Continuous,
                clear_interval: 0,
                pricing: default_pricing(),
                tick_size: None,
            },
            MarketConfig {
                name: "batch".to_string(),
                market_type: MarketType::Call,
                clear_interval: 10,
                pricing: default_pricing(),
                tick_size: None,
            },
        ],
        subscriptions: vec![
            SubscriptionConfig {
                agent: 1,
                market: "nyse".to_string(),
                quote_latency: Some(LatencySetting::IMMEDIATE),
                transaction_latency: Some(LatencySetting::Ticks(0)),
            },
            SubscriptionConfig {
                agent: 2,
                market: "batch".to_string(),
                quote_latency: Some(LatencySetting::Ticks(2)),
                transaction_latency: Some(LatencySetting::Ticks(2)),
            },
        ],
        orders: vec![
            OrderConfig {
                at: 0,
                agent: 2,
                market: "nyse".to_string(),
                side: OrderSide::Sell,
                price: 101,
                quantity: 10,
                routed: false,
                expires_after: None,
            },
            OrderConfig {
                at: 1,
                agent: 3,
                market: "batch".to_string(),
                side: OrderSide::Sell,
                price: 99,
                quantity: 5,
                routed: false,
                expires_after: None,
            },
            OrderConfig {
                at: 20,
                agent: 1,
                market: "nyse".to_string(),
                side: OrderSide::Buy,
                price: 101,
                quantity: 8,
                routed: true,
                expires_after: Some(100),
            },
        ],
    }
}

#[instrument(skip(config))]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &SimulationConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = generate_default_config();
        let report = validate_config(&config);
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("marketsim-config-{}.yaml", std::process::id()));
        let config = generate_default_config();

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = load_config("/definitely/not/here.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_parse_with_env_default() {
        std::env::remove_var("MARKETSIM_TEST_PARSE_SEED");
        let config = parse_config(
            "simulation: { seed: ${MARKETSIM_TEST_PARSE_SEED:-9} }\nmarkets: [{ name: a, type: continuous }]\n",
        )
        .unwrap();
        assert_eq!(config.simulation.seed, 9);
    }
}
