//! MarketSim Binary
//!
//! Entry point for running, validating and initializing simulation
//! scenarios.

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use common::TimeStamp;
use config::{generate_default_config, load_config, save_config, validate_config, SimulationConfig};
use observability::{init_logging, init_metrics, LogFormat};
use simulation::{RunSummary, Simulation};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let format = LogFormat::parse(cli.log_format.as_str()).unwrap_or_default();
    init_logging("marketsim", format)?;
    debug!(?cli, "CLI arguments parsed");

    match cli.command {
        Commands::Run {
            config,
            until,
            seed,
            metrics_port,
            output,
        } => {
            info!("Executing 'run' command");
            run_command(config, until, seed, metrics_port, output).await
        }
        Commands::Validate { config } => {
            info!("Executing 'validate' command");
            validate_command(config).await
        }
        Commands::Init { output } => {
            info!("Executing 'init' command");
            init_command(output).await
        }
    }
}

/// Load a scenario and refuse to go on if it has errors
fn load_valid_config(config_path: &Path) -> Result<SimulationConfig> {
    let config = load_config(config_path)?;
    let report = validate_config(&config);

    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot run simulation due to configuration errors");
    }
    Ok(config)
}

async fn run_command(
    config_path: PathBuf,
    until: Option<u64>,
    seed: Option<u64>,
    metrics_port: Option<u16>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_valid_config(&config_path)?;
    if let Some(seed) = seed {
        debug!(seed, "Overriding scenario seed");
        config.simulation.seed = seed;
    }
    let deadline = until.unwrap_or(config.simulation.duration);

    if let Some(port) = metrics_port {
        init_metrics(port)?;
    }

    info!(
        seed = config.simulation.seed,
        deadline,
        markets = config.markets.len(),
        orders = config.orders.len(),
        "Starting simulation"
    );

    let summary = tokio::task::spawn_blocking(move || -> Result<RunSummary> {
        let mut sim = Simulation::from_config(&config).context("Failed to build simulation")?;
        sim.run_until(TimeStamp::of(deadline))
            .context("Simulation aborted")?;
        Ok(sim.summary())
    })
    .await
    .context("Simulation task panicked")??;

    info!(
        end_time = %summary.end_time,
        activities = summary.activities_executed,
        transactions = summary.tape.len(),
        anomalies = summary.anomalies.len(),
        "Simulation finished"
    );

    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write run summary: {:?}", path))?;
            println!("[ok] Run summary written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    // Print summary
    println!("\n=== Scenario Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Scenario is valid!");
    println!();
    println!("Seed: {}", config.simulation.seed);
    println!("Duration: {} ticks", config.simulation.duration);
    println!("Markets: {}", config.markets.len());
    for market in &config.markets {
        println!("  - {} ({:?})", market.name, market.market_type);
    }
    println!("Subscriptions: {}", config.subscriptions.len());
    println!("Scheduled orders: {}", config.orders.len());

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new scenario file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }

    save_config(&config, output_path)?;

    println!("[ok] Scenario file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("This scenario includes:");
    println!("  - A continuous market (nyse) and a call market (batch)");
    println!("  - A SIP with a 5-tick delay");
    println!("  - A routed order that trades on the stale consolidated quote");
    println!();
    println!("Next steps:");
    println!(
        "  1. Run 'marketsim validate --config {:?}' to check the scenario",
        output_path
    );
    println!(
        "  2. Run 'marketsim run --config {:?}' to simulate it",
        output_path
    );

    Ok(())
}
