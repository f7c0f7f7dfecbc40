use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "marketsim")]
#[command(about = "MarketSim - A discrete-event securities market simulator")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "pretty", env = "MARKETSIM_LOG_FORMAT")]
    pub log_format: LogOutput,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario and print the run summary
    Run {
        /// Path to the scenario file
        #[arg(short, long, default_value = "marketsim.yaml")]
        config: PathBuf,

        /// Override the number of ticks to run
        #[arg(long)]
        until: Option<u64>,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Expose Prometheus metrics on this port
        #[arg(long)]
        metrics_port: Option<u16>,

        /// Write the summary here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a scenario without running it
    Validate {
        /// Path to the scenario file
        #[arg(short, long, default_value = "marketsim.yaml")]
        config: PathBuf,
    },

    /// Write an example scenario with all defaults
    Init {
        /// Output path for the new scenario file
        #[arg(short, long, default_value = "marketsim.yaml")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogOutput {
    /// Human-readable with colors
    Pretty,

    /// One JSON object per line
    Json,

    /// Single-line records
    Compact,
}

impl LogOutput {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOutput::Pretty => "pretty",
            LogOutput::Json => "json",
            LogOutput::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
