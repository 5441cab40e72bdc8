//! Performance governor CLI
//!
//! A command-line tool for inspecting a running governor and feeding it
//! context, power and pressure signals by hand.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{control, health, report};

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Performance governor CLI
#[derive(Parser)]
#[command(name = "govctl")]
#[command(author, version, about = "CLI for the adaptive performance governor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via GOVCTL_URL env var or the config file)
    #[arg(long, env = "GOVCTL_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current performance report
    Report,

    /// Show component health and readiness
    Health,

    /// Declare the current activity context
    Context {
        /// idle, scorecard, navigation, health_tracking, sync or menu
        context: String,
    },

    /// Report a power mode change
    Power {
        /// normal, conservative, aggressive or extreme
        mode: String,
    },

    /// Report the battery level
    Battery {
        /// Charge percentage
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// Report a thermal state change
    Thermal {
        /// nominal, fair, serious or critical
        state: String,
    },

    /// Deliver an OS memory-pressure notification
    MemoryPressure {
        /// normal, warning or critical
        level: String,
    },

    /// Deliver a low-memory warning, forcing an emergency cleanup
    MemoryWarning,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    let api_url = cli
        .api_url
        .or_else(|| config.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let format = cli.format.unwrap_or_else(|| config.output_format());

    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Report => report::show_report(&client, format).await?,
        Commands::Health => health::show_health(&client, format).await?,
        Commands::Context { context } => control::set_context(&client, &context).await?,
        Commands::Power { mode } => control::set_power_mode(&client, &mode).await?,
        Commands::Battery { percent } => control::set_battery(&client, percent).await?,
        Commands::Thermal { state } => control::set_thermal(&client, &state).await?,
        Commands::MemoryPressure { level } => control::memory_pressure(&client, &level).await?,
        Commands::MemoryWarning => control::memory_warning(&client).await?,
    }

    Ok(())
}
