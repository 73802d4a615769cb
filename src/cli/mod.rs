//! CLI interface for fxbot
//!
//! Subcommands:
//! - `run`: start the trading engine
//! - `instruments`: print the instrument registry
//! - `config`: show the effective configuration

mod instruments;
mod run;

pub use instruments::InstrumentsArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fxbot")]
#[command(about = "Forex trading bot: rolling candle windows, RSI signals, risk-bounded orders")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the trading engine
    Run(RunArgs),
    /// Print the instrument registry
    Instruments(InstrumentsArgs),
    /// Show the effective configuration
    Config,
}
