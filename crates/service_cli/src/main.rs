//! mcsim - Monte Carlo simulations from the command line
//!
//! # Commands
//!
//! - `mcsim pi` - Estimate π by sampling the unit square across parallel workers
//! - `mcsim gbm` - Simulate geometric Brownian motion price paths
//!
//! Results go to stdout (or `--output` for path matrices); logs go to stderr.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::{gbm::GbmArgs, pi::PiArgs};
use config::{build_config, CliArgs};

/// Monte Carlo simulation suite
#[derive(Parser)]
#[command(name = "mcsim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MCSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Seed for the random source (drawn from entropy when omitted)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate π with parallel Monte Carlo sampling
    Pi(PiArgs),

    /// Simulate geometric Brownian motion price paths
    Gbm(GbmArgs),
}

impl Cli {
    fn config_args(&self) -> CliArgs {
        CliArgs {
            config_file: self.config.clone(),
            log_level: self.log_level.clone(),
            seed: self.seed,
            verbose: self.verbose,
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli.config_args())?;

    init_tracing(config.log_level.as_filter_str());
    debug!(?config, "Configuration resolved");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Commands::Pi(args) => commands::pi::run(&config, args, &mut out)?,
        Commands::Gbm(args) => commands::gbm::run(&config, args, &mut out)?,
    }

    out.flush()?;
    Ok(())
}
