//! CLI configuration management
//!
//! Settings come from four sources. Priority (highest to lowest):
//! 1. Command line flags
//! 2. Environment variables (`MCSIM_LOG_LEVEL`, `MCSIM_SEED`)
//! 3. TOML config file (`--config mcsim.toml`)
//! 4. Default values (the dashboard's initial inputs)
//!
//! ```toml
//! log_level = "info"
//! seed = 42
//!
//! [pi]
//! total_samples = 1000000
//! n_workers = 4
//!
//! [gbm]
//! spot = 100.0
//! drift = 0.05
//! volatility = 0.2
//! horizon = 1.0
//! dt = 0.01
//! n_paths = 1000
//! ```

use serde::Deserialize;
use sim_engine::{GbmParams, SimRng};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Accepted sample counts for `mcsim pi`
pub const SAMPLES_RANGE: RangeInclusive<u64> = 1_000..=10_000_000;

/// Accepted parallel job counts for `mcsim pi`
pub const JOBS_RANGE: RangeInclusive<usize> = 1..=8;

/// Accepted path counts for `mcsim gbm`
pub const PATHS_RANGE: RangeInclusive<usize> = 10..=5_000;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid seed: {0}. Must be an unsigned 64-bit integer")]
    InvalidSeed(String),

    #[error("{name} = {value} is outside the accepted range {range}")]
    OutOfRange {
        name: &'static str,
        value: String,
        range: String,
    },

    #[error("Configuration file error: {0}")]
    FileError(String),
}

impl ConfigError {
    fn out_of_range<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        range: &RangeInclusive<T>,
    ) -> Self {
        ConfigError::OutOfRange {
            name,
            value: value.to_string(),
            range: format!("[{}, {}]", range.start(), range.end()),
        }
    }
}

/// Log levels accepted by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Raise the level to at least `debug`
    fn at_least_debug(self) -> Self {
        match self {
            LogLevel::Trace => LogLevel::Trace,
            _ => LogLevel::Debug,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Settings for `mcsim pi`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PiSettings {
    pub total_samples: u64,
    pub n_workers: usize,
}

impl Default for PiSettings {
    fn default() -> Self {
        Self {
            total_samples: 1_000_000,
            n_workers: 4,
        }
    }
}

impl PiSettings {
    /// Replace settings with the flags that were given
    pub fn with_overrides(mut self, total_samples: Option<u64>, n_workers: Option<usize>) -> Self {
        if let Some(total_samples) = total_samples {
            self.total_samples = total_samples;
        }
        if let Some(n_workers) = n_workers {
            self.n_workers = n_workers;
        }
        self
    }

    /// Check the settings against the accepted ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SAMPLES_RANGE.contains(&self.total_samples) {
            return Err(ConfigError::out_of_range(
                "total_samples",
                self.total_samples,
                &SAMPLES_RANGE,
            ));
        }
        if !JOBS_RANGE.contains(&self.n_workers) {
            return Err(ConfigError::out_of_range(
                "n_workers",
                self.n_workers,
                &JOBS_RANGE,
            ));
        }
        Ok(())
    }
}

/// Settings for `mcsim gbm`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GbmSettings {
    #[serde(flatten)]
    pub params: GbmParams,
    pub n_paths: usize,
}

impl Default for GbmSettings {
    fn default() -> Self {
        Self {
            params: GbmParams::default(),
            n_paths: 1_000,
        }
    }
}

/// Command line overrides for `mcsim gbm`
#[derive(Debug, Clone, Copy, Default)]
pub struct GbmOverrides {
    pub spot: Option<f64>,
    pub drift: Option<f64>,
    pub volatility: Option<f64>,
    pub horizon: Option<f64>,
    pub dt: Option<f64>,
    pub n_paths: Option<usize>,
}

impl GbmSettings {
    /// Replace settings with the flags that were given
    pub fn with_overrides(mut self, overrides: &GbmOverrides) -> Self {
        let params = &mut self.params;
        params.spot = overrides.spot.unwrap_or(params.spot);
        params.drift = overrides.drift.unwrap_or(params.drift);
        params.volatility = overrides.volatility.unwrap_or(params.volatility);
        params.horizon = overrides.horizon.unwrap_or(params.horizon);
        params.dt = overrides.dt.unwrap_or(params.dt);
        self.n_paths = overrides.n_paths.unwrap_or(self.n_paths);
        self
    }

    /// Check the path count against the accepted range.
    ///
    /// Model parameters are validated by `sim_engine`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PATHS_RANGE.contains(&self.n_paths) {
            return Err(ConfigError::out_of_range(
                "n_paths",
                self.n_paths,
                &PATHS_RANGE,
            ));
        }
        Ok(())
    }
}

/// Resolved CLI configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub log_level: LogLevel,
    /// Seed for the random source; drawn from entropy when absent
    pub seed: Option<u64>,
    pub pi: PiSettings,
    pub gbm: GbmSettings,
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))
    }

    /// Apply `MCSIM_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides from an arbitrary lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("MCSIM_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(seed) = lookup("MCSIM_SEED") {
            self.seed = Some(
                seed.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidSeed(seed.clone()))?,
            );
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if cli.verbose {
            self.log_level = self.log_level.at_least_debug();
        }
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        Ok(())
    }

    /// Random source for one command run
    pub fn rng(&self) -> SimRng {
        match self.seed {
            Some(seed) => SimRng::from_seed(seed),
            None => SimRng::from_entropy(),
        }
    }
}

/// Global CLI arguments relevant to configuration
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub seed: Option<u64>,
    pub verbose: bool,
}

/// Build configuration from all sources
pub fn build_config(cli: &CliArgs) -> Result<CliConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };

    config.apply_env()?;
    config.merge_with_cli(cli)?;

    Ok(config)
}
