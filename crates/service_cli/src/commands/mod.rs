//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod gbm;
pub mod pi;

/// Output format shared by all commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Pretty-printed JSON document
    Json,
    /// Comma-separated values with a header row
    Csv,
}
