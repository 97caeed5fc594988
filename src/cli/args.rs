//! Command-line arguments for the registry replay tool

use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Parsed command-line arguments
#[derive(Parser, Debug)]
#[command(name = "property-registry")]
#[command(about = "Replay a property registry operation script", long_about = None)]
pub struct CliArgs {
    /// Operation script to replay
    #[arg(value_name = "INPUT", help = "Path to the operation script CSV")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Replay strategy: 'sync' for single-threaded or 'async' for batched parallel replay"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads for the async strategy (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Where to write final ledger positions
    #[arg(
        long = "balances",
        value_name = "PATH",
        help = "Write ledger balances as CSV to this file"
    )]
    pub balances: Option<PathBuf>,

    #[arg(
        long = "log-level",
        value_name = "FILTER",
        default_value = "warn",
        help = "Log filter written to stderr, e.g. 'info' or 'property_registry=debug'"
    )]
    pub log_level: String,
}

/// Replay strategy selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    /// Single-threaded, one operation at a time
    Sync,
    /// Batched, properties replayed in parallel
    Async,
}

impl CliArgs {
    /// Build the batch configuration from the optional flags
    pub fn to_batch_config(&self) -> BatchConfig {
        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent_batches
                .unwrap_or(default.max_concurrent_batches),
        )
    }
}
