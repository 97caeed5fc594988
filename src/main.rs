//! Property Registry CLI
//!
//! Replays an operation script against a fresh registry and prints the
//! resulting properties.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > properties.csv
//! cargo run -- --strategy sync --balances balances.csv script.csv > properties.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 script.csv > properties.csv
//! cargo run -- --log-level info script.csv > properties.csv
//! ```
//!
//! Logs go to stderr so stdout stays pure CSV.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use property_registry::cli;
use property_registry::io::write_balances_csv;
use property_registry::strategy::{self, RegistrySnapshot};
use property_registry::types::RegistryError;
use std::path::Path;
use std::process;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let args = cli::parse_args();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = match args.strategy {
        cli::StrategyType::Async => Some(args.to_batch_config()),
        cli::StrategyType::Sync => None,
    };
    let strategy = strategy::create_strategy(args.strategy, config);

    let mut output = std::io::stdout();
    let result = strategy
        .process(&args.input_file, &mut output)
        .and_then(|snapshot| match &args.balances {
            Some(path) => write_balances(path, &snapshot),
            None => Ok(()),
        });

    if let Err(e) = result {
        error!(error = %e, "replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn write_balances(path: &Path, snapshot: &RegistrySnapshot) -> Result<(), RegistryError> {
    let mut file = std::fs::File::create(path)?;
    write_balances_csv(&snapshot.balances, &mut file)
}
