//! Processing strategy module for script replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering both CSV parsing and registry execution. Different
//! implementations (synchronous, asynchronous batch) can be selected at runtime.

use crate::cli::StrategyType;
use crate::io::csv_format::write_properties_csv;
use crate::types::{Amount, Identity, Property, PropertySold, RegistryError};
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Final state of a replay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    /// Every property, in creation order
    pub properties: Vec<Property>,

    /// Ledger positions, sorted by identity
    pub balances: Vec<(Identity, Amount)>,

    /// Completed purchases
    pub sales: Vec<PropertySold>,
}

/// Complete replay pipeline
///
/// Rejected operations and malformed rows are logged and skipped; only
/// failures to read the script are returned as errors.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the script at `input_path` against a fresh registry
    fn run(&self, input_path: &Path) -> Result<RegistrySnapshot, RegistryError>;

    /// Replay the script and write the resulting properties CSV to `output`
    fn process(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RegistrySnapshot, RegistryError> {
        let snapshot = self.run(input_path)?;
        write_properties_csv(&snapshot.properties, output)?;
        Ok(snapshot)
    }
}

/// Create a processing strategy based on the strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of strategy to create
/// * `config` - Optional batch configuration (only used by the async strategy)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_create_strategy_replays_script(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy_type: StrategyType,
    ) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"type,caller,property,beneficiary,amount,category,images,address,description,listed\n\
              add,1,,,100,House,,1 Elm St,,\n\
              buy,2,1,,100,,,,,\n",
        )
        .unwrap();
        file.flush().unwrap();

        let strategy = create_strategy(strategy_type, Some(BatchConfig::new(1, 2)));
        let mut output = Vec::new();
        let snapshot = strategy.process(file.path(), &mut output).unwrap();

        assert_eq!(snapshot.properties[0].owner, 2);
        assert_eq!(snapshot.sales.len(), 1);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,owner,price,listed,category,images,address,description\n\
             1,2,100.0000,true,House,,1 Elm St,\n"
        );
    }
}
