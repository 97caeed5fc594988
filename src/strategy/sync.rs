//! Synchronous processing strategy
//!
//! Single-threaded replay: the `SyncReader` streams operations one at a time
//! into a `Registry`, which applies each one before the next is read.

use crate::core::Registry;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, RegistrySnapshot};
use crate::types::RegistryError;
use std::path::Path;
use tracing::{info, warn};

/// Synchronous, single-threaded processing strategy
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl ProcessingStrategy for SyncProcessingStrategy {
    fn run(&self, input_path: &Path) -> Result<RegistrySnapshot, RegistryError> {
        let mut registry = Registry::new();
        let reader = SyncReader::new(input_path)?;

        let mut rejected = 0usize;
        for result in reader {
            match result {
                Ok(operation) => {
                    if let Err(e) = registry.process(&operation) {
                        rejected += 1;
                        warn!(
                            operation = operation.op_type().as_str(),
                            error = %e,
                            "operation rejected"
                        );
                    }
                }
                Err(e) => warn!(error = %e, "skipping malformed row"),
            }
        }

        let snapshot = RegistrySnapshot {
            properties: registry.engine().get_all_properties(),
            balances: registry.ledger().balances(),
            sales: registry.drain_events(),
        };

        info!(
            properties = snapshot.properties.len(),
            sales = snapshot.sales.len(),
            rejected,
            "replay finished"
        );
        Ok(snapshot)
    }
}
