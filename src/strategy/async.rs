//! Asynchronous batch processing strategy
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (property partitioning + tokio tasks)
//!         ├── AsyncEscrowEngine (purchases inside per-property critical sections)
//!         │   └── ConcurrentPropertyStore
//!         └── ConcurrentLedger
//! ```
//!
//! Batches are replayed one after another, so the per-property order of the
//! script holds across batch boundaries. Within a batch, different properties
//! are replayed in parallel on the multi-threaded tokio runtime.

use crate::core::r#async::{
    AsyncEscrowEngine, BatchProcessor, ConcurrentLedger, ConcurrentPropertyStore,
};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{ProcessingStrategy, RegistrySnapshot};
use crate::types::{PropertySold, RegistryError};
use futures::channel::mpsc;
use futures::stream::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Configuration for batch replay
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of operations read per batch
    pub batch_size: usize,

    /// Worker threads for the tokio runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a configuration, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid worker count, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn run(&self, input_path: &Path) -> Result<RegistrySnapshot, RegistryError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| RegistryError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        runtime.block_on(async {
            let store = Arc::new(ConcurrentPropertyStore::new());
            let ledger = Arc::new(ConcurrentLedger::new());
            let (sender, events) = mpsc::unbounded::<PropertySold>();
            let engine = AsyncEscrowEngine::new(Arc::clone(&store), sender);
            let processor = BatchProcessor::new(engine, Arc::clone(&ledger));

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => RegistryError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => RegistryError::IoError {
                        message: format!("Failed to open file '{}': {}", input_path.display(), e),
                    },
                })?;

            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut rejected = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for outcome in processor.process_batch(batch).await {
                    if let Err(e) = outcome.result {
                        rejected += 1;
                        warn!(
                            operation = outcome.operation.op_type().as_str(),
                            error = %e,
                            "operation rejected"
                        );
                    }
                }
            }

            // Closes the event channel so the receiver terminates
            drop(processor);
            let sales: Vec<PropertySold> = events.collect().await;

            let snapshot = RegistrySnapshot {
                properties: store.get_all_properties(),
                balances: ledger.balances(),
                sales,
            };

            info!(
                properties = snapshot.properties.len(),
                sales = snapshot.sales.len(),
                rejected,
                "replay finished"
            );
            Ok(snapshot)
        })
    }
}
