//! Batch replay with property-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! operations concurrently while keeping the per-property order of the input.
//!
//! # Design
//!
//! A batch is cut into segments at every barrier operation (`Add` and
//! `RejectTransfers`). Barriers run on their own, in input order, because
//! they change what later operations see: the ids issued by `Add` and the
//! recipients the ledger refuses. Between two barriers, operations are
//! partitioned by target property and each partition runs on its own tokio
//! task.
//!
//! Ledger positions are sums of settlements, so the final state does not
//! depend on how the partitions interleave.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── AsyncEscrowEngine        (property records and purchases)
//!     └── Arc<ConcurrentLedger>    (value-transfer substrate)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::{AsyncEscrowEngine, ConcurrentLedger};
use crate::core::registry::{replay, OperationHost};
use crate::types::{
    CallContext, Identity, Operation, PropertyDetails, PropertyId, PropertyUpdate, RegistryError,
};

/// Result of replaying a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Position of the operation in its batch
    pub index: usize,

    /// The operation that was replayed
    pub operation: Operation,

    /// The result of replaying it (success or the rejection)
    pub result: Result<(), RegistryError>,
}

/// Batch processor with property-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: AsyncEscrowEngine,
    ledger: Arc<ConcurrentLedger>,
}

/// An operation tagged with its position in the batch
pub type IndexedOperation = (usize, Operation);

impl BatchProcessor {
    pub fn new(engine: AsyncEscrowEngine, ledger: Arc<ConcurrentLedger>) -> Self {
        Self { engine, ledger }
    }

    /// Replay one operation against the engine and ledger
    ///
    /// For a purchase the tendered value is posted into an escrow hold first,
    /// and whatever the purchase does not pay out goes back to the payer.
    pub fn process_operation(&self, operation: &Operation) -> Result<(), RegistryError> {
        let mut host = self;
        replay(&mut host, operation)
    }

    /// Partition operations by target property, keeping input order per property
    ///
    /// Operations without a target are not expected here; they are grouped
    /// under property id 0, which is never issued.
    pub fn partition_by_property(
        &self,
        operations: Vec<IndexedOperation>,
    ) -> HashMap<PropertyId, Vec<IndexedOperation>> {
        let mut partitions: HashMap<PropertyId, Vec<IndexedOperation>> = HashMap::new();

        for (index, operation) in operations {
            partitions
                .entry(operation.target().unwrap_or(0))
                .or_default()
                .push((index, operation));
        }

        partitions
    }

    /// Replay one property's operations in order
    ///
    /// Processing continues after a rejected operation.
    pub async fn process_property_operations(
        &self,
        operations: Vec<IndexedOperation>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for (index, operation) in operations {
            let result = self.process_operation(&operation);
            results.push(ProcessingResult {
                index,
                operation,
                result,
            });
        }

        results
    }

    /// Replay a barrier-free segment, one tokio task per property
    async fn process_segment(&self, segment: Vec<IndexedOperation>) -> Vec<ProcessingResult> {
        let partitions = self.partition_by_property(segment);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_id, operations) in partitions {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_property_operations(operations).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(partition_results) => results.extend(partition_results),
                Err(e) => warn!(error = %e, "partition task failed"),
            }
        }

        results
    }

    /// Replay a batch of operations
    ///
    /// # Returns
    ///
    /// One result per replayed operation, in input order
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());
        let mut segment: Vec<IndexedOperation> = Vec::new();

        for (index, operation) in batch.into_iter().enumerate() {
            if operation.target().is_some() {
                segment.push((index, operation));
                continue;
            }

            if !segment.is_empty() {
                results.extend(self.process_segment(std::mem::take(&mut segment)).await);
            }
            let result = self.process_operation(&operation);
            results.push(ProcessingResult {
                index,
                operation,
                result,
            });
        }

        if !segment.is_empty() {
            results.extend(self.process_segment(segment).await);
        }

        results.sort_by_key(|result| result.index);
        results
    }
}

impl OperationHost for &BatchProcessor {
    fn add_property(
        &mut self,
        ctx: &CallContext,
        details: PropertyDetails,
    ) -> Result<PropertyId, RegistryError> {
        self.engine.add_property(ctx, details)
    }

    fn update_property(
        &mut self,
        ctx: &CallContext,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<(), RegistryError> {
        self.engine.update_property(ctx, id, update)
    }

    fn ensure_exists(&self, id: PropertyId) -> Result<(), RegistryError> {
        self.engine.get_property(id).map(|_| ())
    }

    fn purchase(
        &mut self,
        ctx: &CallContext,
        id: PropertyId,
        beneficiary: Identity,
    ) -> Result<(), RegistryError> {
        let mut hold = self.ledger.hold(ctx.caller, ctx.tendered)?;
        let result = self.engine.buy_property(ctx, id, beneficiary, &mut hold);
        hold.release();
        result.map(|_| ())
    }

    fn reject_transfers_to(&mut self, identity: Identity) {
        self.ledger.reject_transfers_to(identity);
    }
}
