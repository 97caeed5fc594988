//! Concurrent implementations of core components
//!
//! This module provides thread-safe versions of the registry components for
//! running outside a host that serializes every call.
//!
//! # Architecture
//!
//! The concurrent implementations keep the contracts of the synchronous
//! versions but use concurrent data structures:
//!
//! - **ConcurrentPropertyStore**: Property records in a DashMap, ids from an atomic counter
//! - **ConcurrentLedger**: Net positions in a DashMap
//! - **AsyncEscrowEngine**: Purchases executed inside the property's critical section
//! - **BatchProcessor**: Replays operation batches, partitioned by property id
//!
//! # Thread Safety
//!
//! `update_property` and `buy_property` run while holding the DashMap entry
//! guard of their property, which gives one critical section per call keyed
//! by property id. Calls on different properties proceed in parallel.

pub mod batch_processor;
pub mod engine;
pub mod ledger;
pub mod property_store;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::AsyncEscrowEngine;
pub use ledger::{ConcurrentEscrowHold, ConcurrentLedger};
pub use property_store::ConcurrentPropertyStore;
