//! Core business logic module
//!
//! This module contains the registry components:
//! - `traits` - Capabilities injected into the escrow engine
//! - `property_store` - Property records and owner-gated mutation
//! - `escrow` - Atomic purchase execution
//! - `ledger` - In-memory value-transfer substrate with escrow holds
//! - `events` - In-memory purchase event collector
//! - `registry` - Single-threaded host driving engine and ledger
//! - `async` - Concurrent implementations

pub mod r#async;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod property_store;
pub mod registry;
pub mod traits;

pub use escrow::EscrowEngine;
pub use events::EventLog;
pub use ledger::{EscrowHold, Ledger};
pub use property_store::PropertyStore;
pub use r#async::{
    AsyncEscrowEngine, BatchProcessor, ConcurrentLedger, ConcurrentPropertyStore, ProcessingResult,
};
pub use registry::Registry;
pub use traits::{EventSink, ValueTransfer};
