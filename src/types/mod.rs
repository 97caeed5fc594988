//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `property`: Property records and identifiers
//! - `call`: Per-call context and settlement results
//! - `event`: Events emitted by the escrow engine
//! - `operation`: Operation script steps replayed by the strategies
//! - `error`: Error types for the registry

pub mod call;
pub mod error;
pub mod event;
pub mod operation;
pub mod property;

pub use call::{CallContext, Settlement, TransferReceipt};
pub use error::RegistryError;
pub use event::PropertySold;
pub use operation::{Operation, OperationType};
pub use property::{Amount, Identity, Property, PropertyDetails, PropertyId, PropertyUpdate};
