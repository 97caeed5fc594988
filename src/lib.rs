//! Property Registry Library
//!
//! # Overview
//!
//! An on-ledger style property registry: identities list properties, owners
//! rewrite them, and anyone can buy one through an escrow engine that moves
//! ownership and value as a single all-or-nothing step. Operation scripts in
//! CSV form can be replayed with a synchronous or an asynchronous strategy.
//!
//! # Architecture
//!
//! - [`types`] - Domain types (Property, CallContext, PropertySold, RegistryError)
//! - [`core`] - Business logic:
//!   - [`core::property_store`] - Id issuance and owner-gated updates
//!   - [`core::escrow`] - Atomic purchase execution
//!   - [`core::ledger`] - Value-transfer substrate with escrow holds
//!   - [`core::events`] - Purchase event sinks
//!   - [`core::registry`] - Single-threaded host
//!   - [`core::async`] - Concurrent store, ledger, engine and batch processor
//! - [`io`] - Script parsing and CSV output
//! - [`strategy`] - Replay pipelines
//! - [`cli`] - Command-line arguments
//!
//! # Purchases
//!
//! A purchase of property `id` by payer `p` for beneficiary `b` with tendered
//! value `v`:
//!
//! 1. Fails with `NotFound` if the property does not exist
//! 2. Fails with `InsufficientFunds` if `v` is below the price
//! 3. Moves ownership to `b`
//! 4. Pays the seller exactly the price and refunds `p` exactly `v - price`
//! 5. Emits a `PropertySold` event
//!
//! If a payment fails, every earlier step is undone before the error returns.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AsyncEscrowEngine, EscrowEngine, EventLog, EventSink, Ledger, PropertyStore, Registry,
    ValueTransfer,
};
pub use io::{write_balances_csv, write_properties_csv};
pub use types::{
    CallContext, Identity, Operation, Property, PropertyDetails, PropertyId, PropertySold,
    PropertyUpdate, RegistryError, Settlement,
};
