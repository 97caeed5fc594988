//! Capabilities injected into the escrow engine
//!
//! The engine never moves value or publishes events itself. Both concerns are
//! supplied by the host through these traits, which keeps the engine testable
//! against a mock substrate.

use crate::types::{Amount, Identity, PropertySold, RegistryError, TransferReceipt};

/// Moves value on behalf of the current call
///
/// Implementations draw from the value the payer posted for the call.
pub trait ValueTransfer {
    /// Pay `amount` to `recipient`
    ///
    /// Invoked only after every validation of the purchase has passed.
    fn pay_to(&mut self, recipient: Identity, amount: Amount)
        -> Result<TransferReceipt, RegistryError>;

    /// Undo a payment previously made through `pay_to` in the same call
    fn reverse(&mut self, receipt: TransferReceipt) -> Result<(), RegistryError>;
}

/// Best-effort sink for purchase events
///
/// A failure here is reported to the caller of `emit` but never rolls back
/// the purchase that produced the event.
pub trait EventSink {
    fn emit(&mut self, event: PropertySold) -> Result<(), RegistryError>;
}
