//! Per-call types shared by the store, the escrow engine and the ledger

use super::property::{Amount, Identity};
use rust_decimal::Decimal;

/// What the host supplies with every call
///
/// `caller` is the identity attempting the operation and `tendered` the
/// value attached to it (zero for anything but a purchase).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallContext {
    pub caller: Identity,
    pub tendered: Amount,
}

impl CallContext {
    /// A call that carries no value
    pub fn unpaid(caller: Identity) -> Self {
        CallContext {
            caller,
            tendered: Decimal::ZERO,
        }
    }

    /// A call carrying `tendered` value
    pub fn new(caller: Identity, tendered: Amount) -> Self {
        CallContext { caller, tendered }
    }
}

/// Outcome of a successful purchase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// Exactly the price, paid to the previous owner
    pub seller_payout: Amount,

    /// Exactly `tendered - price`, returned to the payer
    pub refund: Amount,
}

/// Proof of one completed value movement
///
/// Handed back to `ValueTransfer::reverse` when a later step of the same
/// purchase fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferReceipt {
    pub recipient: Identity,
    pub amount: Amount,
}
