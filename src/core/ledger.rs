//! In-memory value-transfer substrate
//!
//! This module provides the `Ledger`, which stands in for the host
//! environment that moves value between identities.
//!
//! # Net Positions
//!
//! Balances are net settlement positions: every identity starts at zero, a
//! payer goes down by what it tenders and a recipient goes up by what it is
//! paid. Deposits are not modelled, so positions may be negative. A position
//! that nets back to zero is dropped, so a call whose effects were all undone
//! leaves no trace in [`Ledger::balances`].
//!
//! # Escrow Holds
//!
//! A purchase never touches the ledger directly. The host first posts the
//! tendered value into an `EscrowHold` with [`Ledger::hold`]; the escrow
//! engine then pays out of that hold through the `ValueTransfer` trait. When
//! the call ends, [`EscrowHold::release`] returns whatever was not paid out to
//! the payer, which is the whole tendered value if the purchase was rejected.

use crate::core::traits::ValueTransfer;
use crate::types::{Amount, Identity, RegistryError, TransferReceipt};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Net settlement positions per identity
#[derive(Debug, Default)]
pub struct Ledger {
    /// Map of identities to net positions
    balances: HashMap<Identity, Amount>,

    /// Identities that refuse incoming transfers
    rejecting: HashSet<Identity>,
}

impl Ledger {
    /// Create a ledger where every position is zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Net position of an identity (zero if it never moved value)
    pub fn balance(&self, identity: Identity) -> Amount {
        self.balances
            .get(&identity)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Every nonzero position, sorted by identity
    pub fn balances(&self) -> Vec<(Identity, Amount)> {
        let mut balances: Vec<(Identity, Amount)> = self
            .balances
            .iter()
            .map(|(identity, amount)| (*identity, *amount))
            .collect();
        balances.sort_by_key(|(identity, _)| *identity);
        balances
    }

    /// Make every later payment to `identity` fail
    pub fn reject_transfers_to(&mut self, identity: Identity) {
        self.rejecting.insert(identity);
    }

    pub fn rejects_transfers_to(&self, identity: Identity) -> bool {
        self.rejecting.contains(&identity)
    }

    /// Post `tendered` from `payer` into an escrow hold for one call
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `tendered` is negative
    /// - Debiting the payer would overflow
    pub fn hold(
        &mut self,
        payer: Identity,
        tendered: Amount,
    ) -> Result<EscrowHold<'_>, RegistryError> {
        if tendered < Decimal::ZERO {
            return Err(RegistryError::invalid_amount(tendered));
        }

        self.adjust(payer, -tendered, "hold")?;

        Ok(EscrowHold {
            ledger: self,
            payer,
            pot: tendered,
        })
    }

    /// Add `delta` to the position of `identity`, dropping it if it nets to zero
    fn adjust(
        &mut self,
        identity: Identity,
        delta: Amount,
        operation: &str,
    ) -> Result<(), RegistryError> {
        let updated = self
            .balance(identity)
            .checked_add(delta)
            .ok_or_else(|| RegistryError::arithmetic_overflow(operation))?;
        if updated.is_zero() {
            self.balances.remove(&identity);
        } else {
            self.balances.insert(identity, updated);
        }
        Ok(())
    }
}

/// Checks shared by every escrow hold before it pays `amount` to `recipient`
///
/// # Errors
///
/// Returns an error if:
/// - `amount` is negative
/// - `recipient` rejects transfers
/// - `amount` exceeds the value still held in `pot`
pub(crate) fn check_payment(
    recipient: Identity,
    amount: Amount,
    pot: Amount,
    recipient_rejects: bool,
) -> Result<(), RegistryError> {
    if amount < Decimal::ZERO {
        return Err(RegistryError::invalid_amount(amount));
    }
    if recipient_rejects {
        return Err(RegistryError::transfer_failed(
            recipient,
            amount,
            "recipient rejects transfers",
        ));
    }
    if amount > pot {
        return Err(RegistryError::transfer_failed(
            recipient,
            amount,
            "escrow hold cannot cover the payment",
        ));
    }
    Ok(())
}

/// Value posted by a payer for a single call
///
/// Dropping the hold has the same effect as [`EscrowHold::release`].
#[derive(Debug)]
pub struct EscrowHold<'a> {
    ledger: &'a mut Ledger,
    payer: Identity,
    pot: Amount,
}

impl EscrowHold<'_> {
    /// Value still held
    pub fn remaining(&self) -> Amount {
        self.pot
    }

    /// Return the unspent value to the payer, ending the call
    ///
    /// # Returns
    ///
    /// The amount handed back
    pub fn release(mut self) -> Amount {
        self.return_pot()
    }

    fn return_pot(&mut self) -> Amount {
        let amount = std::mem::replace(&mut self.pot, Decimal::ZERO);
        if !amount.is_zero() {
            // Cannot overflow: the same amount was debited in `hold`
            let _ = self.ledger.adjust(self.payer, amount, "release");
        }
        amount
    }
}

impl Drop for EscrowHold<'_> {
    fn drop(&mut self) {
        self.return_pot();
    }
}

impl ValueTransfer for EscrowHold<'_> {
    fn pay_to(
        &mut self,
        recipient: Identity,
        amount: Amount,
    ) -> Result<TransferReceipt, RegistryError> {
        check_payment(
            recipient,
            amount,
            self.pot,
            self.ledger.rejects_transfers_to(recipient),
        )?;

        self.ledger.adjust(recipient, amount, "pay_to")?;
        self.pot -= amount;

        debug!(recipient, amount = %amount, "value transferred");
        Ok(TransferReceipt { recipient, amount })
    }

    fn reverse(&mut self, receipt: TransferReceipt) -> Result<(), RegistryError> {
        self.ledger
            .adjust(receipt.recipient, -receipt.amount, "reverse")?;
        self.pot += receipt.amount;

        debug!(recipient = receipt.recipient, amount = %receipt.amount, "transfer reversed");
        Ok(())
    }
}
