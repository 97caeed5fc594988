//! Thread-safe value-transfer substrate
//!
//! This module provides the `ConcurrentLedger`, the DashMap-backed
//! counterpart of `Ledger`. Positions, holds and rejecting recipients behave
//! exactly as in the synchronous ledger.
//!
//! Every adjustment is a signed addition applied under the entry lock of one
//! identity, so the final positions do not depend on the order in which
//! independent calls settle. A position that nets back to zero is removed
//! once the entry lock is released, unless another call moved it meanwhile.

use crate::core::ledger::check_payment;
use crate::core::traits::ValueTransfer;
use crate::types::{Amount, Identity, RegistryError, TransferReceipt};
use dashmap::{DashMap, DashSet};
use rust_decimal::Decimal;
use tracing::debug;

/// Net settlement positions per identity, safe to share across threads
#[derive(Debug, Default)]
pub struct ConcurrentLedger {
    balances: DashMap<Identity, Amount>,
    rejecting: DashSet<Identity>,
}

impl ConcurrentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net position of an identity (zero if it never moved value)
    pub fn balance(&self, identity: Identity) -> Amount {
        self.balances
            .get(&identity)
            .map(|entry| *entry.value())
            .unwrap_or(Decimal::ZERO)
    }

    /// Every nonzero position, sorted by identity
    pub fn balances(&self) -> Vec<(Identity, Amount)> {
        let mut balances: Vec<(Identity, Amount)> = self
            .balances
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        balances.sort_by_key(|(identity, _)| *identity);
        balances
    }

    /// Make every later payment to `identity` fail
    pub fn reject_transfers_to(&self, identity: Identity) {
        self.rejecting.insert(identity);
    }

    pub fn rejects_transfers_to(&self, identity: Identity) -> bool {
        self.rejecting.contains(&identity)
    }

    /// Post `tendered` from `payer` into an escrow hold for one call
    pub fn hold(
        &self,
        payer: Identity,
        tendered: Amount,
    ) -> Result<ConcurrentEscrowHold<'_>, RegistryError> {
        if tendered < Decimal::ZERO {
            return Err(RegistryError::invalid_amount(tendered));
        }

        self.adjust(payer, -tendered, "hold")?;

        Ok(ConcurrentEscrowHold {
            ledger: self,
            payer,
            pot: tendered,
        })
    }

    fn adjust(
        &self,
        identity: Identity,
        delta: Amount,
        operation: &str,
    ) -> Result<(), RegistryError> {
        let mut balance = self
            .balances
            .entry(identity)
            .or_insert(Decimal::ZERO);
        let updated = balance
            .checked_add(delta)
            .ok_or_else(|| RegistryError::arithmetic_overflow(operation))?;
        *balance = updated;
        drop(balance);

        if updated.is_zero() {
            self.balances
                .remove_if(&identity, |_, amount| amount.is_zero());
        }
        Ok(())
    }
}

/// Value posted by a payer for a single call against a `ConcurrentLedger`
///
/// Dropping the hold has the same effect as [`ConcurrentEscrowHold::release`].
#[derive(Debug)]
pub struct ConcurrentEscrowHold<'a> {
    ledger: &'a ConcurrentLedger,
    payer: Identity,
    pot: Amount,
}

impl ConcurrentEscrowHold<'_> {
    pub fn remaining(&self) -> Amount {
        self.pot
    }

    /// Return the unspent value to the payer, ending the call
    pub fn release(mut self) -> Amount {
        self.return_pot()
    }

    fn return_pot(&mut self) -> Amount {
        let amount = std::mem::replace(&mut self.pot, Decimal::ZERO);
        if !amount.is_zero() {
            let _ = self.ledger.adjust(self.payer, amount, "release");
        }
        amount
    }
}

impl Drop for ConcurrentEscrowHold<'_> {
    fn drop(&mut self) {
        self.return_pot();
    }
}

impl ValueTransfer for ConcurrentEscrowHold<'_> {
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_hold_pay_and_release() {
        let ledger = ConcurrentLedger::new();

        let mut hold = ledger.hold(1, Decimal::new(150, 0)).unwrap();
        hold.pay_to(2, Decimal::new(100, 0)).unwrap();
        assert_eq!(hold.release(), Decimal::new(50, 0));

        assert_eq!(ledger.balance(1), Decimal::new(-100, 0));
        assert_eq!(ledger.balance(2), Decimal::new(100, 0));
    }

    #[test]
    fn test_rejecting_recipient() {
        let ledger = ConcurrentLedger::new();
        ledger.reject_transfers_to(2);

        let mut hold = ledger.hold(1, Decimal::new(10, 0)).unwrap();
        let result = hold.pay_to(2, Decimal::new(10, 0));
        drop(hold);

        assert!(matches!(result, Err(RegistryError::TransferFailed { .. })));
        assert_eq!(ledger.balance(1), Decimal::ZERO);
    }

    #[test]
    fn test_reverse_restores_positions() {
        let ledger = ConcurrentLedger::new();

        let mut hold = ledger.hold(1, Decimal::new(10, 0)).unwrap();
        let receipt = hold.pay_to(2, Decimal::new(10, 0)).unwrap();
        hold.reverse(receipt).unwrap();
        hold.release();

        assert_eq!(ledger.balance(1), Decimal::ZERO);
        assert_eq!(ledger.balance(2), Decimal::ZERO);
        assert!(ledger.balances().is_empty());
    }

    #[test]
    fn test_rejected_hold_leaves_no_position() {
        let ledger = ConcurrentLedger::new();
        ledger.reject_transfers_to(2);

        let mut hold = ledger.hold(1, Decimal::new(10, 0)).unwrap();
        assert!(hold.pay_to(2, Decimal::new(10, 0)).is_err());
        hold.release();

        assert!(ledger.balances().is_empty());
    }

    #[test]
    fn test_concurrent_settlements_sum_up() {
        let ledger = Arc::new(ConcurrentLedger::new());

        let mut handles = vec![];
        for payer in 1..=4u32 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let mut hold = ledger.hold(payer, Decimal::new(3, 0)).unwrap();
                    hold.pay_to(99, Decimal::new(2, 0)).unwrap();
                    hold.release();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.balance(99), Decimal::new(800, 0));
        for payer in 1..=4u32 {
            assert_eq!(ledger.balance(payer), Decimal::new(-200, 0));
        }
        assert_eq!(ledger.balances().len(), 5);
    }
}
