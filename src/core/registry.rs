//! Single-threaded registry host
//!
//! This module provides the `Registry`, which plays the part of the host
//! environment for a synchronous replay: it owns the `EscrowEngine` and the
//! `Ledger`, turns each script `Operation` into a call with a `CallContext`,
//! and posts tendered value into an escrow hold for purchases.
//!
//! The mapping from operations to calls lives in [`replay`] and is shared
//! with the concurrent `BatchProcessor` through the `OperationHost` trait.

use crate::core::escrow::EscrowEngine;
use crate::core::events::EventLog;
use crate::core::ledger::Ledger;
use crate::types::{
    CallContext, Identity, Operation, PropertyDetails, PropertyId, PropertySold, PropertyUpdate,
    RegistryError,
};

/// Calls a host makes on behalf of script operations
pub(crate) trait OperationHost {
    fn add_property(
        &mut self,
        ctx: &CallContext,
        details: PropertyDetails,
    ) -> Result<PropertyId, RegistryError>;

    fn update_property(
        &mut self,
        ctx: &CallContext,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<(), RegistryError>;

    /// Fails with `NotFound` if `id` was never issued
    fn ensure_exists(&self, id: PropertyId) -> Result<(), RegistryError>;

    /// Post the tendered value into a hold, buy, then release what is left
    fn purchase(
        &mut self,
        ctx: &CallContext,
        id: PropertyId,
        beneficiary: Identity,
    ) -> Result<(), RegistryError>;

    fn reject_transfers_to(&mut self, identity: Identity);
}

/// Replay one operation against a host
///
/// A purchase of an unknown property is refused before any value is posted,
/// so `NotFound` wins over a malformed tendered value.
pub(crate) fn replay<H: OperationHost>(
    host: &mut H,
    operation: &Operation,
) -> Result<(), RegistryError> {
    match operation {
        Operation::Add { caller, details } => host
            .add_property(&CallContext::unpaid(*caller), details.clone())
            .map(|_| ()),
        Operation::Update { caller, id, update } => {
            host.update_property(&CallContext::unpaid(*caller), *id, update.clone())
        }
        Operation::Buy {
            payer,
            id,
            beneficiary,
            tendered,
        } => {
            host.ensure_exists(*id)?;
            host.purchase(&CallContext::new(*payer, *tendered), *id, *beneficiary)
        }
        Operation::RejectTransfers { identity } => {
            host.reject_transfers_to(*identity);
            Ok(())
        }
    }
}

/// Engine plus ledger, driven one operation at a time
#[derive(Debug)]
pub struct Registry {
    engine: EscrowEngine<EventLog>,
    ledger: Ledger,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            engine: EscrowEngine::new(EventLog::new()),
            ledger: Ledger::new(),
        }
    }

    /// Replay one operation
    ///
    /// # Arguments
    ///
    /// * `operation` - The script step to execute
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the call succeeded
    /// * `Err(RegistryError)` if it was rejected; registry and ledger are unchanged
    pub fn process(&mut self, operation: &Operation) -> Result<(), RegistryError> {
        replay(self, operation)
    }

    pub fn engine(&self) -> &EscrowEngine<EventLog> {
        &self.engine
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Take the purchase events recorded so far
    pub fn drain_events(&mut self) -> Vec<PropertySold> {
        self.engine.events_mut().drain()
    }
}

impl OperationHost for Registry {
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
        self.engine.store().owner_of(id).map(|_| ())
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

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn add(caller: Identity, price: i64) -> Operation {
        Operation::Add {
            caller,
            details: PropertyDetails::priced(Decimal::new(price, 0)),
        }
    }

    fn buy(payer: Identity, id: PropertyId, beneficiary: Identity, tendered: i64) -> Operation {
        Operation::Buy {
            payer,
            id,
            beneficiary,
            tendered: Decimal::new(tendered, 0),
        }
    }

    #[test]
    fn test_process_full_lifecycle() {
        let mut registry = Registry::new();

        registry.process(&add(1, 100)).unwrap();
        registry.process(&buy(2, 1, 2, 120)).unwrap();
        registry
            .process(&Operation::Update {
                caller: 2,
                id: 1,
                update: PropertyUpdate {
                    details: PropertyDetails::priced(Decimal::new(180, 0)),
                    is_listed: true,
                },
            })
            .unwrap();
        registry.process(&buy(3, 1, 4, 180)).unwrap();

        let property = registry.engine().get_property(1).unwrap();
        assert_eq!(property.owner, 4);
        assert_eq!(property.price, Decimal::new(180, 0));
        assert_eq!(
            registry.ledger().balances(),
            vec![
                (1, Decimal::new(100, 0)),
                (2, Decimal::new(80, 0)),
                (3, Decimal::new(-180, 0)),
            ]
        );
        assert_eq!(registry.drain_events().len(), 2);
    }

    #[test]
    fn test_rejected_buy_leaves_ledger_untouched() {
        let mut registry = Registry::new();
        registry.process(&add(1, 100)).unwrap();

        let result = registry.process(&buy(2, 1, 2, 99));

        assert!(matches!(
            result,
            Err(RegistryError::InsufficientFunds { .. })
        ));
        assert!(registry.ledger().balances().is_empty());
        assert!(registry.drain_events().is_empty());
    }

    #[test]
    fn test_rejected_buys_keep_earlier_positions() {
        let mut registry = Registry::new();
        registry.process(&add(1, 100)).unwrap();
        registry.process(&add(3, 50)).unwrap();
        registry.process(&buy(2, 1, 2, 100)).unwrap();
        registry
            .process(&Operation::RejectTransfers { identity: 2 })
            .unwrap();
        let before = registry.ledger().balances();

        // short tender, unknown property, then a refund the payer refuses
        assert!(registry.process(&buy(4, 2, 4, 10)).is_err());
        assert!(registry.process(&buy(9, 7, 9, 10)).is_err());
        assert!(registry.process(&buy(2, 2, 2, 80)).is_err());

        assert_eq!(registry.ledger().balances(), before);
        assert_eq!(registry.engine().get_property(2).unwrap().owner, 3);
    }

    #[test]
    fn test_buy_unknown_property_reports_not_found_first() {
        let mut registry = Registry::new();

        let result = registry.process(&Operation::Buy {
            payer: 2,
            id: 7,
            beneficiary: 2,
            tendered: Decimal::new(-5, 0),
        });

        assert_eq!(result, Err(RegistryError::not_found(7)));
        assert!(registry.ledger().balances().is_empty());
    }

    #[test]
    fn test_reject_transfers_blocks_later_sales() {
        let mut registry = Registry::new();
        registry.process(&add(1, 100)).unwrap();
        registry
            .process(&Operation::RejectTransfers { identity: 1 })
            .unwrap();

        let result = registry.process(&buy(2, 1, 2, 100));

        assert!(matches!(result, Err(RegistryError::TransferFailed { .. })));
        assert_eq!(registry.engine().get_property(1).unwrap().owner, 1);
        assert_eq!(registry.ledger().balance(2), Decimal::ZERO);
    }
}
