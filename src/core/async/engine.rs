//! Purchase orchestration for concurrent callers
//!
//! This module provides the `AsyncEscrowEngine`, which executes the same
//! purchase contract as `EscrowEngine` against a `ConcurrentPropertyStore`.
//!
//! # Architecture
//!
//! ```text
//! AsyncEscrowEngine
//!     ├── Arc<ConcurrentPropertyStore>        (thread-safe property records)
//!     └── UnboundedSender<PropertySold>       (purchase events)
//! ```
//!
//! # Thread Safety
//!
//! Validation, the ownership change and both payments run inside the
//! property's critical section (its DashMap entry guard). The event is sent
//! after the guard is released, once the purchase is final.

use std::sync::Arc;

use futures::channel::mpsc::UnboundedSender;
use tracing::{info, warn};

use super::ConcurrentPropertyStore;
use crate::core::escrow::{quote_purchase, settle};
use crate::core::traits::ValueTransfer;
use crate::types::{
    CallContext, Identity, Property, PropertyDetails, PropertyId, PropertySold, PropertyUpdate,
    RegistryError, Settlement,
};

/// Purchase engine that can be cloned and shared across tasks
#[derive(Debug, Clone)]
pub struct AsyncEscrowEngine {
    store: Arc<ConcurrentPropertyStore>,
    events: UnboundedSender<PropertySold>,
}

impl AsyncEscrowEngine {
    /// Create an engine over `store`, publishing purchases on `events`
    pub fn new(store: Arc<ConcurrentPropertyStore>, events: UnboundedSender<PropertySold>) -> Self {
        Self { store, events }
    }

    pub fn add_property(
        &self,
        ctx: &CallContext,
        details: PropertyDetails,
    ) -> Result<PropertyId, RegistryError> {
        self.store.add_property(ctx.caller, details)
    }

    pub fn update_property(
        &self,
        ctx: &CallContext,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<(), RegistryError> {
        self.store.update_property(ctx.caller, id, update)
    }

    pub fn get_property(&self, id: PropertyId) -> Result<Property, RegistryError> {
        self.store.get_property(id)
    }

    pub fn get_all_properties(&self) -> Vec<Property> {
        self.store.get_all_properties()
    }

    /// Purchase a property for `beneficiary`
    ///
    /// Same contract as `EscrowEngine::buy_property`: on error the property
    /// and every position are exactly as before the call.
    pub fn buy_property<T: ValueTransfer>(
        &self,
        ctx: &CallContext,
        id: PropertyId,
        beneficiary: Identity,
        transfer: &mut T,
    ) -> Result<Settlement, RegistryError> {
        let (seller, quote) = self.store.with_property_mut(id, |property| {
            let quote = quote_purchase(ctx, property)?;

            if !property.is_listed {
                warn!(property = id, "purchasing a property that is not listed");
            }

            let seller = std::mem::replace(&mut property.owner, beneficiary);
            if let Err(e) = settle(ctx.caller, seller, &quote, transfer) {
                property.owner = seller;
                return Err(e);
            }

            Ok((seller, quote))
        })?;

        let event = PropertySold {
            id,
            previous_owner: seller,
            new_owner: beneficiary,
            price_paid: quote.seller_payout,
        };
        if let Err(e) = self.events.unbounded_send(event) {
            warn!(error = %e, %event, "failed to publish purchase event");
        }

        info!(
            property = id,
            seller,
            beneficiary,
            payer = ctx.caller,
            price = %quote.seller_payout,
            refund = %quote.refund,
            "property sold"
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::r#async::ConcurrentLedger;
    use futures::channel::mpsc;
    use rust_decimal::Decimal;
    use std::thread;

    fn setup() -> (
        AsyncEscrowEngine,
        mpsc::UnboundedReceiver<PropertySold>,
        PropertyId,
    ) {
        let store = Arc::new(ConcurrentPropertyStore::new());
        let (sender, receiver) = mpsc::unbounded();
        let engine = AsyncEscrowEngine::new(store, sender);
        let id = engine
            .add_property(
                &CallContext::unpaid(1),
                PropertyDetails::priced(Decimal::new(100, 0)),
            )
            .unwrap();
        (engine, receiver, id)
    }

    #[test]
    fn test_buy_settles_and_publishes_event() {
        let (engine, mut receiver, id) = setup();
        let ledger = ConcurrentLedger::new();

        let ctx = CallContext::new(2, Decimal::new(150, 0));
        let mut hold = ledger.hold(ctx.caller, ctx.tendered).unwrap();
        let settlement = engine.buy_property(&ctx, id, 3, &mut hold).unwrap();
        hold.release();

        assert_eq!(settlement.refund, Decimal::new(50, 0));
        assert_eq!(engine.get_property(id).unwrap().owner, 3);
        assert_eq!(ledger.balance(1), Decimal::new(100, 0));
        assert_eq!(ledger.balance(2), Decimal::new(-100, 0));
        assert_eq!(ledger.balance(3), Decimal::ZERO);

        drop(engine);
        let events: Vec<PropertySold> = futures::executor::block_on_stream(receiver).collect();
        assert_eq!(
            events,
            vec![PropertySold {
                id,
                previous_owner: 1,
                new_owner: 3,
                price_paid: Decimal::new(100, 0),
            }]
        );
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let (engine, receiver, id) = setup();
        let ledger = ConcurrentLedger::new();

        let ctx = CallContext::new(2, Decimal::new(90, 0));
        let mut hold = ledger.hold(ctx.caller, ctx.tendered).unwrap();
        let result = engine.buy_property(&ctx, id, 2, &mut hold);
        hold.release();

        assert!(matches!(
            result,
            Err(RegistryError::InsufficientFunds { .. })
        ));
        assert_eq!(engine.get_property(id).unwrap().owner, 1);
        assert_eq!(ledger.balance(2), Decimal::ZERO);

        drop(engine);
        assert_eq!(futures::executor::block_on_stream(receiver).count(), 0);
    }

    #[test]
    fn test_transfer_failure_restores_owner() {
        let (engine, _receiver, id) = setup();
        let ledger = ConcurrentLedger::new();
        ledger.reject_transfers_to(1);

        let ctx = CallContext::new(2, Decimal::new(100, 0));
        let mut hold = ledger.hold(ctx.caller, ctx.tendered).unwrap();
        let result = engine.buy_property(&ctx, id, 2, &mut hold);
        hold.release();

        assert!(matches!(result, Err(RegistryError::TransferFailed { .. })));
        assert_eq!(engine.get_property(id).unwrap().owner, 1);
        assert_eq!(ledger.balance(2), Decimal::ZERO);
    }

    #[test]
    fn test_closed_event_channel_does_not_roll_back() {
        let (engine, receiver, id) = setup();
        drop(receiver);
        let ledger = ConcurrentLedger::new();

        let ctx = CallContext::new(2, Decimal::new(100, 0));
        let mut hold = ledger.hold(ctx.caller, ctx.tendered).unwrap();
        let result = engine.buy_property(&ctx, id, 2, &mut hold);
        hold.release();

        assert!(result.is_ok());
        assert_eq!(engine.get_property(id).unwrap().owner, 2);
    }

    #[test]
    fn test_racing_buyers_settle_exactly_once_each() {
        // Every buyer pays the full price, so all eight purchases succeed in
        // some order.
        let (engine, receiver, id) = setup();
        let ledger = Arc::new(ConcurrentLedger::new());

        let mut handles = vec![];
        for buyer in 10..18u32 {
            let engine = engine.clone();
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                let ctx = CallContext::new(buyer, Decimal::new(100, 0));
                let mut hold = ledger.hold(ctx.caller, ctx.tendered).unwrap();
                engine.buy_property(&ctx, id, buyer, &mut hold).unwrap();
                hold.release();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        drop(engine);

        let events: Vec<PropertySold> = futures::executor::block_on_stream(receiver).collect();
        assert_eq!(events.len(), 8);
        assert_eq!(events.iter().filter(|e| e.previous_owner == 1).count(), 1);

        let total: Decimal = ledger.balances().iter().map(|(_, amount)| *amount).sum();
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(ledger.balance(1), Decimal::new(100, 0));
    }
}
