//! Atomic purchase execution
//!
//! This module provides the `EscrowEngine`, which runs a purchase as a single
//! all-or-nothing unit on top of the `PropertyStore`.
//!
//! The engine enforces:
//! - Every check before any effect: the property must exist and the tendered
//!   value must cover the price
//! - Effects before interactions: ownership moves to the beneficiary before
//!   any value is paid out
//! - Explicit rollback: if a payment fails, completed payments are reversed
//!   and the previous owner is restored before the error is returned
//!
//! Value movement and event publication are injected capabilities
//! (`ValueTransfer`, `EventSink`), never engine state.

use crate::core::property_store::PropertyStore;
use crate::core::traits::{EventSink, ValueTransfer};
use crate::types::{
    CallContext, Identity, Property, PropertyDetails, PropertyId, PropertySold, PropertyUpdate,
    RegistryError, Settlement,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

/// Purchase engine owning the property store
///
/// Store operations are forwarded so a host drives a single object.
#[derive(Debug)]
pub struct EscrowEngine<E: EventSink> {
    store: PropertyStore,
    events: E,
}

impl<E: EventSink> EscrowEngine<E> {
    /// Create an engine over an empty store
    pub fn new(events: E) -> Self {
        Self::with_store(PropertyStore::new(), events)
    }

    /// Create an engine over an existing store
    pub fn with_store(store: PropertyStore, events: E) -> Self {
        EscrowEngine { store, events }
    }

    /// Create a property owned by the caller
    pub fn add_property(
        &mut self,
        ctx: &CallContext,
        details: PropertyDetails,
    ) -> Result<PropertyId, RegistryError> {
        self.store.add_property(ctx.caller, details)
    }

    /// Rewrite a property on behalf of its owner
    pub fn update_property(
        &mut self,
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

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Purchase a property for `beneficiary`
    ///
    /// The payer is `ctx.caller` and the value offered is `ctx.tendered`,
    /// which `transfer` draws from. Any identity may buy any property; the
    /// `is_listed` flag is not checked.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Payer identity and tendered value
    /// * `id` - Property to purchase
    /// * `beneficiary` - Identity that becomes the owner
    /// * `transfer` - Value-transfer capability for this call
    ///
    /// # Returns
    ///
    /// * `Ok(Settlement)` - Seller was paid exactly the price, payer refunded exactly the excess
    /// * `Err(RegistryError)` - Nothing changed: owner, fields and value are as before the call
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The property does not exist (`NotFound`)
    /// - The tendered value is negative (`InvalidAmount`)
    /// - The tendered value is below the price (`InsufficientFunds`)
    /// - A payment to the seller or the refund to the payer fails
    pub fn buy_property<T: ValueTransfer>(
        &mut self,
        ctx: &CallContext,
        id: PropertyId,
        beneficiary: Identity,
        transfer: &mut T,
    ) -> Result<Settlement, RegistryError> {
        let property = self
            .store
            .get_property(id)
            .map_err(|e| reject("buy", e))?;
        let quote = quote_purchase(ctx, &property).map_err(|e| reject("buy", e))?;

        if !property.is_listed {
            warn!(property = id, "purchasing a property that is not listed");
        }

        // Effect first: the new owner is in place before any value moves
        let seller = self.store.set_owner(id, beneficiary)?;

        if let Err(e) = settle(ctx.caller, seller, &quote, transfer) {
            self.store.set_owner(id, seller)?;
            return Err(reject("buy", e));
        }

        let event = PropertySold {
            id,
            previous_owner: seller,
            new_owner: beneficiary,
            price_paid: quote.seller_payout,
        };
        if let Err(e) = self.events.emit(event) {
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

/// Validate the tendered value against the price and split it
///
/// Runs before any effect of a purchase.
pub(crate) fn quote_purchase(
    ctx: &CallContext,
    property: &Property,
) -> Result<Settlement, RegistryError> {
    if ctx.tendered < Decimal::ZERO {
        return Err(RegistryError::invalid_amount(ctx.tendered));
    }
    if ctx.tendered < property.price {
        return Err(RegistryError::insufficient_funds(
            property.id,
            property.price,
            ctx.tendered,
        ));
    }

    let refund = ctx
        .tendered
        .checked_sub(property.price)
        .ok_or_else(|| RegistryError::arithmetic_overflow("refund"))?;

    Ok(Settlement {
        seller_payout: property.price,
        refund,
    })
}

/// Pay the seller, then refund the payer
///
/// If the refund fails the seller payment is reversed, so on a plain transfer
/// error no value has moved. If the reversal fails as well, both failures
/// come back as `RollbackFailed` and the seller payment may stand.
pub(crate) fn settle<T: ValueTransfer>(
    payer: Identity,
    seller: Identity,
    quote: &Settlement,
    transfer: &mut T,
) -> Result<(), RegistryError> {
    let seller_receipt = transfer.pay_to(seller, quote.seller_payout)?;

    if quote.refund > Decimal::ZERO {
        if let Err(e) = transfer.pay_to(payer, quote.refund) {
            if let Err(rollback) = transfer.reverse(seller_receipt) {
                error!(
                    seller,
                    amount = %seller_receipt.amount,
                    error = %rollback,
                    "failed to reverse seller payment"
                );
                return Err(RegistryError::rollback_failed(e, rollback));
            }
            return Err(e);
        }
    }

    Ok(())
}

fn reject(operation: &str, error: RegistryError) -> RegistryError {
    debug!(operation, error = %error, "operation rejected");
    error
}
