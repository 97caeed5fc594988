//! Property-related types for the registry
//!
//! This module defines the Property record together with the payloads used
//! to create and update it.

use rust_decimal::Decimal;

/// Property identifier
///
/// Issued by the registry counter, starting at 1. Never reused.
pub type PropertyId = u64;

/// Identity of an owner, payer or beneficiary
pub type Identity = u32;

/// Monetary amount (prices, tendered values, balances)
pub type Amount = Decimal;

/// One listing in the registry
///
/// `id` is fixed at creation. `owner` changes only through a purchase; every
/// other field is rewritten by the owner via `update_property`.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Registry-issued identifier
    pub id: PropertyId,

    /// Current asking price (never negative)
    pub price: Amount,

    /// Current owner
    pub owner: Identity,

    /// Opaque descriptive fields
    pub category: String,
    pub images: String,
    pub address: String,
    pub description: String,

    /// Advisory availability flag
    ///
    /// Purchases do not check it.
    pub is_listed: bool,
}

impl Property {
    /// Create a freshly listed property owned by `owner`
    pub fn new(id: PropertyId, owner: Identity, details: PropertyDetails) -> Self {
        Property {
            id,
            price: details.price,
            owner,
            category: details.category,
            images: details.images,
            address: details.address,
            description: details.description,
            is_listed: true,
        }
    }

    /// Overwrite every mutable field except the owner
    pub(crate) fn apply(&mut self, update: PropertyUpdate) {
        let PropertyUpdate { details, is_listed } = update;
        self.price = details.price;
        self.category = details.category;
        self.images = details.images;
        self.address = details.address;
        self.description = details.description;
        self.is_listed = is_listed;
    }
}

/// Fields supplied when a property is created
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDetails {
    pub price: Amount,
    pub category: String,
    pub images: String,
    pub address: String,
    pub description: String,
}

impl PropertyDetails {
    /// Details with the given price and empty text fields
    pub fn priced(price: Amount) -> Self {
        PropertyDetails {
            price,
            ..Default::default()
        }
    }
}

/// Replacement for every mutable field of a property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub details: PropertyDetails,
    pub is_listed: bool,
}
