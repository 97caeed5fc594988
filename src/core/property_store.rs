//! Property storage and owner-gated mutation
//!
//! This module provides the `PropertyStore`, the authoritative mapping from
//! property id to property record.
//!
//! The PropertyStore is responsible for:
//! - Issuing property ids from its own monotonically increasing counter
//! - Creating properties owned by their creator
//! - Rewriting a property's fields on behalf of its current owner only
//! - Listing properties in creation order
//!
//! # Identifier Allocation
//!
//! Ids start at 1 and increase by one per created property. They are never
//! reused, because properties are never removed; delisting is expressed with
//! `is_listed = false`.

use crate::types::{
    Identity, Property, PropertyDetails, PropertyId, PropertyUpdate, RegistryError,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

/// Authoritative registry of properties
///
/// Keys are issued in increasing order, so iterating the map yields the
/// properties in creation order.
#[derive(Debug)]
pub struct PropertyStore {
    /// Map of property ids to records
    properties: BTreeMap<PropertyId, Property>,

    /// Last id handed out (0 before the first creation)
    last_id: PropertyId,
}

impl PropertyStore {
    /// Create an empty store
    pub fn new() -> Self {
        PropertyStore {
            properties: BTreeMap::new(),
            last_id: 0,
        }
    }

    /// Create a property owned by `caller`
    ///
    /// The new property is listed and receives the next id from the counter.
    ///
    /// # Arguments
    ///
    /// * `caller` - Identity creating the property; becomes its owner
    /// * `details` - Price and descriptive fields
    ///
    /// # Returns
    ///
    /// * `Ok(PropertyId)` - The id of the new property
    /// * `Err(RegistryError)` - If the price is negative or the id space is exhausted
    pub fn add_property(
        &mut self,
        caller: Identity,
        details: PropertyDetails,
    ) -> Result<PropertyId, RegistryError> {
        validate_price(details.price)?;

        let id = self
            .last_id
            .checked_add(1)
            .ok_or(RegistryError::IdentifierSpaceExhausted)?;

        self.properties.insert(id, Property::new(id, caller, details));
        self.last_id = id;

        debug!(property = id, owner = caller, "property added");
        Ok(id)
    }

    /// Rewrite every mutable field of a property
    ///
    /// The owner check runs before anything is written, so a rejected call
    /// leaves the property exactly as it was.
    ///
    /// # Arguments
    ///
    /// * `caller` - Identity attempting the update
    /// * `id` - Property to update
    /// * `update` - Replacement values for every mutable field
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No property has this id (`NotFound`)
    /// - `caller` is not the current owner (`Unauthorized`)
    /// - The new price is negative (`InvalidPrice`)
    pub fn update_property(
        &mut self,
        caller: Identity,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<(), RegistryError> {
        let property = self
            .properties
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_found(id))?;

        if property.owner != caller {
            return Err(RegistryError::unauthorized(id, caller, property.owner));
        }

        validate_price(update.details.price)?;

        property.apply(update);

        debug!(property = id, owner = caller, "property updated");
        Ok(())
    }

    /// Look up a single property
    pub fn get_property(&self, id: PropertyId) -> Result<Property, RegistryError> {
        self.properties
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(id))
    }

    /// Snapshot of every property in creation order
    pub fn get_all_properties(&self) -> Vec<Property> {
        self.properties.values().cloned().collect()
    }

    /// Current owner of a property
    pub fn owner_of(&self, id: PropertyId) -> Result<Identity, RegistryError> {
        self.properties
            .get(&id)
            .map(|property| property.owner)
            .ok_or_else(|| RegistryError::not_found(id))
    }

    /// Number of properties created so far
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Replace the owner of a property, returning the previous owner
    ///
    /// Only the escrow engine changes ownership, as part of a purchase.
    pub(crate) fn set_owner(
        &mut self,
        id: PropertyId,
        new_owner: Identity,
    ) -> Result<Identity, RegistryError> {
        let property = self
            .properties
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_found(id))?;

        Ok(std::mem::replace(&mut property.owner, new_owner))
    }
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject prices below zero
pub(crate) fn validate_price(price: Decimal) -> Result<(), RegistryError> {
    if price < Decimal::ZERO {
        return Err(RegistryError::invalid_price(price));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn house(price: i64) -> PropertyDetails {
        PropertyDetails {
            price: Decimal::new(price, 0),
            category: "House".to_string(),
            images: "house.jpg".to_string(),
            address: "123 Main St".to_string(),
            description: "Beautiful house".to_string(),
        }
    }

    fn update(price: i64, address: &str, is_listed: bool) -> PropertyUpdate {
        PropertyUpdate {
            details: PropertyDetails {
                price: Decimal::new(price, 0),
                category: "Updated House".to_string(),
                images: "updated.jpg".to_string(),
                address: address.to_string(),
                description: "Updated description".to_string(),
            },
            is_listed,
        }
    }

    #[test]
    fn test_new_creates_empty_store() {
        let store = PropertyStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get_all_properties().len(), 0);
    }

    #[test]
    fn test_add_property_assigns_sequential_ids() {
        let mut store = PropertyStore::new();

        for expected in 1..=5u64 {
            let id = store.add_property(1, house(100)).unwrap();
            assert_eq!(id, expected);
            assert_eq!(store.len() as u64, expected);
        }
    }

    #[test]
    fn test_add_property_owned_by_creator_and_listed() {
        let mut store = PropertyStore::new();

        let id = store.add_property(7, house(100)).unwrap();

        let property = store.get_property(id).unwrap();
        assert_eq!(property.owner, 7);
        assert_eq!(property.price, Decimal::new(100, 0));
        assert_eq!(property.category, "House");
        assert!(property.is_listed);
    }

    #[test]
    fn test_add_property_accepts_zero_price() {
        let mut store = PropertyStore::new();
        assert!(store.add_property(1, house(0)).is_ok());
    }

    #[test]
    fn test_add_property_rejects_negative_price_without_consuming_id() {
        let mut store = PropertyStore::new();

        let result = store.add_property(1, house(-1));
        assert!(matches!(result, Err(RegistryError::InvalidPrice { .. })));

        let id = store.add_property(1, house(1)).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_get_all_properties_in_creation_order() {
        let mut store = PropertyStore::new();

        store.add_property(3, house(300)).unwrap();
        store.add_property(1, house(100)).unwrap();
        store.add_property(2, house(200)).unwrap();

        let owners: Vec<Identity> = store
            .get_all_properties()
            .iter()
            .map(|property| property.owner)
            .collect();
        assert_eq!(owners, vec![3, 1, 2]);
    }

    #[test]
    fn test_get_property_not_found() {
        let store = PropertyStore::new();
        assert_eq!(
            store.get_property(1).unwrap_err(),
            RegistryError::NotFound { id: 1 }
        );
    }

    #[test]
    fn test_update_property_by_owner_replaces_all_fields() {
        let mut store = PropertyStore::new();
        let id = store.add_property(1, house(100)).unwrap();

        store
            .update_property(1, id, update(200, "123 Main St Updated", false))
            .unwrap();

        let property = store.get_property(id).unwrap();
        assert_eq!(property.id, id);
        assert_eq!(property.owner, 1);
        assert_eq!(property.price, Decimal::new(200, 0));
        assert_eq!(property.category, "Updated House");
        assert_eq!(property.images, "updated.jpg");
        assert_eq!(property.address, "123 Main St Updated");
        assert_eq!(property.description, "Updated description");
        assert!(!property.is_listed);
    }

    #[test]
    fn test_update_property_by_non_owner_is_rejected_without_writes() {
        let mut store = PropertyStore::new();
        let id = store.add_property(1, house(100)).unwrap();
        store
            .update_property(1, id, update(150, "A's address", true))
            .unwrap();
        let before = store.get_property(id).unwrap();

        let result = store.update_property(2, id, update(1, "B's address", false));

        assert_eq!(
            result.unwrap_err(),
            RegistryError::Unauthorized {
                id,
                caller: 2,
                owner: 1
            }
        );
        assert_eq!(store.get_property(id).unwrap(), before);
    }

    #[test]
    fn test_update_property_with_negative_price_is_rejected_without_writes() {
        let mut store = PropertyStore::new();
        let id = store.add_property(1, house(100)).unwrap();
        let before = store.get_property(id).unwrap();

        let result = store.update_property(1, id, update(-10, "Elsewhere", false));

        assert!(matches!(result, Err(RegistryError::InvalidPrice { .. })));
        assert_eq!(store.get_property(id).unwrap(), before);
    }

    #[rstest]
    #[case::empty_store(0, 1)]
    #[case::past_last_id(2, 3)]
    fn test_update_property_not_found(#[case] created: usize, #[case] id: PropertyId) {
        let mut store = PropertyStore::new();
        for _ in 0..created {
            store.add_property(1, house(100)).unwrap();
        }

        let result = store.update_property(1, id, update(1, "x", true));
        assert_eq!(result.unwrap_err(), RegistryError::NotFound { id });
    }

    #[test]
    fn test_set_owner_returns_previous_owner() {
        let mut store = PropertyStore::new();
        let id = store.add_property(1, house(100)).unwrap();

        let previous = store.set_owner(id, 2).unwrap();

        assert_eq!(previous, 1);
        assert_eq!(store.owner_of(id).unwrap(), 2);
    }

    #[test]
    fn test_identifier_space_exhaustion() {
        let mut store = PropertyStore::new();
        store.last_id = PropertyId::MAX;

        let result = store.add_property(1, house(1));
        assert_eq!(result.unwrap_err(), RegistryError::IdentifierSpaceExhausted);
        assert!(store.is_empty());
    }
}
