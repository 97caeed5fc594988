//! Thread-safe property storage
//!
//! This module provides the `ConcurrentPropertyStore`, which keeps property
//! records in a `DashMap` and issues ids from an atomic counter.
//!
//! # Design
//!
//! DashMap shards its entries behind fine-grained locks. A mutable entry
//! guard is held for the whole of an update or a purchase, so no other
//! thread can observe or modify that property half-way through.
//!
//! # Ordering
//!
//! Ids are issued in increasing order, so sorting by id reproduces creation
//! order for enumeration.

use crate::core::property_store::validate_price;
use crate::types::{
    Identity, Property, PropertyDetails, PropertyId, PropertyUpdate, RegistryError,
};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Thread-safe registry of properties
#[derive(Debug, Default)]
pub struct ConcurrentPropertyStore {
    /// Concurrent map of property ids to records
    properties: DashMap<PropertyId, Property>,

    /// Last id handed out (0 before the first creation)
    last_id: AtomicU64,
}

impl ConcurrentPropertyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a property owned by `caller`
    ///
    /// The price is validated before an id is taken from the counter.
    pub fn add_property(
        &self,
        caller: Identity,
        details: PropertyDetails,
    ) -> Result<PropertyId, RegistryError> {
        validate_price(details.price)?;

        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                last.checked_add(1)
            })
            .map_err(|_| RegistryError::IdentifierSpaceExhausted)?;
        let id = previous + 1;

        self.properties
            .insert(id, Property::new(id, caller, details));

        debug!(property = id, owner = caller, "property added");
        Ok(id)
    }

    /// Rewrite every mutable field of a property on behalf of its owner
    ///
    /// Runs inside the property's critical section; a rejected call writes nothing.
    pub fn update_property(
        &self,
        caller: Identity,
        id: PropertyId,
        update: PropertyUpdate,
    ) -> Result<(), RegistryError> {
        self.with_property_mut(id, |property| {
            if property.owner != caller {
                return Err(RegistryError::unauthorized(id, caller, property.owner));
            }
            validate_price(update.details.price)?;
            property.apply(update);
            Ok(())
        })?;

        debug!(property = id, owner = caller, "property updated");
        Ok(())
    }

    /// Run `f` with exclusive access to one property
    ///
    /// The entry guard is held until `f` returns. `f` must not access other
    /// properties of this store.
    pub fn with_property_mut<R, F>(&self, id: PropertyId, f: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&mut Property) -> Result<R, RegistryError>,
    {
        let mut entry = self
            .properties
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_found(id))?;
        f(entry.value_mut())
    }

    /// Look up a single property
    pub fn get_property(&self, id: PropertyId) -> Result<Property, RegistryError> {
        self.properties
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RegistryError::not_found(id))
    }

    /// Snapshot of every property in creation order
    ///
    /// Taken entry by entry; call it between operations for a consistent view.
    pub fn get_all_properties(&self) -> Vec<Property> {
        let mut properties: Vec<Property> = self
            .properties
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        properties.sort_by_key(|property| property.id);
        properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
