//! Events emitted by the escrow engine

use super::property::{Amount, Identity, PropertyId};
use std::fmt;

/// Emitted exactly once per successful purchase
///
/// Carries the pre-sale owner and the price paid, never the amount tendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertySold {
    pub id: PropertyId,
    pub previous_owner: Identity,
    pub new_owner: Identity,
    pub price_paid: Amount,
}

impl fmt::Display for PropertySold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PropertySold(id={}, from={}, to={}, price={})",
            self.id, self.previous_owner, self.new_owner, self.price_paid
        )
    }
}
