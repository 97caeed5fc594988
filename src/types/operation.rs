//! Operation script types
//!
//! An operation script is a sequence of calls replayed against the registry
//! by the processing strategies. Each step carries the caller identity the
//! host would otherwise supply.

use super::property::{Amount, Identity, PropertyDetails, PropertyId, PropertyUpdate};

/// Operation kinds understood by the script runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Create a property owned by the caller
    Add,

    /// Rewrite every mutable field of a property (owner only)
    Update,

    /// Purchase a property on behalf of a beneficiary
    Buy,

    /// Make the ledger refuse every payment to the caller from now on
    Reject,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Add => "add",
            OperationType::Update => "update",
            OperationType::Buy => "buy",
            OperationType::Reject => "reject",
        }
    }
}

/// One validated step of an operation script
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Add {
        caller: Identity,
        details: PropertyDetails,
    },
    Update {
        caller: Identity,
        id: PropertyId,
        update: PropertyUpdate,
    },
    Buy {
        payer: Identity,
        id: PropertyId,
        beneficiary: Identity,
        tendered: Amount,
    },
    RejectTransfers {
        identity: Identity,
    },
}

impl Operation {
    /// The property this operation targets, if it targets an existing one
    ///
    /// Operations without a target (`Add`, `RejectTransfers`) act as ordering
    /// barriers for the concurrent batch processor.
    pub fn target(&self) -> Option<PropertyId> {
        match self {
            Operation::Update { id, .. } | Operation::Buy { id, .. } => Some(*id),
            Operation::Add { .. } | Operation::RejectTransfers { .. } => None,
        }
    }

    pub fn op_type(&self) -> OperationType {
        match self {
            Operation::Add { .. } => OperationType::Add,
            Operation::Update { .. } => OperationType::Update,
            Operation::Buy { .. } => OperationType::Buy,
            Operation::RejectTransfers { .. } => OperationType::Reject,
        }
    }
}
