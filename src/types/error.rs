//! Error types for the property registry
//!
//! This module defines all error types that can occur while operating the
//! registry or replaying an operation script.
//!
//! # Error Categories
//!
//! - **Registry Errors**: Unknown property, caller is not the owner, tendered value too low
//! - **Validation Errors**: Negative prices or amounts
//! - **Settlement Errors**: A value movement was refused by the transfer substrate
//! - **Arithmetic Errors**: Overflow in amounts or in the identifier counter
//! - **Script Errors**: File I/O, CSV parsing, malformed operations

use crate::types::property::{Amount, Identity, PropertyId};
use thiserror::Error;

/// Main error type for the registry
///
/// Every variant is a synchronous rejection of the whole operation. No
/// partial effects are observable after any of them is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No property with this id exists
    #[error("Property {id} not found")]
    NotFound {
        /// The id that was looked up
        id: PropertyId,
    },

    /// The caller is not the current owner of the property
    ///
    /// Checked before any field of the property is touched.
    #[error("Identity {caller} is not the owner of property {id} (owner is {owner})")]
    Unauthorized {
        /// Property the caller tried to mutate
        id: PropertyId,
        /// Identity attempting the mutation
        caller: Identity,
        /// Current owner
        owner: Identity,
    },

    /// The tendered value is below the asking price
    #[error("Insufficient funds for property {id}: price {price}, tendered {tendered}")]
    InsufficientFunds {
        /// Property being purchased
        id: PropertyId,
        /// Current asking price
        price: Amount,
        /// Value attached to the call
        tendered: Amount,
    },

    /// A price below zero was supplied
    #[error("Invalid price {price}: prices must not be negative")]
    InvalidPrice {
        /// The rejected price
        price: Amount,
    },

    /// A tendered or transferred amount below zero was supplied
    #[error("Invalid amount {amount}: amounts must not be negative")]
    InvalidAmount {
        /// The rejected amount
        amount: Amount,
    },

    /// The value-transfer substrate refused a payment
    #[error("Transfer of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        /// Intended recipient
        recipient: Identity,
        /// Amount that could not be moved
        amount: Amount,
        /// Why the substrate refused
        reason: String,
    },

    /// A payment failed and undoing the payments already made failed too
    ///
    /// The property record is restored, but value may have moved.
    #[error("Rollback failed after {cause}: {rollback}")]
    RollbackFailed {
        /// The failure that triggered the rollback
        cause: Box<RegistryError>,
        /// Why the rollback itself failed
        rollback: Box<RegistryError>,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
    },

    /// The property identifier counter cannot advance any further
    #[error("Property identifier space exhausted")]
    IdentifierSpaceExhausted,

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// Recoverable: the malformed row is skipped.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Unknown operation type in a script row
    #[error("Invalid operation type '{op_type}'")]
    InvalidOperationType {
        /// The unrecognised type string
        op_type: String,
    },

    /// A field required by the operation type is empty
    #[error("{op_type} operation requires a {field}")]
    MissingField {
        /// Operation type that requires the field
        op_type: String,
        /// Name of the missing column
        field: String,
    },

    /// A field could not be parsed
    #[error("Invalid {field} '{value}'")]
    InvalidField {
        /// Name of the column
        field: String,
        /// The raw value
        value: String,
    },
}

impl From<std::io::Error> for RegistryError {
    fn from(error: std::io::Error) -> Self {
        RegistryError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for RegistryError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        RegistryError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for RegistryError {
    fn from(error: csv_async::Error) -> Self {
        // The message already carries the position when csv-async knows it
        RegistryError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl RegistryError {
    /// Create a NotFound error
    pub fn not_found(id: PropertyId) -> Self {
        RegistryError::NotFound { id }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(id: PropertyId, caller: Identity, owner: Identity) -> Self {
        RegistryError::Unauthorized { id, caller, owner }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(id: PropertyId, price: Amount, tendered: Amount) -> Self {
        RegistryError::InsufficientFunds {
            id,
            price,
            tendered,
        }
    }

    /// Create an InvalidPrice error
    pub fn invalid_price(price: Amount) -> Self {
        RegistryError::InvalidPrice { price }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Amount) -> Self {
        RegistryError::InvalidAmount { amount }
    }

    /// Create a TransferFailed error
    pub fn transfer_failed(recipient: Identity, amount: Amount, reason: &str) -> Self {
        RegistryError::TransferFailed {
            recipient,
            amount,
            reason: reason.to_string(),
        }
    }

    /// Create a RollbackFailed error
    pub fn rollback_failed(cause: RegistryError, rollback: RegistryError) -> Self {
        RegistryError::RollbackFailed {
            cause: Box::new(cause),
            rollback: Box::new(rollback),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str) -> Self {
        RegistryError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(op_type: &str, field: &str) -> Self {
        RegistryError::MissingField {
            op_type: op_type.to_string(),
            field: field.to_string(),
        }
    }

    /// Create an InvalidField error
    pub fn invalid_field(field: &str, value: &str) -> Self {
        RegistryError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an InvalidOperationType error
    pub fn invalid_operation_type(op_type: &str) -> Self {
        RegistryError::InvalidOperationType {
            op_type: op_type.to_string(),
        }
    }
}
