//! CSV format handling for operation scripts and registry output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to validated `Operation`s
//! - Property and balance output serialization
//!
//! All functions are pure (no I/O beyond the writer they are given).

use crate::types::{
    Amount, Identity, Operation, OperationType, Property, PropertyDetails, PropertyId,
    PropertyUpdate, RegistryError,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the script columns:
/// `type,caller,property,beneficiary,amount,category,images,address,description,listed`.
/// Every column except `type` is optional at this level; which ones an
/// operation needs is checked in [`convert_csv_record`].
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub caller: Option<String>,
    pub property: Option<String>,
    pub beneficiary: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
    pub images: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub listed: Option<String>,
}

/// Convert a CsvRecord to an Operation
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// * `Ok(Operation)` - Successfully converted record
/// * `Err(RegistryError)` - Unknown type, missing required column or unparseable value
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Operation, RegistryError> {
    let op_type = parse_operation_type(&csv_record.op_type)?;
    let name = op_type.as_str();

    let caller: Identity = parse_number(name, "caller", &csv_record.caller)?;

    match op_type {
        OperationType::Add => Ok(Operation::Add {
            caller,
            details: details_from(name, &csv_record)?,
        }),
        OperationType::Update => Ok(Operation::Update {
            caller,
            id: parse_number(name, "property", &csv_record.property)?,
            update: PropertyUpdate {
                details: details_from(name, &csv_record)?,
                is_listed: parse_listed(name, &csv_record.listed)?,
            },
        }),
        OperationType::Buy => {
            let beneficiary = match non_empty(&csv_record.beneficiary) {
                Some(_) => parse_number(name, "beneficiary", &csv_record.beneficiary)?,
                None => caller,
            };
            Ok(Operation::Buy {
                payer: caller,
                id: parse_number::<PropertyId>(name, "property", &csv_record.property)?,
                beneficiary,
                tendered: parse_amount(name, &csv_record.amount)?,
            })
        }
        OperationType::Reject => Ok(Operation::RejectTransfers { identity: caller }),
    }
}

fn parse_operation_type(raw: &str) -> Result<OperationType, RegistryError> {
    match raw.trim().to_lowercase().as_str() {
        "add" => Ok(OperationType::Add),
        "update" => Ok(OperationType::Update),
        "buy" => Ok(OperationType::Buy),
        "reject" => Ok(OperationType::Reject),
        _ => Err(RegistryError::invalid_operation_type(raw)),
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_number<T: FromStr>(
    op_type: &str,
    field: &str,
    raw: &Option<String>,
) -> Result<T, RegistryError> {
    let value = non_empty(raw).ok_or_else(|| RegistryError::missing_field(op_type, field))?;
    value
        .parse()
        .map_err(|_| RegistryError::invalid_field(field, value))
}

fn parse_amount(op_type: &str, raw: &Option<String>) -> Result<Amount, RegistryError> {
    let value = non_empty(raw).ok_or_else(|| RegistryError::missing_field(op_type, "amount"))?;
    Decimal::from_str(value).map_err(|_| RegistryError::invalid_field("amount", value))
}

fn parse_listed(op_type: &str, raw: &Option<String>) -> Result<bool, RegistryError> {
    let value = non_empty(raw).ok_or_else(|| RegistryError::missing_field(op_type, "listed"))?;
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(RegistryError::invalid_field("listed", value)),
    }
}

fn details_from(op_type: &str, record: &CsvRecord) -> Result<PropertyDetails, RegistryError> {
    let text = |field: &Option<String>| non_empty(field).unwrap_or_default().to_string();

    Ok(PropertyDetails {
        price: parse_amount(op_type, &record.amount)?,
        category: text(&record.category),
        images: text(&record.images),
        address: text(&record.address),
        description: text(&record.description),
    })
}

/// Write properties to CSV format
///
/// Columns: id, owner, price, listed, category, images, address, description.
/// Properties are sorted by id, which is creation order.
///
/// # Errors
///
/// Returns `IoError` if writing or flushing fails
pub fn write_properties_csv(
    properties: &[Property],
    output: &mut dyn Write,
) -> Result<(), RegistryError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([
            "id",
            "owner",
            "price",
            "listed",
            "category",
            "images",
            "address",
            "description",
        ])
        .map_err(|e| write_error("header", e))?;

    let mut sorted = properties.to_vec();
    sorted.sort_by_key(|property| property.id);

    for property in sorted {
        writer
            .write_record(&[
                property.id.to_string(),
                property.owner.to_string(),
                format!("{:.4}", property.price),
                property.is_listed.to_string(),
                property.category,
                property.images,
                property.address,
                property.description,
            ])
            .map_err(|e| write_error("property record", e))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write ledger positions to CSV format
///
/// Columns: identity, balance. Rows are sorted by identity.
pub fn write_balances_csv(
    balances: &[(Identity, Amount)],
    output: &mut dyn Write,
) -> Result<(), RegistryError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["identity", "balance"])
        .map_err(|e| write_error("header", e))?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|(identity, _)| *identity);

    for (identity, balance) in sorted {
        writer
            .write_record(&[identity.to_string(), format!("{:.4}", balance)])
            .map_err(|e| write_error("balance record", e))?;
    }

    writer.flush()?;
    Ok(())
}

fn write_error(what: &str, error: csv::Error) -> RegistryError {
    RegistryError::IoError {
        message: format!("Failed to write CSV {}: {}", what, error),
    }
}
