//! # Request Validator
//!
//! Turns a raw JSON request from the payment form into a [`ServiceRequest`],
//! or rejects it with a [`ValidationError`] naming the first bad field.
//!
//! Checks run in a fixed order: `amount`, `memo`, `fiat_reference`,
//! `service` must be present; then `amount` and `fiat_reference` are parsed;
//! then the service kind is resolved and its own fields are checked. Nothing
//! here touches the node.

use crate::error::ValidationError;
use crate::request::{Carrier, ServiceKind, ServicePayload, ServiceRequest};
use serde_json::{Map, Value};

/// Raw request body as posted by the front end
pub type RawServiceRequest = Map<String, Value>;

/// Accepted spellings for each canonical field. The first entry is the
/// canonical name reported in errors.
const FIELD_ALIASES: &[&[&str]] = &[
    &["fiat_reference", "zmw"],
    &["student_id", "studentId"],
    &["student_name", "studentName"],
];

const ENVELOPE_FIELDS: [&str; 4] = ["amount", "memo", "fiat_reference", "service"];

/// Validate a raw request
pub fn validate(raw: &RawServiceRequest) -> Result<ServiceRequest, ValidationError> {
    for field in ENVELOPE_FIELDS {
        if lookup(raw, field).is_none() {
            return Err(ValidationError::missing(field));
        }
    }

    let amount_sats = parse_amount(raw)?;
    let memo = free_text(raw, "memo")?;
    let fiat_reference = parse_fiat_reference(raw)?;

    let service = required_string(raw, "service")?;
    let kind: ServiceKind = service
        .parse()
        .map_err(|service| ValidationError::UnknownService { service })?;

    let payload = match kind {
        ServiceKind::Airtime => {
            let phone = required_string(raw, "phone")?;
            let carrier = required_string(raw, "carrier")?;
            let carrier: Carrier = carrier.parse().map_err(|c| {
                ValidationError::invalid("carrier", format!("unsupported carrier '{}'", c))
            })?;
            ServicePayload::Airtime { phone, carrier }
        }
        ServiceKind::Electricity => ServicePayload::Electricity {
            utility: required_string(raw, "utility")?,
            account: required_string(raw, "account")?,
        },
        ServiceKind::Water => ServicePayload::Water {
            utility: required_string(raw, "utility")?,
            account: required_string(raw, "account")?,
        },
        ServiceKind::SchoolFees => ServicePayload::SchoolFees {
            institution: required_string(raw, "institution")?,
            student_id: required_string(raw, "student_id")?,
            student_name: required_string(raw, "student_name")?,
        },
    };

    Ok(ServiceRequest {
        amount_sats,
        fiat_reference,
        memo,
        payload,
    })
}

/// Find a field by canonical name or alias. `null` counts as absent.
fn lookup<'a>(raw: &'a RawServiceRequest, field: &str) -> Option<&'a Value> {
    let names = FIELD_ALIASES
        .iter()
        .find(|aliases| aliases[0] == field)
        .copied()
        .unwrap_or(std::slice::from_ref(&field));

    names
        .iter()
        .filter_map(|name| raw.get(*name))
        .find(|value| !value.is_null())
}

fn required_string(raw: &RawServiceRequest, field: &str) -> Result<String, ValidationError> {
    match lookup(raw, field) {
        None => Err(ValidationError::missing(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::missing(field)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ValidationError::invalid(field, "must be a string")),
    }
}

/// Free text passed through verbatim. Empty is allowed.
fn free_text(raw: &RawServiceRequest, field: &str) -> Result<String, ValidationError> {
    match lookup(raw, field) {
        None => Err(ValidationError::missing(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::invalid(field, "must be a string")),
    }
}

fn parse_amount(raw: &RawServiceRequest) -> Result<u64, ValidationError> {
    let value = lookup(raw, "amount").ok_or_else(|| ValidationError::missing("amount"))?;

    let amount = match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            ValidationError::invalid("amount", "must be a positive whole number of satoshis")
        })?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ValidationError::invalid(
                    "amount",
                    "must be a positive whole number of satoshis",
                ));
            }
            s.parse::<u64>()
                .map_err(|_| ValidationError::invalid("amount", "out of range"))?
        }
        _ => return Err(ValidationError::invalid("amount", "must be a number")),
    };

    if amount == 0 {
        return Err(ValidationError::invalid("amount", "must be greater than zero"));
    }
    Ok(amount)
}

fn parse_fiat_reference(raw: &RawServiceRequest) -> Result<f64, ValidationError> {
    let value = lookup(raw, "fiat_reference")
        .ok_or_else(|| ValidationError::missing("fiat_reference"))?;

    let fiat = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ValidationError::invalid("fiat_reference", "must be a decimal number"))?;

    if !fiat.is_finite() || fiat < 0.0 {
        return Err(ValidationError::invalid(
            "fiat_reference",
            "must be a non-negative decimal",
        ));
    }
    Ok(fiat)
}
