//! # Invoice Types
//!
//! The invoice issued for a service request, the settlement state the node
//! reports for it, and the payment-hash encoding helpers shared by the
//! orchestrator and the poller.

use crate::error::NodeError;
use crate::request::{ServiceKind, ServiceRequest};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Invoice lifetime enforced by the node
pub const INVOICE_EXPIRY_SECS: u64 = 600;

/// Payment hashes are SHA-256 digests
pub const PAYMENT_HASH_LEN: usize = 32;

/// A Lightning invoice bound to the service request it pays for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// BOLT11 payment request shown to the payer
    pub payment_request: String,

    /// Lowercase hex of the 32-byte payment hash; the primary key
    pub payment_hash: String,

    /// Invoice value in satoshis
    pub amount_sats: u64,

    /// Expiry the node was asked to enforce
    pub expiry_secs: u64,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// The request this invoice pays for
    pub request: ServiceRequest,
}

impl Invoice {
    pub fn new(
        payment_request: impl Into<String>,
        payment_hash: impl Into<String>,
        request: ServiceRequest,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            payment_request: payment_request.into(),
            payment_hash: payment_hash.into(),
            amount_sats: request.amount_sats,
            expiry_secs: INVOICE_EXPIRY_SECS,
            created_at,
            expires_at: created_at + Duration::seconds(INVOICE_EXPIRY_SECS as i64),
            request,
        }
    }

    pub fn service(&self) -> ServiceKind {
        self.request.kind()
    }
}

/// Invoice state as reported by LND
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceState {
    /// Awaiting payment
    Open,
    /// Paid
    Settled,
    /// Cancelled or expired
    Canceled,
    /// HTLC locked in, not yet settled
    Accepted,
}

impl InvoiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Open => "OPEN",
            InvoiceState::Settled => "SETTLED",
            InvoiceState::Canceled => "CANCELED",
            InvoiceState::Accepted => "ACCEPTED",
        }
    }
}

impl fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceState {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(InvoiceState::Open),
            "SETTLED" => Ok(InvoiceState::Settled),
            "CANCELED" => Ok(InvoiceState::Canceled),
            "ACCEPTED" => Ok(InvoiceState::Accepted),
            other => Err(NodeError::Decode(format!("unknown invoice state '{}'", other))),
        }
    }
}

/// Settlement state fetched on demand. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementState {
    pub settled: bool,
    pub state: InvoiceState,
    pub payment_request: String,
}

/// Decode the node's base64 `r_hash` into lowercase hex.
///
/// Anything that is not exactly 32 bytes of valid base64 is rejected.
pub fn decode_r_hash(r_hash: &str) -> Result<String, NodeError> {
    let bytes = STANDARD
        .decode(r_hash.trim())
        .map_err(|e| NodeError::Decode(format!("r_hash is not valid base64: {}", e)))?;

    if bytes.len() != PAYMENT_HASH_LEN {
        return Err(NodeError::Decode(format!(
            "r_hash decodes to {} bytes, expected {}",
            bytes.len(),
            PAYMENT_HASH_LEN
        )));
    }

    Ok(hex::encode(bytes))
}

/// Canonicalize a hex payment hash (trimmed, lowercase, 64 hex chars).
///
/// Returns `None` when the input is not a hex-encoded 32-byte hash.
pub fn normalize_payment_hash(payment_hash: &str) -> Option<String> {
    let candidate = payment_hash.trim().to_ascii_lowercase();
    match hex::decode(&candidate) {
        Ok(bytes) if bytes.len() == PAYMENT_HASH_LEN => Some(candidate),
        _ => None,
    }
}
