//! # Error Types
//!
//! Typed error handling for the lightning-billpay engine.
//!
//! Each layer owns its own error enum so callers can tell the failure
//! classes apart; `BillPayError` unifies them at the HTTP boundary.

use thiserror::Error;

/// Bad or missing client input. Never reaches the node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent (or empty)
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A field is present but has the wrong type or value
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// `service` is not one of the recognized kinds
    #[error("Unknown service: {service}")]
    UnknownService { service: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        ValidationError::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field } => field,
            ValidationError::InvalidField { field, .. } => field,
            ValidationError::UnknownService { .. } => "service",
        }
    }
}

/// Failure talking to the Lightning node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// Node unreachable, connection reset, or call timed out
    #[error("Transport error: {0}")]
    Transport(String),

    /// Node answered with a non-success status
    #[error("Node returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Node answered but the body was malformed
    #[error("Decode error: {0}")]
    Decode(String),
}

impl NodeError {
    /// True when the node reported the invoice as unknown.
    ///
    /// Older LND builds surface gRPC `NotFound` (code 5) through the REST
    /// gateway as HTTP 500, newer ones as 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            NodeError::Status { status, body } => {
                *status == 404
                    || body.contains("unable to locate invoice")
                    || body.replace(' ', "").contains("\"code\":5")
            }
            _ => false,
        }
    }
}

/// Failure reading or writing the invoice association store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record for this payment hash already exists
    #[error("Invoice already recorded: {payment_hash}")]
    Conflict { payment_hash: String },

    /// Backend failure (I/O, serialization)
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Failure creating an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("Invoice creation failed: {0}")]
    Node(#[from] NodeError),

    #[error("Invoice could not be recorded: {0}")]
    Store(#[from] StoreError),
}

/// Failure polling an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Node does not know this payment hash
    #[error("Invoice not found: {payment_hash}")]
    NotFound { payment_hash: String },

    /// Hash is not 32 bytes of hex; the node was not called
    #[error("Invalid payment hash: {0}")]
    InvalidHash(String),

    #[error("Invoice lookup failed: {0}")]
    Node(NodeError),
}

/// Unified error type at the service boundary
#[derive(Debug, Error)]
pub enum BillPayError {
    /// Configuration errors (missing env vars, unreadable credentials)
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BillPayError {
    /// Returns true if the caller may retry the same request
    pub fn is_retryable(&self) -> bool {
        match self {
            BillPayError::Node(e)
            | BillPayError::Orchestrator(OrchestratorError::Node(e))
            | BillPayError::Poll(PollError::Node(e)) => node_error_retryable(e),
            _ => false,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BillPayError::Configuration(_) => 500,
            BillPayError::Validation(_) => 400,
            BillPayError::Node(e) => node_error_status(e),
            BillPayError::Orchestrator(OrchestratorError::Node(e)) => node_error_status(e),
            BillPayError::Orchestrator(OrchestratorError::Store(e)) => store_error_status(e),
            BillPayError::Poll(PollError::NotFound { .. }) => 404,
            BillPayError::Poll(PollError::InvalidHash(_)) => 400,
            BillPayError::Poll(PollError::Node(e)) => node_error_status(e),
            BillPayError::Store(e) => store_error_status(e),
        }
    }
}

fn node_error_retryable(err: &NodeError) -> bool {
    match err {
        NodeError::Transport(_) => true,
        NodeError::Status { status, .. } => *status >= 500,
        NodeError::Decode(_) => false,
    }
}

fn node_error_status(err: &NodeError) -> u16 {
    match err {
        NodeError::Transport(_) => 503,
        NodeError::Status { .. } => 502,
        NodeError::Decode(_) => 502,
    }
}

fn store_error_status(err: &StoreError) -> u16 {
    match err {
        StoreError::Conflict { .. } => 409,
        StoreError::Backend(_) => 500,
    }
}

/// Result type alias for service operations
pub type BillPayResult<T> = Result<T, BillPayError>;

pub type NodeResult<T> = Result<T, NodeError>;
pub type StoreResult<T> = Result<T, StoreError>;
