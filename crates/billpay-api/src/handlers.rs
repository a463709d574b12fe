//! # Request Handlers
//!
//! Axum request handlers for the bill-payment API.

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use billpay_core::{
    dispatch_settlement, normalize_payment_hash, validate, BillPayError, NodeInfo,
    RawServiceRequest, ServiceCatalog, ServiceKind, SettlementState, ValidationError,
    WalletBalance,
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create invoice response
#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    /// BOLT11 string to show (or QR-encode) for the payer
    pub payment_request: String,
    /// Hex payment hash to poll with
    pub payment_hash: String,
    /// Invoice value in satoshis
    pub amount: u64,
    pub service: ServiceKind,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn billpay_error_to_response(err: impl Into<BillPayError>) -> ApiError {
    let err = err.into();
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);

    if let BillPayError::Validation(e) = &err {
        response = response.with_details(format!("field: {}", e.field()));
    } else if err.is_retryable() {
        response = response.with_details("node unavailable, retry later");
    }

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "lightning-billpay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Carriers, utilities and schools on offer
pub async fn catalog(State(state): State<AppState>) -> Json<ServiceCatalog> {
    Json(state.catalog.as_ref().clone())
}

/// On-chain wallet balance
pub async fn balance(State(state): State<AppState>) -> Result<Json<WalletBalance>, ApiError> {
    let balance = state.node.get_balance().await.map_err(|e| {
        error!("Failed to fetch balance: {}", e);
        billpay_error_to_response(e)
    })?;
    Ok(Json(balance))
}

/// Node identity and sync status
pub async fn info(State(state): State<AppState>) -> Result<Json<NodeInfo>, ApiError> {
    let info = state.node.get_info().await.map_err(|e| {
        error!("Failed to fetch node info: {}", e);
        billpay_error_to_response(e)
    })?;
    Ok(Json(info))
}

/// Validate a service request and issue an invoice for it
#[instrument(skip(state, raw), fields(request_id = %Uuid::new_v4()))]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(raw): Json<RawServiceRequest>,
) -> Result<Json<CreateInvoiceResponse>, ApiError> {
    let request = validate(&raw).map_err(|e: ValidationError| {
        warn!("Rejected service request: {}", e);
        billpay_error_to_response(e)
    })?;

    let service = request.kind();
    let invoice = state
        .orchestrator
        .create_invoice(request)
        .await
        .map_err(|e| {
            error!("Failed to create invoice: {}", e);
            billpay_error_to_response(e)
        })?;

    Ok(Json(CreateInvoiceResponse {
        payment_request: invoice.payment_request,
        payment_hash: invoice.payment_hash,
        amount: invoice.amount_sats,
        service,
    }))
}

/// Current settlement state of an invoice.
///
/// When the invoice was recorded here, the observed state is also handed to
/// the fulfillment handler.
#[instrument(skip(state))]
pub async fn invoice_status(
    State(state): State<AppState>,
    Path(payment_hash): Path<String>,
) -> Result<Json<SettlementState>, ApiError> {
    let status = state
        .poller
        .check_status(&payment_hash)
        .await
        .map_err(billpay_error_to_response)?;

    if let Some(hash) = normalize_payment_hash(&payment_hash) {
        hand_off(&state, &hash, &status).await;
    }

    Ok(Json(status))
}

/// Fulfillment failures are logged; the payer still gets the status.
async fn hand_off(state: &AppState, payment_hash: &str, status: &SettlementState) {
    match state.store.get(payment_hash).await {
        Ok(Some(invoice)) => {
            if let Err(e) = dispatch_settlement(state.fulfillment.as_ref(), &invoice, status) {
                error!("Fulfillment failed for {}: {}", payment_hash, e);
            }
        }
        Ok(None) => {
            info!("Invoice {} is not recorded here, skipping fulfillment", payment_hash);
        }
        Err(e) => {
            error!("Failed to load invoice {}: {}", payment_hash, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billpay_core::{NodeError, OrchestratorError, PollError, StoreError};

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400).with_details("field: memo");
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
        assert_eq!(err.details.as_deref(), Some("field: memo"));
    }

    #[test]
    fn test_validation_error_names_field() {
        let (status, Json(body)) = billpay_error_to_response(ValidationError::missing("account"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.details.as_deref(), Some("field: account"));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases: Vec<(BillPayError, StatusCode)> = vec![
            (
                OrchestratorError::Node(NodeError::Status {
                    status: 500,
                    body: "boom".into(),
                })
                .into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                NodeError::Transport("refused".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                PollError::NotFound {
                    payment_hash: "ab".into(),
                }
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                PollError::InvalidHash("xyz".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                OrchestratorError::Store(StoreError::Conflict {
                    payment_hash: "ab".into(),
                })
                .into(),
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            let (status, Json(body)) = billpay_error_to_response(err);
            assert_eq!(status, expected);
            assert_eq!(body.code, expected.as_u16());
        }
    }
}
