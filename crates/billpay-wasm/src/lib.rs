//! # billpay-wasm
//!
//! WebAssembly bindings for lightning-billpay-rs.
//!
//! Runs the same request validation as the server in the browser, so the
//! payment form can flag a bad field before any invoice is requested.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { validate_request, required_fields } from 'lightning-billpay-wasm';
//!
//! await init();
//!
//! try {
//!   const request = JSON.parse(validate_request(JSON.stringify(form)));
//! } catch (err) {
//!   const { error, field } = JSON.parse(err);
//!   highlight(field, error);
//! }
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

use billpay_core::{validate, RawServiceRequest, ServiceKind, ServiceRequest};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Validation failure as handed to JavaScript
#[derive(Debug, Serialize, PartialEq)]
struct WasmValidationError {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl WasmValidationError {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.error.clone())
    }
}

/// Validate a form post (JSON object) and return the normalized request as JSON.
///
/// Throws a JSON string `{ "error": ..., "field": ... }` on failure.
#[wasm_bindgen]
pub fn validate_request(json: &str) -> Result<String, JsValue> {
    check_request(json)
        .and_then(|request| {
            serde_json::to_string(&request).map_err(|e| WasmValidationError {
                error: e.to_string(),
                field: None,
            })
        })
        .map_err(|e| JsValue::from_str(&e.to_json()))
}

/// Fields the form must collect for `service`, as a JSON array
#[wasm_bindgen]
pub fn required_fields(service: &str) -> Result<String, JsValue> {
    fields_for(service).map_err(|e| JsValue::from_str(&e.to_json()))
}

/// Service kinds the engine accepts, as a JSON array
#[wasm_bindgen]
pub fn service_kinds() -> String {
    let kinds: Vec<&str> = ServiceKind::ALL.iter().map(|k| k.as_str()).collect();
    serde_json::to_string(&kinds).unwrap_or_default()
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn check_request(json: &str) -> Result<ServiceRequest, WasmValidationError> {
    let raw: RawServiceRequest = serde_json::from_str(json).map_err(|e| WasmValidationError {
        error: format!("Request must be a JSON object: {}", e),
        field: None,
    })?;

    validate(&raw).map_err(|e| WasmValidationError {
        error: e.to_string(),
        field: Some(e.field().to_string()),
    })
}

fn fields_for(service: &str) -> Result<String, WasmValidationError> {
    let kind: ServiceKind = service.parse().map_err(|service| WasmValidationError {
        error: format!("Unknown service: {}", service),
        field: Some("service".to_string()),
    })?;

    let mut fields = vec!["amount", "memo", "fiat_reference", "service"];
    fields.extend_from_slice(kind.required_fields());
    serde_json::to_string(&fields).map_err(|e| WasmValidationError {
        error: e.to_string(),
        field: None,
    })
}
