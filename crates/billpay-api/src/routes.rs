//! # Routes
//!
//! Axum router configuration for the bill-payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health, / - Health check
/// - GET  /api/catalog - Carriers, utilities and schools
/// - GET  /api/btc/balance - On-chain wallet balance
/// - POST /api/btc/create_invoice - Validate a request and issue an invoice
/// - GET  /api/btc/invoice_status/{payment_hash} - Settlement state
/// - GET  /api/btc/info - Node info
pub fn create_router(state: AppState) -> Router {
    // The payment page is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let btc_routes = Router::new()
        .route("/balance", get(handlers::balance))
        .route("/create_invoice", post(handlers::create_invoice))
        .route(
            "/invoice_status/{payment_hash}",
            get(handlers::invoice_status),
        )
        .route("/info", get(handlers::info));

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .route("/api/catalog", get(handlers::catalog))
        .nest("/api/btc", btc_routes)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}
