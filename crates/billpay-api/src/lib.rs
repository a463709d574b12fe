//! # billpay-api
//!
//! HTTP API layer for lightning-billpay-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for invoices, settlement status and the service catalog
//! - A sled-backed durable invoice store
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/catalog` | Carriers, utilities, schools |
//! | GET | `/api/btc/balance` | Wallet balance |
//! | POST | `/api/btc/create_invoice` | Issue an invoice for a service request |
//! | GET | `/api/btc/invoice_status/{payment_hash}` | Settlement state |
//! | GET | `/api/btc/info` | Node info |

pub mod handlers;
pub mod routes;
pub mod state;
pub mod store;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
pub use store::SledInvoiceStore;
