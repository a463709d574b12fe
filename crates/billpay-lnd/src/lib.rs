//! # billpay-lnd
//!
//! LND node client for lightning-billpay.
//!
//! `LndRestClient` implements `billpay_core::LightningNode` against LND's
//! REST gateway. Authentication is a hex macaroon in the
//! `Grpc-Metadata-macaroon` header; TLS trust comes from the node's own
//! `tls.cert`, the system roots, or (development only) no verification.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use billpay_lnd::LndRestClient;
//! use billpay_core::{InvoiceOrchestrator, MemoryInvoiceStore};
//!
//! // LND_REST_URL, LND_MACAROON / LND_MACAROON_PATH, LND_CERT
//! let node = Arc::new(LndRestClient::from_env()?);
//!
//! let orchestrator = InvoiceOrchestrator::new(node, Arc::new(MemoryInvoiceStore::new()));
//! let invoice = orchestrator.create_invoice(request).await?;
//! ```

pub mod client;
pub mod config;

pub use client::{LndRestClient, MACAROON_HEADER};
pub use config::{LndConfig, TlsTrust};
