//! # billpay-core
//!
//! Invoice lifecycle and service-correlation engine for lightning-billpay.
//!
//! This crate provides:
//! - `validate` for turning raw form posts into `ServiceRequest`s
//! - `InvoiceOrchestrator` for issuing invoices and recording what they pay for
//! - `SettlementPoller` for checking whether an invoice has been paid
//! - `LightningNode` and `InvoiceStore` traits for the node and the store
//! - `FulfillmentHandler` for acting on settlement
//! - `ServiceCatalog` for the carriers, utilities and schools on offer
//! - `BillPayError` and the per-layer error enums
//!
//! ## Example
//!
//! ```rust,ignore
//! use billpay_core::{validate, InvoiceOrchestrator, SettlementPoller, MemoryInvoiceStore};
//!
//! let orchestrator = InvoiceOrchestrator::new(node.clone(), Arc::new(MemoryInvoiceStore::new()));
//! let poller = SettlementPoller::new(node);
//!
//! let request = validate(&raw)?;
//! let invoice = orchestrator.create_invoice(request).await?;
//!
//! // Show invoice.payment_request to the payer, then poll
//! let status = poller.check_status(&invoice.payment_hash).await?;
//! ```

pub mod catalog;
pub mod error;
pub mod fulfillment;
pub mod invoice;
pub mod node;
pub mod orchestrator;
pub mod poller;
pub mod request;
pub mod store;
pub mod validate;

// Re-exports for convenience
pub use catalog::{CarrierEntry, Country, SchoolEntry, ServiceCatalog, UtilityEntry};
pub use error::{
    BillPayError, BillPayResult, NodeError, NodeResult, OrchestratorError, PollError,
    StoreError, StoreResult, ValidationError,
};
pub use fulfillment::{dispatch_settlement, FulfillmentHandler, LoggingFulfillmentHandler};
pub use invoice::{
    decode_r_hash, normalize_payment_hash, Invoice, InvoiceState, SettlementState,
    INVOICE_EXPIRY_SECS,
};
pub use node::{BoxedLightningNode, LightningNode, NodeInfo, RawInvoice, RawInvoiceState, WalletBalance};
pub use orchestrator::InvoiceOrchestrator;
pub use poller::SettlementPoller;
pub use request::{Carrier, ServiceKind, ServicePayload, ServiceRequest};
pub use store::{BoxedInvoiceStore, InvoiceStore, MemoryInvoiceStore};
pub use validate::{validate, RawServiceRequest};
