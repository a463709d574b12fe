//! # Invoice Orchestrator
//!
//! Turns a validated [`ServiceRequest`] into a node invoice and records
//! which request the invoice pays for. This is the only writer of the
//! invoice store.

use crate::error::{OrchestratorError, StoreResult};
use crate::fulfillment::summary;
use crate::invoice::{decode_r_hash, Invoice, INVOICE_EXPIRY_SECS};
use crate::node::BoxedLightningNode;
use crate::request::ServiceRequest;
use crate::store::BoxedInvoiceStore;
use tracing::{debug, error, info, instrument};

#[derive(Clone)]
pub struct InvoiceOrchestrator {
    node: BoxedLightningNode,
    store: BoxedInvoiceStore,
}

impl InvoiceOrchestrator {
    pub fn new(node: BoxedLightningNode, store: BoxedInvoiceStore) -> Self {
        Self { node, store }
    }

    /// Create an invoice for `request` and record the association.
    ///
    /// Succeeds only if the node created the invoice, its hash decoded to
    /// 32 bytes, and the store accepted the record. Nothing is retried.
    #[instrument(
        skip(self, request),
        fields(service = %request.kind(), amount_sats = request.amount_sats)
    )]
    pub async fn create_invoice(
        &self,
        request: ServiceRequest,
    ) -> Result<Invoice, OrchestratorError> {
        let raw = self
            .node
            .create_invoice(request.amount_sats, &request.memo, INVOICE_EXPIRY_SECS)
            .await
            .map_err(|e| {
                error!("{} create_invoice failed: {}", self.node.node_name(), e);
                e
            })?;

        let payment_hash = decode_r_hash(&raw.r_hash).map_err(|e| {
            error!("Node returned malformed r_hash: {}", e);
            e
        })?;

        let invoice = Invoice::new(raw.payment_request, payment_hash, request);

        self.store.put(invoice.clone()).await.map_err(|e| {
            error!(
                "Failed to record invoice {} in {} store: {}",
                invoice.payment_hash,
                self.store.store_name(),
                e
            );
            e
        })?;

        info!(
            "Created invoice: hash={}, {} ({} sats)",
            invoice.payment_hash,
            summary(&invoice.request.payload),
            invoice.amount_sats
        );
        debug!(
            "Invoice {} credits {}",
            invoice.payment_hash,
            invoice.request.payload.beneficiary()
        );

        Ok(invoice)
    }

    /// Look up the service request an invoice pays for
    pub async fn find_invoice(&self, payment_hash: &str) -> StoreResult<Option<Invoice>> {
        self.store.get(payment_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NodeError, NodeResult, StoreError};
    use crate::node::{LightningNode, NodeInfo, RawInvoice, RawInvoiceState, WalletBalance};
    use crate::request::{Carrier, ServicePayload};
    use crate::store::{InvoiceStore, MemoryInvoiceStore};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::sync::{Arc, Mutex};

    struct ScriptedNode {
        response: NodeResult<RawInvoice>,
        calls: Mutex<Vec<(u64, String, u64)>>,
    }

    impl ScriptedNode {
        fn returning(response: NodeResult<RawInvoice>) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LightningNode for ScriptedNode {
        async fn get_balance(&self) -> NodeResult<WalletBalance> {
            Ok(WalletBalance::default())
        }

        async fn create_invoice(
            &self,
            amount_sats: u64,
            memo: &str,
            expiry_secs: u64,
        ) -> NodeResult<RawInvoice> {
            self.calls
                .lock()
                .unwrap()
                .push((amount_sats, memo.to_string(), expiry_secs));
            self.response.clone()
        }

        async fn lookup_invoice(&self, _payment_hash: &str) -> NodeResult<RawInvoiceState> {
            Err(NodeError::Transport("not scripted".into()))
        }

        async fn get_info(&self) -> NodeResult<NodeInfo> {
            Ok(NodeInfo::default())
        }

        fn node_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn airtime_request() -> ServiceRequest {
        ServiceRequest {
            amount_sats: 1000,
            fiat_reference: 5.0,
            memo: "m".into(),
            payload: ServicePayload::Airtime {
                phone: "0971234567".into(),
                carrier: Carrier::Mtn,
            },
        }
    }

    fn raw_invoice(hash_byte: u8) -> RawInvoice {
        RawInvoice {
            r_hash: STANDARD.encode([hash_byte; 32]),
            payment_request: "lnbc10u1pjexample".into(),
        }
    }

    #[tokio::test]
    async fn test_create_invoice_calls_node_with_fixed_expiry() {
        let node = ScriptedNode::returning(Ok(raw_invoice(0x11)));
        let store = Arc::new(MemoryInvoiceStore::new());
        let orchestrator = InvoiceOrchestrator::new(node.clone(), store.clone());

        let invoice = orchestrator.create_invoice(airtime_request()).await.unwrap();

        assert_eq!(
            node.calls.lock().unwrap().as_slice(),
            &[(1000, "m".to_string(), 600)]
        );
        assert_eq!(invoice.amount_sats, 1000);
        assert_eq!(invoice.payment_hash, "11".repeat(32));
        assert_eq!(invoice.payment_request, "lnbc10u1pjexample");
        assert_eq!(invoice.request, airtime_request());
    }

    #[tokio::test]
    async fn test_create_invoice_records_association() {
        let node = ScriptedNode::returning(Ok(raw_invoice(0x22)));
        let store = Arc::new(MemoryInvoiceStore::new());
        let orchestrator = InvoiceOrchestrator::new(node, store.clone());

        let invoice = orchestrator.create_invoice(airtime_request()).await.unwrap();

        let stored = store.get(&invoice.payment_hash).await.unwrap().unwrap();
        assert_eq!(stored, invoice);
        assert_eq!(
            orchestrator.find_invoice(&invoice.payment_hash).await.unwrap(),
            Some(invoice)
        );
    }

    #[tokio::test]
    async fn test_node_error_propagates() {
        let node = ScriptedNode::returning(Err(NodeError::Status {
            status: 500,
            body: "internal error".into(),
        }));
        let store = Arc::new(MemoryInvoiceStore::new());
        let orchestrator = InvoiceOrchestrator::new(node, store.clone());

        let err = orchestrator.create_invoice(airtime_request()).await.unwrap_err();

        assert_eq!(
            err,
            OrchestratorError::Node(NodeError::Status {
                status: 500,
                body: "internal error".into()
            })
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_hash_fails_loudly() {
        let node = ScriptedNode::returning(Ok(RawInvoice {
            r_hash: STANDARD.encode([7u8; 20]),
            payment_request: "lnbc1...".into(),
        }));
        let store = Arc::new(MemoryInvoiceStore::new());
        let orchestrator = InvoiceOrchestrator::new(node, store.clone());

        let err = orchestrator.create_invoice(airtime_request()).await.unwrap_err();

        assert!(matches!(err, OrchestratorError::Node(NodeError::Decode(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_hash_is_a_store_conflict() {
        let node = ScriptedNode::returning(Ok(raw_invoice(0x33)));
        let store = Arc::new(MemoryInvoiceStore::new());
        let orchestrator = InvoiceOrchestrator::new(node, store);

        orchestrator.create_invoice(airtime_request()).await.unwrap();
        let err = orchestrator.create_invoice(airtime_request()).await.unwrap_err();

        assert_eq!(
            err,
            OrchestratorError::Store(StoreError::Conflict {
                payment_hash: "33".repeat(32)
            })
        );
    }
}
