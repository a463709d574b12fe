//! # Invoice Store
//!
//! Durable association `payment_hash → Invoice` where the fulfillment side
//! finds the service request once a payment settles.
//!
//! `put` is insert-if-absent and atomic per key: a second write for the
//! same hash fails with [`StoreError::Conflict`] and leaves the first record
//! untouched. Records are never updated or deleted by the engine.

use crate::error::{StoreError, StoreResult};
use crate::invoice::Invoice;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Record a new invoice
    async fn put(&self, invoice: Invoice) -> StoreResult<()>;

    /// Fetch an invoice by hex payment hash
    async fn get(&self, payment_hash: &str) -> StoreResult<Option<Invoice>>;

    /// Backend name (for logging)
    fn store_name(&self) -> &'static str;
}

pub type BoxedInvoiceStore = Arc<dyn InvoiceStore>;

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryInvoiceStore {
    invoices: RwLock<HashMap<String, Invoice>>,
}

impl MemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.invoices.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn put(&self, invoice: Invoice) -> StoreResult<()> {
        let mut invoices = self
            .invoices
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))?;

        if invoices.contains_key(&invoice.payment_hash) {
            return Err(StoreError::Conflict {
                payment_hash: invoice.payment_hash,
            });
        }
        invoices.insert(invoice.payment_hash.clone(), invoice);
        Ok(())
    }

    async fn get(&self, payment_hash: &str) -> StoreResult<Option<Invoice>> {
        let invoices = self
            .invoices
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))?;
        Ok(invoices.get(payment_hash).cloned())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ServicePayload, ServiceRequest};

    fn invoice(hash: &str, amount_sats: u64) -> Invoice {
        Invoice::new(
            "lnbc1...",
            hash,
            ServiceRequest {
                amount_sats,
                fiat_reference: 1.0,
                memo: "water".into(),
                payload: ServicePayload::Water {
                    utility: "Nkana Water and Sewerage Company".into(),
                    account: "NW12345678".into(),
                },
            },
        )
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryInvoiceStore::new();
        let hash = "ab".repeat(32);

        store.put(invoice(&hash, 700)).await.unwrap();

        let found = store.get(&hash).await.unwrap().unwrap();
        assert_eq!(found.amount_sats, 700);
        assert_eq!(store.len(), 1);
        assert!(store.get(&"cd".repeat(32)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_is_insert_if_absent() {
        let store = MemoryInvoiceStore::new();
        let hash = "ab".repeat(32);

        store.put(invoice(&hash, 700)).await.unwrap();
        let err = store.put(invoice(&hash, 900)).await.unwrap_err();

        assert_eq!(err, StoreError::Conflict { payment_hash: hash.clone() });
        assert_eq!(store.get(&hash).await.unwrap().unwrap().amount_sats, 700);
    }

    #[tokio::test]
    async fn test_concurrent_puts_single_winner() {
        let store = Arc::new(MemoryInvoiceStore::new());
        let hash = "ef".repeat(32);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let hash = hash.clone();
                tokio::spawn(async move { store.put(invoice(&hash, 100 + i)).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
    }
}
