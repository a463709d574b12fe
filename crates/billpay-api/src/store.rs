//! # Sled Invoice Store
//!
//! Durable `InvoiceStore` backed by a sled tree. Records are JSON-encoded
//! under their hex payment hash and flushed before `put` returns, so an
//! acknowledged invoice survives a restart.

use async_trait::async_trait;
use billpay_core::{Invoice, InvoiceStore, StoreError, StoreResult};
use std::path::Path;
use tracing::{debug, error, info};

const INVOICE_TREE: &str = "invoices";

pub struct SledInvoiceStore {
    tree: sled::Tree,
}

impl SledInvoiceStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| {
            error!("Failed to open invoice store at {}: {}", path.display(), e);
            StoreError::Backend(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let store = Self::from_db(&db)?;
        info!(
            "Opened invoice store at {} ({} records)",
            path.display(),
            store.len()
        );
        Ok(store)
    }

    /// Use the invoice tree of an already open database
    pub fn from_db(db: &sled::Db) -> StoreResult<Self> {
        let tree = db
            .open_tree(INVOICE_TREE)
            .map_err(|e| StoreError::Backend(format!("Failed to open invoice tree: {}", e)))?;
        Ok(Self { tree })
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[async_trait]
impl InvoiceStore for SledInvoiceStore {
    async fn put(&self, invoice: Invoice) -> StoreResult<()> {
        let bytes = serde_json::to_vec(&invoice)
            .map_err(|e| StoreError::Backend(format!("Failed to serialize invoice: {}", e)))?;

        let swapped = self
            .tree
            .compare_and_swap(
                invoice.payment_hash.as_bytes(),
                None::<&[u8]>,
                Some(bytes),
            )
            .map_err(|e| {
                error!("Invoice store write failed: {}", e);
                StoreError::Backend(format!("Failed to write invoice: {}", e))
            })?;

        if swapped.is_err() {
            return Err(StoreError::Conflict {
                payment_hash: invoice.payment_hash,
            });
        }

        self.tree.flush_async().await.map_err(|e| {
            error!("Invoice store flush failed: {}", e);
            StoreError::Backend(format!("Failed to flush invoice store: {}", e))
        })?;

        debug!("Stored invoice {}", invoice.payment_hash);
        Ok(())
    }

    async fn get(&self, payment_hash: &str) -> StoreResult<Option<Invoice>> {
        let bytes = self
            .tree
            .get(payment_hash.as_bytes())
            .map_err(|e| StoreError::Backend(format!("Failed to read invoice: {}", e)))?;

        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Backend(format!("Corrupt invoice record: {}", e))),
            None => Ok(None),
        }
    }

    fn store_name(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billpay_core::{Carrier, ServicePayload, ServiceRequest};
    use std::sync::Arc;

    fn temporary_store() -> SledInvoiceStore {
        let db = sled::Config::new().temporary(true).open().unwrap();
        SledInvoiceStore::from_db(&db).unwrap()
    }

    fn invoice(hash: &str) -> Invoice {
        let request = ServiceRequest {
            amount_sats: 2500,
            fiat_reference: 12.5,
            memo: "Airtel top-up".into(),
            payload: ServicePayload::Airtime {
                phone: "0971234567".into(),
                carrier: Carrier::Airtel,
            },
        };
        Invoice::new("lnbc25u1pjstore", hash, request)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = temporary_store();
        let hash = "ab".repeat(32);

        store.put(invoice(&hash)).await.unwrap();

        let found = store.get(&hash).await.unwrap().unwrap();
        assert_eq!(found.payment_hash, hash);
        assert_eq!(found.amount_sats, 2500);
        assert_eq!(store.len(), 1);
        assert!(store.get(&"cd".repeat(32)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_hash_conflicts_and_keeps_first() {
        let store = temporary_store();
        let hash = "ab".repeat(32);

        store.put(invoice(&hash)).await.unwrap();

        let mut second = invoice(&hash);
        second.payment_request = "lnbc1second".into();
        let err = store.put(second).await.unwrap_err();

        assert_eq!(err, StoreError::Conflict { payment_hash: hash.clone() });
        assert_eq!(
            store.get(&hash).await.unwrap().unwrap().payment_request,
            "lnbc25u1pjstore"
        );
    }

    #[tokio::test]
    async fn test_concurrent_puts_have_single_winner() {
        let store = Arc::new(temporary_store());
        let hash = "ef".repeat(32);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let hash = hash.clone();
            tasks.push(tokio::spawn(async move { store.put(invoice(&hash)).await }));
        }

        let mut winners = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let hash = "12".repeat(32);

        {
            let store = SledInvoiceStore::open(dir.path()).unwrap();
            store.put(invoice(&hash)).await.unwrap();
        }

        let store = SledInvoiceStore::open(dir.path()).unwrap();
        let found = store.get(&hash).await.unwrap().unwrap();
        assert_eq!(found.request.memo, "Airtel top-up");
    }
}
