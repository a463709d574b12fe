//! # Settlement Poller
//!
//! Reports what the node currently holds for a payment hash. Every call is
//! a fresh lookup; nothing is cached and no transition is ever inferred
//! locally.
//!
//! ```text
//! OPEN ──► ACCEPTED ──► SETTLED
//!   │          │
//!   └──────────┴──────► CANCELED
//! ```

use crate::error::PollError;
use crate::invoice::{normalize_payment_hash, InvoiceState, SettlementState};
use crate::node::BoxedLightningNode;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct SettlementPoller {
    node: BoxedLightningNode,
}

impl SettlementPoller {
    pub fn new(node: BoxedLightningNode) -> Self {
        Self { node }
    }

    /// Fetch the current settlement state of an invoice.
    ///
    /// `payment_hash` is the hex hash returned when the invoice was created
    /// (already URL-decoded). Case and surrounding whitespace are ignored.
    #[instrument(skip(self))]
    pub async fn check_status(&self, payment_hash: &str) -> Result<SettlementState, PollError> {
        let hash = normalize_payment_hash(payment_hash).ok_or_else(|| {
            PollError::InvalidHash(format!(
                "expected {} hex characters, got '{}'",
                crate::invoice::PAYMENT_HASH_LEN * 2,
                payment_hash
            ))
        })?;

        let raw = self.node.lookup_invoice(&hash).await.map_err(|e| {
            if e.is_not_found() {
                debug!("{} does not know invoice {}", self.node.node_name(), hash);
                PollError::NotFound {
                    payment_hash: hash.clone(),
                }
            } else {
                warn!("Invoice lookup failed for {}: {}", hash, e);
                PollError::Node(e)
            }
        })?;

        let state: InvoiceState = raw.state.parse().map_err(PollError::Node)?;

        debug!("Invoice {} is {} (settled={})", hash, state, raw.settled);

        Ok(SettlementState {
            settled: raw.settled,
            state,
            payment_request: raw.payment_request,
        })
    }
}
