//! # Lightning Node Trait
//!
//! The seam between the engine and a Lightning node's control API.
//! Implementations: LND REST (`billpay-lnd`), test doubles.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   LightningNode (trait)                     │
//! │  ├── get_balance()                                          │
//! │  ├── create_invoice()                                       │
//! │  ├── lookup_invoice()                                       │
//! │  ├── get_info()                                             │
//! │  └── node_name()                                            │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┴─────────────────┐
//!  ┌───────┴───────┐                   ┌───────┴───────┐
//!  │ LndRestClient │                   │   MockNode    │
//!  └───────────────┘                   └───────────────┘
//! ```
//!
//! Implementations hold connection configuration only. They perform exactly
//! one outbound call per operation and never retry.

use crate::error::NodeResult;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Control operations the engine needs from a Lightning node
#[async_trait]
pub trait LightningNode: Send + Sync {
    /// On-chain wallet balance
    async fn get_balance(&self) -> NodeResult<WalletBalance>;

    /// Ask the node for a new invoice.
    ///
    /// # Arguments
    /// * `amount_sats` - Invoice value
    /// * `memo` - Description embedded in the payment request
    /// * `expiry_secs` - Lifetime enforced by the node
    async fn create_invoice(
        &self,
        amount_sats: u64,
        memo: &str,
        expiry_secs: u64,
    ) -> NodeResult<RawInvoice>;

    /// Look up an invoice by hex payment hash
    async fn lookup_invoice(&self, payment_hash: &str) -> NodeResult<RawInvoiceState>;

    /// Node identity and sync status
    async fn get_info(&self) -> NodeResult<NodeInfo>;

    /// Node implementation name (for logging)
    fn node_name(&self) -> &'static str;
}

/// Type alias for a shared node client (dynamic dispatch)
pub type BoxedLightningNode = Arc<dyn LightningNode>;

/// `POST /v1/invoices` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInvoice {
    /// Base64 payment hash
    pub r_hash: String,
    pub payment_request: String,
}

/// `GET /v1/invoice/{hash}` response (fields we use)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInvoiceState {
    #[serde(default)]
    pub settled: bool,
    pub state: String,
    pub payment_request: String,
}

/// `GET /v1/balance/blockchain` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    #[serde(default, deserialize_with = "int64_string")]
    pub total_balance: i64,
    #[serde(default, deserialize_with = "int64_string")]
    pub confirmed_balance: i64,
    #[serde(default, deserialize_with = "int64_string")]
    pub unconfirmed_balance: i64,
}

/// `GET /v1/getinfo` response (fields we use)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub identity_pubkey: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, deserialize_with = "int64_string")]
    pub block_height: i64,
    #[serde(default, deserialize_with = "int64_string")]
    pub num_active_channels: i64,
    #[serde(default, deserialize_with = "int64_string")]
    pub num_peers: i64,
    #[serde(default)]
    pub synced_to_chain: bool,
    #[serde(default)]
    pub chains: Vec<Chain>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub chain: String,
    pub network: String,
}

/// grpc-gateway renders int64 as a JSON string; accept either encoding.
fn int64_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Int(i64),
        Str(String),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Int(n) => Ok(n),
        StringOrInt::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
