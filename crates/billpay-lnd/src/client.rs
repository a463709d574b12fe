//! # LND REST Client
//!
//! `LightningNode` implementation over LND's REST gateway.
//!
//! Every call carries the macaroon header, is bounded by the configured
//! timeout, and waits for one of `max_in_flight` permits so a slow node
//! cannot pile up unbounded requests. Calls are never retried here.

use crate::config::{LndConfig, TlsTrust};
use async_trait::async_trait;
use billpay_core::{
    BillPayError, BillPayResult, LightningNode, NodeError, NodeInfo, NodeResult, RawInvoice,
    RawInvoiceState, WalletBalance,
};
use reqwest::{Certificate, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Header LND's REST gateway reads the macaroon from
pub const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

pub struct LndRestClient {
    config: LndConfig,
    client: Client,
    permits: Semaphore,
}

impl LndRestClient {
    /// Create a new LND client
    pub fn new(config: LndConfig) -> BillPayResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout);

        match &config.tls {
            TlsTrust::Certificate(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    BillPayError::Configuration(format!(
                        "Failed to read LND certificate {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let cert = Certificate::from_pem(&pem).map_err(|e| {
                    BillPayError::Configuration(format!("Invalid LND certificate: {}", e))
                })?;
                // LND's tls.cert is self-signed with CA:TRUE. webpki refuses a CA
                // certificate as the server's own, OpenSSL accepts it as a trust anchor.
                builder = builder
                    .use_native_tls()
                    .tls_built_in_root_certs(false)
                    .add_root_certificate(cert);
            }
            TlsTrust::SystemRoots => {
                builder = builder.use_rustls_tls();
            }
            TlsTrust::InsecureSkipVerify => {
                warn!(
                    "TLS certificate verification is DISABLED for {} (development only)",
                    config.rest_url
                );
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        let client = builder.build().map_err(|e| {
            BillPayError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        info!(
            "LND client ready: url={}, timeout={:?}, max_in_flight={}",
            config.rest_url, config.timeout, config.max_in_flight
        );

        Ok(Self {
            permits: Semaphore::new(config.max_in_flight),
            config,
            client,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> BillPayResult<Self> {
        let config = LndConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &LndConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.rest_url, path)
    }

    /// Send one authenticated request and decode a JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> NodeResult<T> {
        let _permit = tokio::time::timeout(self.config.timeout, self.permits.acquire())
            .await
            .map_err(|_| {
                NodeError::Transport("timed out waiting for a free node connection".to_string())
            })?
            .map_err(|_| NodeError::Transport("node client is shutting down".to_string()))?;

        let response = request
            .header(MACAROON_HEADER, self.config.macaroon_header())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            error!("LND error: status={}, body={}", status, body);
            return Err(NodeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| NodeError::Decode(format!("Failed to parse LND response: {}", e)))
    }
}

#[async_trait]
impl LightningNode for LndRestClient {
    #[instrument(skip(self))]
    async fn get_balance(&self) -> NodeResult<WalletBalance> {
        self.send(self.client.get(self.url("/v1/balance/blockchain")))
            .await
    }

    #[instrument(skip(self, memo))]
    async fn create_invoice(
        &self,
        amount_sats: u64,
        memo: &str,
        expiry_secs: u64,
    ) -> NodeResult<RawInvoice> {
        let body = AddInvoiceRequest {
            value: amount_sats,
            memo,
            expiry: expiry_secs.to_string(),
        };

        let invoice: RawInvoice = self
            .send(self.client.post(self.url("/v1/invoices")).json(&body))
            .await?;

        debug!("LND created invoice: r_hash={}", invoice.r_hash);
        Ok(invoice)
    }

    #[instrument(skip(self))]
    async fn lookup_invoice(&self, payment_hash: &str) -> NodeResult<RawInvoiceState> {
        let path = format!("/v1/invoice/{}", payment_hash);
        self.send(self.client.get(self.url(&path))).await
    }

    #[instrument(skip(self))]
    async fn get_info(&self) -> NodeResult<NodeInfo> {
        self.send(self.client.get(self.url("/v1/getinfo"))).await
    }

    fn node_name(&self) -> &'static str {
        "lnd"
    }
}

fn transport_error(e: reqwest::Error) -> NodeError {
    if e.is_timeout() {
        NodeError::Transport(format!("node call timed out: {}", e))
    } else {
        NodeError::Transport(e.to_string())
    }
}

// =============================================================================
// LND API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct AddInvoiceRequest<'a> {
    value: u64,
    memo: &'a str,
    expiry: String,
}
