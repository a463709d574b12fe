//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the invoice engine, the node client, the store and the catalog.

use crate::store::SledInvoiceStore;
use billpay_core::{
    BoxedInvoiceStore, BoxedLightningNode, FulfillmentHandler, InvoiceOrchestrator,
    LoggingFulfillmentHandler, MemoryInvoiceStore, ServiceCatalog, SettlementPoller,
};
use billpay_lnd::LndRestClient;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// sled directory for invoice records; in-memory when unset
    pub store_path: Option<PathBuf>,
    /// Service catalog TOML; searched for under `config/` when unset
    pub catalog_path: Option<PathBuf>,
    /// `json` or `text`; production defaults to JSON when unset
    pub log_format: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(5000),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            store_path: var("STORE_PATH").map(PathBuf::from),
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
            log_format: var("LOG_FORMAT"),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Emit one JSON object per log line
    pub fn json_logs(&self) -> bool {
        match self.log_format.as_deref() {
            Some(format) => format.trim().eq_ignore_ascii_case("json"),
            None => self.is_production(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<InvoiceOrchestrator>,
    pub poller: Arc<SettlementPoller>,
    /// Node client, for balance and info
    pub node: BoxedLightningNode,
    /// Invoice records, for fulfillment lookups
    pub store: BoxedInvoiceStore,
    pub catalog: Arc<ServiceCatalog>,
    pub fulfillment: Arc<dyn FulfillmentHandler>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState against the LND node named in the environment
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let node = LndRestClient::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize LND client: {}", e))?;

        let store: BoxedInvoiceStore = match &config.store_path {
            Some(path) => Arc::new(
                SledInvoiceStore::open(path)
                    .map_err(|e| anyhow::anyhow!("Failed to open invoice store: {}", e))?,
            ),
            None => {
                warn!("STORE_PATH not set, invoice records are kept in memory only");
                Arc::new(MemoryInvoiceStore::new())
            }
        };

        let catalog = load_catalog(config.catalog_path.as_deref())?;

        Ok(Self::with_parts(
            config,
            Arc::new(node),
            store,
            catalog,
            Arc::new(LoggingFulfillmentHandler),
        ))
    }

    /// Assemble state from already-built parts
    pub fn with_parts(
        config: AppConfig,
        node: BoxedLightningNode,
        store: BoxedInvoiceStore,
        catalog: ServiceCatalog,
        fulfillment: Arc<dyn FulfillmentHandler>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(InvoiceOrchestrator::new(node.clone(), store.clone())),
            poller: Arc::new(SettlementPoller::new(node.clone())),
            node,
            store,
            catalog: Arc::new(catalog),
            fulfillment,
            config,
        }
    }
}

/// Load the service catalog.
///
/// An explicit path must exist and parse. Otherwise `config/catalog.toml` is
/// searched for, falling back to the builtin catalog.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<ServiceCatalog> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        return parse_catalog(&content, &path.display().to_string());
    }

    let config_paths = [
        "config/catalog.toml",
        "../config/catalog.toml",
        "../../config/catalog.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            return parse_catalog(&content, path);
        }
    }

    warn!("No service catalog found, using builtin catalog");
    Ok(ServiceCatalog::builtin())
}

fn parse_catalog(content: &str, source: &str) -> anyhow::Result<ServiceCatalog> {
    let catalog = ServiceCatalog::from_toml(content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", source, e))?;
    catalog
        .check()
        .map_err(|e| anyhow::anyhow!("Invalid catalog {}: {}", source, e))?;
    info!(
        "Loaded catalog from {}: {} carriers, {} utilities, {} schools",
        source,
        catalog.carriers.len(),
        catalog.utilities.len(),
        catalog.schools.len()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.environment, "development");
        assert!(config.store_path.is_none());
        assert!(!config.is_production());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_app_config_overrides() {
        let config = AppConfig::from_lookup(|key| match key {
            "PORT" => Some("8081".into()),
            "ENVIRONMENT" => Some("production".into()),
            "STORE_PATH" => Some("/var/lib/billpay".into()),
            _ => None,
        });
        assert_eq!(config.port, 8081);
        assert!(config.is_production());
        assert_eq!(config.store_path, Some(PathBuf::from("/var/lib/billpay")));
    }

    #[test]
    fn test_log_format() {
        let config = |pairs: &'static [(&'static str, &'static str)]| {
            AppConfig::from_lookup(move |key| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.to_string())
            })
        };

        assert!(config(&[("ENVIRONMENT", "production")]).json_logs());
        assert!(!config(&[("ENVIRONMENT", "production"), ("LOG_FORMAT", "text")]).json_logs());
        assert!(config(&[("LOG_FORMAT", "JSON")]).json_logs());
        assert!(!config(&[("LOG_FORMAT", "")]).json_logs());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::default()
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");

        let bad = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_load_catalog_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[schools]]
            name = "University of Zambia"
            "#
        )
        .unwrap();

        let catalog = load_catalog(Some(file.path())).unwrap();
        assert_eq!(catalog.schools.len(), 1);
        assert!(catalog.carriers.is_empty());
    }

    #[test]
    fn test_load_catalog_missing_explicit_path_fails() {
        assert!(load_catalog(Some(Path::new("/nonexistent/catalog.toml"))).is_err());
    }
}
