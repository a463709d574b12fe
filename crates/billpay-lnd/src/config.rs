//! # LND Configuration
//!
//! Connection settings for the LND REST gateway.
//! Secrets are loaded from environment variables (or a `.env` file).

use billpay_core::BillPayError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// How the node's TLS certificate is trusted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsTrust {
    /// Trust the PEM certificate at this path (LND's `tls.cert`)
    Certificate(PathBuf),
    /// Trust the platform's web PKI roots
    SystemRoots,
    /// Accept any certificate. Development only.
    InsecureSkipVerify,
}

/// LND REST connection configuration
#[derive(Clone)]
pub struct LndConfig {
    /// REST base URL (e.g., "https://localhost:8080")
    pub rest_url: String,

    /// Hex-encoded macaroon, sent on every call
    macaroon_hex: String,

    pub tls: TlsTrust,

    /// Upper bound on every node call
    pub timeout: Duration,

    /// Max concurrent node calls
    pub max_in_flight: usize,
}

impl LndConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `LND_REST_URL`
    /// - `LND_MACAROON` (hex) or `LND_MACAROON_PATH` (binary macaroon file)
    ///
    /// Optional: `LND_CERT`, `LND_TLS_INSECURE`, `LND_TIMEOUT_SECS`,
    /// `LND_MAX_IN_FLIGHT`, `ENVIRONMENT`.
    pub fn from_env() -> Result<Self, BillPayError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BillPayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rest_url = var("LND_REST_URL")
            .ok_or_else(|| BillPayError::Configuration("LND_REST_URL not set".to_string()))?;

        if !rest_url.starts_with("https://") && !rest_url.starts_with("http://") {
            return Err(BillPayError::Configuration(
                "LND_REST_URL must start with https:// or http://".to_string(),
            ));
        }

        let macaroon_hex = match (var("LND_MACAROON"), var("LND_MACAROON_PATH")) {
            (Some(hex_str), _) => {
                let hex_str = hex_str.trim().to_string();
                hex::decode(&hex_str).map_err(|_| {
                    BillPayError::Configuration("LND_MACAROON must be hex-encoded".to_string())
                })?;
                hex_str
            }
            (None, Some(path)) => {
                let bytes = std::fs::read(&path).map_err(|e| {
                    BillPayError::Configuration(format!(
                        "Failed to read LND_MACAROON_PATH {}: {}",
                        path, e
                    ))
                })?;
                hex::encode(bytes)
            }
            (None, None) => {
                return Err(BillPayError::Configuration(
                    "LND_MACAROON or LND_MACAROON_PATH must be set".to_string(),
                ))
            }
        };

        let insecure = var("LND_TLS_INSECURE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let tls = match var("LND_CERT") {
            Some(path) => TlsTrust::Certificate(PathBuf::from(path)),
            None if insecure => TlsTrust::InsecureSkipVerify,
            None => TlsTrust::SystemRoots,
        };

        let production = var("ENVIRONMENT").as_deref() == Some("production");
        if production && tls == TlsTrust::InsecureSkipVerify {
            return Err(BillPayError::Configuration(
                "LND_TLS_INSECURE is not allowed when ENVIRONMENT=production".to_string(),
            ));
        }

        let timeout_secs = parse_or(var("LND_TIMEOUT_SECS"), "LND_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_in_flight =
            parse_or(var("LND_MAX_IN_FLIGHT"), "LND_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT)?;

        if timeout_secs == 0 || max_in_flight == 0 {
            return Err(BillPayError::Configuration(
                "LND_TIMEOUT_SECS and LND_MAX_IN_FLIGHT must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            rest_url: rest_url.trim_end_matches('/').to_string(),
            macaroon_hex,
            tls,
            timeout: Duration::from_secs(timeout_secs),
            max_in_flight,
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(rest_url: impl Into<String>, macaroon_hex: impl Into<String>) -> Self {
        let rest_url: String = rest_url.into();
        Self {
            rest_url: rest_url.trim_end_matches('/').to_string(),
            macaroon_hex: macaroon_hex.into(),
            tls: TlsTrust::SystemRoots,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Value of the `Grpc-Metadata-macaroon` header
    pub fn macaroon_header(&self) -> &str {
        &self.macaroon_hex
    }

    pub fn is_insecure(&self) -> bool {
        self.tls == TlsTrust::InsecureSkipVerify
    }

    /// Builder: set TLS trust
    pub fn with_tls(mut self, tls: TlsTrust) -> Self {
        self.tls = tls;
        self
    }

    /// Builder: set per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: set max concurrent node calls
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }
}

impl fmt::Debug for LndConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LndConfig")
            .field("rest_url", &self.rest_url)
            .field("macaroon_hex", &"<redacted>")
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
    default: T,
) -> Result<T, BillPayError> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| BillPayError::Configuration(format!("{} must be a positive integer", key))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_minimal_config() {
        let config = LndConfig::from_lookup(lookup(&[
            ("LND_REST_URL", "https://localhost:8080/"),
            ("LND_MACAROON", "0201036c6e64"),
        ]))
        .unwrap();

        assert_eq!(config.rest_url, "https://localhost:8080");
        assert_eq!(config.macaroon_header(), "0201036c6e64");
        assert_eq!(config.tls, TlsTrust::SystemRoots);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_in_flight, 16);
        assert!(!config.is_insecure());
    }

    #[test]
    fn test_missing_url_or_macaroon() {
        assert!(LndConfig::from_lookup(lookup(&[("LND_MACAROON", "00")])).is_err());
        assert!(LndConfig::from_lookup(lookup(&[("LND_REST_URL", "https://node:8080")])).is_err());
        assert!(LndConfig::from_lookup(lookup(&[
            ("LND_REST_URL", "https://node:8080"),
            ("LND_MACAROON", "not hex"),
        ]))
        .is_err());
    }

    #[test]
    fn test_macaroon_from_file_is_hex_encoded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x02, 0x01, 0x03]).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = LndConfig::from_lookup(lookup(&[
            ("LND_REST_URL", "https://node:8080"),
            ("LND_MACAROON_PATH", path.as_str()),
        ]))
        .unwrap();

        assert_eq!(config.macaroon_header(), "020103");
    }

    #[test]
    fn test_tls_trust_selection() {
        let base = [("LND_REST_URL", "https://node:8080"), ("LND_MACAROON", "00")];

        let mut with_cert = base.to_vec();
        with_cert.push(("LND_CERT", "/etc/lnd/tls.cert"));
        with_cert.push(("LND_TLS_INSECURE", "true"));
        let config = LndConfig::from_lookup(lookup(&with_cert)).unwrap();
        assert_eq!(config.tls, TlsTrust::Certificate(PathBuf::from("/etc/lnd/tls.cert")));

        let mut insecure = base.to_vec();
        insecure.push(("LND_TLS_INSECURE", "true"));
        let config = LndConfig::from_lookup(lookup(&insecure)).unwrap();
        assert!(config.is_insecure());
    }

    #[test]
    fn test_insecure_refused_in_production() {
        let vars = [
            ("LND_REST_URL", "https://node:8080"),
            ("LND_MACAROON", "00"),
            ("LND_TLS_INSECURE", "1"),
            ("ENVIRONMENT", "production"),
        ];
        let err = LndConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("LND_TLS_INSECURE"));
    }

    #[test]
    fn test_timeout_and_limit_parsing() {
        let vars = [
            ("LND_REST_URL", "https://node:8080"),
            ("LND_MACAROON", "00"),
            ("LND_TIMEOUT_SECS", "5"),
            ("LND_MAX_IN_FLIGHT", "4"),
        ];
        let config = LndConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_in_flight, 4);

        let vars = [
            ("LND_REST_URL", "https://node:8080"),
            ("LND_MACAROON", "00"),
            ("LND_TIMEOUT_SECS", "soon"),
        ];
        assert!(LndConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_debug_redacts_macaroon() {
        let config = LndConfig::new("https://node:8080", "0201036c6e64deadbeef");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("deadbeef"));
        assert!(debug.contains("<redacted>"));
    }
}
