use std::{path::PathBuf, time::Duration};

/// Default lnd gRPC endpoint.
pub const DEFAULT_ADDRESS: &str = "https://localhost:10009";
/// TLS certificate file name inside the lnd data directory.
pub const TLS_CERT_FILE: &str = "tls.cert";
/// Macaroon file name inside the lnd data directory.
pub const MACAROON_FILE: &str = "admin.macaroon";
/// Expiry applied to invoices created through [`crate::node::NodeClient::make_invoice`].
pub const DEFAULT_INVOICE_EXPIRY_SECS: i64 = 120;

/// Global configuration applied to a [`crate::client::LndClient`] instance.
#[derive(Clone, Debug)]
pub struct LndConfig {
    /// Directory holding `tls.cert` and `admin.macaroon`.
    pub data_dir: PathBuf,
    /// gRPC endpoint, including scheme.
    pub address: String,
    /// Override the TLS server name when the certificate does not cover the host in `address`.
    pub tls_domain: Option<String>,
    /// Timeout applied to dialing and the TLS handshake.
    pub connect_timeout: Duration,
    /// Deadline applied to every request/response call.
    pub rpc_timeout: Duration,
    pub invoice_expiry_secs: i64,
    /// Where to persist the invoice subscription cursor. `None` keeps it in memory only, so each
    /// start replays the node's invoice history.
    pub cursor_path: Option<PathBuf>,
    pub subscription: SubscriptionConfig,
}

impl Default for LndConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            address: DEFAULT_ADDRESS.to_string(),
            tls_domain: None,
            connect_timeout: Duration::from_secs(10),
            rpc_timeout: Duration::from_secs(1),
            invoice_expiry_secs: DEFAULT_INVOICE_EXPIRY_SECS,
            cursor_path: None,
            subscription: SubscriptionConfig::default(),
        }
    }
}

impl LndConfig {
    /// Default configuration reading credentials from `data_dir`.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

/// Retry policy for the invoice subscription consumer.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Consecutive stream failures tolerated before the consumer gives up.
    pub max_retries: u32,
    /// Delay before the first re-subscribe; doubles on each further failure.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between re-subscribe attempts.
    pub max_backoff: Duration,
    /// A stream that stays up at least this long before failing ends the outage: the failure
    /// count and backoff start over.
    pub healthy_after: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(32),
            healthy_after: Duration::from_secs(60),
        }
    }
}
