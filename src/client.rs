use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::watch;
use tonic::Status;
#[cfg(feature = "transport-direct")]
use tracing::info;

#[cfg(feature = "transport-direct")]
use crate::credentials::Credential;
use crate::{
    config::LndConfig,
    credentials::CredentialError,
    cursor::{CursorError, CursorStore, FileCursorStore, InMemoryCursorStore},
    handler::InvoiceHandler,
    node::{MakeInvoiceResponse, NodeClient, ViewInvoiceResponse},
    proto::lnrpc::Peer,
    rpc::{GrpcLightning, LightningRpc},
    subscription::{InvoiceSubscriptionManager, SubscriptionState},
    transport::TransportError,
};

/// Library-level error type surfaced by [`LndClient`].
#[derive(Debug, Error)]
pub enum LndError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{method} timed out after {after:?}")]
    Timeout {
        method: &'static str,
        after: Duration,
    },
    #[error(transparent)]
    Remote(#[from] Box<Status>),
    #[error("invoice stream failed: {0}")]
    Stream(Box<Status>),
    #[error("invoice stream closed by node")]
    SubscriptionClosed,
    #[error("invalid payment hash {0:?}: expected 64 hex characters")]
    InvalidPaymentHash(String),
    #[error(transparent)]
    Cursor(#[from] CursorError),
    #[error("invoice subscription task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<Status> for LndError {
    fn from(status: Status) -> Self {
        Self::Remote(Box::new(status))
    }
}

/// Result alias that defaults to [`LndError`].
pub type Result<T, E = LndError> = std::result::Result<T, E>;

/// Primary entry point: request/response calls plus the live invoice subscription, sharing one
/// authenticated connection.
pub struct LndClient<R: ?Sized = GrpcLightning> {
    node: NodeClient<R>,
    subscription: InvoiceSubscriptionManager,
}

#[cfg(feature = "transport-direct")]
impl LndClient<GrpcLightning> {
    /// Load credentials from `config.data_dir`, connect, and start the invoice subscription with
    /// the logging handler.
    ///
    /// # Errors
    /// Returns [`LndError`] when credentials cannot be loaded, the node cannot be reached, or the
    /// initial subscribe call fails.
    pub async fn init(config: LndConfig) -> Result<Self> {
        let store = cursor_store(&config);
        Self::init_with(
            config,
            Arc::new(crate::handler::LoggingInvoiceHandler),
            store,
        )
        .await
    }

    /// Like [`init`](Self::init) with a caller-supplied handler and cursor store.
    ///
    /// # Errors
    /// Same as [`init`](Self::init).
    pub async fn init_with(
        config: LndConfig,
        handler: Arc<dyn InvoiceHandler>,
        store: Arc<dyn CursorStore>,
    ) -> Result<Self> {
        let credential = Credential::load(&config.data_dir)?;
        let conn = crate::transport::direct::connect(&config, credential).await?;
        info!(
            target: "lnd_invoice_client::client",
            address = %config.address,
            "connected to lnd"
        );
        Self::from_rpc(Arc::new(GrpcLightning::new(conn)), &config, handler, store).await
    }
}

impl<R: LightningRpc + ?Sized> LndClient<R> {
    /// Build a client over an existing [`LightningRpc`] implementation and start the invoice
    /// subscription on it.
    ///
    /// # Errors
    /// Returns [`LndError`] when the cursor cannot be loaded or the initial subscribe fails.
    pub async fn from_rpc(
        rpc: Arc<R>,
        config: &LndConfig,
        handler: Arc<dyn InvoiceHandler>,
        store: Arc<dyn CursorStore>,
    ) -> Result<Self> {
        let subscription = InvoiceSubscriptionManager::start(
            rpc.clone(),
            handler,
            store,
            config.subscription.clone(),
        )
        .await?;
        Ok(Self {
            node: NodeClient::new(rpc, config),
            subscription,
        })
    }

    /// See [`NodeClient::list_peers`].
    ///
    /// # Errors
    /// Returns [`LndError::Timeout`] or [`LndError::Remote`].
    pub async fn list_peers(&self) -> Result<Vec<Peer>> {
        self.node.list_peers().await
    }

    /// See [`NodeClient::make_invoice`].
    ///
    /// # Errors
    /// Returns [`LndError`] if either underlying call fails.
    pub async fn make_invoice(
        &self,
        amount_sat: i64,
        description: &str,
    ) -> Result<MakeInvoiceResponse> {
        self.node.make_invoice(amount_sat, description).await
    }

    /// See [`NodeClient::view_invoice`].
    ///
    /// # Errors
    /// Returns [`LndError`] if the hash is malformed, unknown, or the call times out.
    pub async fn view_invoice(&self, payment_hash_hex: &str) -> Result<ViewInvoiceResponse> {
        self.node.view_invoice(payment_hash_hex).await
    }

    /// The request/response half, cheap to clone and share across tasks.
    pub fn node(&self) -> &NodeClient<R> {
        &self.node
    }

    /// Current state of the invoice subscription consumer.
    #[must_use]
    pub fn subscription_state(&self) -> SubscriptionState {
        self.subscription.state()
    }

    /// Receiver that observes every subscription state transition, including the terminal
    /// `Stopped` or `Terminated`.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SubscriptionState> {
        self.subscription.subscribe_state()
    }

    /// Stop the invoice subscription and wait for its task to exit.
    ///
    /// # Errors
    /// Returns the subscription's terminal error if it had already given up.
    pub async fn shutdown(self) -> Result<()> {
        self.subscription.stop().await
    }
}

/// Cursor store selected by `config.cursor_path`.
pub fn cursor_store(config: &LndConfig) -> Arc<dyn CursorStore> {
    match &config.cursor_path {
        Some(path) => Arc::new(FileCursorStore::new(path)),
        None => Arc::new(InMemoryCursorStore::default()),
    }
}
