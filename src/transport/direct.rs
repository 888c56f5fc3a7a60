use std::time::Duration;

use tokio::time::timeout;
use tonic::{
    service::interceptor::InterceptedService,
    transport::{Certificate, ClientTlsConfig, Endpoint},
};
use tracing::debug;

use super::{Connection, TransportError};
use crate::{config::LndConfig, credentials::Credential};

const HTTP2_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Dial lnd over TLS and bind the credential's macaroon to the resulting channel.
///
/// The node's own certificate is the only trust root. Dialing is eager, so a bad address,
/// refused connection or failed handshake is reported here rather than on the first call.
/// There is no retry; callers retry initialization as a whole.
///
/// # Errors
/// Returns [`TransportError::Connection`] when the endpoint is invalid or cannot be reached.
pub async fn connect(config: &LndConfig, credential: Credential) -> Result<Connection, TransportError> {
    let endpoint = endpoint(config, &credential)?;
    debug!(
        target: "lnd_invoice_client::transport",
        address = %config.address,
        "dialing lnd"
    );
    let channel = timeout(config.connect_timeout, endpoint.connect())
        .await
        .map_err(|_| {
            TransportError::connection_message(format!(
                "timed out connecting to {}",
                config.address
            ))
        })?
        .map_err(|e| TransportError::connection("direct transport connect failed", e))?;
    debug!(target: "lnd_invoice_client::transport", "TLS channel established");
    Ok(InterceptedService::new(channel, credential.interceptor()))
}

fn endpoint(config: &LndConfig, credential: &Credential) -> Result<Endpoint, TransportError> {
    let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(credential.tls_cert()));
    if let Some(domain) = &config.tls_domain {
        tls = tls.domain_name(domain.clone());
    }
    Endpoint::from_shared(config.address.clone())
        .map_err(|e| TransportError::connection("invalid gRPC endpoint", e))?
        .connect_timeout(config.connect_timeout)
        .http2_keep_alive_interval(HTTP2_KEEPALIVE_INTERVAL)
        .keep_alive_while_idle(true)
        .tls_config(tls)
        .map_err(|e| TransportError::connection("invalid TLS client config", e))
}
