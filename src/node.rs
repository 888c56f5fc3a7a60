use std::{future::Future, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tonic::Status;
use tracing::debug;

use crate::{
    client::{LndError, Result},
    config::LndConfig,
    proto::lnrpc::{self, ListPeersRequest, PayReqString, PaymentHash, Peer},
    rpc::LightningRpc,
};

/// Result of [`NodeClient::make_invoice`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeInvoiceResponse {
    /// Hex payment hash, taken from the decoded payment request.
    pub payment_hash: String,
    /// BOLT 11 payment request to hand to the payer.
    pub payment_request: String,
}

/// Result of [`NodeClient::view_invoice`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewInvoiceResponse {
    pub creation_date: i64,
    pub payment_request: String,
    pub expiry: i64,
    pub settled: bool,
    /// Local wall-clock time at which the response arrived, in milliseconds since the Unix
    /// epoch. Used to audit settlement latency from the client's side.
    pub observed_at_ms: u64,
}

impl ViewInvoiceResponse {
    /// `observed_at_ms` truncated to whole seconds.
    #[must_use]
    pub fn observed_at_secs(&self) -> u64 {
        self.observed_at_ms / 1_000
    }
}

/// Stateless request/response calls against an lnd node.
///
/// Every call is bounded by the configured deadline; when it expires the in-flight call is
/// dropped and [`LndError::Timeout`] is returned.
pub struct NodeClient<R: ?Sized> {
    rpc: Arc<R>,
    rpc_timeout: Duration,
    invoice_expiry_secs: i64,
}

impl<R: ?Sized> Clone for NodeClient<R> {
    fn clone(&self) -> Self {
        Self {
            rpc: self.rpc.clone(),
            rpc_timeout: self.rpc_timeout,
            invoice_expiry_secs: self.invoice_expiry_secs,
        }
    }
}

impl<R: LightningRpc + ?Sized> NodeClient<R> {
    pub fn new(rpc: Arc<R>, config: &LndConfig) -> Self {
        Self {
            rpc,
            rpc_timeout: config.rpc_timeout,
            invoice_expiry_secs: config.invoice_expiry_secs,
        }
    }

    /// Peers currently connected to the node, in the order the node reports them.
    ///
    /// # Errors
    /// [`LndError::Timeout`] or [`LndError::Remote`].
    pub async fn list_peers(&self) -> Result<Vec<Peer>> {
        let res = self
            .call("ListPeers", self.rpc.list_peers(ListPeersRequest::default()))
            .await?;
        for peer in &res.peers {
            debug!(
                target: "lnd_invoice_client::node",
                pub_key = %peer.pub_key,
                address = %peer.address,
                "peer"
            );
        }
        Ok(res.peers)
    }

    /// Create a private invoice for `amount_sat` and return its hash and payment request.
    ///
    /// The hash is read back by decoding the freshly issued payment request, so the value
    /// returned is exactly the one a payer will see.
    ///
    /// # Errors
    /// Fails if either the add or the decode call fails or times out.
    pub async fn make_invoice(
        &self,
        amount_sat: i64,
        description: &str,
    ) -> Result<MakeInvoiceResponse> {
        let invoice = lnrpc::Invoice {
            memo: description.to_string(),
            value: amount_sat,
            expiry: self.invoice_expiry_secs,
            private: true,
            ..lnrpc::Invoice::default()
        };
        let added = self.call("AddInvoice", self.rpc.add_invoice(invoice)).await?;
        let decoded = self
            .call(
                "DecodePayReq",
                self.rpc.decode_pay_req(PayReqString {
                    pay_req: added.payment_request.clone(),
                }),
            )
            .await?;
        debug!(
            target: "lnd_invoice_client::node",
            payment_hash = %decoded.payment_hash,
            add_index = added.add_index,
            "invoice created"
        );
        Ok(MakeInvoiceResponse {
            payment_hash: decoded.payment_hash,
            payment_request: added.payment_request,
        })
    }

    /// Look up an invoice by its hex payment hash.
    ///
    /// # Errors
    /// [`LndError::InvalidPaymentHash`] if the argument is not 32 hex-encoded bytes,
    /// [`LndError::Remote`] if the node does not know the invoice, [`LndError::Timeout`].
    pub async fn view_invoice(&self, payment_hash_hex: &str) -> Result<ViewInvoiceResponse> {
        let r_hash = parse_payment_hash(payment_hash_hex)?;
        let inv = self
            .call(
                "LookupInvoice",
                self.rpc.lookup_invoice(PaymentHash {
                    r_hash,
                    ..PaymentHash::default()
                }),
            )
            .await?;
        let observed_at_ms = unix_time_ms();
        #[allow(deprecated)]
        let settled = inv.settled || inv.state == lnrpc::invoice::InvoiceState::Settled as i32;
        Ok(ViewInvoiceResponse {
            creation_date: inv.creation_date,
            payment_request: inv.payment_request,
            expiry: inv.expiry,
            settled,
            observed_at_ms,
        })
    }

    async fn call<T, F>(&self, method: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, Status>>,
    {
        match timeout(self.rpc_timeout, fut).await {
            Ok(res) => res.map_err(LndError::from),
            Err(_) => Err(LndError::Timeout {
                method,
                after: self.rpc_timeout,
            }),
        }
    }
}

fn parse_payment_hash(hex_str: &str) -> Result<Vec<u8>> {
    match hex::decode(hex_str) {
        Ok(bytes) if bytes.len() == 32 => Ok(bytes),
        _ => Err(LndError::InvalidPaymentHash(hex_str.to_string())),
    }
}

fn unix_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_hash_must_be_32_bytes() {
        assert!(parse_payment_hash(&"ab".repeat(32)).is_ok());
        assert!(matches!(
            parse_payment_hash("abcd"),
            Err(LndError::InvalidPaymentHash(_))
        ));
        assert!(matches!(
            parse_payment_hash(&"zz".repeat(32)),
            Err(LndError::InvalidPaymentHash(_))
        ));
    }
}
