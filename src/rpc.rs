//! The remote procedure surface this crate needs from lnd.
//!
//! [`LightningRpc`] is the seam between the request/subscription logic and the wire: the gRPC
//! implementation lives here, test doubles and alternative transports implement the same trait.

use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tonic::Status;

use crate::{
    proto::lnrpc::{
        self, lightning_client::LightningClient, AddInvoiceResponse, InvoiceSubscription,
        ListPeersRequest, ListPeersResponse, PayReq, PayReqString, PaymentHash,
    },
    transport::Connection,
};

/// Server-pushed invoice events. Each item is either a decoded invoice or the status that ended
/// (or interrupted) the stream.
pub type InvoiceStream = Pin<Box<dyn Stream<Item = Result<lnrpc::Invoice, Status>> + Send>>;

#[async_trait]
pub trait LightningRpc: Send + Sync + 'static {
    async fn list_peers(&self, req: ListPeersRequest) -> Result<ListPeersResponse, Status>;

    async fn add_invoice(&self, req: lnrpc::Invoice) -> Result<AddInvoiceResponse, Status>;

    async fn decode_pay_req(&self, req: PayReqString) -> Result<PayReq, Status>;

    async fn lookup_invoice(&self, req: PaymentHash) -> Result<lnrpc::Invoice, Status>;

    /// Open a server-streaming subscription starting after the given indices.
    async fn subscribe_invoices(&self, req: InvoiceSubscription) -> Result<InvoiceStream, Status>;
}

/// [`LightningRpc`] over a macaroon-authenticated tonic channel.
///
/// At most one `SubscribeInvoices` stream is live per connection: while one is held, further
/// subscribe calls on this value or its clones fail with `FailedPrecondition`. Dropping the
/// stream frees the slot.
#[derive(Clone, Debug)]
pub struct GrpcLightning {
    client: LightningClient<Connection>,
    invoice_stream: StreamSlot,
}

impl GrpcLightning {
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self {
            client: LightningClient::new(conn),
            invoice_stream: StreamSlot::default(),
        }
    }

    // tonic clients take `&mut self`; clones share the underlying channel.
    fn client(&self) -> LightningClient<Connection> {
        self.client.clone()
    }
}

#[async_trait]
impl LightningRpc for GrpcLightning {
    async fn list_peers(&self, req: ListPeersRequest) -> Result<ListPeersResponse, Status> {
        Ok(self.client().list_peers(req).await?.into_inner())
    }

    async fn add_invoice(&self, req: lnrpc::Invoice) -> Result<AddInvoiceResponse, Status> {
        Ok(self.client().add_invoice(req).await?.into_inner())
    }

    async fn decode_pay_req(&self, req: PayReqString) -> Result<PayReq, Status> {
        Ok(self.client().decode_pay_req(req).await?.into_inner())
    }

    async fn lookup_invoice(&self, req: PaymentHash) -> Result<lnrpc::Invoice, Status> {
        Ok(self.client().lookup_invoice(req).await?.into_inner())
    }

    async fn subscribe_invoices(&self, req: InvoiceSubscription) -> Result<InvoiceStream, Status> {
        let slot = self.invoice_stream.claim().ok_or_else(|| {
            Status::failed_precondition("an invoice subscription is already active on this connection")
        })?;
        let stream = self.client().subscribe_invoices(req).await?.into_inner();
        // The slot is released when the returned stream is dropped.
        Ok(stream
            .map(move |item| {
                let _held = &slot;
                item
            })
            .boxed())
    }
}

/// Single-holder flag shared by clones.
#[derive(Clone, Debug, Default)]
struct StreamSlot(Arc<AtomicBool>);

impl StreamSlot {
    fn claim(&self) -> Option<SlotGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotGuard(Arc::clone(&self.0)))
    }
}

#[derive(Debug)]
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_slot_has_one_holder_across_clones() {
        let slot = StreamSlot::default();
        let shared = slot.clone();

        let guard = slot.claim().expect("first claim");
        assert!(shared.claim().is_none());
        assert!(slot.claim().is_none());

        drop(guard);
        assert!(shared.claim().is_some());
    }
}
