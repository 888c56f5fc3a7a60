use std::error::Error;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::invoice::Invoice;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Receives every invoice event delivered by the subscription, in delivery order.
///
/// Runs inline in the consumer task: a slow handler delays the next event, so keep it bounded.
/// Returned errors are logged by the consumer and never stop it.
#[async_trait]
pub trait InvoiceHandler: Send + Sync + 'static {
    async fn handle(&self, invoice: &Invoice) -> Result<(), BoxError>;
}

/// Emits one tracing record per invoice event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingInvoiceHandler;

#[async_trait]
impl InvoiceHandler for LoggingInvoiceHandler {
    async fn handle(&self, invoice: &Invoice) -> Result<(), BoxError> {
        info!(
            target: "lnd_invoice_client::handler",
            payment_hash = %invoice.payment_hash,
            state = ?invoice.state,
            amount_msat = invoice.amount_msat,
            amount_paid_msat = invoice.amount_paid_msat,
            add_index = invoice.add_index,
            settle_index = invoice.settle_index,
            "invoice update received"
        );
        Ok(())
    }
}

/// Forwards invoice events to a channel so they can be consumed outside the subscription task.
#[derive(Clone, Debug)]
pub struct ChannelInvoiceHandler {
    tx: mpsc::UnboundedSender<Invoice>,
}

impl ChannelInvoiceHandler {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Invoice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl InvoiceHandler for ChannelInvoiceHandler {
    async fn handle(&self, invoice: &Invoice) -> Result<(), BoxError> {
        self.tx
            .send(invoice.clone())
            .map_err(|_| "invoice receiver dropped".into())
    }
}
