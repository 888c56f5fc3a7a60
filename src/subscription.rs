//! Long-lived consumer for lnd's `SubscribeInvoices` stream.
//!
//! [`InvoiceSubscriptionManager::start`] opens the stream from the stored cursor and spawns a
//! single consumer task. The task decodes each pushed invoice, hands it to the
//! [`InvoiceHandler`], and records progress in the [`CursorStore`]. When the stream fails or the
//! node closes it, the task re-subscribes from the current cursor with exponential backoff, and
//! gives up after `max_retries` consecutive failures. A failure only counts as consecutive if
//! no event arrived and the stream was up for less than `healthy_after` since the previous one.
//! The owner can observe the state, stop the task, or await its terminal result.

use std::{fmt, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::{FutureExt, StreamExt};
use tokio::{sync::watch, task::JoinHandle, time};
use tracing::{debug, error, trace, warn};

use crate::{
    backoff,
    client::{LndError, Result},
    config::SubscriptionConfig,
    cursor::{CursorStore, SubscriptionCursor},
    handler::InvoiceHandler,
    invoice::Invoice,
    proto::lnrpc,
    rpc::{InvoiceStream, LightningRpc},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubscriptionState {
    #[default]
    Unsubscribed,
    Subscribing,
    Streaming,
    /// Waiting before re-subscribe attempt number `attempt`.
    Backoff { attempt: u32 },
    /// Stopped by the owner.
    Stopped,
    /// Gave up: initial subscribe failed or retries were exhausted.
    Terminated,
}

impl SubscriptionState {
    /// `true` for states the consumer never leaves.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Terminated)
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsubscribed => write!(f, "Unsubscribed"),
            Self::Subscribing => write!(f, "Subscribing"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Backoff { attempt } => write!(f, "Backoff (attempt {attempt})"),
            Self::Stopped => write!(f, "Stopped"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Owns the invoice consumer task.
///
/// Dropping the manager signals the task to stop; use [`stop`](Self::stop) to also wait for it.
pub struct InvoiceSubscriptionManager {
    state_rx: watch::Receiver<SubscriptionState>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<Result<()>>>,
}

impl InvoiceSubscriptionManager {
    /// Load the cursor, subscribe, and spawn the consumer task.
    ///
    /// # Errors
    /// Returns [`LndError::Cursor`] if the cursor cannot be loaded and [`LndError::Remote`] if the
    /// initial subscribe call is rejected. No task is spawned in either case.
    pub async fn start<R>(
        rpc: Arc<R>,
        handler: Arc<dyn InvoiceHandler>,
        store: Arc<dyn CursorStore>,
        config: SubscriptionConfig,
    ) -> Result<Self>
    where
        R: LightningRpc + ?Sized,
    {
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Unsubscribed);

        let cursor = match store.load() {
            Ok(cursor) => cursor,
            Err(e) => {
                state_tx.send_replace(SubscriptionState::Terminated);
                return Err(e.into());
            }
        };

        state_tx.send_replace(SubscriptionState::Subscribing);
        debug!(
            target: "lnd_invoice_client::subscription",
            add_index = cursor.add_index,
            settle_index = cursor.settle_index,
            "subscribing to invoices"
        );
        let stream = match rpc.subscribe_invoices(cursor.into()).await {
            Ok(stream) => stream,
            Err(status) => {
                error!(
                    target: "lnd_invoice_client::subscription",
                    error = %status,
                    "initial invoice subscription failed"
                );
                state_tx.send_replace(SubscriptionState::Terminated);
                return Err(status.into());
            }
        };
        state_tx.send_replace(SubscriptionState::Streaming);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let consumer = Consumer {
            rpc,
            handler,
            store,
            delays: Box::new(backoff::for_subscription(&config)),
            failures: 0,
            streaming_since: time::Instant::now(),
            config,
            cursor,
            state: state_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(async move {
            trace!(target: "lnd_invoice_client::subscription", "consumer spawned");
            let res = consumer.run(stream).await;
            trace!(target: "lnd_invoice_client::subscription", ok = res.is_ok(), "consumer exited");
            res
        });

        Ok(Self {
            state_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        })
    }

    /// State of the consumer as of its last transition.
    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SubscriptionState> {
        self.state_rx.clone()
    }

    /// `true` once the consumer task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal the consumer to stop and wait for it.
    ///
    /// # Errors
    /// Returns the terminal error if the consumer had already given up before the signal.
    pub async fn stop(mut self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.wait().await
    }

    /// Wait for the consumer to exit on its own, returning its terminal result.
    ///
    /// # Errors
    /// The last stream error once retries are exhausted, or [`LndError::Task`] if the task
    /// panicked.
    pub async fn join(mut self) -> Result<()> {
        self.wait().await
    }

    async fn wait(&mut self) -> Result<()> {
        match self.task.take() {
            Some(task) => task.await?,
            None => Ok(()),
        }
    }
}

impl Drop for InvoiceSubscriptionManager {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

impl fmt::Debug for InvoiceSubscriptionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvoiceSubscriptionManager")
            .field("state", &self.state())
            .field("finished", &self.is_finished())
            .finish()
    }
}

struct Consumer<R: ?Sized> {
    rpc: Arc<R>,
    handler: Arc<dyn InvoiceHandler>,
    store: Arc<dyn CursorStore>,
    config: SubscriptionConfig,
    cursor: SubscriptionCursor,
    /// Failures in the current outage.
    failures: u32,
    /// When the current stream was opened.
    streaming_since: time::Instant,
    delays: Box<dyn Iterator<Item = Duration> + Send>,
    state: watch::Sender<SubscriptionState>,
    shutdown: watch::Receiver<bool>,
}

impl<R: LightningRpc + ?Sized> Consumer<R> {
    async fn run(mut self, mut stream: InvoiceStream) -> Result<()> {
        loop {
            if *self.shutdown.borrow() {
                return self.stopped();
            }
            let next = tokio::select! {
                biased;
                _ = self.shutdown.changed() => return self.stopped(),
                next = stream.next() => next,
            };
            let err = match next {
                Some(Ok(raw)) => {
                    self.reset_retries();
                    self.dispatch(raw).await;
                    continue;
                }
                Some(Err(status)) => LndError::Stream(Box::new(status)),
                None => LndError::SubscriptionClosed,
            };
            let uptime = self.streaming_since.elapsed();
            if self.failures > 0 && uptime >= self.config.healthy_after {
                debug!(
                    target: "lnd_invoice_client::subscription",
                    uptime_secs = uptime.as_secs(),
                    "stream was healthy before failing, retry budget restored"
                );
                self.reset_retries();
            }
            // The failed stream is dropped before we re-subscribe.
            drop(stream);
            stream = match self.resubscribe(err).await? {
                Some(stream) => stream,
                None => return self.stopped(),
            };
        }
    }

    /// Re-open the stream from the current cursor. `Ok(None)` means the owner asked us to stop
    /// while waiting; `Err` means retries are exhausted.
    async fn resubscribe(&mut self, mut err: LndError) -> Result<Option<InvoiceStream>> {
        loop {
            self.failures += 1;
            let failures = self.failures;
            warn!(
                target: "lnd_invoice_client::subscription",
                error = %err,
                failures,
                max_retries = self.config.max_retries,
                "invoice stream error"
            );
            if failures > self.config.max_retries {
                error!(
                    target: "lnd_invoice_client::subscription",
                    error = %err,
                    "giving up on invoice subscription"
                );
                self.state.send_replace(SubscriptionState::Terminated);
                return Err(err);
            }

            let delay = self.delays.next().unwrap_or(self.config.max_backoff);
            self.state
                .send_replace(SubscriptionState::Backoff { attempt: failures });
            tokio::select! {
                biased;
                _ = self.shutdown.changed() => return Ok(None),
                () = time::sleep(delay) => {}
            }

            self.state.send_replace(SubscriptionState::Subscribing);
            debug!(
                target: "lnd_invoice_client::subscription",
                add_index = self.cursor.add_index,
                settle_index = self.cursor.settle_index,
                "re-subscribing to invoices"
            );
            let attempt = tokio::select! {
                biased;
                _ = self.shutdown.changed() => return Ok(None),
                res = self.rpc.subscribe_invoices(self.cursor.into()) => res,
            };
            match attempt {
                Ok(stream) => {
                    self.streaming_since = time::Instant::now();
                    self.state.send_replace(SubscriptionState::Streaming);
                    return Ok(Some(stream));
                }
                Err(status) => err = LndError::Stream(Box::new(status)),
            }
        }
    }

    async fn dispatch(&mut self, raw: lnrpc::Invoice) {
        let invoice = Invoice::from(&raw);
        trace!(
            target: "lnd_invoice_client::subscription",
            payment_hash = %invoice.payment_hash,
            add_index = invoice.add_index,
            settle_index = invoice.settle_index,
            "invoice event"
        );

        match AssertUnwindSafe(self.handler.handle(&invoice))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(
                target: "lnd_invoice_client::subscription",
                error = %e,
                payment_hash = %invoice.payment_hash,
                "invoice handler failed"
            ),
            Err(_) => error!(
                target: "lnd_invoice_client::subscription",
                payment_hash = %invoice.payment_hash,
                "invoice handler panicked"
            ),
        }

        if self.cursor.advance(&invoice) {
            // Stores may touch the filesystem; keep that off the runtime's workers.
            let store = Arc::clone(&self.store);
            let cursor = self.cursor;
            match tokio::task::spawn_blocking(move || store.save(cursor)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(
                    target: "lnd_invoice_client::subscription",
                    error = %e,
                    "failed to persist invoice cursor"
                ),
                Err(e) => warn!(
                    target: "lnd_invoice_client::subscription",
                    error = %e,
                    "invoice cursor save task failed"
                ),
            }
        }
    }

    fn reset_retries(&mut self) {
        if self.failures > 0 {
            self.failures = 0;
            self.delays = Box::new(backoff::for_subscription(&self.config));
        }
    }

    fn stopped(&self) -> Result<()> {
        debug!(target: "lnd_invoice_client::subscription", "invoice consumer stopped");
        self.state.send_replace(SubscriptionState::Stopped);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stopped_and_terminated_are_terminal() {
        assert!(SubscriptionState::Stopped.is_terminal());
        assert!(SubscriptionState::Terminated.is_terminal());
        assert!(!SubscriptionState::Backoff { attempt: 3 }.is_terminal());
        assert!(!SubscriptionState::default().is_terminal());
    }

    #[test]
    fn backoff_display_names_attempt() {
        assert_eq!(
            SubscriptionState::Backoff { attempt: 2 }.to_string(),
            "Backoff (attempt 2)"
        );
    }
}
