#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use lnd_invoice_client::{
    lnrpc::{
        self, AddInvoiceResponse, InvoiceSubscription, ListPeersRequest, ListPeersResponse,
        PayReq, PayReqString, PaymentHash, Peer,
    },
    rpc::{InvoiceStream, LightningRpc},
};
use parking_lot::Mutex;
use tonic::Status;

/// What the next `SubscribeInvoices` call should produce.
pub enum Script {
    /// Yield these items, then either stay open forever or end the stream.
    Stream {
        items: Vec<Result<lnrpc::Invoice, Status>>,
        hold_open: bool,
    },
    /// Stay quiet for `after`, then fail with `status`.
    DropAfter { after: Duration, status: Status },
    /// Reject the subscribe call itself.
    Reject(Status),
}

impl Script {
    pub fn open(items: Vec<lnrpc::Invoice>) -> Self {
        Self::Stream {
            items: items.into_iter().map(Ok).collect(),
            hold_open: true,
        }
    }

    pub fn closing(items: Vec<lnrpc::Invoice>) -> Self {
        Self::Stream {
            items: items.into_iter().map(Ok).collect(),
            hold_open: false,
        }
    }

    pub fn failing(status: Status) -> Self {
        Self::Stream {
            items: vec![Err(status)],
            hold_open: false,
        }
    }

    pub fn drops_after(after: Duration, status: Status) -> Self {
        Self::DropAfter { after, status }
    }
}

/// Decrements the live-stream count when the stream holding it is dropped.
struct LiveStream(Arc<AtomicUsize>);

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory stand-in for an lnd node.
#[derive(Default)]
pub struct MockNode {
    pub delay: Option<Duration>,
    peers: Mutex<Vec<Peer>>,
    invoices: Mutex<HashMap<Vec<u8>, lnrpc::Invoice>>,
    added: Mutex<Vec<lnrpc::Invoice>>,
    lookups: Mutex<usize>,
    scripts: Mutex<VecDeque<Script>>,
    subscriptions: Mutex<Vec<InvoiceSubscription>>,
    live_streams: Arc<AtomicUsize>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_peers(&self, peers: Vec<Peer>) {
        *self.peers.lock() = peers;
    }

    pub fn push_script(&self, script: Script) {
        self.scripts.lock().push_back(script);
    }

    pub fn added(&self) -> Vec<lnrpc::Invoice> {
        self.added.lock().clone()
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }

    pub fn subscriptions(&self) -> Vec<InvoiceSubscription> {
        self.subscriptions.lock().clone()
    }

    /// Subscription streams handed out and not yet dropped.
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    fn tracked(&self, stream: InvoiceStream) -> InvoiceStream {
        self.live_streams.fetch_add(1, Ordering::SeqCst);
        let live = LiveStream(Arc::clone(&self.live_streams));
        stream
            .map(move |item| {
                let _live = &live;
                item
            })
            .boxed()
    }

    async fn latency(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

pub fn peer(pub_key: &str) -> Peer {
    Peer {
        pub_key: pub_key.to_string(),
        address: "127.0.0.1:9735".to_string(),
        ..Peer::default()
    }
}

pub fn hash_for(index: u64) -> Vec<u8> {
    let mut hash = vec![0u8; 32];
    hash[24..].copy_from_slice(&index.to_be_bytes());
    hash
}

/// Invoice event as lnd would push it on creation.
pub fn created_event(add_index: u64) -> lnrpc::Invoice {
    lnrpc::Invoice {
        memo: format!("invoice {add_index}"),
        r_hash: hash_for(add_index),
        value: 1_000,
        payment_request: format!("lnbcrt10u1p{add_index:04}"),
        creation_date: 1_700_000_000 + i64::try_from(add_index).unwrap_or_default(),
        expiry: 120,
        private: true,
        add_index,
        ..lnrpc::Invoice::default()
    }
}

/// Invoice event as lnd would push it on settlement.
pub fn settled_event(add_index: u64, settle_index: u64) -> lnrpc::Invoice {
    lnrpc::Invoice {
        settled: true,
        state: lnrpc::invoice::InvoiceState::Settled as i32,
        settle_index,
        amt_paid_msat: 1_000_000,
        ..created_event(add_index)
    }
}

#[async_trait]
impl LightningRpc for MockNode {
    async fn list_peers(&self, _req: ListPeersRequest) -> Result<ListPeersResponse, Status> {
        self.latency().await;
        Ok(ListPeersResponse {
            peers: self.peers.lock().clone(),
        })
    }

    async fn add_invoice(&self, req: lnrpc::Invoice) -> Result<AddInvoiceResponse, Status> {
        self.latency().await;
        let mut invoices = self.invoices.lock();
        let add_index = invoices.len() as u64 + 1;
        let r_hash = hash_for(add_index);
        let payment_request = format!("lnbcrt{}n1p{}", req.value, hex::encode(&r_hash));
        let stored = lnrpc::Invoice {
            r_hash: r_hash.clone(),
            payment_request: payment_request.clone(),
            creation_date: 1_700_000_000 + i64::try_from(add_index).unwrap_or_default(),
            add_index,
            ..req.clone()
        };
        invoices.insert(r_hash.clone(), stored);
        self.added.lock().push(req);
        Ok(AddInvoiceResponse {
            r_hash,
            payment_request,
            add_index,
            ..AddInvoiceResponse::default()
        })
    }

    async fn decode_pay_req(&self, req: PayReqString) -> Result<PayReq, Status> {
        self.latency().await;
        let invoices = self.invoices.lock();
        let inv = invoices
            .values()
            .find(|inv| inv.payment_request == req.pay_req)
            .ok_or_else(|| Status::invalid_argument("invalid payment request"))?;
        Ok(PayReq {
            payment_hash: hex::encode(&inv.r_hash),
            num_satoshis: inv.value,
            expiry: inv.expiry,
            description: inv.memo.clone(),
            ..PayReq::default()
        })
    }

    async fn lookup_invoice(&self, req: PaymentHash) -> Result<lnrpc::Invoice, Status> {
        self.latency().await;
        *self.lookups.lock() += 1;
        self.invoices
            .lock()
            .get(&req.r_hash)
            .cloned()
            .ok_or_else(|| Status::not_found("unable to locate invoice"))
    }

    async fn subscribe_invoices(&self, req: InvoiceSubscription) -> Result<InvoiceStream, Status> {
        self.subscriptions.lock().push(req);
        let script = self.scripts.lock().pop_front();
        let stream = match script {
            Some(Script::Reject(status)) => return Err(status),
            Some(Script::Stream { items, hold_open }) => {
                let items = stream::iter(items);
                if hold_open {
                    items.chain(stream::pending()).boxed()
                } else {
                    items.boxed()
                }
            }
            Some(Script::DropAfter { after, status }) => stream::once(async move {
                tokio::time::sleep(after).await;
                Err(status)
            })
            .boxed(),
            None => stream::pending::<Result<lnrpc::Invoice, Status>>().boxed(),
        };
        Ok(self.tracked(stream))
    }
}
