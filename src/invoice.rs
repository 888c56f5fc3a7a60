use serde::{Deserialize, Serialize};

use crate::proto::lnrpc;

/// Lifecycle of an invoice as reported by the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    Open,
    Accepted,
    Settled,
    Canceled,
}

impl From<lnrpc::invoice::InvoiceState> for InvoiceState {
    fn from(state: lnrpc::invoice::InvoiceState) -> Self {
        match state {
            lnrpc::invoice::InvoiceState::Open => Self::Open,
            lnrpc::invoice::InvoiceState::Accepted => Self::Accepted,
            lnrpc::invoice::InvoiceState::Settled => Self::Settled,
            lnrpc::invoice::InvoiceState::Canceled => Self::Canceled,
        }
    }
}

/// An invoice event pushed by the node's invoice subscription.
///
/// `payment_hash` is the lowercase hex of the preimage hash and identifies the invoice. The
/// settlement fields reflect the node's view at the time of the event; this client never sets
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub payment_hash: String,
    pub payment_request: String,
    pub memo: String,
    pub amount_sat: i64,
    pub amount_msat: i64,
    pub expiry_secs: i64,
    pub private: bool,
    pub creation_date: i64,
    pub state: InvoiceState,
    pub settled: bool,
    pub settle_date: i64,
    pub amount_paid_msat: i64,
    pub add_index: u64,
    pub settle_index: u64,
}

impl From<&lnrpc::Invoice> for Invoice {
    #[allow(deprecated)]
    fn from(inv: &lnrpc::Invoice) -> Self {
        // Older lnd versions only set the deprecated `settled` flag.
        let state = lnrpc::invoice::InvoiceState::try_from(inv.state)
            .map(InvoiceState::from)
            .unwrap_or(InvoiceState::Open);
        let state = if inv.settled { InvoiceState::Settled } else { state };
        let amount_msat = if inv.value_msat != 0 {
            inv.value_msat
        } else {
            inv.value.saturating_mul(1_000)
        };
        Self {
            payment_hash: hex::encode(&inv.r_hash),
            payment_request: inv.payment_request.clone(),
            memo: inv.memo.clone(),
            amount_sat: inv.value,
            amount_msat,
            expiry_secs: inv.expiry,
            private: inv.private,
            creation_date: inv.creation_date,
            state,
            settled: state == InvoiceState::Settled,
            settle_date: inv.settle_date,
            amount_paid_msat: inv.amt_paid_msat,
            add_index: inv.add_index,
            settle_index: inv.settle_index,
        }
    }
}

impl From<lnrpc::Invoice> for Invoice {
    fn from(inv: lnrpc::Invoice) -> Self {
        Self::from(&inv)
    }
}
