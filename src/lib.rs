#![deny(unsafe_code)]

//! Macaroon-authenticated LND client with a live invoice subscription.
//!
//! [`LndClient::init`] reads `tls.cert` and `admin.macaroon` from an lnd data directory, opens a
//! TLS gRPC channel whose every call carries the macaroon, and starts a background task that
//! consumes `SubscribeInvoices`. Request/response calls (`list_peers`, `make_invoice`,
//! `view_invoice`) share the same channel and run independently of the subscription.
//!
//! Features
//! - `transport-direct` (default): direct TLS gRPC via tonic
//!
//! Example
//! ```no_run
//! use lnd_invoice_client::{config::LndConfig, LndClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LndConfig::with_data_dir("/home/satoshi/.lnd");
//! let client = LndClient::init(config).await?;
//! let invoice = client.make_invoice(1_000, "coffee").await?;
//! let status = client.view_invoice(&invoice.payment_hash).await?;
//! println!("settled: {}", status.settled);
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod backoff;
pub mod client;
pub mod config;
pub mod credentials;
pub mod cursor;
pub mod handler;
pub mod invoice;
pub mod macaroon;
pub mod node;
pub mod proto;
pub mod rpc;
pub mod subscription;
pub mod transport;

pub use client::{LndClient, LndError, Result};
pub use proto::lnrpc;
