use std::path::PathBuf;

use lnd_invoice_client::{config::LndConfig, LndClient};
use tracing_subscriber::EnvFilter;

/// Connects to a local lnd node, prints its peers, optionally creates an invoice, then logs
/// invoice events until ctrl-c.
///
/// Usage: cargo run --example invoice_watch -- [--lnddir DIR] [--addr URL] [--cursor FILE]
///        [--invoice SATS]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let data_dir = flag_value(&args, "--lnddir").unwrap_or_else(|| ".".to_string());
    let mut config = LndConfig::with_data_dir(data_dir);
    if let Some(addr) = flag_value(&args, "--addr") {
        config.address = addr;
    }
    config.cursor_path = flag_value(&args, "--cursor").map(PathBuf::from);

    let client = LndClient::init(config).await?;

    let peers = client.list_peers().await?;
    println!("{} peer(s)", peers.len());
    for peer in &peers {
        println!("  {} @ {}", peer.pub_key, peer.address);
    }

    if let Some(sats) = flag_value(&args, "--invoice") {
        let made = client.make_invoice(sats.parse()?, "invoice_watch").await?;
        println!("payment_request: {}", made.payment_request);
        let viewed = client.view_invoice(&made.payment_hash).await?;
        println!("settled: {} (observed at {})", viewed.settled, viewed.observed_at_secs());
    }

    let mut state = client.subscribe_state();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                println!("subscription: {current}");
                if current.is_terminal() {
                    break;
                }
            }
        }
    }

    client.shutdown().await?;
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|pair| pair[0] == flag)
        .map(|pair| pair[1].clone())
}
