mod config;
mod error;
mod ledger;
mod reclaim;
mod wallet;

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    ledger::SolanaLedger,
    reclaim::{FleetRunner, TokioPause},
};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reclaimer=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting rent reclaimer");

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        "⚙️  batch size {}, {} attempts per batch, {}-{}s between wallets",
        config.batch_size, config.max_attempts, config.delay_from, config.delay_to
    );

    let identities = wallet::load_identities(&config.keys_file)
        .with_context(|| format!("failed to load wallets from {}", config.keys_file))?;

    let ledger = Arc::new(SolanaLedger::new(
        config.solana_rpc_url.clone(),
        config.commitment,
        config.confirm_poll_interval,
    ));
    let runner = FleetRunner::from_config(&config, ledger, Arc::new(TokioPause))?;

    runner.run(&identities).await;

    Ok(())
}
