//! Escrow ledger demo server binary
//!
//! Opens the ledger against in-memory host interfaces and runs until
//! interrupted. Real deployments supply their own `ValueTransfer` and
//! `HeightSource` implementations.

use escrow_core::{BlockCounter, Config, Escrow, InMemoryBank};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting escrow ledger server");

    // Load configuration
    let config = Config::from_env()?;

    // Host interfaces (in-memory stand-ins)
    let bank = Arc::new(InMemoryBank::new());
    let heights = Arc::new(BlockCounter::new(1));

    // Open ledger
    let escrow = Escrow::open(config, bank, heights).await?;
    tracing::info!(
        admin = %escrow.config().admin,
        min_deal_value = escrow.config().min_deal_value,
        "Escrow ledger opened"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down escrow ledger server");
    escrow.shutdown().await?;
    Ok(())
}
