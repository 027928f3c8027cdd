use clap::Parser;
use ledger_core::Blockchain;
use ledger_node::{router, Args, LedgerService};
use std::net::SocketAddr;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.chain_config()?;
    info!(
        difficulty = config.difficulty,
        max_batch = ?config.max_batch_size,
        timeout_ms = ?config.mining_timeout_ms,
        strategy = ?config.strategy,
        "chain configured"
    );
    let service = LedgerService::new(Blockchain::with_config(config)?);
    let app = router(service);

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
