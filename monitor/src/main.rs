//! chess-monitor: print engine suggestions for a game in progress.
//!
//! Reads the displayed move list from `--moves-file`, which an external
//! scraper keeps current, and writes one report per move to stdout. Logs go
//! to stderr. Ctrl-C stops the monitor cleanly.

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use chess_monitor::{run_monitor, Cli, MoveFileSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging (RUST_LOG wins over --log-level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let settings = cli.settings()?;
    tracing::info!(game = %settings.game_id, "Starting chess-monitor");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl-C, stopping");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                // Keep the sender alive so the monitor is not stopped
                std::future::pending::<()>().await;
            }
        }
    });

    let mut source = MoveFileSource::new(&cli.moves_file);
    let mut stdout = std::io::stdout();
    run_monitor(&settings, &mut source, &mut stdout, shutdown_rx).await?;

    Ok(())
}
