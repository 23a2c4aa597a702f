use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wallet_watcher::config::Config;
use wallet_watcher::monitor::Monitor;
use wallet_watcher::report_worker::run_report_worker;
use wallet_watcher::rpc::RpcClient;
use wallet_watcher::supervisor::{run_block_driver, run_pending_driver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Inspect every transaction of each new block
    Blocks,
    /// Poll the pending pool
    Pending,
    Both,
}

#[derive(Parser)]
#[command(name = "watcher")]
#[command(about = "Report swaps made by watched wallets through a DEX router", long_about = None)]
struct Cli {
    #[arg(short, long, value_enum, default_value = "both")]
    mode: Mode,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting wallet watcher");

    let config = Config::from_env()?;
    info!("Configuration loaded");
    let watchlist = config.watchlist();
    info!(
        "Watching {} address(es) for swaps through router {}",
        watchlist.len(),
        watchlist.router()
    );
    info!(
        "RPC URLs: {} endpoint(s) configured",
        config.ws_rpc_urls.len()
    );

    let client =
        RpcClient::connect(&config.ws_rpc_urls, config.request_timeout, config.max_retries)
            .await?;
    info!("RPC client connected");

    let monitor = Monitor::new(client, watchlist, config.explorer_tx_url.clone());

    let (tx, rx) = mpsc::channel(256);
    let reporter = tokio::spawn(run_report_worker(tokio::io::stdout(), rx));

    let drivers = async {
        match cli.mode {
            Mode::Blocks => run_block_driver(&monitor, config.max_retries, tx).await,
            Mode::Pending => {
                run_pending_driver(&monitor, config.poll_interval, config.seen_tx_ttl, tx).await
            }
            Mode::Both => {
                tokio::try_join!(
                    run_block_driver(&monitor, config.max_retries, tx.clone()),
                    run_pending_driver(&monitor, config.poll_interval, config.seen_tx_ttl, tx),
                )?;
                Ok(())
            }
        }
    };

    if let Err(e) = drivers.await {
        error!("Watcher error: {:#}", e);
        reporter.abort();
        return Err(e);
    }

    reporter.await??;
    Ok(())
}
