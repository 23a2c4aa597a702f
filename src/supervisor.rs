use crate::models::Observation;
use crate::monitor::Monitor;
use crate::rpc::{ChainClient, retry_strategy};
use crate::seen::SeenTransactions;
use anyhow::{Context, Result};
use futures::StreamExt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_retry::Retry;
use tracing::{debug, error, info, warn};

/// Runs one unit of work, logging a failure instead of propagating it.
pub async fn run_unit<F>(unit: &str, task: F) -> Option<Vec<Observation>>
where
    F: Future<Output = Result<Vec<Observation>>>,
{
    match task.await {
        Ok(observations) => Some(observations),
        Err(e) => {
            error!("Error processing {}: {:#}", unit, e);
            None
        }
    }
}

async fn forward(tx: &mpsc::Sender<Observation>, observations: Vec<Observation>) -> Result<()> {
    for observation in observations {
        tx.send(observation)
            .await
            .context("Report worker stopped")?;
    }
    Ok(())
}

/// Follows new block headers, resubscribing with bounded backoff whenever the stream ends.
pub async fn run_block_driver<C: ChainClient>(
    monitor: &Monitor<C>,
    max_retries: usize,
    tx: mpsc::Sender<Observation>,
) -> Result<()> {
    loop {
        let mut blocks = Retry::spawn(retry_strategy(max_retries), || async {
            monitor.client().subscribe_blocks().await.inspect_err(|e| {
                warn!("Block subscription failed: {}", e);
            })
        })
        .await
        .context("Unable to subscribe to new blocks")?;
        info!("Subscribed to new blocks");

        while let Some(block_number) = blocks.next().await {
            let unit = format!("block {block_number}");
            if let Some(observations) = run_unit(&unit, monitor.process_block(block_number)).await
            {
                forward(&tx, observations).await?;
            }
        }

        warn!("Block subscription ended, resubscribing");
    }
}

/// Polls the pending pool every `poll_interval`. A slow pass delays the next tick
/// instead of overlapping with it.
pub async fn run_pending_driver<C: ChainClient>(
    monitor: &Monitor<C>,
    poll_interval: Duration,
    seen_ttl: Duration,
    tx: mpsc::Sender<Observation>,
) -> Result<()> {
    let mut seen = SeenTransactions::new(seen_ttl);
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let expired = seen.prune(Instant::now());
        if expired > 0 {
            debug!("Expired {} seen transactions, {} remain", expired, seen.len());
        }

        if let Some(observations) = run_unit("pending pool", monitor.poll_pending(&mut seen)).await
        {
            forward(&tx, observations).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonitoredTransaction;
    use alloy_primitives::{Address, B256, U256};

    #[tokio::test]
    async fn failed_unit_is_swallowed() {
        let result = run_unit("block 1", async { Err(anyhow::anyhow!("timeout")) }).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn successful_unit_passes_observations_through() {
        let observation = Observation::watch_match(MonitoredTransaction {
            hash: B256::ZERO,
            from: Address::ZERO,
            to: None,
            value: U256::ZERO,
        });
        let result = run_unit("block 2", async move { Ok(vec![observation]) }).await;
        assert_eq!(result.map(|o| o.len()), Some(1));
    }

    #[tokio::test]
    async fn forwarding_fails_once_worker_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let observation = Observation::watch_match(MonitoredTransaction {
            hash: B256::ZERO,
            from: Address::ZERO,
            to: None,
            value: U256::ZERO,
        });
        assert!(forward(&tx, vec![observation]).await.is_err());
    }
}
