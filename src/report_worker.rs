use crate::models::Observation;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::warn;

/// Prints observations to `out` until every sender is dropped.
pub async fn run_report_worker<W>(
    mut out: W,
    mut rx: mpsc::Receiver<Observation>,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(observation) = rx.recv().await {
        let block = format!("{observation}\n");
        if let Err(e) = write_block(&mut out, block.as_bytes()).await {
            warn!("Failed to write report: {}", e);
        }
    }
    Ok(())
}

async fn write_block<W: AsyncWrite + Unpin>(out: &mut W, block: &[u8]) -> std::io::Result<()> {
    out.write_all(block).await?;
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonitoredTransaction;
    use alloy_primitives::{Address, B256, U256};

    #[tokio::test]
    async fn writes_one_block_per_observation() {
        let (tx, rx) = mpsc::channel(4);
        for byte in [0xab, 0xcd] {
            tx.send(Observation::watch_match(MonitoredTransaction {
                hash: B256::repeat_byte(byte),
                from: Address::repeat_byte(0x01),
                to: None,
                value: U256::ZERO,
            }))
            .await
            .unwrap();
        }
        drop(tx);

        let mut out = Vec::new();
        run_report_worker(&mut out, rx).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("From: 0x0101010101010101010101010101010101010101 | ").count(), 2);
        assert!(text.contains(&format!("Tx Hash: {:?}", B256::repeat_byte(0xab))));
        assert!(text.ends_with(&format!("Tx Hash: {:?}\n", B256::repeat_byte(0xcd))));
    }
}
