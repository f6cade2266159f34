use std::cmp;
use std::collections::BTreeSet;
use std::num::NonZeroU64;

use mintrecon_fetch::{RangeFetcher, ScanRange};
use mintrecon_format::{Address, Log};
use mintrecon_rpc_client::RpcTransport;
use thiserror::Error as ThisError;

use crate::checkpoint::{
    BatchResult, CheckpointError, CheckpointStore, ScanProgress, TransactionRecord,
};
use crate::config::{RetryConfig, ScanConfig};

#[derive(Debug, ThisError)]
pub enum ScanError {
    #[error("Invalid scan range: {from_block} is past {to_block}.")]
    InvalidRange { from_block: u64, to_block: u64 },
    #[error("Failed to access the checkpoint store:\n{0}")]
    Checkpoint(#[from] CheckpointError),
    #[error(
        "Giving up on blocks [{}, {}] after {attempts} attempts, {batches_completed} batches are saved. Caused by:\n{source}",
        .range.from_block,
        .range.to_block
    )]
    RetriesExhausted {
        range: ScanRange,
        attempts: usize,
        batches_completed: usize,
        source: mintrecon_fetch::Error,
    },
    #[error("Batch {index} is marked processed but its record is missing.")]
    MissingBatchRecord { index: u64 },
}

/// Scan lifecycle. Failure is only reachable while scanning, after the
/// batch-level retries are spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Aggregating,
    Done,
    Failed,
}

/// Aggregate view over every stored batch. Rebuilt from the checkpoint
/// store, never a source of truth on its own.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub fee_payers: BTreeSet<Address>,
    pub confirmed_recipients: BTreeSet<Address>,
}

impl ScanSummary {
    /// Fee payers with no transfer observed.
    pub fn unconfirmed(&self) -> BTreeSet<Address> {
        self.fee_payers
            .difference(&self.confirmed_recipients)
            .cloned()
            .collect()
    }
}

/// Drives the scan over the configured range, one batch at a time.
///
/// A batch is never started before the previous one is durably saved, so
/// the stored progress always covers a contiguous prefix of the range.
/// Interrupting the process between batches is safe; the next run picks
/// up from the checkpoint without refetching saved batches.
pub struct ReconEngine<T, S> {
    fetcher: RangeFetcher<T>,
    store: S,
    scan: ScanConfig,
    max_span: NonZeroU64,
    retry: RetryConfig,
    state: ScanState,
}

impl<T: RpcTransport, S: CheckpointStore> ReconEngine<T, S> {
    pub fn new(
        fetcher: RangeFetcher<T>,
        store: S,
        scan: ScanConfig,
        max_span: NonZeroU64,
        retry: RetryConfig,
    ) -> Self {
        Self {
            fetcher,
            store,
            scan,
            max_span,
            retry,
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub async fn run(&mut self) -> Result<ScanSummary, ScanError> {
        match self.run_impl().await {
            Ok(summary) => {
                self.set_state(ScanState::Done);
                Ok(summary)
            }
            Err(e) => {
                self.set_state(ScanState::Failed);
                Err(e)
            }
        }
    }

    async fn run_impl(&mut self) -> Result<ScanSummary, ScanError> {
        let overall = ScanRange::new(self.scan.from_block, self.scan.to_block).map_err(|_| {
            ScanError::InvalidRange {
                from_block: self.scan.from_block,
                to_block: self.scan.to_block,
            }
        })?;

        let mut progress = self.store.load().await?;
        let cursor = cmp::max(overall.from_block, progress.next_block);

        if cursor <= overall.to_block {
            self.set_state(ScanState::Scanning);
            self.scan_batches(overall, &mut progress).await?;
        }

        self.set_state(ScanState::Aggregating);

        self.aggregate(&progress).await
    }

    async fn scan_batches(
        &mut self,
        overall: ScanRange,
        progress: &mut ScanProgress,
    ) -> Result<(), ScanError> {
        for (index, window) in overall.windows(self.max_span).enumerate() {
            let index = index as u64;

            if progress.processed_batches.contains(&index) {
                log::debug!(
                    "batch {} for blocks [{}, {}] already processed, skipping",
                    index,
                    window.from_block,
                    window.to_block
                );
                continue;
            }

            let result = self
                .fetch_batch_with_retry(window, progress.processed_batches.len())
                .await?;

            self.store.save_batch(index, &result).await?;
            progress.processed_batches.insert(index);
            progress.next_block = window.to_block + 1;

            log::info!(
                "saved batch {} with {} fee payers and {} recipients for blocks [{}, {}]",
                index,
                result.fee_payers.len(),
                result.confirmed_recipients.len(),
                window.from_block,
                window.to_block
            );

            self.retry.throttle().await;
        }

        Ok(())
    }

    async fn fetch_batch_with_retry(
        &self,
        window: ScanRange,
        batches_completed: usize,
    ) -> Result<BatchResult, ScanError> {
        let max_attempts = self.retry.max_attempts.get();
        let mut attempt = 0;

        loop {
            match self.fetch_batch(window).await {
                Ok(result) => return Ok(result),
                Err(source) => {
                    attempt += 1;

                    if attempt >= max_attempts {
                        return Err(ScanError::RetriesExhausted {
                            range: window,
                            attempts: attempt,
                            batches_completed,
                            source,
                        });
                    }

                    log::warn!(
                        "fetch failed for blocks [{}, {}], retry {}/{}. Caused by:\n{}",
                        window.from_block,
                        window.to_block,
                        attempt,
                        max_attempts - 1,
                        source
                    );

                    self.retry.sleep_before_retry(attempt - 1).await;
                }
            }
        }
    }

    async fn fetch_batch(&self, window: ScanRange) -> Result<BatchResult, mintrecon_fetch::Error> {
        let txs = self.fetcher.transactions_to(&self.scan.vault, window).await?;
        let logs = self
            .fetcher
            .logs(&self.scan.collection, &self.scan.transfer_topic, window)
            .await?;

        let mut fee_payers = BTreeSet::new();
        let mut transactions = Vec::new();

        for tx in txs {
            if tx.value.is_zero() {
                continue;
            }

            let Some(from) = tx.from else {
                continue;
            };

            fee_payers.insert(from.clone());
            transactions.push(TransactionRecord {
                hash: tx.hash,
                from,
                value: tx.value,
                block_number: *tx.block_number,
            });
        }

        let mut confirmed_recipients = BTreeSet::new();

        for log in logs.iter() {
            match transfer_recipient(log) {
                Some(addr) => {
                    confirmed_recipients.insert(addr);
                }
                None => log::warn!(
                    "skipping malformed transfer log in transaction {}",
                    log.transaction_hash
                ),
            }
        }

        Ok(BatchResult {
            range: window,
            fee_payers,
            confirmed_recipients,
            transactions,
        })
    }

    async fn aggregate(&self, progress: &ScanProgress) -> Result<ScanSummary, ScanError> {
        let mut summary = ScanSummary::default();

        for index in progress.processed_batches.iter() {
            let batch = self
                .store
                .load_batch(*index)
                .await?
                .ok_or(ScanError::MissingBatchRecord { index: *index })?;

            summary.fee_payers.extend(batch.fee_payers);
            summary
                .confirmed_recipients
                .extend(batch.confirmed_recipients);
        }

        Ok(summary)
    }

    fn set_state(&mut self, state: ScanState) {
        log::debug!("scan state {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

/// Recipient of a transfer event, the second indexed argument.
fn transfer_recipient(log: &Log) -> Option<Address> {
    let topic = log.topics.get(2)?;
    let (padding, addr) = topic.as_slice().split_at(12);

    if padding.iter().any(|b| *b != 0) {
        return None;
    }

    Address::try_from(addr).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use mintrecon_format::LogArgument;

    fn transfer_log(topics: &[[u8; 32]]) -> Log {
        let mut log = Log::default();
        for topic in topics {
            log.topics.push(LogArgument::from(topic));
        }

        log
    }

    #[test]
    fn test_transfer_recipient() {
        let log = transfer_log(&[
            hex!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
            hex!("0000000000000000000000000000000000000000000000000000000000000000"),
            hex!("00000000000000000000000000000000000000000000000000000000000000aa"),
            hex!("0000000000000000000000000000000000000000000000000000000000000001"),
        ]);

        let addr = transfer_recipient(&log).unwrap();

        assert_eq!(addr, hex!("00000000000000000000000000000000000000aa").into());
    }

    #[test]
    fn test_transfer_recipient_missing_topic() {
        let log = transfer_log(&[hex!(
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        )]);

        assert!(transfer_recipient(&log).is_none());
    }

    #[test]
    fn test_transfer_recipient_dirty_padding() {
        let log = transfer_log(&[
            hex!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
            hex!("0000000000000000000000000000000000000000000000000000000000000000"),
            hex!("01000000000000000000000000000000000000000000000000000000000000aa"),
        ]);

        assert!(transfer_recipient(&log).is_none());
    }

    #[test]
    fn test_unconfirmed_is_set_difference() {
        let aa: Address = hex!("00000000000000000000000000000000000000aa").into();
        let bb: Address = hex!("00000000000000000000000000000000000000bb").into();

        let summary = ScanSummary {
            fee_payers: [aa.clone(), bb.clone()].into(),
            confirmed_recipients: [aa].into(),
        };

        assert_eq!(summary.unconfirmed(), [bb].into());
    }
}
