use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use mintrecon_fetch::ScanRange;
use mintrecon_format::{Address, Hash, Quantity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::report::ReconciliationReport;

/// Durable scan position.
///
/// `next_block` is one past the end of the highest fully processed batch;
/// the batch indices below it always form a gapless prefix. A fresh store
/// loads as the zero value, which puts the cursor at the start of the
/// configured range.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    pub next_block: u64,
    pub processed_batches: BTreeSet<u64>,
}

/// Everything extracted from one batch of blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub range: ScanRange,
    pub fee_payers: BTreeSet<Address>,
    pub confirmed_recipients: BTreeSet<Address>,
    pub transactions: Vec<TransactionRecord>,
}

/// Slimmed down fee payment kept for the reconciliation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: Hash,
    pub from: Address,
    pub value: Quantity,
    pub block_number: u64,
}

#[derive(Debug, ThisError)]
pub enum CheckpointError {
    #[error("Failed to read or write checkpoint file:\n{0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode or decode checkpoint record:\n{0}")]
    Codec(#[from] serde_json::Error),
    #[error("Saving batch {got} would leave a gap, expected batch {expected}.")]
    NonContiguousBatch { expected: u64, got: u64 },
}

#[allow(async_fn_in_trait)]
pub trait CheckpointStore {
    /// Persisted progress, or the zero value if none exists yet.
    async fn load(&self) -> Result<ScanProgress, CheckpointError>;

    /// Durably persists a batch record, then marks it processed.
    ///
    /// Only call after the batch's fetch fully succeeded; a batch is
    /// either entirely persisted or not at all.
    async fn save_batch(&self, index: u64, result: &BatchResult) -> Result<(), CheckpointError>;

    async fn load_batch(&self, index: u64) -> Result<Option<BatchResult>, CheckpointError>;

    /// Rewrites the final reconciliation artifact.
    async fn save_report(&self, report: &ReconciliationReport) -> Result<(), CheckpointError>;
}

impl<S: CheckpointStore + Sync> CheckpointStore for &S {
    async fn load(&self) -> Result<ScanProgress, CheckpointError> {
        S::load(self).await
    }

    async fn save_batch(&self, index: u64, result: &BatchResult) -> Result<(), CheckpointError> {
        S::save_batch(self, index, result).await
    }

    async fn load_batch(&self, index: u64) -> Result<Option<BatchResult>, CheckpointError> {
        S::load_batch(self, index).await
    }

    async fn save_report(&self, report: &ReconciliationReport) -> Result<(), CheckpointError> {
        S::save_report(self, report).await
    }
}

/// One JSON file per record under a directory.
///
/// Writes land in a temp file first and are renamed into place, so a
/// crash never leaves a half written record behind. Single writer;
/// nothing guards two engines sharing the same directory.
pub struct FsCheckpointStore {
    path: PathBuf,
}

impl FsCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn progress_path(&self) -> PathBuf {
        self.path.join("progress.json")
    }

    fn batch_path(&self, index: u64) -> PathBuf {
        self.path.join(format!("batch-{:05}.json", index))
    }

    fn report_path(&self) -> PathBuf {
        self.path.join("report.json")
    }

    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), CheckpointError> {
        let data = serde_json::to_vec_pretty(value)?;

        let mut tmp_path = path.to_owned();
        tmp_path.set_extension("json.tmp");

        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, path).await?;

        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, CheckpointError> {
        match tokio::fs::read_to_string(path).await {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl CheckpointStore for FsCheckpointStore {
    async fn load(&self) -> Result<ScanProgress, CheckpointError> {
        let progress = self.read_json(&self.progress_path()).await?;

        Ok(progress.unwrap_or_default())
    }

    async fn save_batch(&self, index: u64, result: &BatchResult) -> Result<(), CheckpointError> {
        let mut progress = self.load().await?;

        let expected = progress
            .processed_batches
            .iter()
            .next_back()
            .map(|i| i + 1)
            .unwrap_or(0);

        if index != expected {
            return Err(CheckpointError::NonContiguousBatch {
                expected,
                got: index,
            });
        }

        self.write_json(&self.batch_path(index), result).await?;

        progress.processed_batches.insert(index);
        progress.next_block = result.range.to_block + 1;

        self.write_json(&self.progress_path(), &progress).await
    }

    async fn load_batch(&self, index: u64) -> Result<Option<BatchResult>, CheckpointError> {
        self.read_json(&self.batch_path(index)).await
    }

    async fn save_report(&self, report: &ReconciliationReport) -> Result<(), CheckpointError> {
        self.write_json(&self.report_path(), report).await
    }
}
