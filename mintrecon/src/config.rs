use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;
use std::time::Duration;

use hex_literal::hex;
use mintrecon_format::{Address, LogArgument};
use mintrecon_rpc_client::RpcClientConfig;
use serde::{Deserialize, Serialize};

/// Transfer(address,address,uint256)
pub const TRANSFER_TOPIC: [u8; 32] =
    hex!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// Canonical Multicall3 deployment, same address on most chains.
pub const MULTICALL3_ADDRESS: [u8; 20] = hex!("ca11bde05977b3631167028862be2a173976ca11");

#[derive(Serialize, Deserialize)]
pub struct Config {
    /// Block range and addresses to reconcile
    pub scan: ScanConfig,
    /// Config for the chain data fetcher
    pub fetch: FetchConfig,
    /// Config for the checkpoint directory
    pub checkpoint: CheckpointConfig,
    /// Retry and throttle policy for provider calls
    pub retry: RetryConfig,
    /// Config for live ownership verification
    pub verify: VerifyConfig,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct ScanConfig {
    /// First block of the scan, inclusive
    pub from_block: u64,
    /// Last block of the scan, inclusive
    pub to_block: u64,
    /// Address collecting mint fees
    pub vault: Address,
    /// Collection contract emitting transfer events
    pub collection: Address,
    /// First topic of the transfer event
    #[serde(default = "default_transfer_topic")]
    pub transfer_topic: LogArgument,
}

#[derive(Serialize, Deserialize)]
pub struct FetchConfig {
    /// Configuration for the chain RPC client
    pub rpc_client: RpcClientConfig,
    /// Maximum block span a single provider query may cover
    pub max_span: NonZeroU64,
}

#[derive(Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Path to the checkpoint directory
    pub path: PathBuf,
}

/// Bounded retry with a linearly growing delay.
///
/// Also owns the inter-batch pause that keeps the scan inside provider
/// rate limits. Zeroing every delay turns this into an immediate-retry
/// policy, which is what the tests run with.
#[derive(Serialize, Deserialize, Clone, Copy)]
pub struct RetryConfig {
    /// Attempts per batch before the scan gives up
    pub max_attempts: NonZeroUsize,
    /// Delay before the first retry
    pub initial_backoff_millis: u64,
    /// Added to the delay on every further retry
    pub backoff_step_millis: u64,
    /// Pause between consecutive batches
    pub batch_delay_millis: u64,
}

impl RetryConfig {
    pub fn backoff(&self, retry_num: usize) -> Duration {
        let step = self.backoff_step_millis * u64::try_from(retry_num).unwrap();

        Duration::from_millis(self.initial_backoff_millis + step)
    }

    pub async fn sleep_before_retry(&self, retry_num: usize) {
        tokio::time::sleep(self.backoff(retry_num)).await;
    }

    pub async fn throttle(&self) {
        tokio::time::sleep(Duration::from_millis(self.batch_delay_millis)).await;
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct VerifyConfig {
    /// Multicall aggregator contract
    #[serde(default = "default_multicall")]
    pub multicall: Address,
    /// Number of addresses checked per aggregated call
    #[serde(default = "default_group_size")]
    pub group_size: NonZeroUsize,
}

fn default_transfer_topic() -> LogArgument {
    TRANSFER_TOPIC.into()
}

fn default_multicall() -> Address {
    MULTICALL3_ADDRESS.into()
}

fn default_group_size() -> NonZeroUsize {
    NonZeroUsize::new(100).unwrap()
}
