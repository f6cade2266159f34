use std::num::NonZeroU64;
use std::sync::Arc;

use mintrecon_format::{Address, Block, Log, LogArgument, Transaction};
use mintrecon_rpc_client::{GetLogs, RpcRequest, RpcRequestImpl, RpcTransport};

use crate::validate::{validate_window_blocks, validate_window_logs};
use crate::{Error, Result, ScanRange};

/// Fetches chain data for bounded block ranges.
///
/// Providers cap the block span a single query may cover, so ranges wider
/// than `max_span` are split into sub-windows with one underlying call per
/// window. Results come back concatenated in ascending block order.
pub struct RangeFetcher<T> {
    transport: Arc<T>,
    max_span: NonZeroU64,
}

impl<T: RpcTransport> RangeFetcher<T> {
    pub fn new(transport: Arc<T>, max_span: NonZeroU64) -> Self {
        Self {
            transport,
            max_span,
        }
    }

    /// Every transaction in `range` whose recipient is `target`.
    pub async fn transactions_to(
        &self,
        target: &Address,
        range: ScanRange,
    ) -> Result<Vec<Transaction>> {
        let mut txs = Vec::new();

        for window in range.windows(self.max_span) {
            log::debug!(
                "fetching transactions for blocks [{}, {}]",
                window.from_block,
                window.to_block
            );

            let req: RpcRequest = (window.from_block..=window.to_block)
                .map(|num| RpcRequestImpl::GetBlockByNumber(num.into()))
                .collect::<Vec<_>>()
                .into();

            let resp = self.transport.send(req).await?;
            let blocks: Vec<Block<Transaction>> =
                resp.try_into().map_err(|()| Error::UnexpectedResponse)?;

            validate_window_blocks(&window, &blocks)?;

            for block in blocks.iter() {
                for tx in block.transactions.iter() {
                    if tx.to.as_ref() == Some(target) {
                        txs.push(tx.clone());
                    }
                }
            }
        }

        Ok(txs)
    }

    /// Every log in `range` emitted by `contract` with the given first topic.
    pub async fn logs(
        &self,
        contract: &Address,
        topic0: &LogArgument,
        range: ScanRange,
    ) -> Result<Vec<Log>> {
        let mut logs = Vec::new();

        for window in range.windows(self.max_span) {
            log::debug!(
                "fetching logs for blocks [{}, {}]",
                window.from_block,
                window.to_block
            );

            let req: RpcRequest = GetLogs {
                address: contract.clone(),
                topic0: topic0.clone(),
                from_block: window.from_block.into(),
                to_block: window.to_block.into(),
            }
            .into();

            let resp = self.transport.send(req).await?;
            let batch: Vec<Log> = resp.try_into_single().ok_or(Error::UnexpectedResponse)?;

            validate_window_logs(&window, &batch)?;

            logs.extend(batch);
        }

        Ok(logs)
    }
}
