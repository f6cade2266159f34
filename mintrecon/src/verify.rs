use std::collections::BTreeMap;
use std::sync::Arc;

use mintrecon_format::{Address, Data};
use mintrecon_rpc_client::{CallRequest, RpcTransport};
use thiserror::Error as ThisError;

use crate::config::{RetryConfig, VerifyConfig};
use crate::multicall;

#[derive(Debug, ThisError)]
pub enum VerifyError {
    #[error("Aggregated call failed after {attempts} attempts. Caused by:\n{source}")]
    RetriesExhausted {
        attempts: usize,
        source: mintrecon_rpc_client::Error,
    },
    #[error("Aggregated call returned an undecodable payload after {attempts} attempts.")]
    UndecodableResponse { attempts: usize },
}

enum GroupError {
    Provider(mintrecon_rpc_client::Error),
    Envelope,
}

/// Cross-checks addresses against current chain state.
///
/// Addresses are grouped into one aggregated read call per group. Every
/// sub-result decodes independently; a failed or undecodable sub-result
/// counts as not holding, absence of proof goes against the holder claim.
pub struct OwnershipVerifier<T> {
    transport: Arc<T>,
    token: Address,
    config: VerifyConfig,
    retry: RetryConfig,
}

impl<T: RpcTransport> OwnershipVerifier<T> {
    pub fn new(transport: Arc<T>, token: Address, config: VerifyConfig, retry: RetryConfig) -> Self {
        Self {
            transport,
            token,
            config,
            retry,
        }
    }

    /// Checks which of `addresses` currently hold the asset.
    pub async fn verify(
        &self,
        addresses: &[Address],
    ) -> Result<BTreeMap<Address, bool>, VerifyError> {
        let mut out = BTreeMap::new();

        for group in addresses.chunks(self.config.group_size.get()) {
            let results = self.query_group_with_retry(group).await?;

            for (addr, item) in group.iter().zip(results) {
                let holds = match item.as_deref().map(multicall::decode_holds) {
                    Some(Some(holds)) => holds,
                    Some(None) => {
                        log::warn!("undecodable balance result for {}, treating as negative", addr);
                        false
                    }
                    None => {
                        log::warn!("balance check reverted for {}, treating as negative", addr);
                        false
                    }
                };

                out.insert(addr.clone(), holds);
            }
        }

        Ok(out)
    }

    async fn query_group_with_retry(
        &self,
        group: &[Address],
    ) -> Result<Vec<Option<Vec<u8>>>, VerifyError> {
        let max_attempts = self.retry.max_attempts.get();
        let mut attempt = 0;

        loop {
            match self.query_group(group).await {
                Ok(results) => return Ok(results),
                Err(source) => {
                    attempt += 1;

                    if attempt >= max_attempts {
                        return Err(match source {
                            GroupError::Provider(source) => VerifyError::RetriesExhausted {
                                attempts: attempt,
                                source,
                            },
                            GroupError::Envelope => {
                                VerifyError::UndecodableResponse { attempts: attempt }
                            }
                        });
                    }

                    log::warn!(
                        "aggregated call for {} addresses failed, retry {}/{}",
                        group.len(),
                        attempt,
                        max_attempts - 1
                    );

                    self.retry.sleep_before_retry(attempt - 1).await;
                }
            }
        }
    }

    async fn query_group(&self, group: &[Address]) -> Result<Vec<Option<Vec<u8>>>, GroupError> {
        let calls = group
            .iter()
            .map(|addr| (self.token.clone(), multicall::balance_of(addr)))
            .collect::<Vec<_>>();

        let req = CallRequest {
            to: self.config.multicall.clone(),
            data: multicall::encode_try_aggregate(&calls),
        };

        let resp = self
            .transport
            .send(req.into())
            .await
            .map_err(GroupError::Provider)?;

        let ret: Data = resp.try_into_single().ok_or(GroupError::Envelope)?;

        multicall::decode_try_aggregate(&ret, group.len()).ok_or(GroupError::Envelope)
    }
}
