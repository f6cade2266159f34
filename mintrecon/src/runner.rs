use std::sync::Arc;

use anyhow::{Context, Result};
use itertools::Itertools;
use mintrecon_fetch::RangeFetcher;
use mintrecon_rpc_client::RpcClient;

use crate::checkpoint::{CheckpointStore, FsCheckpointStore};
use crate::config::Config;
use crate::engine::ReconEngine;
use crate::report::ReconciliationReport;
use crate::verify::OwnershipVerifier;
use crate::Args;

pub struct ReconRunner;

impl ReconRunner {
    pub async fn run(args: Args) -> Result<()> {
        let cfg = tokio::fs::read_to_string(&args.config_path)
            .await
            .context("read config file")?;
        let cfg: Config = toml::de::from_str(&cfg).context("parse config")?;

        tokio::fs::create_dir_all(&cfg.checkpoint.path)
            .await
            .context("create checkpoint directory if not exists")?;

        let store = FsCheckpointStore::new(cfg.checkpoint.path.clone());

        let transport = Arc::new(RpcClient::new(cfg.fetch.rpc_client));
        let fetcher = RangeFetcher::new(transport.clone(), cfg.fetch.max_span);

        let mut engine = ReconEngine::new(
            fetcher,
            &store,
            cfg.scan.clone(),
            cfg.fetch.max_span,
            cfg.retry,
        );
        let summary = engine.run().await.context("scan block range")?;

        let unconfirmed = summary.unconfirmed().into_iter().collect::<Vec<_>>();
        log::info!(
            "scan finished with {} fee payers, {} still unconfirmed",
            summary.fee_payers.len(),
            unconfirmed.len()
        );

        let verifier = OwnershipVerifier::new(
            transport,
            cfg.scan.collection.clone(),
            cfg.verify,
            cfg.retry,
        );
        let verified = verifier
            .verify(&unconfirmed)
            .await
            .context("verify unconfirmed addresses")?;

        let report = ReconciliationReport::build(&summary, &verified);
        store
            .save_report(&report)
            .await
            .context("write reconciliation report")?;

        log::info!(
            "reconciled {} fee payers, {} confirmed, {} unconfirmed",
            report.total_fee_payers,
            report.total_confirmed,
            report.total_unconfirmed
        );

        if !report.unconfirmed_addresses.is_empty() {
            log::warn!(
                "unconfirmed fee payers: {}",
                report.unconfirmed_addresses.iter().join(", ")
            );
        }

        Ok(())
    }
}
