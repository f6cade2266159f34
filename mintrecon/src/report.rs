use std::collections::BTreeMap;

use mintrecon_format::Address;
use serde::{Deserialize, Serialize};

use crate::engine::ScanSummary;

/// Final reconciliation artifact.
///
/// Matching is by address alone: a fee payment counts as confirmed when
/// the paying address shows up as a transfer recipient, with no tie to a
/// specific order. Treat the unconfirmed list as a work queue for
/// order-level review, not as ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub total_fee_payers: usize,
    pub total_confirmed: usize,
    pub total_unconfirmed: usize,
    pub unconfirmed_addresses: Vec<Address>,
    pub discrepancies: Vec<DiscrepancyRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyRecord {
    pub address: Address,
    pub status: DiscrepancyStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyStatus {
    MissingFromDb,
    MissingOnChain,
    WrongOwner,
}

impl ReconciliationReport {
    /// Folds live ownership checks into the scan aggregates.
    ///
    /// An address moves from unconfirmed to confirmed only on a
    /// definitive positive check.
    pub fn build(summary: &ScanSummary, verified: &BTreeMap<Address, bool>) -> Self {
        let mut confirmed = summary.confirmed_recipients.clone();

        for (addr, holds) in verified.iter() {
            if *holds {
                confirmed.insert(addr.clone());
            }
        }

        let unconfirmed_addresses = summary
            .fee_payers
            .difference(&confirmed)
            .cloned()
            .collect::<Vec<_>>();

        let discrepancies = unconfirmed_addresses
            .iter()
            .map(|addr| DiscrepancyRecord {
                address: addr.clone(),
                status: DiscrepancyStatus::MissingOnChain,
            })
            .collect();

        Self {
            total_fee_payers: summary.fee_payers.len(),
            total_confirmed: summary.fee_payers.len() - unconfirmed_addresses.len(),
            total_unconfirmed: unconfirmed_addresses.len(),
            unconfirmed_addresses,
            discrepancies,
        }
    }
}
