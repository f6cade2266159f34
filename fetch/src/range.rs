use std::cmp;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Inclusive block number range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRange {
    pub from_block: u64,
    pub to_block: u64,
}

impl ScanRange {
    pub fn new(from_block: u64, to_block: u64) -> Result<Self> {
        if from_block > to_block {
            return Err(Error::InvalidRange {
                from_block,
                to_block,
            });
        }

        Ok(Self {
            from_block,
            to_block,
        })
    }

    pub fn span(&self) -> u64 {
        self.to_block - self.from_block + 1
    }

    /// Sub-ranges of at most `max_span` blocks, ascending.
    pub fn windows(&self, max_span: NonZeroU64) -> impl Iterator<Item = ScanRange> {
        let step = max_span.get();
        let to_block = self.to_block;

        (self.from_block..=self.to_block)
            .step_by(usize::try_from(step).unwrap())
            .map(move |start| ScanRange {
                from_block: start,
                to_block: cmp::min(to_block, start + step - 1),
            })
    }
}
