use std::collections::BTreeSet;

use mintrecon_format::{Block, Log, Transaction};

use crate::{Error, Result, ScanRange};

/// Checks a window response covers exactly the requested blocks, ascending.
pub fn validate_window_blocks(window: &ScanRange, blocks: &[Block<Transaction>]) -> Result<()> {
    let blk_nums = blocks
        .iter()
        .map(|b| *b.header.number)
        .collect::<BTreeSet<_>>();

    let mut current = window.from_block;
    for i in blk_nums {
        if current != i {
            return Err(Error::MissingBlock { number: current });
        }

        current += 1;
    }

    if current != window.to_block + 1 {
        return Err(Error::MissingBlock { number: current });
    }

    for pair in blocks.windows(2) {
        if *pair[0].header.number >= *pair[1].header.number {
            return Err(Error::UnorderedBlock {
                number: *pair[1].header.number,
            });
        }
    }

    Ok(())
}

/// Checks logs fall inside the requested window and come back ascending.
pub fn validate_window_logs(window: &ScanRange, logs: &[Log]) -> Result<()> {
    for log in logs.iter() {
        let number = *log.block_number;
        if number < window.from_block || number > window.to_block {
            return Err(Error::LogOutsideWindow { number });
        }
    }

    for pair in logs.windows(2) {
        let prev = (*pair[0].block_number, *pair[0].log_index);
        let next = (*pair[1].block_number, *pair[1].log_index);

        if prev >= next {
            return Err(Error::UnorderedLog {
                number: *pair[1].block_number,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintrecon_format::BlockHeader;

    fn block(number: u64) -> Block<Transaction> {
        Block {
            header: BlockHeader {
                number: number.into(),
                ..Default::default()
            },
            transactions: Box::new([]),
        }
    }

    fn log(block_number: u64, log_index: u64) -> Log {
        Log {
            block_number: block_number.into(),
            log_index: log_index.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_exact_window() {
        let window = ScanRange::new(10, 12).unwrap();

        let blocks = [block(10), block(11), block(12)];

        validate_window_blocks(&window, &blocks).unwrap();
    }

    #[test]
    fn test_rejects_hole_in_window() {
        let window = ScanRange::new(10, 12).unwrap();

        let blocks = [block(10), block(12)];

        assert!(matches!(
            validate_window_blocks(&window, &blocks),
            Err(Error::MissingBlock { number: 11 })
        ));
    }

    #[test]
    fn test_rejects_truncated_window() {
        let window = ScanRange::new(10, 12).unwrap();

        let blocks = [block(10), block(11)];

        assert!(validate_window_blocks(&window, &blocks).is_err());
    }

    #[test]
    fn test_accepts_ordered_logs() {
        let window = ScanRange::new(10, 12).unwrap();

        let logs = [log(10, 0), log(10, 1), log(12, 0)];

        validate_window_logs(&window, &logs).unwrap();
    }

    #[test]
    fn test_rejects_log_outside_window() {
        let window = ScanRange::new(10, 12).unwrap();

        let logs = [log(13, 0)];

        assert!(matches!(
            validate_window_logs(&window, &logs),
            Err(Error::LogOutsideWindow { number: 13 })
        ));
    }

    #[test]
    fn test_rejects_unordered_logs() {
        let window = ScanRange::new(10, 12).unwrap();

        let logs = [log(11, 0), log(10, 2)];

        assert!(validate_window_logs(&window, &logs).is_err());
    }
}
