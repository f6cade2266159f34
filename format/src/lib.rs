mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
    Address, Block, BlockHeader, BlockNumber, Data, FixedSizeData, Hash, Log, LogArgument,
    LogIndex, Quantity, Transaction, TransactionIndex,
};
