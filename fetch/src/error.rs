use std::result::Result as StdResult;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Provider request failed:\n{0}")]
    Provider(#[from] mintrecon_rpc_client::Error),
    #[error("Invalid block range: {from_block} is past {to_block}.")]
    InvalidRange { from_block: u64, to_block: u64 },
    #[error("Provider response doesn't match the request shape.")]
    UnexpectedResponse,
    #[error("Block {number} is missing from the window response.")]
    MissingBlock { number: u64 },
    #[error("Block {number} is out of order in the window response.")]
    UnorderedBlock { number: u64 },
    #[error("Log for block {number} is outside the requested window.")]
    LogOutsideWindow { number: u64 },
    #[error("Log for block {number} is out of order in the window response.")]
    UnorderedLog { number: u64 },
}

pub type Result<T> = StdResult<T, Error>;
