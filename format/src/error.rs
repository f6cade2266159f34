use std::result::Result as StdResult;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Failed to decode hex string:\n{0}")]
    DecodeHex(String),
    #[error("Unexpected data length. Expected {expected} bytes but got {got}.")]
    UnexpectedLength { expected: usize, got: usize },
    #[error("Hex string doesn't start with \"0x\".")]
    MissingPrefix,
    #[error("Failed to parse hex integer:\n{0}")]
    ParseInt(std::num::ParseIntError),
}

pub type Result<T> = StdResult<T, Error>;
