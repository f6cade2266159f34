use std::fmt;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::str::FromStr;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::{Error, Result};

/// Fixed size byte array that round-trips through "0x"-prefixed hex.
///
/// Hex input is accepted in any casing and always rendered lowercase,
/// so two values parsed from differently cased strings compare equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedSizeData<const N: usize>(Box<[u8; N]>);

impl<const N: usize> FixedSizeData<N> {
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl<const N: usize> Default for FixedSizeData<N> {
    fn default() -> Self {
        Self(Box::new([0; N]))
    }
}

impl<const N: usize> Deref for FixedSizeData<N> {
    type Target = [u8; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> From<[u8; N]> for FixedSizeData<N> {
    fn from(data: [u8; N]) -> Self {
        Self(Box::new(data))
    }
}

impl<const N: usize> From<&[u8; N]> for FixedSizeData<N> {
    fn from(data: &[u8; N]) -> Self {
        Self(Box::new(*data))
    }
}

impl<const N: usize> TryFrom<&[u8]> for FixedSizeData<N> {
    type Error = Error;

    fn try_from(data: &[u8]) -> Result<Self> {
        let data: [u8; N] = data.try_into().map_err(|_| Error::UnexpectedLength {
            expected: N,
            got: data.len(),
        })?;

        Ok(Self(Box::new(data)))
    }
}

impl<const N: usize> FromStr for FixedSizeData<N> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let data =
            prefix_hex::decode::<Vec<u8>>(s).map_err(|e| Error::DecodeHex(e.to_string()))?;

        Self::try_from(data.as_slice())
    }
}

impl<const N: usize> fmt::Display for FixedSizeData<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.0.to_vec()))
    }
}

impl<const N: usize> fmt::Debug for FixedSizeData<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.0.to_vec()))
    }
}

impl<const N: usize> Serialize for FixedSizeData<N> {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&prefix_hex::encode(self.0.to_vec()))
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedSizeData<N> {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let buf = String::deserialize(deserializer)?;

        buf.parse().map_err(serde::de::Error::custom)
    }
}
