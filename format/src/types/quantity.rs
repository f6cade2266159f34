use std::fmt;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::str::FromStr;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::{Error, Result};

/// Arbitrary numeric quantity, e.g. a wei amount or a gas figure.
///
/// Wide enough for any value the chain produces in practice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(u128);

impl Quantity {
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Deref for Quantity {
    type Target = u128;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u128> for Quantity {
    fn from(val: u128) -> Self {
        Self(val)
    }
}

impl From<u64> for Quantity {
    fn from(val: u64) -> Self {
        Self(val.into())
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix("0x").ok_or(Error::MissingPrefix)?;
        let val = u128::from_str_radix(hex, 16).map_err(Error::ParseInt)?;

        Ok(Self(val))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{:x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let buf = String::deserialize(deserializer)?;

        buf.parse().map_err(serde::de::Error::custom)
    }
}
