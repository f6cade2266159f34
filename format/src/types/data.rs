use std::fmt;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::str::FromStr;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::{Error, Result};

/// Variable length byte blob that round-trips through "0x"-prefixed hex.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Data(Box<[u8]>);

impl Data {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Data {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<u8>> for Data {
    fn from(data: Vec<u8>) -> Self {
        Self(data.into_boxed_slice())
    }
}

impl From<&[u8]> for Data {
    fn from(data: &[u8]) -> Self {
        Self(data.into())
    }
}

impl FromStr for Data {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "0x" {
            return Ok(Self::default());
        }

        let data =
            prefix_hex::decode::<Vec<u8>>(s).map_err(|e| Error::DecodeHex(e.to_string()))?;

        Ok(Self(data.into_boxed_slice()))
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.0.to_vec()))
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", prefix_hex::encode(self.0.to_vec()))
    }
}

impl Serialize for Data {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&prefix_hex::encode(self.0.to_vec()))
    }
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let buf = String::deserialize(deserializer)?;

        buf.parse().map_err(serde::de::Error::custom)
    }
}
