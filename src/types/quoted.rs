//! Decimal-string encoding for 64-bit counters.
//!
//! JSON numbers cannot hold every `u64` safely, so counters travel as quoted decimal strings
//! (`"18446744073709551615"`). YAML uses single quotes.

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotedIntError {
    #[error("empty string is not a number")]
    Empty,

    #[error("negative value {0} for unsigned integer")]
    Negative(String),

    #[error("invalid decimal integer {0:?}")]
    Invalid(String),

    #[error("value is not wrapped in {0} delimiters")]
    NotDelimited(char),
}

/// Parses the text inside the quotes.
pub fn parse_u64(text: &str) -> Result<u64, QuotedIntError> {
    if text.is_empty() {
        return Err(QuotedIntError::Empty);
    }
    if text.starts_with('-') {
        return Err(QuotedIntError::Negative(text.to_string()));
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QuotedIntError::Invalid(text.to_string()));
    }
    text.parse()
        .map_err(|_| QuotedIntError::Invalid(text.to_string()))
}

pub fn to_yaml(value: u64) -> String {
    format!("'{value}'")
}

pub fn from_yaml(text: &str) -> Result<u64, QuotedIntError> {
    let inner = text
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .ok_or(QuotedIntError::NotDelimited('\''))?;
    parse_u64(inner)
}

/// `#[serde(with = "quoted_u64")]`
pub mod quoted_u64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_u64(&text).map_err(D::Error::custom)
    }
}

/// `#[serde(with = "quoted_u64_vec")]`
pub mod quoted_u64_vec {
    use serde::ser::SerializeSeq;

    use super::*;

    pub fn serialize<S: Serializer>(values: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        texts
            .iter()
            .map(|text| parse_u64(text).map_err(D::Error::custom))
            .collect()
    }
}

/// `#[serde(with = "quoted_u64_opt")]`, `null` maps to `None`.
pub mod quoted_u64_opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        text.map(|text| parse_u64(&text).map_err(D::Error::custom))
            .transpose()
    }
}
