use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{fixed::Root, primitives::Slot};
use crate::errors::ClientError;

/// A symbolic or concrete reference to a beacon state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    Genesis,
    Justified,
    Finalized,
    Head,
    Slot(Slot),
    /// Block root; resolved to a slot through the backend's block lookup.
    Root(Root),
}

impl FromStr for StateId {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genesis" => Ok(Self::Genesis),
            "justified" => Ok(Self::Justified),
            "finalized" => Ok(Self::Finalized),
            "head" => Ok(Self::Head),
            _ if s.starts_with("0x") => s
                .parse()
                .map(Self::Root)
                .map_err(|_| ClientError::InvalidIdentifier(s.to_string())),
            _ if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse()
                .map(Self::Slot)
                .map_err(|_| ClientError::InvalidIdentifier(s.to_string())),
            _ => Err(ClientError::InvalidIdentifier(s.to_string())),
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Genesis => f.write_str("genesis"),
            Self::Justified => f.write_str("justified"),
            Self::Finalized => f.write_str("finalized"),
            Self::Head => f.write_str("head"),
            Self::Slot(slot) => write!(f, "{slot}"),
            Self::Root(root) => write!(f, "{root}"),
        }
    }
}

impl From<Slot> for StateId {
    fn from(slot: Slot) -> Self {
        Self::Slot(slot)
    }
}

impl From<Root> for StateId {
    fn from(root: Root) -> Self {
        Self::Root(root)
    }
}

impl Serialize for StateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
