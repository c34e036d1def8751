use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Node implementation behind an address.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Probe the node version endpoint and pick an HTTP backend.
    #[default]
    Auto,
    /// The standard `/eth/v1` REST API.
    Standard,
    Lighthouse,
    Teku,
    /// gRPC `ethereum.eth.v1alpha1`; never auto-detected.
    Prysm,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Standard => "standard",
            Self::Lighthouse => "lighthouse",
            Self::Teku => "teku",
            Self::Prysm => "prysm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_case_names() {
        assert_eq!("prysm".parse::<Backend>().unwrap(), Backend::Prysm);
        assert_eq!(Backend::Lighthouse.to_string(), "lighthouse");
        assert_eq!(Backend::Teku.as_ref(), Backend::Teku.name());
        assert!("Prysm".parse::<Backend>().is_err());
    }
}
