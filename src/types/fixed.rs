//! Fixed-length byte types and their wire contract.
//!
//! Every type here renders as `0x` followed by lowercase hex of exactly the declared length.
//! JSON wraps the text in double quotes, YAML in single quotes. Decoding rejects a missing
//! delimiter, a missing `0x` prefix, invalid hex and any payload whose decoded length differs
//! from the declared size.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tree_hash::{merkle_root, Hash256, PackedEncoding, TreeHash, TreeHashType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FixedBytesError {
    #[error("value is not wrapped in {0} delimiters")]
    NotDelimited(char),

    #[error("value does not start with 0x")]
    MissingPrefix,

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

pub const JSON_DELIMITER: u8 = b'"';
pub const YAML_DELIMITER: u8 = b'\'';

/// Decodes `0x`-prefixed hex into exactly `N` bytes.
pub fn decode_fixed_hex<const N: usize>(text: &str) -> Result<[u8; N], FixedBytesError> {
    let payload = text
        .strip_prefix("0x")
        .ok_or(FixedBytesError::MissingPrefix)?;
    let decoded = hex::decode(payload)?;
    decoded
        .as_slice()
        .try_into()
        .map_err(|_| FixedBytesError::InvalidLength {
            expected: N,
            actual: decoded.len(),
        })
}

/// Decodes a delimited scalar, e.g. `"0x00ff"` for JSON or `'0x00ff'` for YAML.
pub fn decode_delimited<const N: usize>(
    input: &[u8],
    delimiter: u8,
) -> Result<[u8; N], FixedBytesError> {
    let not_delimited = FixedBytesError::NotDelimited(delimiter as char);
    let inner = input
        .strip_prefix(&[delimiter])
        .and_then(|rest| rest.strip_suffix(&[delimiter]))
        .ok_or(not_delimited.clone())?;
    let text = std::str::from_utf8(inner).map_err(|_| not_delimited)?;
    decode_fixed_hex(text)
}

fn encode_delimited(bytes: &[u8], delimiter: u8) -> Vec<u8> {
    let delimiter = delimiter as char;
    format!("{delimiter}0x{}{delimiter}", hex::encode(bytes)).into_bytes()
}

macro_rules! fixed_bytes_type {
    ($(#[$attr:meta])* $name:ident, $len:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub const fn zero() -> Self {
                Self([0u8; $len])
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn to_json(&self) -> Vec<u8> {
                encode_delimited(&self.0, JSON_DELIMITER)
            }

            pub fn from_json(input: &[u8]) -> Result<Self, FixedBytesError> {
                decode_delimited(input, JSON_DELIMITER).map(Self)
            }

            pub fn to_yaml(&self) -> Vec<u8> {
                encode_delimited(&self.0, YAML_DELIMITER)
            }

            pub fn from_yaml(input: &[u8]) -> Result<Self, FixedBytesError> {
                decode_delimited(input, YAML_DELIMITER).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = FixedBytesError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                bytes
                    .try_into()
                    .map(Self)
                    .map_err(|_| FixedBytesError::InvalidLength {
                        expected: $len,
                        actual: bytes.len(),
                    })
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = FixedBytesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed_hex(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(serde::de::Error::custom)
            }
        }

        impl TreeHash for $name {
            fn tree_hash_type() -> TreeHashType {
                TreeHashType::Vector
            }

            fn tree_hash_packed_encoding(&self) -> PackedEncoding {
                PackedEncoding::from_slice(&self.0)
            }

            fn tree_hash_packing_factor() -> usize {
                1
            }

            fn tree_hash_root(&self) -> Hash256 {
                merkle_root(&self.0, 1)
            }
        }
    };
}

fixed_bytes_type!(
    /// A 32-byte hash: block roots, state roots, Merkle roots.
    Root,
    32
);
fixed_bytes_type!(
    /// A 96-byte BLS signature.
    Signature,
    96
);
fixed_bytes_type!(
    /// A 48-byte BLS public key.
    BlsPubKey,
    48
);
fixed_bytes_type!(
    /// A 4-byte fork version.
    Version,
    4
);
fixed_bytes_type!(
    /// A 4-byte signing purpose, e.g. beacon attester.
    DomainType,
    4
);
fixed_bytes_type!(
    /// `domain_type || fork_data_root[..28]`.
    Domain,
    32
);

impl From<Hash256> for Root {
    fn from(hash: Hash256) -> Self {
        Self(hash.0)
    }
}

impl From<Root> for Hash256 {
    fn from(root: Root) -> Self {
        Hash256::from(root.0)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const ROOT_HEX: &str = "0x4b363db94e286120d76eb905340fdd4e54bfe9f06bf33ff6cf5ad27f511bfe95";

    #[test]
    fn root_json_round_trip() {
        let root: Root = ROOT_HEX.parse().unwrap();
        let encoded = root.to_json();
        assert_eq!(encoded.len(), 68);
        assert_eq!(encoded, format!("\"{ROOT_HEX}\"").into_bytes());
        assert_eq!(Root::from_json(&encoded).unwrap(), root);
    }

    #[test]
    fn root_yaml_round_trip() {
        let root: Root = ROOT_HEX.parse().unwrap();
        let encoded = root.to_yaml();
        assert_eq!(encoded, format!("'{ROOT_HEX}'").into_bytes());
        assert_eq!(Root::from_yaml(&encoded).unwrap(), root);
        assert_eq!(
            Root::from_yaml(&root.to_json()),
            Err(FixedBytesError::NotDelimited('\''))
        );
    }

    #[test]
    fn canonical_text_is_66_lowercase_chars() {
        let root = Root::new([0xab; 32]);
        let text = root.to_string();
        assert_eq!(text.len(), 66);
        assert_eq!(text, text.to_lowercase());
    }

    #[rstest]
    #[case::no_quotes(&b"0x00000000"[..], FixedBytesError::NotDelimited('"'))]
    #[case::leading_quote_only(&b"\"0x00000000"[..], FixedBytesError::NotDelimited('"'))]
    #[case::no_prefix(&b"\"00000000\""[..], FixedBytesError::MissingPrefix)]
    #[case::space_before_prefix(&b"\" 0x00000000\""[..], FixedBytesError::MissingPrefix)]
    #[case::short(&b"\"0x000000\""[..], FixedBytesError::InvalidLength { expected: 4, actual: 3 })]
    #[case::long(&b"\"0x0000000000\""[..], FixedBytesError::InvalidLength { expected: 4, actual: 5 })]
    #[case::empty(&b"\"0x\""[..], FixedBytesError::InvalidLength { expected: 4, actual: 0 })]
    fn version_json_rejections(#[case] input: &[u8], #[case] expected: FixedBytesError) {
        assert_eq!(Version::from_json(input), Err(expected));
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(matches!(
            Version::from_json(b"\"0x0000000g\""),
            Err(FixedBytesError::InvalidHex(_))
        ));
    }

    #[test]
    fn signature_length_is_enforced() {
        let ok = format!("\"0x{}\"", "11".repeat(96));
        let short = format!("\"0x{}\"", "11".repeat(95));
        assert_eq!(
            Signature::from_json(ok.as_bytes()).unwrap(),
            Signature::new([0x11; 96])
        );
        assert_eq!(
            Signature::from_json(short.as_bytes()),
            Err(FixedBytesError::InvalidLength {
                expected: 96,
                actual: 95
            })
        );
    }

    #[test]
    fn serde_uses_the_same_contract() {
        let version: Version = serde_json::from_str("\"0x01020304\"").unwrap();
        assert_eq!(version, Version::new([1, 2, 3, 4]));
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"0x01020304\"");
        assert!(serde_json::from_str::<Version>("\"0x010203\"").is_err());
        assert!(serde_json::from_str::<Version>("\"01020304\"").is_err());
        assert!(serde_json::from_str::<Version>("16909060").is_err());
    }

    #[test]
    fn slice_conversion_checks_length() {
        assert!(DomainType::try_from(&[0u8, 0, 0, 1][..]).is_ok());
        assert_eq!(
            DomainType::try_from(&[0u8; 5][..]),
            Err(FixedBytesError::InvalidLength {
                expected: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn tree_hash_root_pads_short_vectors() {
        let version = Version::new([1, 2, 3, 4]);
        let mut expected = [0u8; 32];
        expected[..4].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(Root::from(version.tree_hash_root()), Root::new(expected));

        let root = Root::new([7; 32]);
        assert_eq!(Root::from(root.tree_hash_root()), root);
    }
}
