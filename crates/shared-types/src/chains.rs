// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Chain tags for POAP tokens
//!
//! POAPs are minted on a sidechain (Gnosis, historically "xdai") and can be
//! migrated to Ethereum mainnet. Every activity record carries the tag of the
//! indexer it came from.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use utoipa::ToSchema;

/// Chains indexed by the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
pub enum Chain {
    /// Ethereum mainnet, the primary chain
    Mainnet,
    /// Gnosis chain (xdai), where POAPs are claimed
    Xdai,
}

/// Error returned when a chain tag cannot be parsed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown chain tag: {0}")]
pub struct ChainParseError(pub String);

impl Chain {
    /// Returns the tag used by indexers and in serialized output
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Xdai => "xdai",
        }
    }

    /// Returns the human-readable chain name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mainnet => "Ethereum",
            Self::Xdai => "Gnosis",
        }
    }

    /// Whether this chain is the layer-2/sidechain where tokens are claimed
    pub const fn is_sidechain(self) -> bool {
        matches!(self, Self::Xdai)
    }

    /// Returns every indexed chain, primary chain first
    pub const fn all() -> &'static [Self] {
        &[Self::Mainnet, Self::Xdai]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Chain {
    type Err = ChainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "ethereum" | "homestead" | "eth" => Ok(Self::Mainnet),
            "xdai" | "gnosis" => Ok(Self::Xdai),
            _ => Err(ChainParseError(s.to_string())),
        }
    }
}

impl Serialize for Chain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for Chain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("mainnet".parse::<Chain>(), Ok(Chain::Mainnet));
        assert_eq!("Homestead".parse::<Chain>(), Ok(Chain::Mainnet));
        assert_eq!("xdai".parse::<Chain>(), Ok(Chain::Xdai));
        assert_eq!(" GNOSIS ".parse::<Chain>(), Ok(Chain::Xdai));
        assert!("polygon".parse::<Chain>().is_err());
    }

    #[test]
    fn sidechain_flag() {
        assert!(Chain::Xdai.is_sidechain());
        assert!(!Chain::Mainnet.is_sidechain());
    }

    #[test]
    fn serde_uses_tags() {
        assert_eq!(serde_json::to_string(&Chain::Xdai).unwrap(), "\"xdai\"");
        let chain: Chain = serde_json::from_str("\"mainnet\"").unwrap();
        assert_eq!(chain, Chain::Mainnet);
        assert!(serde_json::from_str::<Chain>("\"solana\"").is_err());
    }
}
