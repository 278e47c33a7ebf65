use alloy_primitives::{keccak256, U256};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Arbitrary precision amount used for every asset quantity.
pub type Amount = U256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown chain: {0}")]
pub struct UnknownChainError(pub String);

/// Chains a guard can observe or pay on.
#[derive(
	Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
	Ergo,
	Cardano,
	Bitcoin,
	Doge,
	Ethereum,
}

impl Chain {
	/// The chain hosting event trigger artifacts and watcher rewards.
	pub const BRIDGE: Chain = Chain::Ergo;

	pub const ALL: [Chain; 5] =
		[Chain::Ergo, Chain::Cardano, Chain::Bitcoin, Chain::Doge, Chain::Ethereum];

	pub fn is_bridge_chain(&self) -> bool {
		*self == Self::BRIDGE
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Chain::Ergo => "ergo",
			Chain::Cardano => "cardano",
			Chain::Bitcoin => "bitcoin",
			Chain::Doge => "doge",
			Chain::Ethereum => "ethereum",
		}
	}
}

impl fmt::Display for Chain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for Chain {
	type Err = UnknownChainError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Chain::ALL
			.into_iter()
			.find(|chain| chain.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnknownChainError(s.to_string()))
	}
}

/// Identifier of a confirmed event, the hex encoded keccak256 digest of the
/// lock transaction id on the source chain.
#[derive(
	Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Deref,
)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
	pub fn from_source_tx(source_tx_id: &str) -> Self {
		EventId(hex::encode(keccak256(source_tx_id.as_bytes())))
	}
}

impl From<&str> for EventId {
	fn from(id: &str) -> Self {
		EventId(id.to_string())
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
