use crate::types::Chain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainToken {
	pub token_id: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub decimals: u8,
	/// Whether the token is the chain's native asset.
	#[serde(default)]
	pub native: bool,
}

/// Sets of equivalent tokens, one entry per chain the token is bridged to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenMap(pub Vec<BTreeMap<Chain, ChainToken>>);

impl TokenMap {
	pub fn new(sets: Vec<BTreeMap<Chain, ChainToken>>) -> Self {
		TokenMap(sets)
	}

	/// Token on `to` that corresponds to `token_id` on `from`.
	pub fn target_token(&self, from: Chain, token_id: &str, to: Chain) -> Option<&ChainToken> {
		self.0
			.iter()
			.find(|set| set.get(&from).map_or(false, |token| token.token_id == token_id))
			.and_then(|set| set.get(&to))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn token(id: &str, native: bool) -> ChainToken {
		ChainToken { token_id: id.to_string(), name: id.to_string(), decimals: 0, native }
	}

	#[test]
	fn test_target_token_lookup() {
		let map = TokenMap::new(vec![
			BTreeMap::from([
				(Chain::Ergo, token("erg", true)),
				(Chain::Cardano, token("wrapped-erg", false)),
			]),
			BTreeMap::from([
				(Chain::Ergo, token("wrapped-ada", false)),
				(Chain::Cardano, token("lovelace", true)),
			]),
		]);

		let target = map.target_token(Chain::Cardano, "lovelace", Chain::Ergo).unwrap();
		assert_eq!(target.token_id, "wrapped-ada");
		assert!(!target.native);
		assert!(map.target_token(Chain::Cardano, "wrapped-erg", Chain::Ergo).unwrap().native);
		assert!(map.target_token(Chain::Cardano, "unknown", Chain::Ergo).is_none());
	}
}
