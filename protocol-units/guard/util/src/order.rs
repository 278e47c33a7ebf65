use crate::types::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
	pub id: String,
	pub value: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
	pub native_token: Amount,
	pub tokens: Vec<TokenAmount>,
}

impl AssetBalance {
	pub fn native(native_token: Amount) -> Self {
		AssetBalance { native_token, tokens: Vec::new() }
	}

	/// Adds a token entry, skipping zero amounts so token lists stay sparse.
	pub fn with_token(mut self, id: impl Into<String>, value: Amount) -> Self {
		if !value.is_zero() {
			self.tokens.push(TokenAmount { id: id.into(), value });
		}
		self
	}

	pub fn token(&self, id: &str) -> Option<Amount> {
		self.tokens.iter().find(|token| token.id == id).map(|token| token.value)
	}
}

/// One output of an order. `extra` is an opaque correlation tag for the chain builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglePayment {
	pub address: String,
	pub assets: AssetBalance,
	pub extra: Option<String>,
}

/// Ordered outputs; the chain builder may correlate outputs by index.
pub type PaymentOrder = Vec<SinglePayment>;
