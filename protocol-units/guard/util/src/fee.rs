use crate::chains::adapter::AdapterError;
use crate::events::EventTrigger;
use crate::types::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fee schedule supplied per event by the fee policy lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
	pub bridge_fee: Amount,
	pub network_fee: Amount,
	pub fee_ratio: Amount,
	pub fee_ratio_divisor: Amount,
	pub rsn_ratio: Amount,
	pub rsn_ratio_divisor: Amount,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
	#[error("Divisor {0} is zero")]
	ZeroDivisor(&'static str),
	#[error("Event has no watchers to reward")]
	NoWatchers,
	#[error("Amount {amount} does not cover fees {fees}")]
	NegativePayout { amount: Amount, fees: Amount },
	#[error("Share percent {0} is above 100")]
	InvalidPercent(u64),
	#[error("Arithmetic overflow while computing {0}")]
	Overflow(&'static str),
	#[error("Arithmetic underflow while computing {0}")]
	Underflow(&'static str),
}

/// External lookup of the fee schedule applying to an event.
#[async_trait::async_trait]
pub trait FeePolicy: Send + Sync {
	async fn fee(&self, event: &EventTrigger) -> Result<Fee, AdapterError>;
}

/// Applies one schedule to every event.
#[derive(Debug, Clone)]
pub struct StaticFeePolicy(pub Fee);

#[async_trait::async_trait]
impl FeePolicy for StaticFeePolicy {
	async fn fee(&self, _event: &EventTrigger) -> Result<Fee, AdapterError> {
		Ok(self.0.clone())
	}
}
