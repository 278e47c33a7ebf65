use crate::status::TransactionStatus;
use crate::types::{Chain, EventId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
	Payment,
	Reward,
	ColdStorage,
}

impl TransactionType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Payment => "payment",
			Self::Reward => "reward",
			Self::ColdStorage => "coldStorage",
		}
	}
}

impl fmt::Display for TransactionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Key under which at most one transaction may be active.
#[derive(Debug, Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum AdmissionKey {
	Event { event_id: EventId, tx_type: TransactionType },
	Chain { chain: Chain, tx_type: TransactionType },
}

impl fmt::Display for AdmissionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Event { event_id, tx_type } => write!(f, "event/{event_id}/{tx_type}"),
			Self::Chain { chain, tx_type } => write!(f, "chain/{chain}/{tx_type}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
	pub tx_id: String,
	/// Absent for maintenance transactions such as cold storage sweeps.
	pub event_id: Option<EventId>,
	pub tx_type: TransactionType,
	pub chain: Chain,
	#[serde(with = "hex")]
	pub payload: Vec<u8>,
	pub status: TransactionStatus,
	/// Last chain height at which confirmation was polled.
	pub last_check: u64,
	pub last_status_update: DateTime<Utc>,
	pub failed_in_sign: bool,
	pub sign_failed_count: u32,
	pub required_sign: u32,
}

impl PaymentTransaction {
	pub fn new(
		tx_id: impl Into<String>,
		event_id: Option<EventId>,
		tx_type: TransactionType,
		chain: Chain,
		payload: Vec<u8>,
		required_sign: u32,
	) -> Self {
		PaymentTransaction {
			tx_id: tx_id.into(),
			event_id,
			tx_type,
			chain,
			payload,
			status: TransactionStatus::Approved,
			last_check: 0,
			last_status_update: Utc::now(),
			failed_in_sign: false,
			sign_failed_count: 0,
			required_sign,
		}
	}

	/// Eventless transactions are keyed by their chain.
	pub fn admission_key(&self) -> AdmissionKey {
		match &self.event_id {
			Some(event_id) if self.tx_type != TransactionType::ColdStorage => {
				AdmissionKey::Event { event_id: event_id.clone(), tx_type: self.tx_type }
			}
			_ => AdmissionKey::Chain { chain: self.chain, tx_type: self.tx_type },
		}
	}

	pub fn is_active(&self) -> bool {
		self.status != TransactionStatus::Invalid
	}
}

impl fmt::Display for PaymentTransaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} tx {} on {} [{}]", self.tx_type, self.tx_id, self.chain, self.status)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_admission_key() {
		let event_id = EventId::from("E");
		let tx = PaymentTransaction::new(
			"5",
			Some(event_id.clone()),
			TransactionType::Payment,
			Chain::Cardano,
			vec![],
			3,
		);
		assert_eq!(
			tx.admission_key(),
			AdmissionKey::Event { event_id, tx_type: TransactionType::Payment }
		);

		let cold =
			PaymentTransaction::new("7", None, TransactionType::ColdStorage, Chain::Ergo, vec![], 3);
		assert_eq!(
			cold.admission_key(),
			AdmissionKey::Chain { chain: Chain::Ergo, tx_type: TransactionType::ColdStorage }
		);
		assert_eq!(cold.status, TransactionStatus::Approved);
		assert_eq!(cold.last_check, 0);
	}
}
