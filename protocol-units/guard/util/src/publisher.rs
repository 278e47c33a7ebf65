use crate::status::{EventStatus, TransactionStatus};
use crate::transactions::TransactionType;
use crate::types::EventId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
	#[error("Status channel closed")]
	ChannelClosed,
	#[error("Failed to deliver status update: {0}")]
	Delivery(String),
}

/// Public status of an event, with the transaction currently driving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
	/// Unix timestamp in milliseconds.
	pub date: i64,
	pub event_id: EventId,
	pub status: EventStatus,
	pub tx_id: Option<String>,
	pub tx_type: Option<TransactionType>,
	pub tx_status: Option<TransactionStatus>,
}

impl StatusUpdate {
	/// Message the publisher signs before delivery.
	pub fn sign_message(&self) -> String {
		format!(
			"{}{}{}{}{}{}",
			self.event_id,
			self.status,
			self.tx_id.as_deref().unwrap_or_default(),
			self.tx_type.map(|t| t.as_str()).unwrap_or_default(),
			self.tx_status.map(|s| s.as_str()).unwrap_or_default(),
			self.date
		)
	}
}

#[async_trait::async_trait]
pub trait StatusPublisher: Send + Sync {
	async fn publish(&self, update: StatusUpdate) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sign_message() {
		let update = StatusUpdate {
			date: 1700000000000,
			event_id: EventId::from("e1"),
			status: EventStatus::InPayment,
			tx_id: Some("t1".to_string()),
			tx_type: Some(TransactionType::Payment),
			tx_status: Some(TransactionStatus::Approved),
		};
		assert_eq!(update.sign_message(), "e1inPaymentt1paymentapproved1700000000000");

		let bare = StatusUpdate { tx_id: None, tx_type: None, tx_status: None, ..update };
		assert_eq!(bare.sign_message(), "e1inPayment1700000000000");
	}
}
