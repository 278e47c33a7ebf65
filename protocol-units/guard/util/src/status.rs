use crate::transactions::TransactionType;
use crate::types::{Chain, EventId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
	PendingPayment,
	InPayment,
	PaymentWaiting,
	PendingReward,
	InReward,
	RewardWaiting,
	Completed,
	Timeout,
	Rejected,
}

impl EventStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::PendingPayment => "pendingPayment",
			Self::InPayment => "inPayment",
			Self::PaymentWaiting => "paymentWaiting",
			Self::PendingReward => "pendingReward",
			Self::InReward => "inReward",
			Self::RewardWaiting => "rewardWaiting",
			Self::Completed => "completed",
			Self::Timeout => "timeout",
			Self::Rejected => "rejected",
		}
	}

	pub fn is_pending(&self) -> bool {
		matches!(self, Self::PendingPayment | Self::PendingReward)
	}

	pub fn is_waiting(&self) -> bool {
		matches!(self, Self::PaymentWaiting | Self::RewardWaiting)
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Completed | Self::Timeout | Self::Rejected)
	}

	/// The transaction type an event in this status is being processed with.
	pub fn tx_type(&self) -> Option<TransactionType> {
		match self {
			Self::PendingPayment | Self::InPayment | Self::PaymentWaiting => {
				Some(TransactionType::Payment)
			}
			Self::PendingReward | Self::InReward | Self::RewardWaiting => {
				Some(TransactionType::Reward)
			}
			_ => None,
		}
	}

	pub fn can_transition_to(&self, next: EventStatus) -> bool {
		use EventStatus::*;
		matches!(
			(self, next),
			(PendingPayment, InPayment)
				| (InPayment, PaymentWaiting)
				| (PaymentWaiting, Completed)
				| (PaymentWaiting, PendingReward)
				| (PendingReward, InReward)
				| (InReward, RewardWaiting)
				| (RewardWaiting, Completed)
				| (InPayment, PendingPayment)
				| (PaymentWaiting, PendingPayment)
				| (InReward, PendingReward)
				| (RewardWaiting, PendingReward)
				| (PendingPayment, Timeout)
				| (PendingReward, Timeout)
				| (PaymentWaiting, Timeout)
				| (RewardWaiting, Timeout)
				| (PendingPayment, Rejected)
				| (PendingReward, Rejected)
		)
	}
}

impl fmt::Display for EventStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
	Approved,
	InSign,
	SignFailed,
	Signed,
	Sent,
	Completed,
	Invalid,
}

impl TransactionStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Approved => "approved",
			Self::InSign => "inSign",
			Self::SignFailed => "signFailed",
			Self::Signed => "signed",
			Self::Sent => "sent",
			Self::Completed => "completed",
			Self::Invalid => "invalid",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Completed | Self::Invalid)
	}

	pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
		use TransactionStatus::*;
		matches!(
			(self, next),
			(Approved, InSign)
				| (InSign, Signed)
				| (InSign, SignFailed)
				| (SignFailed, Approved)
				| (SignFailed, Invalid)
				| (Signed, Sent)
				| (Sent, Completed)
				| (Approved, Invalid)
				| (Signed, Invalid)
				| (Sent, Invalid)
		)
	}
}

impl fmt::Display for TransactionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Confirmation level of a transaction as reported by a chain adapter.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxConfirmationStatus {
	NotFound,
	Unconfirmed,
	Confirming,
	ConfirmedEnough,
}

/// A status change applied to the store, returned by every mutation so the
/// caller can hand it to the status dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTransition {
	Event {
		event_id: EventId,
		/// `None` when the event was just inserted.
		from: Option<EventStatus>,
		to: EventStatus,
	},
	Transaction {
		tx_id: String,
		tx_type: TransactionType,
		chain: Chain,
		event_id: Option<EventId>,
		/// `None` when the transaction was just inserted.
		from: Option<TransactionStatus>,
		to: TransactionStatus,
	},
}

impl fmt::Display for StatusTransition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fn from_str<T: fmt::Display>(from: &Option<T>) -> String {
			from.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
		}
		match self {
			Self::Event { event_id, from, to } => {
				write!(f, "event {event_id}: {} -> {to}", from_str(from))
			}
			Self::Transaction { tx_id, tx_type, from, to, .. } => {
				write!(f, "{tx_type} tx {tx_id}: {} -> {to}", from_str(from))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_event_payment_path() {
		use EventStatus::*;
		assert!(PendingPayment.can_transition_to(InPayment));
		assert!(InPayment.can_transition_to(PaymentWaiting));
		assert!(PaymentWaiting.can_transition_to(Completed));
		assert!(PaymentWaiting.can_transition_to(PendingReward));
		assert!(!PendingPayment.can_transition_to(Completed));
		assert!(!Completed.can_transition_to(PendingPayment));
		assert!(!InPayment.can_transition_to(Timeout));
	}

	#[test]
	fn test_terminal_event_statuses_have_no_exit() {
		let all = [
			EventStatus::PendingPayment,
			EventStatus::InPayment,
			EventStatus::PaymentWaiting,
			EventStatus::PendingReward,
			EventStatus::InReward,
			EventStatus::RewardWaiting,
			EventStatus::Completed,
			EventStatus::Timeout,
			EventStatus::Rejected,
		];
		for from in all.iter().filter(|s| s.is_terminal()) {
			assert!(all.iter().all(|to| !from.can_transition_to(*to)), "{from} has an exit");
		}
	}

	#[test]
	fn test_transaction_sign_retry_path() {
		use TransactionStatus::*;
		assert!(InSign.can_transition_to(SignFailed));
		assert!(SignFailed.can_transition_to(Approved));
		assert!(SignFailed.can_transition_to(Invalid));
		assert!(!Signed.can_transition_to(Approved));
		assert!(!Completed.can_transition_to(Invalid));
		assert!(!Invalid.can_transition_to(Approved));
	}

	#[test]
	fn test_status_serde_names() {
		assert_eq!(
			serde_json::to_string(&EventStatus::PendingPayment).unwrap(),
			"\"pendingPayment\""
		);
		assert_eq!(serde_json::to_string(&TransactionStatus::InSign).unwrap(), "\"inSign\"");
	}
}
