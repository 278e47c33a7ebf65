use crate::chains::adapter::AdapterError;
use crate::fee::FeeError;
use crate::publisher::PublishError;
use crate::signer::SignerError;
use crate::transactions::AdmissionKey;
use crate::types::{Chain, EventId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
	#[error("Event {0} not found")]
	EventNotFound(EventId),
	#[error("Transaction {0} not found")]
	TransactionNotFound(String),
	#[error("Transaction {0} is not linked to an event")]
	UnlinkedTransaction(String),
	#[error("Found {count} active transactions for {key}")]
	InvariantViolation { key: AdmissionKey, count: usize },
	#[error("Invalid {kind} transition for {id}: {from} -> {to}")]
	InvalidTransition { kind: &'static str, id: String, from: String, to: String },
	#[error("No {to} token mapped for {token} on {from}")]
	TokenNotFound { token: String, from: Chain, to: Chain },
	#[error("No {tx_type} transaction found for event {event_id}")]
	MissingTransaction { event_id: EventId, tx_type: String },
	#[error(transparent)]
	Adapter(#[from] AdapterError),
	#[error(transparent)]
	Signer(#[from] SignerError),
	#[error(transparent)]
	Fee(#[from] FeeError),
	#[error(transparent)]
	Publish(#[from] PublishError),
	#[error("Store error: {0}")]
	Store(String),
}

impl GuardError {
	/// Invariant violations halt processing of the affected event.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::InvariantViolation { .. })
	}
}

pub type GuardResult<T> = Result<T, GuardError>;
