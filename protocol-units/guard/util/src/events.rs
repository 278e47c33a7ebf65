use crate::status::EventStatus;
use crate::types::{Amount, Chain, EventId};
use chrono::{DateTime, Utc};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A lock observed on a source chain and reported by the watchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
	pub source_tx_id: String,
	pub from_chain: Chain,
	pub to_chain: Chain,
	pub from_address: String,
	pub to_address: String,
	pub amount: Amount,
	pub bridge_fee: Amount,
	pub network_fee: Amount,
	pub source_chain_token_id: String,
	pub target_chain_token_id: String,
	/// Watcher ids that merged their commitments into the trigger, in order.
	pub wids: Vec<String>,
	/// Bridge chain height at which the trigger was created.
	pub height: u64,
	#[serde(default)]
	pub source_block_id: String,
	#[serde(default)]
	pub source_chain_height: u64,
}

impl EventTrigger {
	pub fn event_id(&self) -> EventId {
		EventId::from_source_tx(&self.source_tx_id)
	}
}

/// Serialized on chain artifact of the trigger, opaque to the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct EventProof(#[serde(with = "hex")] pub Vec<u8>);

impl From<Vec<u8>> for EventProof {
	fn from(bytes: Vec<u8>) -> Self {
		EventProof(bytes)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedEvent {
	pub id: EventId,
	pub event: EventTrigger,
	pub status: EventStatus,
	/// Start of the current processing attempt, reset on every entry to a pending state.
	pub first_try: Option<DateTime<Utc>>,
	pub event_proof: EventProof,
}

impl ConfirmedEvent {
	pub fn new(event: EventTrigger, event_proof: EventProof, status: EventStatus) -> Self {
		ConfirmedEvent {
			id: event.event_id(),
			event,
			status,
			first_try: Some(Utc::now()),
			event_proof,
		}
	}
}

impl fmt::Display for ConfirmedEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Event {} [{}] {} -> {} amount: {}",
			self.id, self.status, self.event.from_chain, self.event.to_chain, self.event.amount
		)
	}
}
