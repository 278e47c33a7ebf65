use crate::chains::adapter::AdapterResult;
use crate::events::EventTrigger;
use crate::types::EventId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A watcher commitment to an event that has not been merged into its trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
	pub wid: String,
	pub event_id: EventId,
	pub height: u64,
}

#[async_trait::async_trait]
pub trait CommitmentProvider: Send + Sync {
	/// Valid commitments for the event created strictly before `event_height`.
	async fn commitments(&self, event_id: &EventId, event_height: u64)
		-> AdapterResult<Vec<Commitment>>;
}

/// Watcher ids of commitments that should still be rewarded: one per wid,
/// first occurrence kept, and none that already merged into the trigger.
pub fn unmerged_wids(event: &EventTrigger, commitments: &[Commitment]) -> Vec<String> {
	let mut seen: HashSet<&str> = event.wids.iter().map(String::as_str).collect();
	commitments
		.iter()
		.filter(|commitment| seen.insert(commitment.wid.as_str()))
		.map(|commitment| commitment.wid.clone())
		.collect()
}
