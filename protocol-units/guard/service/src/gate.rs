use guard_util::{
	AdapterError, ChainRegistry, ConfirmedEvent, EventProof, EventStatus, EventTrigger, Fee,
	GuardResult, TransactionType, TxConfirmationStatus, TxKind,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Decides whether an observed event is deep enough and authentic.
#[derive(Debug, Clone)]
pub struct EventConfirmationGate {
	registry: Arc<ChainRegistry>,
	event_confirmation: u64,
	adapter_timeout: Duration,
}

impl EventConfirmationGate {
	pub fn new(registry: Arc<ChainRegistry>, event_confirmation: u64, adapter_timeout: Duration) -> Self {
		EventConfirmationGate { registry, event_confirmation, adapter_timeout }
	}

	/// Runs an adapter call under the timeout; `None` when it timed out.
	async fn bounded<T, F>(&self, call: F) -> Option<Result<T, AdapterError>>
	where
		F: Future<Output = Result<T, AdapterError>>,
	{
		timeout(self.adapter_timeout, call).await.ok()
	}

	/// Both the trigger height and the lock transaction must be confirmed.
	/// Adapter errors propagate, a timed out call counts as not confirmed.
	pub async fn is_confirmed_enough(&self, event: &EventTrigger) -> GuardResult<bool> {
		let bridge = self.registry.bridge()?;
		let height = match self.bounded(bridge.height()).await {
			Some(height) => height?,
			None => {
				warn!("Bridge chain height request timed out for lock {}", event.source_tx_id);
				return Ok(false);
			}
		};
		let deep_enough = height
			.checked_sub(event.height)
			.map_or(false, |depth| depth >= self.event_confirmation);
		if !deep_enough {
			debug!(
				"Trigger of lock {} at height {} not confirmed at height {height}",
				event.source_tx_id, event.height
			);
			return Ok(false);
		}

		let source = self.registry.get(event.from_chain)?;
		let status = match self
			.bounded(source.tx_confirmation_status(&event.source_tx_id, TxKind::Lock))
			.await
		{
			Some(status) => status?,
			None => {
				warn!("Confirmation request of lock {} timed out", event.source_tx_id);
				return Ok(false);
			}
		};
		Ok(status == TxConfirmationStatus::ConfirmedEnough)
	}

	/// The lock must verify on the source chain and the trigger must carry
	/// reward tokens of the source chain watchers.
	pub async fn verify(
		&self,
		event: &EventTrigger,
		fee: &Fee,
		proof: &EventProof,
	) -> GuardResult<bool> {
		let source = self.registry.get(event.from_chain)?;
		let timed_out = |what: &str| AdapterError::RequestFailed {
			chain: event.from_chain,
			message: format!("{what} timed out"),
		};
		let event_valid = self
			.bounded(source.verify_event(event, fee))
			.await
			.ok_or_else(|| timed_out("event verification"))??;
		if !event_valid {
			warn!("Lock {} failed verification on {}", event.source_tx_id, event.from_chain);
			return Ok(false);
		}

		let bridge = self.registry.bridge()?;
		let rwt_valid = self
			.bounded(bridge.verify_event_rwt(proof, &source.rwt_token()))
			.await
			.ok_or_else(|| timed_out("reward token verification"))??;
		if !rwt_valid {
			warn!("Trigger of lock {} carries an unexpected reward token", event.source_tx_id);
		}
		Ok(rwt_valid)
	}
}

/// Whether the event waits for a new transaction of the given type.
pub fn is_event_pending_to_type(event: &ConfirmedEvent, tx_type: TransactionType) -> bool {
	matches!(
		(event.status, tx_type),
		(EventStatus::PendingPayment, TransactionType::Payment)
			| (EventStatus::PendingReward, TransactionType::Reward)
	)
}
