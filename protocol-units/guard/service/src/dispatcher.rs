use chrono::Utc;
use guard_store::GuardStore;
use guard_util::{
	EventStatus, GuardError, GuardResult, PublishError, StatusPublisher, StatusTransition,
	StatusUpdate,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Turns status transitions into public status updates.
pub struct StatusDispatcher {
	store: Arc<dyn GuardStore>,
	publisher: Arc<dyn StatusPublisher>,
}

impl StatusDispatcher {
	pub fn new(store: Arc<dyn GuardStore>, publisher: Arc<dyn StatusPublisher>) -> Self {
		StatusDispatcher { store, publisher }
	}

	/// Publishes every transition. Failures are logged and do not stop the
	/// remaining updates, the stored state being already written.
	pub async fn dispatch(&self, transitions: Vec<StatusTransition>) {
		for transition in transitions {
			let update = match self.status_update(&transition).await {
				Ok(Some(update)) => update,
				Ok(None) => continue,
				Err(e) => {
					error!("Failed to build status update for {transition}: {e}");
					continue;
				}
			};
			if let Err(e) = self.publisher.publish(update).await {
				error!("Failed to publish status update for {transition}: {e}");
			}
		}
	}

	/// The update describing `transition`, or `None` for transactions without an event.
	pub async fn status_update(
		&self,
		transition: &StatusTransition,
	) -> GuardResult<Option<StatusUpdate>> {
		let date = Utc::now().timestamp_millis();
		match transition {
			StatusTransition::Event { event_id, to, .. } => {
				let mut update = StatusUpdate {
					date,
					event_id: event_id.clone(),
					status: *to,
					tx_id: None,
					tx_type: None,
					tx_status: None,
				};
				if matches!(to, EventStatus::InPayment | EventStatus::InReward) {
					let Some(tx_type) = to.tx_type() else {
						return Ok(Some(update));
					};
					let tx = self
						.store
						.event_transactions(event_id)
						.await?
						.into_iter()
						.filter(|tx| tx.tx_type == tx_type && tx.is_active())
						.max_by_key(|tx| tx.last_status_update)
						.ok_or_else(|| GuardError::MissingTransaction {
							event_id: event_id.clone(),
							tx_type: tx_type.to_string(),
						})?;
					update.tx_id = Some(tx.tx_id);
					update.tx_type = Some(tx.tx_type);
					update.tx_status = Some(tx.status);
				}
				Ok(Some(update))
			}
			StatusTransition::Transaction { tx_id, tx_type, event_id, to, .. } => {
				let Some(event_id) = event_id else {
					return Ok(None);
				};
				let event = self
					.store
					.get_event(event_id)
					.await?
					.ok_or_else(|| GuardError::EventNotFound(event_id.clone()))?;
				Ok(Some(StatusUpdate {
					date,
					event_id: event_id.clone(),
					status: event.status,
					tx_id: Some(tx_id.clone()),
					tx_type: Some(*tx_type),
					tx_status: Some(*to),
				}))
			}
		}
	}
}

/// Publishes updates on an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
	sender: mpsc::UnboundedSender<StatusUpdate>,
}

impl ChannelPublisher {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusUpdate>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(ChannelPublisher { sender }, receiver)
	}
}

#[async_trait::async_trait]
impl StatusPublisher for ChannelPublisher {
	async fn publish(&self, update: StatusUpdate) -> Result<(), PublishError> {
		self.sender.send(update).map_err(|_| PublishError::ChannelClosed)
	}
}

/// Writes updates to the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingPublisher;

#[async_trait::async_trait]
impl StatusPublisher for LoggingPublisher {
	async fn publish(&self, update: StatusUpdate) -> Result<(), PublishError> {
		let payload = serde_json::to_string(&update)
			.map_err(|e| PublishError::Delivery(e.to_string()))?;
		info!(target: "guard::status", sign_message = %update.sign_message(), "{payload}");
		Ok(())
	}
}
