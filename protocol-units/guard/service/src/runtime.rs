use crate::processor::events::EventProcessor;
use crate::processor::transactions::TransactionProcessor;
use guard_util::{EventProof, EventTrigger};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{error, info};

/// An event trigger reported by the watchers, with its on chain artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedEvent {
	pub trigger: EventTrigger,
	pub proof: EventProof,
}

/// Feeds observed events to the event processor and polls both processors.
pub struct GuardRuntime {
	events: Arc<EventProcessor>,
	transactions: Arc<TransactionProcessor>,
	poll_interval: Duration,
}

impl GuardRuntime {
	pub fn new(
		events: Arc<EventProcessor>,
		transactions: Arc<TransactionProcessor>,
		poll_interval: Duration,
	) -> Self {
		GuardRuntime { events, transactions, poll_interval }
	}

	/// One processing round: new transactions for pending events, progress on
	/// active transactions, then timeouts.
	pub async fn tick(&self) {
		if let Err(e) = self.events.process_pending_events().await {
			error!("Failed to process pending events: {e}");
		}
		if let Err(e) = self.transactions.process_transactions().await {
			error!("Failed to process transactions: {e}");
		}
		if let Err(e) = self.events.process_timeouts().await {
			error!("Failed to process event timeouts: {e}");
		}
	}

	/// Runs until `shutdown` resolves.
	pub async fn run<S>(
		&self,
		observed: mpsc::Receiver<ObservedEvent>,
		shutdown: S,
	) -> Result<(), anyhow::Error>
	where
		S: Future<Output = ()>,
	{
		let mut observed = ReceiverStream::new(observed);
		let mut ticker = interval(self.poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		tokio::pin!(shutdown);

		info!("Guard runtime started, polling every {:?}", self.poll_interval);
		loop {
			tokio::select! {
				_ = &mut shutdown => {
					info!("Guard runtime stopping");
					break;
				}
				Some(event) = observed.next() => {
					let source_tx_id = event.trigger.source_tx_id.clone();
					match self.events.insert_event(event.trigger, event.proof).await {
						Ok(true) => info!("Observed new event of lock {source_tx_id}"),
						Ok(false) => {}
						Err(e) => error!("Failed to store event of lock {source_tx_id}: {e}"),
					}
				}
				_ = ticker.tick() => self.tick().await,
			}
		}
		Ok(())
	}
}
