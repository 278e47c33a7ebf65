use super::log_failure;
use crate::dispatcher::StatusDispatcher;
use crate::gate::{is_event_pending_to_type, EventConfirmationGate};
use crate::ledger::{Admission, TransactionLedger};
use crate::order_builder::EventOrderBuilder;
use crate::status_machine::StatusMachine;
use chrono::Utc;
use guard_store::GuardStore;
use guard_util::{
	AdmissionKey, Chain, ChainRegistry, ConfirmedEvent, EventProof, EventStatus, EventTrigger, Fee, FeePolicy,
	GuardError, GuardResult, PaymentOrder, TransactionStatus, TransactionType,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the event processor is wired to.
pub struct EventProcessorParts {
	pub store: Arc<dyn GuardStore>,
	pub registry: Arc<ChainRegistry>,
	pub gate: EventConfirmationGate,
	pub fee_policy: Arc<dyn FeePolicy>,
	pub builder: EventOrderBuilder,
	pub ledger: Arc<TransactionLedger>,
	pub machine: Arc<StatusMachine>,
	pub dispatcher: Arc<StatusDispatcher>,
}

/// Turns pending events into approved payment and reward transactions.
pub struct EventProcessor {
	parts: EventProcessorParts,
	required_sign: u32,
	event_timeout: Duration,
}

impl EventProcessor {
	pub fn new(parts: EventProcessorParts, required_sign: u32, event_timeout: Duration) -> Self {
		EventProcessor { parts, required_sign, event_timeout }
	}

	/// Stores an event reported by the watchers. Returns whether it is new.
	pub async fn insert_event(&self, trigger: EventTrigger, proof: EventProof) -> GuardResult<bool> {
		let transition =
			self.parts.machine.insert_event(trigger, proof, EventStatus::PendingPayment).await?;
		let inserted = transition.is_some();
		self.parts.dispatcher.dispatch(transition.into_iter().collect()).await;
		Ok(inserted)
	}

	pub async fn process_pending_events(&self) -> GuardResult<()> {
		let events = self.parts.store.pending_events().await?;
		debug!("Processing {} pending events", events.len());
		for event in events {
			if let Err(e) = self.process_event(&event).await {
				log_failure(&format!("event {}", event.id), &e);
			}
		}
		Ok(())
	}

	/// Builds and admits the next transaction of a pending event. Returns
	/// `None` when the event is not ready yet or got rejected.
	pub async fn process_event(&self, event: &ConfirmedEvent) -> GuardResult<Option<Admission>> {
		let Some(tx_type) = [TransactionType::Payment, TransactionType::Reward]
			.into_iter()
			.find(|&tx_type| is_event_pending_to_type(event, tx_type))
		else {
			return Ok(None);
		};
		// an event with conflicting transactions stays halted until an operator steps in
		let key = AdmissionKey::Event { event_id: event.id.clone(), tx_type };
		let active = self.parts.store.active_transactions_by_key(&key).await?;
		if active.len() > 1 {
			return Err(GuardError::InvariantViolation { key, count: active.len() });
		}
		if !self.parts.gate.is_confirmed_enough(&event.event).await? {
			debug!("Event {} is not confirmed yet", event.id);
			return Ok(None);
		}
		let fee = self.parts.fee_policy.fee(&event.event).await?;
		if !self.parts.gate.verify(&event.event, &fee, &event.event_proof).await? {
			warn!("Rejecting event {}", event.id);
			let transition =
				self.parts.machine.set_event_status(&event.id, EventStatus::Rejected).await?;
			self.parts.dispatcher.dispatch(vec![transition]).await;
			return Ok(None);
		}

		let (chain, order) = match tx_type {
			TransactionType::Reward => (Chain::BRIDGE, self.reward_order(event, &fee).await?),
			_ => (
				event.event.to_chain,
				self.parts
					.builder
					.create_payment_order(&event.event, &event.event_proof, &fee)
					.await?,
			),
		};
		let adapter = self.parts.registry.get(chain)?;
		let candidate = adapter
			.generate_transaction(Some(&event.id), tx_type, &order, self.required_sign)
			.await?;
		let outcome = self.parts.ledger.insert(candidate).await?;
		info!("Event {} {tx_type} candidate {}", event.id, outcome.admission);
		self.parts.dispatcher.dispatch(outcome.transitions).await;
		Ok(Some(outcome.admission))
	}

	/// The reward order references the completed payment of the event.
	async fn reward_order(
		&self,
		event: &ConfirmedEvent,
		fee: &Fee,
	) -> GuardResult<PaymentOrder> {
		let payment = self
			.parts
			.store
			.event_transactions(&event.id)
			.await?
			.into_iter()
			.find(|tx| {
				tx.tx_type == TransactionType::Payment && tx.status == TransactionStatus::Completed
			})
			.ok_or_else(|| GuardError::MissingTransaction {
				event_id: event.id.clone(),
				tx_type: TransactionType::Payment.to_string(),
			})?;
		self.parts
			.builder
			.create_reward_order(&event.event, &event.event_proof, fee, &payment.tx_id)
			.await
	}

	/// Times out events whose current attempt outlived the event timeout.
	pub async fn process_timeouts(&self) -> GuardResult<()> {
		let now = Utc::now();
		let mut events = self.parts.store.pending_events().await?;
		events.extend(self.parts.store.waiting_events().await?);
		for event in events {
			match self.parts.machine.timeout_event(&event.id, self.event_timeout, now).await {
				Ok(Some(transition)) => self.parts.dispatcher.dispatch(vec![transition]).await,
				Ok(None) => {}
				Err(e) => log_failure(&format!("timeout of event {}", event.id), &e),
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dispatcher::ChannelPublisher;
	use crate::locks::KeyLocks;
	use crate::mock::{
		sample_event, sample_fee, sample_tokens, MockChainAdapter, MockCommitmentProvider,
	};
	use crate::reward::{RewardOrderCalculator, RewardSettings};
	use guard_store::{MemoryStore, StoreBatch};
	use guard_util::{
		EventId, PaymentTransaction, StaticFeePolicy, StatusUpdate, TxConfirmationStatus,
	};
	use tokio::sync::mpsc::UnboundedReceiver;

	struct Fixture {
		processor: EventProcessor,
		store: Arc<MemoryStore>,
		ergo: MockChainAdapter,
		cardano: MockChainAdapter,
		updates: UnboundedReceiver<StatusUpdate>,
	}

	fn fixture() -> Fixture {
		let store = Arc::new(MemoryStore::new());
		let ergo = MockChainAdapter::new(Chain::Ergo);
		let cardano = MockChainAdapter::new(Chain::Cardano);
		let registry = Arc::new(
			ChainRegistry::new()
				.with_adapter(Arc::new(ergo.clone()))
				.with_adapter(Arc::new(cardano.clone())),
		);
		let locks = Arc::new(KeyLocks::new());
		let (publisher, updates) = ChannelPublisher::new();
		let settings = RewardSettings {
			watchers_share_percent: 50,
			watchers_rsn_share_percent: 0,
			bridge_fee_repo_address: "bridge-fee-repo".to_string(),
			network_fee_repo_address: "network-fee-repo".to_string(),
			watcher_permit_address: "permit".to_string(),
			rsn_token_id: "rsn".to_string(),
		};
		let parts = EventProcessorParts {
			store: store.clone(),
			registry: registry.clone(),
			gate: EventConfirmationGate::new(registry.clone(), 10, Duration::from_secs(1)),
			fee_policy: Arc::new(StaticFeePolicy(sample_fee())),
			builder: EventOrderBuilder::new(
				registry,
				RewardOrderCalculator::new(settings, sample_tokens()),
				Arc::new(MockCommitmentProvider::new()),
			),
			ledger: Arc::new(TransactionLedger::new(store.clone(), locks.clone())),
			machine: Arc::new(StatusMachine::new(store.clone(), locks)),
			dispatcher: Arc::new(StatusDispatcher::new(store.clone(), Arc::new(publisher))),
		};
		Fixture {
			processor: EventProcessor::new(parts, 3, Duration::from_secs(3600)),
			store,
			ergo,
			cardano,
			updates,
		}
	}

	impl Fixture {
		async fn event(&self, id: &EventId) -> Result<ConfirmedEvent, anyhow::Error> {
			self.store.get_event(id).await?.ok_or_else(|| anyhow::anyhow!("event {id} missing"))
		}
	}

	#[tokio::test]
	async fn test_confirmed_event_gets_payment() -> Result<(), anyhow::Error> {
		let mut fixture = fixture();
		let trigger = sample_event("lock-1", Chain::Ergo, Chain::Cardano, 100);
		let event_id = trigger.event_id();
		assert!(fixture.processor.insert_event(trigger.clone(), EventProof(vec![7])).await?);
		assert!(!fixture.processor.insert_event(trigger, EventProof(vec![7])).await?);
		assert_eq!(fixture.updates.recv().await.unwrap().status, EventStatus::PendingPayment);

		fixture.ergo.set_height(105).await;
		fixture.ergo.set_confirmation("lock-1", TxConfirmationStatus::ConfirmedEnough).await;
		fixture.processor.process_pending_events().await?;
		assert_eq!(fixture.event(&event_id).await?.status, EventStatus::PendingPayment);

		fixture.ergo.set_height(110).await;
		fixture.processor.process_pending_events().await?;
		assert_eq!(fixture.event(&event_id).await?.status, EventStatus::InPayment);

		let txs = fixture.store.event_transactions(&event_id).await?;
		assert_eq!(txs.len(), 1);
		assert_eq!(txs[0].chain, Chain::Cardano);
		assert_eq!(txs[0].status, TransactionStatus::Approved);

		let update = fixture.updates.recv().await.unwrap();
		assert_eq!(update.status, EventStatus::InPayment);
		assert_eq!(update.tx_id, Some(txs[0].tx_id.clone()));
		Ok(())
	}

	#[tokio::test]
	async fn test_unverified_event_is_rejected() -> Result<(), anyhow::Error> {
		let fixture = fixture();
		let trigger = sample_event("lock-1", Chain::Cardano, Chain::Ergo, 100);
		let event_id = trigger.event_id();
		fixture.processor.insert_event(trigger, EventProof::default()).await?;
		fixture.ergo.set_height(200).await;
		fixture.cardano.set_confirmation("lock-1", TxConfirmationStatus::ConfirmedEnough).await;
		fixture.cardano.set_event_valid(false).await;

		fixture.processor.process_pending_events().await?;
		assert_eq!(fixture.event(&event_id).await?.status, EventStatus::Rejected);
		assert!(fixture.store.event_transactions(&event_id).await?.is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn test_reward_needs_completed_payment() -> Result<(), anyhow::Error> {
		let fixture = fixture();
		let trigger = sample_event("lock-1", Chain::Ergo, Chain::Cardano, 100);
		let event_id = trigger.event_id();
		fixture
			.processor
			.parts
			.machine
			.insert_event(trigger, EventProof::default(), EventStatus::PendingReward)
			.await?;
		fixture.ergo.set_height(200).await;
		fixture.ergo.set_confirmation("lock-1", TxConfirmationStatus::ConfirmedEnough).await;

		let event = fixture.event(&event_id).await?;
		let result = fixture.processor.process_event(&event).await;
		assert!(matches!(result, Err(GuardError::MissingTransaction { .. })));

		let mut payment = PaymentTransaction::new(
			"payment-1",
			Some(event_id.clone()),
			TransactionType::Payment,
			Chain::Cardano,
			vec![],
			3,
		);
		payment.status = TransactionStatus::Completed;
		fixture.store.write(StoreBatch::new().put_transaction(payment)).await?;

		let admission = fixture.processor.process_event(&event).await?;
		assert_eq!(admission, Some(Admission::Inserted));
		let event = fixture.event(&event_id).await?;
		assert_eq!(event.status, EventStatus::InReward);
		let reward = fixture
			.store
			.event_transactions(&event_id)
			.await?
			.into_iter()
			.find(|tx| tx.tx_type == TransactionType::Reward)
			.unwrap();
		assert_eq!(reward.chain, Chain::Ergo);
		Ok(())
	}

	#[tokio::test]
	async fn test_conflicting_transactions_halt_the_event() -> Result<(), anyhow::Error> {
		let fixture = fixture();
		let trigger = sample_event("lock-1", Chain::Ergo, Chain::Cardano, 100);
		let event_id = trigger.event_id();
		fixture.processor.insert_event(trigger, EventProof::default()).await?;
		let payment = |tx_id: &str| {
			PaymentTransaction::new(
				tx_id,
				Some(event_id.clone()),
				TransactionType::Payment,
				Chain::Cardano,
				vec![],
				3,
			)
		};
		fixture
			.store
			.write(StoreBatch::new().put_transaction(payment("a")).put_transaction(payment("b")))
			.await?;
		// no adapter is queried for a halted event
		fixture.ergo.set_failing(true).await;

		let event = fixture.event(&event_id).await?;
		for _ in 0..2 {
			let result = fixture.processor.process_event(&event).await;
			assert!(matches!(result, Err(GuardError::InvariantViolation { count: 2, .. })));
		}
		fixture.processor.process_pending_events().await?;
		assert_eq!(fixture.store.event_transactions(&event_id).await?.len(), 2);
		assert_eq!(fixture.event(&event_id).await?.status, EventStatus::PendingPayment);
		Ok(())
	}

	#[tokio::test]
	async fn test_stale_pending_event_times_out() -> Result<(), anyhow::Error> {
		let mut fixture = fixture();
		fixture.processor.event_timeout = Duration::ZERO;
		let trigger = sample_event("lock-1", Chain::Ergo, Chain::Cardano, 100);
		let event_id = trigger.event_id();
		fixture.processor.insert_event(trigger, EventProof::default()).await?;
		fixture.processor.process_timeouts().await?;
		assert_eq!(fixture.event(&event_id).await?.status, EventStatus::Timeout);
		Ok(())
	}
}
