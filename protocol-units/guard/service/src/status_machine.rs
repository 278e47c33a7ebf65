use crate::locks::{KeyLocks, LockKey};
use chrono::{DateTime, Utc};
use guard_store::{GuardStore, StoreBatch};
use guard_util::{
	Chain, ConfirmedEvent, EventId, EventProof, EventStatus, EventTrigger, GuardError,
	GuardResult, PaymentTransaction, StatusTransition, TransactionStatus, TransactionType,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Applies event and transaction status changes. Every change is validated
/// against the allowed transitions, written in one batch together with the
/// changes it implies, and returned to the caller for publication.
pub struct StatusMachine {
	store: Arc<dyn GuardStore>,
	locks: Arc<KeyLocks>,
}

fn event_transition(event: &mut ConfirmedEvent, to: EventStatus) -> GuardResult<StatusTransition> {
	if !event.status.can_transition_to(to) {
		return Err(GuardError::InvalidTransition {
			kind: "event",
			id: event.id.to_string(),
			from: event.status.to_string(),
			to: to.to_string(),
		});
	}
	let from = event.status;
	event.status = to;
	if to.is_pending() {
		event.first_try = Some(Utc::now());
	}
	Ok(StatusTransition::Event { event_id: event.id.clone(), from: Some(from), to })
}

fn tx_transition(
	tx: &mut PaymentTransaction,
	to: TransactionStatus,
) -> GuardResult<StatusTransition> {
	if !tx.status.can_transition_to(to) {
		return Err(GuardError::InvalidTransition {
			kind: "transaction",
			id: tx.tx_id.clone(),
			from: tx.status.to_string(),
			to: to.to_string(),
		});
	}
	let from = tx.status;
	tx.status = to;
	tx.last_status_update = Utc::now();
	Ok(StatusTransition::Transaction {
		tx_id: tx.tx_id.clone(),
		tx_type: tx.tx_type,
		chain: tx.chain,
		event_id: tx.event_id.clone(),
		from: Some(from),
		to,
	})
}

/// Status the event returns to when its transaction of `tx_type` is lost.
fn pending_status(tx_type: TransactionType) -> EventStatus {
	match tx_type {
		TransactionType::Reward => EventStatus::PendingReward,
		_ => EventStatus::PendingPayment,
	}
}

impl StatusMachine {
	pub fn new(store: Arc<dyn GuardStore>, locks: Arc<KeyLocks>) -> Self {
		StatusMachine { store, locks }
	}

	pub fn store(&self) -> &Arc<dyn GuardStore> {
		&self.store
	}

	async fn load_event(&self, event_id: &EventId) -> GuardResult<ConfirmedEvent> {
		self.store
			.get_event(event_id)
			.await?
			.ok_or_else(|| GuardError::EventNotFound(event_id.clone()))
	}

	async fn load_transaction(&self, tx_id: &str) -> GuardResult<PaymentTransaction> {
		self.store
			.get_transaction(tx_id)
			.await?
			.ok_or_else(|| GuardError::TransactionNotFound(tx_id.to_string()))
	}

	/// Stores a newly observed event. Returns `None` when it is already known.
	pub async fn insert_event(
		&self,
		trigger: EventTrigger,
		proof: EventProof,
		status: EventStatus,
	) -> GuardResult<Option<StatusTransition>> {
		let event = ConfirmedEvent::new(trigger, proof, status);
		let event_id = event.id.clone();
		let _guard = self.locks.acquire(LockKey::Event(event_id.clone())).await;
		if !self.store.insert_event(event).await? {
			return Ok(None);
		}
		info!("Inserted event {event_id} as {status}");
		Ok(Some(StatusTransition::Event { event_id, from: None, to: status }))
	}

	/// Moves an event to `to` when allowed from its current status.
	pub async fn set_event_status(
		&self,
		event_id: &EventId,
		to: EventStatus,
	) -> GuardResult<StatusTransition> {
		let _guard = self.locks.acquire(LockKey::Event(event_id.clone())).await;
		let mut event = self.load_event(event_id).await?;
		let transition = event_transition(&mut event, to)?;
		self.store.write(StoreBatch::new().put_event(event)).await?;
		info!("Event {transition}");
		Ok(transition)
	}

	/// Times the event out if its current attempt started before `now - deadline`.
	pub async fn timeout_event(
		&self,
		event_id: &EventId,
		deadline: Duration,
		now: DateTime<Utc>,
	) -> GuardResult<Option<StatusTransition>> {
		let _guard = self.locks.acquire(LockKey::Event(event_id.clone())).await;
		let mut event = self.load_event(event_id).await?;
		if !event.status.can_transition_to(EventStatus::Timeout) {
			return Ok(None);
		}
		let Some(first_try) = event.first_try else {
			return Ok(None);
		};
		let Ok(deadline) = chrono::Duration::from_std(deadline) else {
			return Ok(None);
		};
		if first_try.checked_add_signed(deadline).map_or(true, |at| at > now) {
			return Ok(None);
		}
		let transition = event_transition(&mut event, EventStatus::Timeout)?;
		warn!("Event {event_id} timed out, first try at {first_try}");
		self.store.write(StoreBatch::new().put_event(event)).await?;
		Ok(Some(transition))
	}

	/// Applies `change` to the transaction under its admission lock and writes it
	/// together with the event it implies, if any.
	async fn update_transaction<F>(&self, tx_id: &str, change: F) -> GuardResult<Vec<StatusTransition>>
	where
		F: FnOnce(
			&mut PaymentTransaction,
			Option<&mut ConfirmedEvent>,
		) -> GuardResult<Vec<StatusTransition>>,
	{
		let key = self.load_transaction(tx_id).await?.admission_key();
		let _guard = self.locks.acquire(LockKey::from(&key)).await;
		let mut tx = self.load_transaction(tx_id).await?;
		let mut event = match &tx.event_id {
			Some(event_id) if tx.tx_type != TransactionType::ColdStorage => {
				Some(self.load_event(event_id).await?)
			}
			_ => None,
		};
		let before = event.as_ref().map(|event| event.status);
		let transitions = change(&mut tx, event.as_mut())?;
		let mut batch = StoreBatch::new().put_transaction(tx);
		if let Some(event) = event {
			if Some(event.status) != before {
				batch = batch.put_event(event);
			}
		}
		self.store.write(batch).await?;
		for transition in &transitions {
			info!("Applied {transition}");
		}
		Ok(transitions)
	}

	/// Hands an approved transaction to signing.
	pub async fn mark_in_sign(
		&self,
		tx_id: &str,
	) -> GuardResult<(PaymentTransaction, Vec<StatusTransition>)> {
		let transitions = self
			.update_transaction(tx_id, |tx, _| Ok(vec![tx_transition(tx, TransactionStatus::InSign)?]))
			.await?;
		Ok((self.load_transaction(tx_id).await?, transitions))
	}

	pub async fn update_with_signed_tx(
		&self,
		tx_id: &str,
		payload: Vec<u8>,
	) -> GuardResult<Vec<StatusTransition>> {
		self.update_transaction(tx_id, |tx, _| {
			let transition = tx_transition(tx, TransactionStatus::Signed)?;
			tx.payload = payload;
			tx.failed_in_sign = false;
			Ok(vec![transition])
		})
		.await
	}

	pub async fn mark_sign_failed(&self, tx_id: &str) -> GuardResult<Vec<StatusTransition>> {
		self.update_transaction(tx_id, |tx, _| {
			let transition = tx_transition(tx, TransactionStatus::SignFailed)?;
			tx.failed_in_sign = true;
			tx.sign_failed_count += 1;
			Ok(vec![transition])
		})
		.await
	}

	/// Returns a failed transaction to approval while retries remain, otherwise
	/// invalidates it and puts its event back to pending.
	pub async fn retry_sign_failed(
		&self,
		tx_id: &str,
		max_retries: u32,
	) -> GuardResult<Vec<StatusTransition>> {
		self.update_transaction(tx_id, |tx, event| {
			if tx.sign_failed_count < max_retries {
				return Ok(vec![tx_transition(tx, TransactionStatus::Approved)?]);
			}
			warn!("{tx} failed signing {} times, invalidating", tx.sign_failed_count);
			invalidate(tx, event)
		})
		.await
	}

	/// Records a signed transaction as submitted to its chain.
	pub async fn mark_sent(&self, tx_id: &str) -> GuardResult<Vec<StatusTransition>> {
		self.update_transaction(tx_id, |tx, event| {
			let mut transitions = vec![tx_transition(tx, TransactionStatus::Sent)?];
			if let Some(event) = event {
				let waiting = match event.status {
					EventStatus::InPayment => Some(EventStatus::PaymentWaiting),
					EventStatus::InReward => Some(EventStatus::RewardWaiting),
					_ => None,
				};
				if let Some(waiting) = waiting {
					transitions.push(event_transition(event, waiting)?);
				}
			}
			Ok(transitions)
		})
		.await
	}

	/// Completes a confirmed transaction. A payment made on a chain other than
	/// the bridge chain leaves the reward to distribute.
	pub async fn complete_transaction(&self, tx_id: &str) -> GuardResult<Vec<StatusTransition>> {
		self.update_transaction(tx_id, |tx, event| {
			let mut transitions = vec![tx_transition(tx, TransactionStatus::Completed)?];
			if let Some(event) = event {
				let next = match (event.status, tx.tx_type) {
					(EventStatus::PaymentWaiting, TransactionType::Payment)
						if tx.chain != Chain::BRIDGE =>
					{
						Some(EventStatus::PendingReward)
					}
					(EventStatus::PaymentWaiting, TransactionType::Payment)
					| (EventStatus::RewardWaiting, TransactionType::Reward) => Some(EventStatus::Completed),
					_ => None,
				};
				if let Some(next) = next {
					transitions.push(event_transition(event, next)?);
				}
			}
			Ok(transitions)
		})
		.await
	}

	/// Invalidates a transaction that can no longer be confirmed.
	pub async fn invalidate_transaction(&self, tx_id: &str) -> GuardResult<Vec<StatusTransition>> {
		self.update_transaction(tx_id, invalidate).await
	}

	pub async fn update_last_check(&self, tx_id: &str, height: u64) -> GuardResult<()> {
		self.update_transaction(tx_id, |tx, _| {
			tx.last_check = height;
			Ok(Vec::new())
		})
		.await?;
		Ok(())
	}
}

fn invalidate(
	tx: &mut PaymentTransaction,
	event: Option<&mut ConfirmedEvent>,
) -> GuardResult<Vec<StatusTransition>> {
	let mut transitions = vec![tx_transition(tx, TransactionStatus::Invalid)?];
	if let Some(event) = event {
		let pending = pending_status(tx.tx_type);
		if event.status != pending && event.status.can_transition_to(pending) {
			transitions.push(event_transition(event, pending)?);
		}
	}
	Ok(transitions)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::sample_event;
	use guard_store::MemoryStore;

	struct Fixture {
		machine: StatusMachine,
		store: Arc<MemoryStore>,
		event_id: EventId,
	}

	async fn fixture(to_chain: Chain, status: EventStatus) -> Result<Fixture, anyhow::Error> {
		let store = Arc::new(MemoryStore::new());
		let machine = StatusMachine::new(store.clone(), Arc::new(KeyLocks::new()));
		let from_chain = if to_chain == Chain::Ergo { Chain::Cardano } else { Chain::Ergo };
		let transition = machine
			.insert_event(sample_event("lock-1", from_chain, to_chain, 100), EventProof::default(), status)
			.await?;
		let Some(StatusTransition::Event { event_id, from: None, .. }) = transition else {
			anyhow::bail!("event not inserted");
		};
		Ok(Fixture { machine, store, event_id })
	}

	impl Fixture {
		async fn put_tx(
			&self,
			tx_id: &str,
			tx_type: TransactionType,
			chain: Chain,
			status: TransactionStatus,
		) -> Result<(), anyhow::Error> {
			let mut tx = PaymentTransaction::new(
				tx_id,
				Some(self.event_id.clone()),
				tx_type,
				chain,
				vec![],
				3,
			);
			tx.status = status;
			self.store.write(StoreBatch::new().put_transaction(tx)).await?;
			Ok(())
		}

		async fn event_status(&self) -> Result<EventStatus, anyhow::Error> {
			Ok(self.store.get_event(&self.event_id).await?.unwrap().status)
		}

		async fn tx(&self, tx_id: &str) -> Result<PaymentTransaction, anyhow::Error> {
			Ok(self.store.get_transaction(tx_id).await?.unwrap())
		}
	}

	#[tokio::test]
	async fn test_duplicate_event_insert() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Cardano, EventStatus::PendingPayment).await?;
		let again = fixture
			.machine
			.insert_event(
				sample_event("lock-1", Chain::Ergo, Chain::Cardano, 100),
				EventProof::default(),
				EventStatus::PendingPayment,
			)
			.await?;
		assert_eq!(again, None);
		Ok(())
	}

	#[tokio::test]
	async fn test_cross_chain_payment_lifecycle() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Cardano, EventStatus::InPayment).await?;
		fixture
			.put_tx("p1", TransactionType::Payment, Chain::Cardano, TransactionStatus::Approved)
			.await?;
		let machine = &fixture.machine;

		let (tx, transitions) = machine.mark_in_sign("p1").await?;
		assert_eq!(tx.status, TransactionStatus::InSign);
		assert_eq!(transitions.len(), 1);

		machine.update_with_signed_tx("p1", vec![0xaa]).await?;
		assert_eq!(fixture.tx("p1").await?.payload, vec![0xaa]);

		let transitions = machine.mark_sent("p1").await?;
		assert_eq!(transitions.len(), 2);
		assert_eq!(fixture.event_status().await?, EventStatus::PaymentWaiting);

		let transitions = machine.complete_transaction("p1").await?;
		assert_eq!(
			transitions[1],
			StatusTransition::Event {
				event_id: fixture.event_id.clone(),
				from: Some(EventStatus::PaymentWaiting),
				to: EventStatus::PendingReward,
			}
		);
		assert_eq!(fixture.event_status().await?, EventStatus::PendingReward);
		Ok(())
	}

	#[tokio::test]
	async fn test_bridge_chain_payment_completes_event() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Ergo, EventStatus::PaymentWaiting).await?;
		fixture
			.put_tx("p1", TransactionType::Payment, Chain::Ergo, TransactionStatus::Sent)
			.await?;
		fixture.machine.complete_transaction("p1").await?;
		assert_eq!(fixture.event_status().await?, EventStatus::Completed);
		assert_eq!(fixture.tx("p1").await?.status, TransactionStatus::Completed);
		Ok(())
	}

	#[tokio::test]
	async fn test_sign_failures_are_bounded() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Cardano, EventStatus::InPayment).await?;
		fixture
			.put_tx("p1", TransactionType::Payment, Chain::Cardano, TransactionStatus::Approved)
			.await?;
		let machine = &fixture.machine;

		for attempt in 1..=2 {
			machine.mark_in_sign("p1").await?;
			machine.mark_sign_failed("p1").await?;
			let tx = fixture.tx("p1").await?;
			assert!(tx.failed_in_sign);
			assert_eq!(tx.sign_failed_count, attempt);
			machine.retry_sign_failed("p1", 2).await?;
		}
		assert_eq!(fixture.tx("p1").await?.status, TransactionStatus::Invalid);
		assert_eq!(fixture.event_status().await?, EventStatus::PendingPayment);
		Ok(())
	}

	#[tokio::test]
	async fn test_invalid_transitions_rejected() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Cardano, EventStatus::PendingPayment).await?;
		fixture
			.put_tx("p1", TransactionType::Payment, Chain::Cardano, TransactionStatus::Approved)
			.await?;
		let result = fixture.machine.complete_transaction("p1").await;
		assert!(matches!(result, Err(GuardError::InvalidTransition { kind: "transaction", .. })));
		assert_eq!(fixture.tx("p1").await?.status, TransactionStatus::Approved);

		let result =
			fixture.machine.set_event_status(&fixture.event_id, EventStatus::Completed).await;
		assert!(matches!(result, Err(GuardError::InvalidTransition { kind: "event", .. })));
		Ok(())
	}

	#[tokio::test]
	async fn test_invalidated_sent_tx_reverts_event() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Ergo, EventStatus::RewardWaiting).await?;
		fixture
			.put_tx("r1", TransactionType::Reward, Chain::Ergo, TransactionStatus::Sent)
			.await?;
		let transitions = fixture.machine.invalidate_transaction("r1").await?;
		assert_eq!(transitions.len(), 2);
		assert_eq!(fixture.event_status().await?, EventStatus::PendingReward);
		Ok(())
	}

	#[tokio::test]
	async fn test_timeout_after_deadline() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Cardano, EventStatus::PendingPayment).await?;
		let deadline = Duration::from_secs(60);
		let now = Utc::now();
		assert_eq!(fixture.machine.timeout_event(&fixture.event_id, deadline, now).await?, None);

		let later = now + chrono::Duration::seconds(120);
		let transition = fixture.machine.timeout_event(&fixture.event_id, deadline, later).await?;
		assert!(transition.is_some());
		assert_eq!(fixture.event_status().await?, EventStatus::Timeout);
		Ok(())
	}

	#[tokio::test]
	async fn test_in_payment_does_not_time_out() -> Result<(), anyhow::Error> {
		let fixture = fixture(Chain::Cardano, EventStatus::InPayment).await?;
		let later = Utc::now() + chrono::Duration::days(30);
		let transition = fixture
			.machine
			.timeout_event(&fixture.event_id, Duration::from_secs(1), later)
			.await?;
		assert_eq!(transition, None);
		Ok(())
	}
}
