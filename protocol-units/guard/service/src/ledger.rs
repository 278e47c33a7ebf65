use crate::locks::{KeyLocks, LockKey};
use chrono::Utc;
use guard_store::{GuardStore, StoreBatch};
use guard_util::{
	AdmissionKey, EventStatus, GuardError, GuardResult, PaymentTransaction, StatusTransition,
	TransactionStatus, TransactionType,
};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What happened to a candidate transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
	/// No transaction was active for the key.
	Inserted,
	/// The candidate had a lower id than the approved transaction, now invalid.
	Replaced { previous: String },
	/// The candidate is the active transaction.
	AlreadyKnown,
	/// The approved transaction has a lower id and stays.
	Rejected { kept: String },
	/// The active transaction is past approval and must not be disturbed.
	Discarded { active: String, status: TransactionStatus },
	/// The event is not waiting for a transaction of the candidate's type.
	NotPending { status: EventStatus },
}

impl Admission {
	pub fn is_admitted(&self) -> bool {
		matches!(self, Self::Inserted | Self::Replaced { .. })
	}
}

impl fmt::Display for Admission {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Inserted => write!(f, "inserted"),
			Self::Replaced { previous } => write!(f, "replaced {previous}"),
			Self::AlreadyKnown => write!(f, "already known"),
			Self::Rejected { kept } => write!(f, "rejected in favor of {kept}"),
			Self::Discarded { active, status } => write!(f, "discarded, {active} is {status}"),
			Self::NotPending { status } => write!(f, "discarded, event is {status}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionOutcome {
	pub admission: Admission,
	pub transitions: Vec<StatusTransition>,
}

impl AdmissionOutcome {
	fn unchanged(admission: Admission) -> Self {
		AdmissionOutcome { admission, transitions: Vec::new() }
	}
}

/// Admits candidate transactions so that at most one transaction per
/// admission key is ever active. Competing approved candidates are resolved
/// by keeping the lowest transaction id, which every guard agrees on
/// without exchanging votes.
pub struct TransactionLedger {
	store: Arc<dyn GuardStore>,
	locks: Arc<KeyLocks>,
}

impl TransactionLedger {
	pub fn new(store: Arc<dyn GuardStore>, locks: Arc<KeyLocks>) -> Self {
		TransactionLedger { store, locks }
	}

	pub async fn insert(&self, candidate: PaymentTransaction) -> GuardResult<AdmissionOutcome> {
		let key = candidate.admission_key();
		let _guard = self.locks.acquire(LockKey::from(&key)).await;
		self.admit(candidate, key).await
	}

	async fn admit(
		&self,
		mut candidate: PaymentTransaction,
		key: AdmissionKey,
	) -> GuardResult<AdmissionOutcome> {
		let event = match (&key, candidate.tx_type) {
			(_, TransactionType::ColdStorage) => None,
			(AdmissionKey::Event { event_id, .. }, _) => Some(
				self.store
					.get_event(event_id)
					.await?
					.ok_or_else(|| GuardError::EventNotFound(event_id.clone()))?,
			),
			(AdmissionKey::Chain { .. }, _) => {
				return Err(GuardError::UnlinkedTransaction(candidate.tx_id));
			}
		};

		let mut active = self.store.active_transactions_by_key(&key).await?;
		if active.len() > 1 {
			error!("Found {} active transactions for {key}, halting admission", active.len());
			return Err(GuardError::InvariantViolation { key, count: active.len() });
		}
		let now = Utc::now();

		let Some(mut stored) = active.pop() else {
			if let Some(event) = &event {
				if !event.status.is_pending() || event.status.tx_type() != Some(candidate.tx_type) {
					warn!(
						"Discarding {} tx {} for {key}: event is {}",
						candidate.tx_type, candidate.tx_id, event.status
					);
					return Ok(AdmissionOutcome::unchanged(Admission::NotPending {
						status: event.status,
					}));
				}
			}
			candidate.status = TransactionStatus::Approved;
			candidate.last_check = 0;
			candidate.last_status_update = now;
			let mut transitions = vec![transaction_inserted(&candidate)];
			let mut batch = StoreBatch::new();
			if let Some(mut event) = event {
				let from = event.status;
				event.status = match candidate.tx_type {
					TransactionType::Reward => EventStatus::InReward,
					_ => EventStatus::InPayment,
				};
				transitions.push(StatusTransition::Event {
					event_id: event.id.clone(),
					from: Some(from),
					to: event.status,
				});
				batch = batch.put_event(event);
			}
			info!("Admitted {candidate} for {key}");
			self.store.write(batch.put_transaction(candidate)).await?;
			return Ok(AdmissionOutcome { admission: Admission::Inserted, transitions });
		};

		if stored.tx_id == candidate.tx_id {
			if stored.failed_in_sign {
				stored.failed_in_sign = false;
				self.store.write(StoreBatch::new().put_transaction(stored)).await?;
			}
			return Ok(AdmissionOutcome::unchanged(Admission::AlreadyKnown));
		}

		if stored.status != TransactionStatus::Approved {
			warn!(
				"Discarding {} tx {} for {key}: {} is already {}",
				candidate.tx_type, candidate.tx_id, stored.tx_id, stored.status
			);
			return Ok(AdmissionOutcome::unchanged(Admission::Discarded {
				active: stored.tx_id,
				status: stored.status,
			}));
		}

		if candidate.tx_id > stored.tx_id {
			info!(
				"Rejecting {} tx {} for {key} in favor of {}",
				candidate.tx_type, candidate.tx_id, stored.tx_id
			);
			return Ok(AdmissionOutcome::unchanged(Admission::Rejected { kept: stored.tx_id }));
		}

		let previous = stored.tx_id.clone();
		stored.status = TransactionStatus::Invalid;
		stored.last_status_update = now;
		candidate.event_id = stored.event_id.clone();
		candidate.status = TransactionStatus::Approved;
		candidate.last_check = 0;
		candidate.last_status_update = now;
		let transitions = vec![
			StatusTransition::Transaction {
				tx_id: stored.tx_id.clone(),
				tx_type: stored.tx_type,
				chain: stored.chain,
				event_id: stored.event_id.clone(),
				from: Some(TransactionStatus::Approved),
				to: TransactionStatus::Invalid,
			},
			transaction_inserted(&candidate),
		];
		info!("Replacing {} tx {previous} with {} for {key}", candidate.tx_type, candidate.tx_id);
		self.store
			.write(StoreBatch::new().put_transaction(stored).put_transaction(candidate))
			.await?;
		Ok(AdmissionOutcome { admission: Admission::Replaced { previous }, transitions })
	}
}

fn transaction_inserted(tx: &PaymentTransaction) -> StatusTransition {
	StatusTransition::Transaction {
		tx_id: tx.tx_id.clone(),
		tx_type: tx.tx_type,
		chain: tx.chain,
		event_id: tx.event_id.clone(),
		from: None,
		to: tx.status,
	}
}
