pub mod memory;
pub mod query;
#[cfg(feature = "rocksdb")]
pub mod rocks;

#[cfg(test)]
pub(crate) mod test_utils;

use guard_util::{
	AdmissionKey, Chain, ConfirmedEvent, EventId, EventStatus, GuardError, PaymentTransaction,
	TransactionStatus, TransactionType,
};
use thiserror::Error;

pub use crate::memory::MemoryStore;
pub use crate::query::{EventPage, EventQuery, SortOrder};
#[cfg(feature = "rocksdb")]
pub use crate::rocks::RocksdbStore;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("Failed to serialize or deserialize: {0}")]
	Serialization(#[from] serde_json::Error),
	#[error("Backend failure: {0}")]
	Backend(String),
}

impl StoreError {
	pub fn backend<E: std::error::Error>(e: E) -> Self {
		Self::Backend(e.to_string())
	}
}

impl From<StoreError> for GuardError {
	fn from(e: StoreError) -> Self {
		GuardError::Store(e.to_string())
	}
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Records written together: either all of them are stored or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreBatch {
	pub events: Vec<ConfirmedEvent>,
	pub transactions: Vec<PaymentTransaction>,
}

impl StoreBatch {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn put_event(mut self, event: ConfirmedEvent) -> Self {
		self.events.push(event);
		self
	}

	pub fn put_transaction(mut self, tx: PaymentTransaction) -> Self {
		self.transactions.push(tx);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty() && self.transactions.is_empty()
	}
}

/// Storage of events and transactions. Backends implement the primitive
/// reads and the atomic batch write; the queries are derived from them.
#[async_trait::async_trait]
pub trait GuardStore: Send + Sync {
	/// Inserts the event unless one with the same id exists. Returns whether it was inserted.
	async fn insert_event(&self, event: ConfirmedEvent) -> StoreResult<bool>;

	async fn get_event(&self, id: &EventId) -> StoreResult<Option<ConfirmedEvent>>;

	async fn events(&self) -> StoreResult<Vec<ConfirmedEvent>>;

	async fn get_transaction(&self, tx_id: &str) -> StoreResult<Option<PaymentTransaction>>;

	/// Every transaction ever stored under the admission key, invalid ones included.
	async fn transactions_by_key(&self, key: &AdmissionKey)
		-> StoreResult<Vec<PaymentTransaction>>;

	async fn transactions(&self) -> StoreResult<Vec<PaymentTransaction>>;

	async fn write(&self, batch: StoreBatch) -> StoreResult<()>;

	async fn active_transactions_by_key(
		&self,
		key: &AdmissionKey,
	) -> StoreResult<Vec<PaymentTransaction>> {
		Ok(self.transactions_by_key(key).await?.into_iter().filter(|tx| tx.is_active()).collect())
	}

	/// Payment and reward transactions of an event.
	async fn event_transactions(&self, event_id: &EventId) -> StoreResult<Vec<PaymentTransaction>> {
		let mut txs = Vec::new();
		for tx_type in [TransactionType::Payment, TransactionType::Reward] {
			let key = AdmissionKey::Event { event_id: event_id.clone(), tx_type };
			txs.extend(self.transactions_by_key(&key).await?);
		}
		Ok(txs)
	}

	async fn events_by_status(&self, statuses: &[EventStatus]) -> StoreResult<Vec<ConfirmedEvent>> {
		Ok(self
			.events()
			.await?
			.into_iter()
			.filter(|event| statuses.contains(&event.status))
			.collect())
	}

	async fn pending_events(&self) -> StoreResult<Vec<ConfirmedEvent>> {
		self.events_by_status(&[EventStatus::PendingPayment, EventStatus::PendingReward]).await
	}

	async fn waiting_events(&self) -> StoreResult<Vec<ConfirmedEvent>> {
		self.events_by_status(&[EventStatus::PaymentWaiting, EventStatus::RewardWaiting]).await
	}

	async fn transactions_by_status(
		&self,
		statuses: &[TransactionStatus],
		chain: Option<Chain>,
	) -> StoreResult<Vec<PaymentTransaction>> {
		Ok(self
			.transactions()
			.await?
			.into_iter()
			.filter(|tx| statuses.contains(&tx.status))
			.filter(|tx| chain.map_or(true, |chain| tx.chain == chain))
			.collect())
	}

	async fn unsigned_transactions(&self, chain: Chain) -> StoreResult<Vec<PaymentTransaction>> {
		self.transactions_by_status(
			&[TransactionStatus::Approved, TransactionStatus::InSign, TransactionStatus::SignFailed],
			Some(chain),
		)
		.await
	}

	async fn signed_transactions(&self, chain: Chain) -> StoreResult<Vec<PaymentTransaction>> {
		self.transactions_by_status(&[TransactionStatus::Signed, TransactionStatus::Sent], Some(chain))
			.await
	}

	/// Cold storage transactions of the chain that are neither completed nor invalid.
	async fn cold_storage_transactions(&self, chain: Chain) -> StoreResult<Vec<PaymentTransaction>> {
		let key = AdmissionKey::Chain { chain, tx_type: TransactionType::ColdStorage };
		Ok(self
			.transactions_by_key(&key)
			.await?
			.into_iter()
			.filter(|tx| !tx.status.is_terminal())
			.collect())
	}

	async fn completed_events(&self, query: &EventQuery) -> StoreResult<EventPage> {
		let completed = self.events_by_status(&[EventStatus::Completed]).await?;
		Ok(query.apply(completed))
	}
}
