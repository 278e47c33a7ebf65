use crate::{GuardStore, StoreBatch, StoreResult};
use guard_util::{AdmissionKey, ConfirmedEvent, EventId, PaymentTransaction};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
	events: BTreeMap<EventId, ConfirmedEvent>,
	transactions: BTreeMap<String, PaymentTransaction>,
	admission_index: BTreeMap<AdmissionKey, BTreeSet<String>>,
}

impl Tables {
	fn put_transaction(&mut self, tx: PaymentTransaction) {
		self.admission_index.entry(tx.admission_key()).or_default().insert(tx.tx_id.clone());
		self.transactions.insert(tx.tx_id.clone(), tx);
	}
}

/// Store kept in process memory, used by tests and ephemeral guards.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait::async_trait]
impl GuardStore for MemoryStore {
	async fn insert_event(&self, event: ConfirmedEvent) -> StoreResult<bool> {
		let mut tables = self.tables.write().await;
		if tables.events.contains_key(&event.id) {
			return Ok(false);
		}
		tables.events.insert(event.id.clone(), event);
		Ok(true)
	}

	async fn get_event(&self, id: &EventId) -> StoreResult<Option<ConfirmedEvent>> {
		Ok(self.tables.read().await.events.get(id).cloned())
	}

	async fn events(&self) -> StoreResult<Vec<ConfirmedEvent>> {
		Ok(self.tables.read().await.events.values().cloned().collect())
	}

	async fn get_transaction(&self, tx_id: &str) -> StoreResult<Option<PaymentTransaction>> {
		Ok(self.tables.read().await.transactions.get(tx_id).cloned())
	}

	async fn transactions_by_key(
		&self,
		key: &AdmissionKey,
	) -> StoreResult<Vec<PaymentTransaction>> {
		let tables = self.tables.read().await;
		Ok(tables
			.admission_index
			.get(key)
			.into_iter()
			.flatten()
			.filter_map(|tx_id| tables.transactions.get(tx_id).cloned())
			.collect())
	}

	async fn transactions(&self) -> StoreResult<Vec<PaymentTransaction>> {
		Ok(self.tables.read().await.transactions.values().cloned().collect())
	}

	async fn write(&self, batch: StoreBatch) -> StoreResult<()> {
		let mut tables = self.tables.write().await;
		for event in batch.events {
			tables.events.insert(event.id.clone(), event);
		}
		for tx in batch.transactions {
			tables.put_transaction(tx);
		}
		Ok(())
	}
}
