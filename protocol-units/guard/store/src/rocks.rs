use crate::{GuardStore, StoreBatch, StoreError, StoreResult};
use guard_util::{AdmissionKey, ConfirmedEvent, EventId, PaymentTransaction};
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use tokio::sync::Mutex;

const EVENTS_CF: &str = "events";
const TRANSACTIONS_CF: &str = "transactions";
const ADMISSION_INDEX_CF: &str = "admission_index";

impl From<rocksdb::Error> for StoreError {
	fn from(e: rocksdb::Error) -> Self {
		StoreError::backend(e)
	}
}

impl From<tokio::task::JoinError> for StoreError {
	fn from(e: tokio::task::JoinError) -> Self {
		StoreError::backend(e)
	}
}

fn cf_handle<'a>(db: &'a DB, name: &str) -> StoreResult<&'a rocksdb::ColumnFamily> {
	db.cf_handle(name)
		.ok_or_else(|| StoreError::Backend(format!("CF handle {name} not found")))
}

fn index_prefix(key: &AdmissionKey) -> String {
	format!("{key}/")
}

fn index_key(tx: &PaymentTransaction) -> String {
	format!("{}{}", index_prefix(&tx.admission_key()), tx.tx_id)
}

/// Store persisted in RocksDB, one column family per table plus the admission index.
#[derive(Debug, Clone)]
pub struct RocksdbStore {
	db: Arc<DB>,
	insert_lock: Arc<Mutex<()>>,
}

impl RocksdbStore {
	pub fn try_new(path: &str) -> StoreResult<Self> {
		let mut options = Options::default();
		options.create_if_missing(true);
		options.create_missing_column_families(true);

		let events_cf = ColumnFamilyDescriptor::new(EVENTS_CF, Options::default());
		let transactions_cf = ColumnFamilyDescriptor::new(TRANSACTIONS_CF, Options::default());
		let admission_index_cf =
			ColumnFamilyDescriptor::new(ADMISSION_INDEX_CF, Options::default());

		let db = DB::open_cf_descriptors(
			&options,
			path,
			vec![events_cf, transactions_cf, admission_index_cf],
		)?;
		tracing::info!("Opened guard store at {path}");

		Ok(RocksdbStore { db: Arc::new(db), insert_lock: Arc::new(Mutex::new(())) })
	}

	async fn get_value<T>(&self, cf: &'static str, key: Vec<u8>) -> StoreResult<Option<T>>
	where
		T: serde::de::DeserializeOwned + Send + 'static,
	{
		let db = self.db.clone();
		tokio::task::spawn_blocking(move || {
			let cf_handle = cf_handle(&db, cf)?;
			match db.get_cf(cf_handle, key)? {
				Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
				None => Ok(None),
			}
		})
		.await?
	}

	async fn scan<T>(&self, cf: &'static str) -> StoreResult<Vec<T>>
	where
		T: serde::de::DeserializeOwned + Send + 'static,
	{
		let db = self.db.clone();
		tokio::task::spawn_blocking(move || {
			let cf_handle = cf_handle(&db, cf)?;
			db.iterator_cf(cf_handle, IteratorMode::Start)
				.map(|res| -> StoreResult<T> {
					let (_, value) = res?;
					Ok(serde_json::from_slice(&value)?)
				})
				.collect()
		})
		.await?
	}
}

#[async_trait::async_trait]
impl GuardStore for RocksdbStore {
	async fn insert_event(&self, event: ConfirmedEvent) -> StoreResult<bool> {
		let _guard = self.insert_lock.lock().await;
		if self.get_event(&event.id).await?.is_some() {
			return Ok(false);
		}
		self.write(StoreBatch::new().put_event(event)).await?;
		Ok(true)
	}

	async fn get_event(&self, id: &EventId) -> StoreResult<Option<ConfirmedEvent>> {
		self.get_value(EVENTS_CF, id.as_bytes().to_vec()).await
	}

	async fn events(&self) -> StoreResult<Vec<ConfirmedEvent>> {
		self.scan(EVENTS_CF).await
	}

	async fn get_transaction(&self, tx_id: &str) -> StoreResult<Option<PaymentTransaction>> {
		self.get_value(TRANSACTIONS_CF, tx_id.as_bytes().to_vec()).await
	}

	async fn transactions_by_key(
		&self,
		key: &AdmissionKey,
	) -> StoreResult<Vec<PaymentTransaction>> {
		let db = self.db.clone();
		let prefix = index_prefix(key);
		tokio::task::spawn_blocking(move || {
			let index_cf = cf_handle(&db, ADMISSION_INDEX_CF)?;
			let transactions_cf = cf_handle(&db, TRANSACTIONS_CF)?;
			let mut txs = Vec::new();
			let iter = db.iterator_cf(
				index_cf,
				IteratorMode::From(prefix.as_bytes(), Direction::Forward),
			);
			for res in iter {
				let (key, tx_id) = res?;
				if !key.starts_with(prefix.as_bytes()) {
					break;
				}
				if let Some(value) = db.get_cf(transactions_cf, &tx_id)? {
					txs.push(serde_json::from_slice(&value)?);
				}
			}
			Ok(txs)
		})
		.await?
	}

	async fn transactions(&self) -> StoreResult<Vec<PaymentTransaction>> {
		self.scan(TRANSACTIONS_CF).await
	}

	async fn write(&self, batch: StoreBatch) -> StoreResult<()> {
		let mut serialized_events = Vec::with_capacity(batch.events.len());
		for event in &batch.events {
			serialized_events.push((event.id.as_bytes().to_vec(), serde_json::to_vec(event)?));
		}
		let mut serialized_txs = Vec::with_capacity(batch.transactions.len());
		for tx in &batch.transactions {
			serialized_txs.push((tx.tx_id.clone(), index_key(tx), serde_json::to_vec(tx)?));
		}

		let db = self.db.clone();
		tokio::task::spawn_blocking(move || {
			let events_cf = cf_handle(&db, EVENTS_CF)?;
			let transactions_cf = cf_handle(&db, TRANSACTIONS_CF)?;
			let index_cf = cf_handle(&db, ADMISSION_INDEX_CF)?;

			let mut write_batch = WriteBatch::default();
			for (key, value) in serialized_events {
				write_batch.put_cf(events_cf, key, value);
			}
			for (tx_id, index_key, value) in serialized_txs {
				write_batch.put_cf(transactions_cf, tx_id.as_bytes(), value);
				write_batch.put_cf(index_cf, index_key.as_bytes(), tx_id.as_bytes());
			}
			db.write(write_batch)?;
			Ok::<(), StoreError>(())
		})
		.await??;
		Ok(())
	}
}
