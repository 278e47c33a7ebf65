use guard_util::{AdmissionKey, Chain, EventId, TransactionType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Scope of a critical section. Every admission key of an event maps to the
/// event, so ledger writes and status transitions of one event never interleave.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
	Event(EventId),
	Chain(Chain, TransactionType),
}

impl From<&AdmissionKey> for LockKey {
	fn from(key: &AdmissionKey) -> Self {
		match key {
			AdmissionKey::Event { event_id, .. } => LockKey::Event(event_id.clone()),
			AdmissionKey::Chain { chain, tx_type } => LockKey::Chain(*chain, *tx_type),
		}
	}
}

/// Async mutexes created on demand per key and dropped once unused.
#[derive(Debug, Default)]
pub struct KeyLocks {
	locks: Mutex<HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
	pub fn new() -> Self {
		Self::default()
	}

	fn map(&self) -> MutexGuard<'_, HashMap<LockKey, Arc<tokio::sync::Mutex<()>>>> {
		self.locks.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub async fn acquire(&self, key: LockKey) -> KeyGuard<'_> {
		let lock = self.map().entry(key.clone()).or_default().clone();
		let guard = lock.lock_owned().await;
		KeyGuard { locks: self, key, guard: Some(guard) }
	}

	pub fn len(&self) -> usize {
		self.map().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

pub struct KeyGuard<'a> {
	locks: &'a KeyLocks,
	key: LockKey,
	guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
	fn drop(&mut self) {
		drop(self.guard.take());
		let mut map = self.locks.map();
		// Clones are only taken under the map lock, so a count of one means no waiter.
		if map.get(&self.key).map_or(false, |lock| Arc::strong_count(lock) == 1) {
			map.remove(&self.key);
		}
	}
}
