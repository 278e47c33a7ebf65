use super::log_failure;
use crate::dispatcher::StatusDispatcher;
use crate::signing::SignSubmitter;
use crate::status_machine::StatusMachine;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use guard_store::GuardStore;
use guard_util::{
	AdmissionKey, Chain, ChainRegistry, GuardError, GuardResult, PaymentTransaction,
	StatusTransition, TransactionStatus, TxConfirmationStatus,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Drives stored transactions through signing, submission and confirmation.
pub struct TransactionProcessor {
	store: Arc<dyn GuardStore>,
	registry: Arc<ChainRegistry>,
	machine: Arc<StatusMachine>,
	submitter: Arc<SignSubmitter>,
	dispatcher: Arc<StatusDispatcher>,
	max_sign_retries: u32,
	sign_timeout: Duration,
}

impl TransactionProcessor {
	pub fn new(
		store: Arc<dyn GuardStore>,
		registry: Arc<ChainRegistry>,
		machine: Arc<StatusMachine>,
		submitter: Arc<SignSubmitter>,
		dispatcher: Arc<StatusDispatcher>,
		max_sign_retries: u32,
		sign_timeout: Duration,
	) -> Self {
		TransactionProcessor {
			store,
			registry,
			machine,
			submitter,
			dispatcher,
			max_sign_retries,
			sign_timeout,
		}
	}

	/// Processes every active transaction, chains concurrently and the
	/// transactions of one chain in order. Keys holding more than one active
	/// transaction are left untouched and reported as invariant violations.
	pub async fn process_transactions(&self) -> GuardResult<()> {
		let mut chains: FuturesUnordered<_> =
			self.registry.chains().map(|chain| self.process_chain(chain)).collect();
		let mut failure = None;
		while let Some(result) = chains.next().await {
			match result {
				Ok(halted) => failure = failure.or(halted.into_iter().next()),
				Err(e) => failure = failure.or(Some(e)),
			}
		}
		failure.map_or(Ok(()), Err)
	}

	/// Returns the invariant violations that halted transactions of the chain.
	async fn process_chain(&self, chain: Chain) -> GuardResult<Vec<GuardError>> {
		let mut txs = self.store.unsigned_transactions(chain).await?;
		txs.extend(self.store.signed_transactions(chain).await?);
		debug!("Processing {} active transactions on {chain}", txs.len());

		let mut halted: BTreeMap<AdmissionKey, GuardError> = BTreeMap::new();
		for tx in txs {
			let key = tx.admission_key();
			if halted.contains_key(&key) {
				continue;
			}
			let result = match self.ensure_single_active(&key).await {
				Ok(()) => self.process_transaction(&tx).await,
				Err(e) => Err(e),
			};
			match result {
				Ok(transitions) => self.dispatcher.dispatch(transitions).await,
				Err(e) if e.is_fatal() => {
					halted.insert(key, e);
				}
				Err(e) => log_failure(&tx.to_string(), &e),
			}
		}
		Ok(halted.into_values().collect())
	}

	async fn ensure_single_active(&self, key: &AdmissionKey) -> GuardResult<()> {
		let active = self.store.active_transactions_by_key(key).await?;
		if active.len() > 1 {
			let ids: Vec<_> = active.iter().map(|tx| tx.tx_id.as_str()).collect();
			error!("Found active transactions {ids:?} for {key}, none of them will be processed");
			return Err(GuardError::InvariantViolation { key: key.clone(), count: active.len() });
		}
		Ok(())
	}

	pub async fn process_transaction(
		&self,
		tx: &PaymentTransaction,
	) -> GuardResult<Vec<StatusTransition>> {
		match tx.status {
			TransactionStatus::Approved => self.submitter.submit(&tx.tx_id).await,
			TransactionStatus::InSign => {
				let elapsed = Utc::now().signed_duration_since(tx.last_status_update);
				if elapsed.to_std().map_or(false, |elapsed| elapsed > self.sign_timeout) {
					warn!("{tx} has been in sign since {}", tx.last_status_update);
					self.machine.mark_sign_failed(&tx.tx_id).await
				} else {
					Ok(Vec::new())
				}
			}
			TransactionStatus::SignFailed => {
				self.machine.retry_sign_failed(&tx.tx_id, self.max_sign_retries).await
			}
			TransactionStatus::Signed => self.process_signed(tx).await,
			TransactionStatus::Sent => self.process_sent(tx).await,
			TransactionStatus::Completed | TransactionStatus::Invalid => Ok(Vec::new()),
		}
	}

	async fn process_signed(&self, tx: &PaymentTransaction) -> GuardResult<Vec<StatusTransition>> {
		let adapter = self.registry.get(tx.chain)?;
		if !adapter.is_tx_valid(tx).await? {
			warn!("{tx} can no longer be confirmed");
			return self.machine.invalidate_transaction(&tx.tx_id).await;
		}
		adapter.submit_transaction(tx).await?;
		info!("Submitted {tx}");
		self.machine.mark_sent(&tx.tx_id).await
	}

	async fn process_sent(&self, tx: &PaymentTransaction) -> GuardResult<Vec<StatusTransition>> {
		let adapter = self.registry.get(tx.chain)?;
		match adapter.tx_confirmation_status(&tx.tx_id, tx.tx_type.into()).await? {
			TxConfirmationStatus::ConfirmedEnough => {
				info!("{tx} is confirmed");
				self.machine.complete_transaction(&tx.tx_id).await
			}
			TxConfirmationStatus::NotFound => {
				if !adapter.is_tx_valid(tx).await? {
					warn!("{tx} dropped and can no longer be confirmed");
					return self.machine.invalidate_transaction(&tx.tx_id).await;
				}
				debug!("{tx} not found, submitting again");
				adapter.submit_transaction(tx).await?;
				self.machine.update_last_check(&tx.tx_id, adapter.height().await?).await?;
				Ok(Vec::new())
			}
			TxConfirmationStatus::Unconfirmed | TxConfirmationStatus::Confirming => {
				self.machine.update_last_check(&tx.tx_id, adapter.height().await?).await?;
				Ok(Vec::new())
			}
		}
	}
}
