use crate::status_machine::StatusMachine;
use guard_util::{GuardResult, SignerError, StatusTransition, TxSigner};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

/// Hands approved transactions to the threshold signer one at a time.
pub struct SignSubmitter {
	signer: Arc<dyn TxSigner>,
	machine: Arc<StatusMachine>,
	permit: Arc<Semaphore>,
	sign_timeout: Duration,
}

impl SignSubmitter {
	pub fn new(signer: Arc<dyn TxSigner>, machine: Arc<StatusMachine>, sign_timeout: Duration) -> Self {
		SignSubmitter { signer, machine, permit: Arc::new(Semaphore::new(1)), sign_timeout }
	}

	/// Marks the transaction in sign and records the signer's verdict. A signer
	/// error or timeout leaves the transaction sign failed.
	pub async fn submit(&self, tx_id: &str) -> GuardResult<Vec<StatusTransition>> {
		let _permit = self
			.permit
			.acquire()
			.await
			.map_err(|e| SignerError::Unavailable(e.to_string()))?;
		let (tx, mut transitions) = self.machine.mark_in_sign(tx_id).await?;

		let signed = match timeout(self.sign_timeout, self.signer.sign(&tx)).await {
			Ok(result) => result,
			Err(_) => Err(SignerError::Unavailable(format!(
				"no signature after {}s",
				self.sign_timeout.as_secs()
			))),
		};
		match signed {
			Ok(payload) => {
				info!("Signed {tx}");
				transitions.extend(self.machine.update_with_signed_tx(tx_id, payload).await?);
			}
			Err(e) => {
				warn!("Signing {tx} failed: {e}");
				transitions.extend(self.machine.mark_sign_failed(tx_id).await?);
			}
		}
		Ok(transitions)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::locks::KeyLocks;
	use crate::mock::MockSigner;
	use guard_store::{GuardStore, MemoryStore, StoreBatch};
	use guard_util::{Chain, PaymentTransaction, TransactionStatus, TransactionType};

	async fn submitter(
		signer: MockSigner,
		sign_timeout: Duration,
	) -> Result<(SignSubmitter, Arc<MemoryStore>), anyhow::Error> {
		let store = Arc::new(MemoryStore::new());
		let cold = PaymentTransaction::new(
			"cold-1",
			None,
			TransactionType::ColdStorage,
			Chain::Ergo,
			b"unsigned".to_vec(),
			3,
		);
		store.write(StoreBatch::new().put_transaction(cold)).await?;
		let machine = Arc::new(StatusMachine::new(store.clone(), Arc::new(KeyLocks::new())));
		Ok((SignSubmitter::new(Arc::new(signer), machine, sign_timeout), store))
	}

	#[tokio::test]
	async fn test_signed_payload_is_stored() -> Result<(), anyhow::Error> {
		let (submitter, store) = submitter(MockSigner::new(), Duration::from_secs(1)).await?;
		let transitions = submitter.submit("cold-1").await?;
		assert_eq!(transitions.len(), 2);
		let tx = store.get_transaction("cold-1").await?.unwrap();
		assert_eq!(tx.status, TransactionStatus::Signed);
		assert_eq!(tx.payload, b"signed:unsigned".to_vec());
		Ok(())
	}

	#[tokio::test]
	async fn test_signer_timeout_marks_sign_failed() -> Result<(), anyhow::Error> {
		let signer = MockSigner::new();
		signer.set_delay(Duration::from_millis(200)).await;
		let (submitter, store) = submitter(signer, Duration::from_millis(20)).await?;
		submitter.submit("cold-1").await?;
		let tx = store.get_transaction("cold-1").await?.unwrap();
		assert_eq!(tx.status, TransactionStatus::SignFailed);
		assert!(tx.failed_in_sign);
		assert_eq!(tx.sign_failed_count, 1);
		Ok(())
	}

	#[tokio::test]
	async fn test_not_approved_is_not_signed() -> Result<(), anyhow::Error> {
		let signer = MockSigner::new();
		let (submitter, _store) = submitter(signer.clone(), Duration::from_secs(1)).await?;
		submitter.submit("cold-1").await?;
		assert!(submitter.submit("cold-1").await.is_err());
		assert_eq!(signer.signed(), 1);
		Ok(())
	}
}
