use crate::transactions::PaymentTransaction;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
	#[error("Signing rejected: {0}")]
	Rejected(String),
	#[error("Signer unavailable: {0}")]
	Unavailable(String),
}

/// External threshold signer.
#[async_trait::async_trait]
pub trait TxSigner: Send + Sync {
	/// Signs the transaction, returning the signed payload.
	async fn sign(&self, tx: &PaymentTransaction) -> Result<Vec<u8>, SignerError>;
}
