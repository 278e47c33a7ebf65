use crate::events::{EventProof, EventTrigger};
use crate::fee::Fee;
use crate::order::PaymentOrder;
use crate::status::TxConfirmationStatus;
use crate::transactions::{PaymentTransaction, TransactionType};
use crate::types::{Amount, Chain, EventId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
	#[error("Chain {0} has no registered adapter")]
	UnknownChain(Chain),
	#[error("Request to {chain} failed: {message}")]
	RequestFailed { chain: Chain, message: String },
	#[error("Failed to build transaction: {0}")]
	BuildFailed(String),
	#[error("Failed to submit transaction: {0}")]
	SubmitFailed(String),
	#[error("Generic error: {0}")]
	GenericError(String),
}

impl AdapterError {
	pub fn generic<E: std::error::Error>(e: E) -> Self {
		Self::GenericError(e.to_string())
	}
}

pub type AdapterResult<T> = Result<T, AdapterError>;

/// What a transaction id refers to when asking for its confirmation status.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TxKind {
	Lock,
	Payment,
	Reward,
	ColdStorage,
}

impl From<TransactionType> for TxKind {
	fn from(tx_type: TransactionType) -> Self {
		match tx_type {
			TransactionType::Payment => TxKind::Payment,
			TransactionType::Reward => TxKind::Reward,
			TransactionType::ColdStorage => TxKind::ColdStorage,
		}
	}
}

/// Network and wallet access for one chain.
#[async_trait::async_trait]
pub trait ChainAdapter: Send + Sync {
	fn chain(&self) -> Chain;

	/// Reward token id watchers of this chain lock in their permits.
	fn rwt_token(&self) -> String;

	/// Minimum native amount an output must carry on this chain.
	fn minimum_native_token(&self) -> Amount;

	async fn height(&self) -> AdapterResult<u64>;

	async fn tx_confirmation_status(
		&self,
		tx_id: &str,
		kind: TxKind,
	) -> AdapterResult<TxConfirmationStatus>;

	/// Checks the lock transaction backing the event against the chain.
	async fn verify_event(&self, event: &EventTrigger, fee: &Fee) -> AdapterResult<bool>;

	/// Checks that the trigger artifact carries reward tokens of `rwt_token`.
	async fn verify_event_rwt(&self, proof: &EventProof, rwt_token: &str) -> AdapterResult<bool>;

	/// Amount of reward token locked in the trigger artifact.
	async fn event_rwt(&self, proof: &EventProof) -> AdapterResult<Amount>;

	async fn generate_transaction(
		&self,
		event_id: Option<&EventId>,
		tx_type: TransactionType,
		order: &PaymentOrder,
		required_sign: u32,
	) -> AdapterResult<PaymentTransaction>;

	async fn submit_transaction(&self, tx: &PaymentTransaction) -> AdapterResult<()>;

	/// Whether a signed or sent transaction can still be confirmed, i.e. its
	/// inputs are unspent.
	async fn is_tx_valid(&self, tx: &PaymentTransaction) -> AdapterResult<bool>;
}
