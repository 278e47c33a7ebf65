pub mod chains;
pub mod commitments;
pub mod errors;
pub mod events;
pub mod fee;
pub mod order;
pub mod publisher;
pub mod signer;
pub mod status;
pub mod tokens;
pub mod transactions;
pub mod types;

pub use crate::chains::adapter::AdapterError;
pub use crate::chains::adapter::AdapterResult;
pub use crate::chains::adapter::ChainAdapter;
pub use crate::chains::adapter::TxKind;
pub use crate::chains::registry::ChainRegistry;
pub use crate::commitments::Commitment;
pub use crate::commitments::CommitmentProvider;
pub use crate::errors::GuardError;
pub use crate::errors::GuardResult;
pub use crate::events::ConfirmedEvent;
pub use crate::events::EventProof;
pub use crate::events::EventTrigger;
pub use crate::fee::Fee;
pub use crate::fee::FeeError;
pub use crate::fee::FeePolicy;
pub use crate::fee::StaticFeePolicy;
pub use crate::order::AssetBalance;
pub use crate::order::PaymentOrder;
pub use crate::order::SinglePayment;
pub use crate::order::TokenAmount;
pub use crate::publisher::PublishError;
pub use crate::publisher::StatusPublisher;
pub use crate::publisher::StatusUpdate;
pub use crate::signer::SignerError;
pub use crate::signer::TxSigner;
pub use crate::status::EventStatus;
pub use crate::status::StatusTransition;
pub use crate::status::TransactionStatus;
pub use crate::status::TxConfirmationStatus;
pub use crate::tokens::ChainToken;
pub use crate::tokens::TokenMap;
pub use crate::transactions::AdmissionKey;
pub use crate::transactions::PaymentTransaction;
pub use crate::transactions::TransactionType;
pub use crate::types::Amount;
pub use crate::types::Chain;
pub use crate::types::EventId;
