pub mod dispatcher;
pub mod gate;
pub mod ledger;
pub mod locks;
pub mod mock;
pub mod order_builder;
pub mod processor;
pub mod reward;
pub mod runtime;
pub mod signing;
pub mod status_machine;

pub use crate::dispatcher::{ChannelPublisher, LoggingPublisher, StatusDispatcher};
pub use crate::gate::EventConfirmationGate;
pub use crate::ledger::{Admission, AdmissionOutcome, TransactionLedger};
pub use crate::order_builder::EventOrderBuilder;
pub use crate::processor::events::EventProcessor;
pub use crate::processor::transactions::TransactionProcessor;
pub use crate::reward::{RewardOrderCalculator, RewardSettings};
pub use crate::runtime::{GuardRuntime, ObservedEvent};
pub use crate::signing::SignSubmitter;
pub use crate::status_machine::StatusMachine;
