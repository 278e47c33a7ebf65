#![allow(dead_code)]

use guard_service::dispatcher::ChannelPublisher;
use guard_service::locks::KeyLocks;
use guard_service::mock::{
	sample_fee, sample_tokens, MockChainAdapter, MockCommitmentProvider, MockSigner,
};
use guard_service::processor::events::EventProcessorParts;
use guard_service::{
	EventConfirmationGate, EventOrderBuilder, EventProcessor, GuardRuntime, RewardOrderCalculator,
	RewardSettings, SignSubmitter, StatusDispatcher, StatusMachine, TransactionLedger,
	TransactionProcessor,
};
use guard_store::MemoryStore;
use guard_util::{Chain, ChainRegistry, StaticFeePolicy, StatusUpdate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub const EVENT_CONFIRMATION: u64 = 10;
pub const MAX_SIGN_RETRIES: u32 = 3;

/// A guard wired to in-memory chains, signer and store.
pub struct GuardHarness {
	pub store: Arc<MemoryStore>,
	pub ergo: MockChainAdapter,
	pub cardano: MockChainAdapter,
	pub signer: MockSigner,
	pub commitments: MockCommitmentProvider,
	pub machine: Arc<StatusMachine>,
	pub ledger: Arc<TransactionLedger>,
	pub submitter: Arc<SignSubmitter>,
	pub runtime: GuardRuntime,
	pub events: Arc<EventProcessor>,
	pub updates: UnboundedReceiver<StatusUpdate>,
}

impl GuardHarness {
	pub fn new() -> Self {
		let store = Arc::new(MemoryStore::new());
		let ergo = MockChainAdapter::new(Chain::Ergo);
		let cardano = MockChainAdapter::new(Chain::Cardano);
		let registry = Arc::new(
			ChainRegistry::new()
				.with_adapter(Arc::new(ergo.clone()))
				.with_adapter(Arc::new(cardano.clone())),
		);
		let signer = MockSigner::new();
		let commitments = MockCommitmentProvider::new();
		let locks = Arc::new(KeyLocks::new());
		let machine = Arc::new(StatusMachine::new(store.clone(), locks.clone()));
		let ledger = Arc::new(TransactionLedger::new(store.clone(), locks));
		let (publisher, updates) = ChannelPublisher::new();
		let dispatcher = Arc::new(StatusDispatcher::new(store.clone(), Arc::new(publisher)));
		let settings = RewardSettings {
			watchers_share_percent: 50,
			watchers_rsn_share_percent: 0,
			bridge_fee_repo_address: "bridge-fee-repo".to_string(),
			network_fee_repo_address: "network-fee-repo".to_string(),
			watcher_permit_address: "permit".to_string(),
			rsn_token_id: "rsn".to_string(),
		};

		let events = Arc::new(EventProcessor::new(
			EventProcessorParts {
				store: store.clone(),
				registry: registry.clone(),
				gate: EventConfirmationGate::new(
					registry.clone(),
					EVENT_CONFIRMATION,
					Duration::from_millis(200),
				),
				fee_policy: Arc::new(StaticFeePolicy(sample_fee())),
				builder: EventOrderBuilder::new(
					registry.clone(),
					RewardOrderCalculator::new(settings, sample_tokens()),
					Arc::new(commitments.clone()),
				),
				ledger: ledger.clone(),
				machine: machine.clone(),
				dispatcher: dispatcher.clone(),
			},
			3,
			Duration::from_secs(3600),
		));
		let submitter = Arc::new(SignSubmitter::new(
			Arc::new(signer.clone()),
			machine.clone(),
			Duration::from_secs(1),
		));
		let transactions = Arc::new(TransactionProcessor::new(
			store.clone(),
			registry,
			machine.clone(),
			submitter.clone(),
			dispatcher,
			MAX_SIGN_RETRIES,
			Duration::from_secs(60),
		));
		let runtime = GuardRuntime::new(events.clone(), transactions, Duration::from_millis(10));

		GuardHarness {
			store,
			ergo,
			cardano,
			signer,
			commitments,
			machine,
			ledger,
			submitter,
			runtime,
			events,
			updates,
		}
	}

	/// Updates published so far.
	pub fn drain_updates(&mut self) -> Vec<StatusUpdate> {
		let mut updates = Vec::new();
		while let Ok(update) = self.updates.try_recv() {
			updates.push(update);
		}
		updates
	}
}
