use anyhow::Context;
use guard_config::{Config, StoreBackend};
use guard_service::dispatcher::LoggingPublisher;
use guard_service::locks::KeyLocks;
use guard_service::mock::{MockChainAdapter, MockCommitmentProvider, MockSigner};
use guard_service::processor::events::EventProcessorParts;
use guard_service::{
	EventConfirmationGate, EventOrderBuilder, EventProcessor, GuardRuntime, ObservedEvent,
	RewardOrderCalculator, RewardSettings, SignSubmitter, StatusDispatcher, StatusMachine,
	TransactionLedger, TransactionProcessor,
};
use guard_store::{GuardStore, MemoryStore};
use guard_util::{Chain, ChainRegistry, EventProof, EventTrigger, StaticFeePolicy};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

fn open_store(config: &Config) -> Result<Arc<dyn GuardStore>, anyhow::Error> {
	match config.store.backend {
		StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
		#[cfg(feature = "rocksdb")]
		StoreBackend::Rocksdb => Ok(Arc::new(guard_store::RocksdbStore::try_new(&config.store.path)?)),
		#[cfg(not(feature = "rocksdb"))]
		StoreBackend::Rocksdb => {
			anyhow::bail!("the rocksdb store backend requires the `rocksdb` feature")
		}
	}
}

/// Reads event triggers from stdin, one JSON object per line.
async fn read_observed_events(sender: mpsc::Sender<ObservedEvent>) -> Result<(), anyhow::Error> {
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Some(line) = lines.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}
		match serde_json::from_str::<EventTrigger>(&line) {
			Ok(trigger) => {
				sender.send(ObservedEvent { trigger, proof: EventProof::default() }).await?
			}
			Err(e) => tracing::warn!("Skipping malformed event trigger: {e}"),
		}
	}
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
	let tracing_config = guard_tracing::Config::from_env()?;
	let _guard = guard_tracing::init_tracing_subscriber("guard-service", &tracing_config)?;

	let config_path = guard_config::get_config_path();
	let config = Config::try_load(&config_path)
		.await
		.with_context(|| format!("failed to load config {}", config_path.display()))?;
	tracing::info!("Guard config loaded: {config:?}");

	let store = open_store(&config)?;
	let mut registry = ChainRegistry::new();
	for chain in Chain::ALL {
		registry.register(Arc::new(MockChainAdapter::new(chain)));
	}
	let registry = Arc::new(registry);
	tracing::warn!("Running with in-memory chain adapters and signer");

	let locks = Arc::new(KeyLocks::new());
	let machine = Arc::new(StatusMachine::new(store.clone(), locks.clone()));
	let dispatcher = Arc::new(StatusDispatcher::new(store.clone(), Arc::new(LoggingPublisher)));
	let calculator =
		RewardOrderCalculator::new(RewardSettings::from(&config.reward), config.tokens.clone());

	let events = EventProcessor::new(
		EventProcessorParts {
			store: store.clone(),
			registry: registry.clone(),
			gate: EventConfirmationGate::new(
				registry.clone(),
				config.confirmation.event_confirmation,
				config.confirmation.adapter_timeout(),
			),
			fee_policy: Arc::new(StaticFeePolicy(config.fee.clone())),
			builder: EventOrderBuilder::new(
				registry.clone(),
				calculator,
				Arc::new(MockCommitmentProvider::new()),
			),
			ledger: Arc::new(TransactionLedger::new(store.clone(), locks)),
			machine: machine.clone(),
			dispatcher: dispatcher.clone(),
		},
		config.processing.required_sign,
		config.processing.event_timeout(),
	);
	let submitter = SignSubmitter::new(
		Arc::new(MockSigner::new()),
		machine.clone(),
		config.processing.sign_timeout(),
	);
	let transactions = TransactionProcessor::new(
		store,
		registry,
		machine,
		Arc::new(submitter),
		dispatcher,
		config.processing.max_sign_retries,
		config.processing.sign_timeout(),
	);

	let (sender, receiver) = mpsc::channel(64);
	tokio::spawn(async move {
		if let Err(e) = read_observed_events(sender).await {
			tracing::error!("Event reader stopped: {e}");
		}
	});

	let runtime = GuardRuntime::new(
		Arc::new(events),
		Arc::new(transactions),
		config.processing.poll_interval(),
	);
	runtime
		.run(receiver, async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!("Failed to listen for shutdown signal: {e}");
			}
		})
		.await
}
