//! In-memory chain adapter, signer and commitment provider used by the
//! tests and by the local run of the service binary.

use alloy_primitives::keccak256;
use guard_util::{
	AdapterError, AdapterResult, Amount, Chain, ChainAdapter, ChainToken, Commitment,
	CommitmentProvider, EventId, EventProof, EventTrigger, Fee, PaymentOrder, PaymentTransaction,
	SignerError, TokenMap, TransactionType, TxConfirmationStatus, TxKind, TxSigner,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Minimum native amount of an output on every mock chain.
pub const MOCK_MINIMUM_NATIVE: u64 = 1_100_000;

/// Reward token amount locked in every mock trigger.
pub const MOCK_EVENT_RWT: u64 = 30;

#[derive(Debug)]
struct AdapterState {
	height: u64,
	confirmations: HashMap<String, TxConfirmationStatus>,
	invalid_txs: HashSet<String>,
	failing: bool,
	delay: Duration,
	event_valid: bool,
	rwt_valid: bool,
	event_rwt: Amount,
	tx_salt: String,
	submitted: Vec<PaymentTransaction>,
}

impl Default for AdapterState {
	fn default() -> Self {
		AdapterState {
			height: 0,
			confirmations: HashMap::new(),
			invalid_txs: HashSet::new(),
			failing: false,
			delay: Duration::ZERO,
			event_valid: true,
			rwt_valid: true,
			event_rwt: Amount::from(MOCK_EVENT_RWT),
			tx_salt: String::new(),
			submitted: Vec::new(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct MockChainAdapter {
	chain: Chain,
	state: Arc<RwLock<AdapterState>>,
}

impl MockChainAdapter {
	pub fn new(chain: Chain) -> Self {
		MockChainAdapter { chain, state: Arc::new(RwLock::new(AdapterState::default())) }
	}

	pub async fn set_height(&self, height: u64) {
		self.state.write().await.height = height;
	}

	pub async fn set_confirmation(&self, tx_id: &str, status: TxConfirmationStatus) {
		self.state.write().await.confirmations.insert(tx_id.to_string(), status);
	}

	/// Makes every chain request fail while set.
	pub async fn set_failing(&self, failing: bool) {
		self.state.write().await.failing = failing;
	}

	/// Delays every chain request.
	pub async fn set_delay(&self, delay: Duration) {
		self.state.write().await.delay = delay;
	}

	pub async fn set_event_valid(&self, valid: bool) {
		self.state.write().await.event_valid = valid;
	}

	pub async fn set_rwt_valid(&self, valid: bool) {
		self.state.write().await.rwt_valid = valid;
	}

	pub async fn set_event_rwt(&self, amount: Amount) {
		self.state.write().await.event_rwt = amount;
	}

	/// Marks a transaction as no longer confirmable, e.g. its inputs got spent.
	pub async fn set_tx_invalid(&self, tx_id: &str) {
		self.state.write().await.invalid_txs.insert(tx_id.to_string());
	}

	/// Mixed into generated transaction ids, to simulate the candidates of
	/// other guards built from different inputs.
	pub async fn set_tx_salt(&self, salt: &str) {
		self.state.write().await.tx_salt = salt.to_string();
	}

	pub async fn submitted(&self) -> Vec<PaymentTransaction> {
		self.state.read().await.submitted.clone()
	}

	async fn request(&self) -> AdapterResult<()> {
		let (failing, delay) = {
			let state = self.state.read().await;
			(state.failing, state.delay)
		};
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
		if failing {
			return Err(AdapterError::RequestFailed {
				chain: self.chain,
				message: "mock chain unavailable".to_string(),
			});
		}
		Ok(())
	}
}

#[async_trait::async_trait]
impl ChainAdapter for MockChainAdapter {
	fn chain(&self) -> Chain {
		self.chain
	}

	fn rwt_token(&self) -> String {
		format!("{}-rwt", self.chain)
	}

	fn minimum_native_token(&self) -> Amount {
		Amount::from(MOCK_MINIMUM_NATIVE)
	}

	async fn height(&self) -> AdapterResult<u64> {
		self.request().await?;
		Ok(self.state.read().await.height)
	}

	async fn tx_confirmation_status(
		&self,
		tx_id: &str,
		_kind: TxKind,
	) -> AdapterResult<TxConfirmationStatus> {
		self.request().await?;
		let state = self.state.read().await;
		Ok(state.confirmations.get(tx_id).copied().unwrap_or(TxConfirmationStatus::NotFound))
	}

	async fn verify_event(&self, _event: &EventTrigger, _fee: &Fee) -> AdapterResult<bool> {
		self.request().await?;
		Ok(self.state.read().await.event_valid)
	}

	async fn verify_event_rwt(&self, _proof: &EventProof, _rwt_token: &str) -> AdapterResult<bool> {
		self.request().await?;
		Ok(self.state.read().await.rwt_valid)
	}

	async fn event_rwt(&self, _proof: &EventProof) -> AdapterResult<Amount> {
		self.request().await?;
		Ok(self.state.read().await.event_rwt)
	}

	async fn generate_transaction(
		&self,
		event_id: Option<&EventId>,
		tx_type: TransactionType,
		order: &PaymentOrder,
		required_sign: u32,
	) -> AdapterResult<PaymentTransaction> {
		self.request().await?;
		let salt = self.state.read().await.tx_salt.clone();
		let payload = serde_json::to_vec(order).map_err(AdapterError::generic)?;
		let preimage = serde_json::to_vec(&(self.chain, event_id, tx_type, &salt, order))
			.map_err(AdapterError::generic)?;
		let tx_id = hex::encode(keccak256(preimage));
		debug!("Generated {tx_type} transaction {tx_id} on {}", self.chain);
		Ok(PaymentTransaction::new(
			tx_id,
			event_id.cloned(),
			tx_type,
			self.chain,
			payload,
			required_sign,
		))
	}

	async fn submit_transaction(&self, tx: &PaymentTransaction) -> AdapterResult<()> {
		self.request().await?;
		let mut state = self.state.write().await;
		state.confirmations.entry(tx.tx_id.clone()).or_insert(TxConfirmationStatus::Unconfirmed);
		state.submitted.push(tx.clone());
		Ok(())
	}

	async fn is_tx_valid(&self, tx: &PaymentTransaction) -> AdapterResult<bool> {
		self.request().await?;
		Ok(!self.state.read().await.invalid_txs.contains(&tx.tx_id))
	}
}

/// Signer that prefixes the payload, tracking how many signatures ran at once.
#[derive(Debug, Clone, Default)]
pub struct MockSigner {
	failing: Arc<RwLock<bool>>,
	delay: Arc<RwLock<Duration>>,
	in_flight: Arc<AtomicUsize>,
	max_in_flight: Arc<AtomicUsize>,
	signed: Arc<AtomicUsize>,
}

impl MockSigner {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn set_failing(&self, failing: bool) {
		*self.failing.write().await = failing;
	}

	pub async fn set_delay(&self, delay: Duration) {
		*self.delay.write().await = delay;
	}

	/// Highest number of signatures observed running concurrently.
	pub fn max_in_flight(&self) -> usize {
		self.max_in_flight.load(Ordering::SeqCst)
	}

	pub fn signed(&self) -> usize {
		self.signed.load(Ordering::SeqCst)
	}
}

#[async_trait::async_trait]
impl TxSigner for MockSigner {
	async fn sign(&self, tx: &PaymentTransaction) -> Result<Vec<u8>, SignerError> {
		let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(running, Ordering::SeqCst);
		let delay = *self.delay.read().await;
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
		self.in_flight.fetch_sub(1, Ordering::SeqCst);

		if *self.failing.read().await {
			return Err(SignerError::Rejected(format!("mock signer refused {}", tx.tx_id)));
		}
		self.signed.fetch_add(1, Ordering::SeqCst);
		let mut payload = b"signed:".to_vec();
		payload.extend_from_slice(&tx.payload);
		Ok(payload)
	}
}

#[derive(Debug, Clone, Default)]
pub struct MockCommitmentProvider {
	commitments: Arc<RwLock<HashMap<EventId, Vec<Commitment>>>>,
}

impl MockCommitmentProvider {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn add_commitment(&self, event_id: &EventId, wid: &str, height: u64) {
		let commitment = Commitment { wid: wid.to_string(), event_id: event_id.clone(), height };
		self.commitments.write().await.entry(event_id.clone()).or_default().push(commitment);
	}
}

#[async_trait::async_trait]
impl CommitmentProvider for MockCommitmentProvider {
	async fn commitments(
		&self,
		event_id: &EventId,
		event_height: u64,
	) -> AdapterResult<Vec<Commitment>> {
		let commitments = self.commitments.read().await;
		Ok(commitments
			.get(event_id)
			.map(|all| all.iter().filter(|c| c.height < event_height).cloned().collect())
			.unwrap_or_default())
	}
}

/// Native token of a mock chain.
pub fn native_token(chain: Chain) -> String {
	format!("{chain}-native")
}

/// Token of `chain` wrapped on `target`.
pub fn wrapped_token(chain: Chain, target: Chain) -> String {
	format!("{chain}-native-on-{target}")
}

/// Every native token bridged to every other chain.
pub fn sample_tokens() -> TokenMap {
	let sets = Chain::ALL
		.iter()
		.map(|&origin| {
			Chain::ALL
				.iter()
				.map(|&chain| {
					let token_id = if chain == origin {
						native_token(origin)
					} else {
						wrapped_token(origin, chain)
					};
					let token = ChainToken {
						name: token_id.clone(),
						token_id,
						decimals: 0,
						native: chain == origin,
					};
					(chain, token)
				})
				.collect::<BTreeMap<_, _>>()
		})
		.collect();
	TokenMap::new(sets)
}

/// Event moving the native token of `from` to `to`, triggered at bridge `height`.
pub fn sample_event(source_tx_id: &str, from: Chain, to: Chain, height: u64) -> EventTrigger {
	EventTrigger {
		source_tx_id: source_tx_id.to_string(),
		from_chain: from,
		to_chain: to,
		from_address: format!("{from}-sender"),
		to_address: format!("{to}-receiver"),
		amount: Amount::from(100_000_000u64),
		bridge_fee: Amount::from(1_000_000u64),
		network_fee: Amount::from(500_000u64),
		source_chain_token_id: native_token(from),
		target_chain_token_id: wrapped_token(from, to),
		wids: vec!["wid-1".to_string(), "wid-2".to_string(), "wid-3".to_string()],
		height,
		source_block_id: format!("{from}-block-{height}"),
		source_chain_height: height,
	}
}

pub fn sample_fee() -> Fee {
	Fee {
		bridge_fee: Amount::from(1_000_000u64),
		network_fee: Amount::from(500_000u64),
		fee_ratio: Amount::from(10u64),
		fee_ratio_divisor: Amount::from(10_000u64),
		rsn_ratio: Amount::ZERO,
		rsn_ratio_divisor: Amount::from(1u64),
	}
}
