use crate::reward::{RewardInputs, RewardOrderCalculator};
use alloy_primitives::U256;
use guard_util::{
	commitments::unmerged_wids, ChainRegistry, CommitmentProvider, EventProof, EventTrigger, Fee,
	FeeError, GuardResult, PaymentOrder,
};
use std::sync::Arc;
use tracing::debug;

/// Gathers the chain data the reward calculator needs and builds the orders
/// of an event.
pub struct EventOrderBuilder {
	registry: Arc<ChainRegistry>,
	calculator: RewardOrderCalculator,
	commitments: Arc<dyn CommitmentProvider>,
}

impl EventOrderBuilder {
	pub fn new(
		registry: Arc<ChainRegistry>,
		calculator: RewardOrderCalculator,
		commitments: Arc<dyn CommitmentProvider>,
	) -> Self {
		EventOrderBuilder { registry, calculator, commitments }
	}

	/// Order paying the user. An event targeting the bridge chain pays its
	/// rewards in the same transaction, ahead of the user output.
	pub async fn create_payment_order(
		&self,
		event: &EventTrigger,
		proof: &EventProof,
		fee: &Fee,
	) -> GuardResult<PaymentOrder> {
		let target = self.registry.get(event.to_chain)?;
		let payment = self.calculator.payment_order(event, target.minimum_native_token(), fee)?;
		if !event.to_chain.is_bridge_chain() {
			return Ok(vec![payment]);
		}
		let mut order = self.create_reward_order(event, proof, fee, "").await?;
		order.push(payment);
		Ok(order)
	}

	/// Order distributing the fees of an event on the bridge chain.
	pub async fn create_reward_order(
		&self,
		event: &EventTrigger,
		proof: &EventProof,
		fee: &Fee,
		payment_tx_id: &str,
	) -> GuardResult<PaymentOrder> {
		if event.wids.is_empty() {
			return Err(FeeError::NoWatchers.into());
		}
		let bridge = self.registry.bridge()?;
		let source = self.registry.get(event.from_chain)?;
		let event_rwt = bridge.event_rwt(proof).await?;
		let rwt_per_watcher = event_rwt / U256::from(event.wids.len() as u64);

		let commitments = self.commitments.commitments(&event.event_id(), event.height).await?;
		let unmerged = unmerged_wids(event, &commitments);
		debug!(
			"Rewarding {} merged and {} unmerged watchers of lock {}",
			event.wids.len(),
			unmerged.len(),
			event.source_tx_id
		);

		let rwt_token = source.rwt_token();
		let inputs = RewardInputs {
			unmerged_wids: &unmerged,
			payment_tx_ref: payment_tx_id,
			rwt_token_id: &rwt_token,
			rwt_per_watcher,
			minimum_chain_fee: bridge.minimum_native_token(),
		};
		self.calculator.reward_order(event, &inputs, fee)
	}
}
