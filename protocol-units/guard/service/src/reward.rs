//! Fee arithmetic and the payment and reward orders derived from it.
//!
//! Every guard computes these orders independently from the same event and
//! fee schedule, so the arithmetic is integer only with floor division in a
//! fixed order. Division residue of the watcher shares goes to the guard
//! bridge fee output.

use guard_config::RewardConfig;
use guard_util::{
	Amount, AssetBalance, Chain, EventTrigger, Fee, FeeError, GuardError, GuardResult,
	PaymentOrder, SinglePayment, TokenMap,
};

const PERCENT: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSettings {
	pub watchers_share_percent: u64,
	pub watchers_rsn_share_percent: u64,
	pub bridge_fee_repo_address: String,
	pub network_fee_repo_address: String,
	pub watcher_permit_address: String,
	pub rsn_token_id: String,
}

impl From<&RewardConfig> for RewardSettings {
	fn from(config: &RewardConfig) -> Self {
		RewardSettings {
			watchers_share_percent: config.watchers_share_percent,
			watchers_rsn_share_percent: config.watchers_rsn_share_percent,
			bridge_fee_repo_address: config.bridge_fee_repo_address.clone(),
			network_fee_repo_address: config.network_fee_repo_address.clone(),
			watcher_permit_address: config.watcher_permit_address.clone(),
			rsn_token_id: config.rsn_token_id.clone(),
		}
	}
}

/// Fees charged on an event after applying the schedule floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFees {
	pub bridge_fee: Amount,
	pub network_fee: Amount,
	pub rsn_fee: Amount,
}

impl EventFees {
	pub fn compute(event: &EventTrigger, fee: &Fee) -> Result<Self, FeeError> {
		if fee.fee_ratio_divisor.is_zero() {
			return Err(FeeError::ZeroDivisor("fee_ratio_divisor"));
		}
		if fee.rsn_ratio_divisor.is_zero() {
			return Err(FeeError::ZeroDivisor("rsn_ratio_divisor"));
		}
		let ratio_fee = event
			.amount
			.checked_mul(fee.fee_ratio)
			.ok_or(FeeError::Overflow("ratio bridge fee"))?
			/ fee.fee_ratio_divisor;
		let bridge_fee = event.bridge_fee.max(fee.bridge_fee).max(ratio_fee);
		let network_fee = event.network_fee.max(fee.network_fee);
		let rsn_fee = bridge_fee.checked_mul(fee.rsn_ratio).ok_or(FeeError::Overflow("rsn fee"))?
			/ fee.rsn_ratio_divisor;
		Ok(EventFees { bridge_fee, network_fee, rsn_fee })
	}

	/// Amount left for the user once both fees are taken.
	pub fn payout(&self, amount: Amount) -> Result<Amount, FeeError> {
		amount
			.checked_sub(self.bridge_fee)
			.and_then(|rest| rest.checked_sub(self.network_fee))
			.ok_or(FeeError::NegativePayout {
				amount,
				fees: self.bridge_fee.saturating_add(self.network_fee),
			})
	}
}

/// Equal per watcher share of a fee and the remainder left to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
	pub per_watcher: Amount,
	pub guard: Amount,
}

impl Split {
	pub fn compute(
		total: Amount,
		watchers_percent: u64,
		watchers: usize,
		what: &'static str,
	) -> Result<Self, FeeError> {
		if watchers == 0 {
			return Err(FeeError::NoWatchers);
		}
		if watchers_percent > PERCENT {
			return Err(FeeError::InvalidPercent(watchers_percent));
		}
		let count = Amount::from(watchers as u64);
		let per_watcher = total
			.checked_mul(Amount::from(watchers_percent))
			.ok_or(FeeError::Overflow(what))?
			/ Amount::from(PERCENT)
			/ count;
		let distributed = per_watcher.checked_mul(count).ok_or(FeeError::Overflow(what))?;
		let guard = total.checked_sub(distributed).ok_or(FeeError::Underflow(what))?;
		Ok(Split { per_watcher, guard })
	}
}

/// Inputs of a reward order gathered from the chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardInputs<'a> {
	/// Watchers with valid commitments that were not merged into the trigger.
	pub unmerged_wids: &'a [String],
	/// Payment transaction the reward belongs to, empty when not known yet.
	pub payment_tx_ref: &'a str,
	pub rwt_token_id: &'a str,
	pub rwt_per_watcher: Amount,
	/// Minimum native amount of an output on the bridge chain.
	pub minimum_chain_fee: Amount,
}

fn checked_add(a: Amount, b: Amount, what: &'static str) -> Result<Amount, FeeError> {
	a.checked_add(b).ok_or(FeeError::Overflow(what))
}

#[derive(Debug, Clone)]
pub struct RewardOrderCalculator {
	settings: RewardSettings,
	tokens: TokenMap,
}

impl RewardOrderCalculator {
	pub fn new(settings: RewardSettings, tokens: TokenMap) -> Self {
		RewardOrderCalculator { settings, tokens }
	}

	pub fn settings(&self) -> &RewardSettings {
		&self.settings
	}

	/// The output paying the user on the target chain.
	pub fn payment_order(
		&self,
		event: &EventTrigger,
		min_target_native: Amount,
		fee: &Fee,
	) -> GuardResult<SinglePayment> {
		let fees = EventFees::compute(event, fee)?;
		let payout = fees.payout(event.amount)?;
		let target = self
			.tokens
			.target_token(event.from_chain, &event.source_chain_token_id, event.to_chain)
			.ok_or_else(|| GuardError::TokenNotFound {
				token: event.source_chain_token_id.clone(),
				from: event.from_chain,
				to: event.to_chain,
			})?;
		let assets = if target.native {
			AssetBalance::native(checked_add(min_target_native, payout, "payout")?)
		} else {
			AssetBalance::native(min_target_native).with_token(target.token_id.clone(), payout)
		};
		Ok(SinglePayment { address: event.to_address.clone(), assets, extra: None })
	}

	/// Outputs rewarding the watchers, the guards and the network on the bridge chain.
	pub fn reward_order(
		&self,
		event: &EventTrigger,
		inputs: &RewardInputs<'_>,
		fee: &Fee,
	) -> GuardResult<PaymentOrder> {
		let fees = EventFees::compute(event, fee)?;
		let wids: Vec<&String> = event.wids.iter().chain(inputs.unmerged_wids.iter()).collect();
		let fee_split = Split::compute(
			fees.bridge_fee,
			self.settings.watchers_share_percent,
			wids.len(),
			"watcher bridge fee share",
		)?;
		let rsn_split = Split::compute(
			fees.rsn_fee,
			self.settings.watchers_rsn_share_percent,
			wids.len(),
			"watcher rsn share",
		)?;

		let reward_token = self
			.tokens
			.target_token(event.from_chain, &event.source_chain_token_id, Chain::BRIDGE)
			.ok_or_else(|| GuardError::TokenNotFound {
				token: event.source_chain_token_id.clone(),
				from: event.from_chain,
				to: Chain::BRIDGE,
			})?;
		let rsn = self.settings.rsn_token_id.as_str();
		let min = inputs.minimum_chain_fee;

		let (watcher_assets, guard_assets, network_assets) = if reward_token.native {
			(
				AssetBalance::native(checked_add(fee_split.per_watcher, min, "watcher share")?)
					.with_token(inputs.rwt_token_id, inputs.rwt_per_watcher)
					.with_token(rsn, rsn_split.per_watcher),
				AssetBalance::native(checked_add(fee_split.guard, min, "guard share")?)
					.with_token(rsn, rsn_split.guard),
				AssetBalance::native(checked_add(fees.network_fee, min, "network fee")?),
			)
		} else {
			let token = reward_token.token_id.as_str();
			(
				AssetBalance::native(min)
					.with_token(inputs.rwt_token_id, inputs.rwt_per_watcher)
					.with_token(token, fee_split.per_watcher)
					.with_token(rsn, rsn_split.per_watcher),
				AssetBalance::native(min)
					.with_token(token, fee_split.guard)
					.with_token(rsn, rsn_split.guard),
				AssetBalance::native(min).with_token(token, fees.network_fee),
			)
		};

		let mut order: PaymentOrder = wids
			.into_iter()
			.map(|wid| SinglePayment {
				address: self.settings.watcher_permit_address.clone(),
				assets: watcher_assets.clone(),
				extra: Some(wid.clone()),
			})
			.collect();
		order.push(SinglePayment {
			address: self.settings.bridge_fee_repo_address.clone(),
			assets: guard_assets,
			extra: Some(inputs.payment_tx_ref.to_string()),
		});
		order.push(SinglePayment {
			address: self.settings.network_fee_repo_address.clone(),
			assets: network_assets,
			extra: None,
		});
		Ok(order)
	}
}
