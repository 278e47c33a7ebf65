use crate::env_default;
use serde::{Deserialize, Serialize};

const DEFAULT_WATCHERS_SHARE_PERCENT: u64 = 50;
const DEFAULT_WATCHERS_RSN_SHARE_PERCENT: u64 = 0;
const DEFAULT_BRIDGE_FEE_REPO_ADDRESS: &str = "bridge-fee-repo";
const DEFAULT_NETWORK_FEE_REPO_ADDRESS: &str = "network-fee-repo";
const DEFAULT_WATCHER_PERMIT_ADDRESS: &str = "watcher-permit";
const DEFAULT_RSN_TOKEN_ID: &str = "rsn";

/// Where rewards go and how they are split between watchers and guards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
	#[serde(default = "default_watchers_share_percent")]
	pub watchers_share_percent: u64,
	#[serde(default = "default_watchers_rsn_share_percent")]
	pub watchers_rsn_share_percent: u64,
	#[serde(default = "default_bridge_fee_repo_address")]
	pub bridge_fee_repo_address: String,
	#[serde(default = "default_network_fee_repo_address")]
	pub network_fee_repo_address: String,
	#[serde(default = "default_watcher_permit_address")]
	pub watcher_permit_address: String,
	#[serde(default = "default_rsn_token_id")]
	pub rsn_token_id: String,
}

env_default!(
	default_watchers_share_percent,
	"GUARD_WATCHERS_SHARE_PERCENT",
	u64,
	DEFAULT_WATCHERS_SHARE_PERCENT
);

env_default!(
	default_watchers_rsn_share_percent,
	"GUARD_WATCHERS_RSN_SHARE_PERCENT",
	u64,
	DEFAULT_WATCHERS_RSN_SHARE_PERCENT
);

env_default!(
	default_bridge_fee_repo_address,
	"GUARD_BRIDGE_FEE_REPO_ADDRESS",
	String,
	DEFAULT_BRIDGE_FEE_REPO_ADDRESS.to_string()
);

env_default!(
	default_network_fee_repo_address,
	"GUARD_NETWORK_FEE_REPO_ADDRESS",
	String,
	DEFAULT_NETWORK_FEE_REPO_ADDRESS.to_string()
);

env_default!(
	default_watcher_permit_address,
	"GUARD_WATCHER_PERMIT_ADDRESS",
	String,
	DEFAULT_WATCHER_PERMIT_ADDRESS.to_string()
);

env_default!(default_rsn_token_id, "GUARD_RSN_TOKEN_ID", String, DEFAULT_RSN_TOKEN_ID.to_string());

impl Default for RewardConfig {
	fn default() -> Self {
		RewardConfig {
			watchers_share_percent: default_watchers_share_percent(),
			watchers_rsn_share_percent: default_watchers_rsn_share_percent(),
			bridge_fee_repo_address: default_bridge_fee_repo_address(),
			network_fee_repo_address: default_network_fee_repo_address(),
			watcher_permit_address: default_watcher_permit_address(),
			rsn_token_id: default_rsn_token_id(),
		}
	}
}
