use crate::env_default;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_EVENT_CONFIRMATION: u64 = 20;
const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationConfig {
	/// Bridge chain blocks required on top of the trigger height.
	#[serde(default = "default_event_confirmation")]
	pub event_confirmation: u64,
	#[serde(default = "default_adapter_timeout_secs")]
	pub adapter_timeout_secs: u64,
}

env_default!(
	default_event_confirmation,
	"GUARD_EVENT_CONFIRMATION",
	u64,
	DEFAULT_EVENT_CONFIRMATION
);

env_default!(
	default_adapter_timeout_secs,
	"GUARD_ADAPTER_TIMEOUT_SECS",
	u64,
	DEFAULT_ADAPTER_TIMEOUT_SECS
);

impl ConfirmationConfig {
	pub fn adapter_timeout(&self) -> Duration {
		Duration::from_secs(self.adapter_timeout_secs)
	}
}

impl Default for ConfirmationConfig {
	fn default() -> Self {
		ConfirmationConfig {
			event_confirmation: default_event_confirmation(),
			adapter_timeout_secs: default_adapter_timeout_secs(),
		}
	}
}
