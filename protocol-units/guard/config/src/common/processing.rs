use crate::env_default;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_EVENT_TIMEOUT_SECS: u64 = 24 * 60 * 60;
const DEFAULT_SIGN_TIMEOUT_SECS: u64 = 5 * 60;
const DEFAULT_MAX_SIGN_RETRIES: u32 = 3;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_REQUIRED_SIGN: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
	/// Time after the first try of an attempt at which an event times out.
	#[serde(default = "default_event_timeout_secs")]
	pub event_timeout_secs: u64,
	/// Time after which a transaction stuck in signing counts as failed.
	#[serde(default = "default_sign_timeout_secs")]
	pub sign_timeout_secs: u64,
	#[serde(default = "default_max_sign_retries")]
	pub max_sign_retries: u32,
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
	/// Threshold of guard signatures a transaction needs.
	#[serde(default = "default_required_sign")]
	pub required_sign: u32,
}

env_default!(
	default_event_timeout_secs,
	"GUARD_EVENT_TIMEOUT_SECS",
	u64,
	DEFAULT_EVENT_TIMEOUT_SECS
);

env_default!(default_sign_timeout_secs, "GUARD_SIGN_TIMEOUT_SECS", u64, DEFAULT_SIGN_TIMEOUT_SECS);

env_default!(default_max_sign_retries, "GUARD_MAX_SIGN_RETRIES", u32, DEFAULT_MAX_SIGN_RETRIES);

env_default!(
	default_poll_interval_secs,
	"GUARD_POLL_INTERVAL_SECS",
	u64,
	DEFAULT_POLL_INTERVAL_SECS
);

env_default!(default_required_sign, "GUARD_REQUIRED_SIGN", u32, DEFAULT_REQUIRED_SIGN);

impl ProcessingConfig {
	pub fn event_timeout(&self) -> Duration {
		Duration::from_secs(self.event_timeout_secs)
	}

	pub fn sign_timeout(&self) -> Duration {
		Duration::from_secs(self.sign_timeout_secs)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}
}

impl Default for ProcessingConfig {
	fn default() -> Self {
		ProcessingConfig {
			event_timeout_secs: default_event_timeout_secs(),
			sign_timeout_secs: default_sign_timeout_secs(),
			max_sign_retries: default_max_sign_retries(),
			poll_interval_secs: default_poll_interval_secs(),
			required_sign: default_required_sign(),
		}
	}
}
