pub mod common;
mod macros;

use anyhow::Context;
use guard_util::{Amount, Fee, TokenMap};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use common::confirmation::ConfirmationConfig;
pub use common::processing::ProcessingConfig;
pub use common::reward::RewardConfig;
pub use common::store::{StoreBackend, StoreConfig};

const CONFIG_PATH_ENV: &str = "GUARD_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "./guard.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub confirmation: ConfirmationConfig,
	#[serde(default)]
	pub reward: RewardConfig,
	#[serde(default)]
	pub processing: ProcessingConfig,
	#[serde(default)]
	pub store: StoreConfig,
	/// Fee schedule applied to events when no per-event policy overrides it.
	#[serde(default = "default_fee")]
	pub fee: Fee,
	#[serde(default)]
	pub tokens: TokenMap,
}

pub fn default_fee() -> Fee {
	Fee {
		bridge_fee: Amount::ZERO,
		network_fee: Amount::ZERO,
		fee_ratio: Amount::ZERO,
		fee_ratio_divisor: Amount::from(10_000u64),
		rsn_ratio: Amount::ZERO,
		rsn_ratio_divisor: Amount::from(1u64),
	}
}

impl Default for Config {
	fn default() -> Self {
		Config {
			confirmation: ConfirmationConfig::default(),
			reward: RewardConfig::default(),
			processing: ProcessingConfig::default(),
			store: StoreConfig::default(),
			fee: default_fee(),
			tokens: TokenMap::default(),
		}
	}
}

env_default!(config_path_from_env, CONFIG_PATH_ENV, String, DEFAULT_CONFIG_PATH.to_string());

/// Path of the guard config file, `GUARD_CONFIG_PATH` or `./guard.json`.
pub fn get_config_path() -> PathBuf {
	PathBuf::from(config_path_from_env())
}

impl Config {
	/// Loads the config file; a missing file yields the defaults.
	pub async fn try_load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
		let path = path.as_ref();
		match tokio::fs::read(path).await {
			Ok(bytes) => {
				let config: Config = serde_json::from_slice(&bytes)
					.with_context(|| format!("invalid config file {}", path.display()))?;
				config.validate()?;
				Ok(config)
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				tracing::warn!("Config file {} not found, using defaults", path.display());
				Ok(Config::default())
			}
			Err(e) => Err(e).with_context(|| format!("can't read {}", path.display())),
		}
	}

	pub fn validate(&self) -> Result<(), anyhow::Error> {
		if self.reward.watchers_share_percent > 100 {
			anyhow::bail!(
				"watchers_share_percent {} is above 100",
				self.reward.watchers_share_percent
			);
		}
		if self.reward.watchers_rsn_share_percent > 100 {
			anyhow::bail!(
				"watchers_rsn_share_percent {} is above 100",
				self.reward.watchers_rsn_share_percent
			);
		}
		if self.fee.fee_ratio_divisor.is_zero() || self.fee.rsn_ratio_divisor.is_zero() {
			anyhow::bail!("fee divisors must be non zero");
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use guard_util::Chain;
	use std::io::Write;

	#[tokio::test]
	async fn test_missing_file_uses_defaults() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let config = Config::try_load(dir.path().join("absent.json")).await?;
		assert_eq!(config.confirmation.event_confirmation, 20);
		assert_eq!(config.reward.watchers_share_percent, 50);
		assert_eq!(config.store.backend, StoreBackend::Memory);
		Ok(())
	}

	#[tokio::test]
	async fn test_partial_file_fills_defaults() -> Result<(), anyhow::Error> {
		let mut file = tempfile::NamedTempFile::new()?;
		write!(
			file,
			r#"{{
				"reward": {{ "watchers_share_percent": 40, "rsn_token_id": "rsn-id" }},
				"processing": {{ "max_sign_retries": 5 }},
				"tokens": [
					{{
						"ergo": {{ "tokenId": "erg", "native": true }},
						"cardano": {{ "tokenId": "wrapped-erg" }}
					}}
				]
			}}"#
		)?;

		let config = Config::try_load(file.path()).await?;
		assert_eq!(config.reward.watchers_share_percent, 40);
		assert_eq!(config.reward.watchers_rsn_share_percent, 0);
		assert_eq!(config.reward.rsn_token_id, "rsn-id");
		assert_eq!(config.processing.max_sign_retries, 5);
		assert_eq!(config.confirmation.event_confirmation, 20);
		let erg = config.tokens.target_token(Chain::Cardano, "wrapped-erg", Chain::Ergo);
		assert!(erg.map_or(false, |token| token.native && token.token_id == "erg"));
		Ok(())
	}

	#[tokio::test]
	async fn test_invalid_percent_rejected() -> Result<(), anyhow::Error> {
		let mut file = tempfile::NamedTempFile::new()?;
		write!(file, r#"{{ "reward": {{ "watchers_share_percent": 140 }} }}"#)?;
		assert!(Config::try_load(file.path()).await.is_err());
		Ok(())
	}
}
