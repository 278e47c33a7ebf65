use crate::env_default;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DEFAULT_STORE_PATH: &str = "./guard-db";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
	#[default]
	Memory,
	Rocksdb,
}

impl fmt::Display for StoreBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self {
			Self::Memory => "memory",
			Self::Rocksdb => "rocksdb",
		};
		write!(f, "{}", kind)
	}
}

impl FromStr for StoreBackend {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"memory" => Ok(Self::Memory),
			"rocksdb" => Ok(Self::Rocksdb),
			other => Err(format!("unknown store backend {other}")),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
	#[serde(default = "default_store_backend")]
	pub backend: StoreBackend,
	#[serde(default = "default_store_path")]
	pub path: String,
}

env_default!(default_store_backend, "GUARD_STORE_BACKEND", StoreBackend, StoreBackend::Memory);

env_default!(default_store_path, "GUARD_STORE_PATH", String, DEFAULT_STORE_PATH.to_string());

impl Default for StoreConfig {
	fn default() -> Self {
		StoreConfig { backend: default_store_backend(), path: default_store_path() }
	}
}
