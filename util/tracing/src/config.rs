use anyhow::anyhow;
use std::env;
use std::path::PathBuf;

const LOG_DIR_ENV: &str = "GUARD_LOG_DIR";
const LOG_JSON_ENV: &str = "GUARD_LOG_JSON";

/// Options for tracing configuration.
#[derive(Debug, Default, Clone)]
pub struct Config {
	/// Directory receiving a daily rolling log file.
	/// If the value is `None`, logs are only written to stdout.
	pub log_dir: Option<PathBuf>,
	/// Emit structured JSON lines instead of the human readable format.
	pub json: bool,
}

impl Config {
	/// Get the tracing configuration from well-known environment variables.
	pub fn from_env() -> Result<Self, anyhow::Error> {
		let log_dir = match env::var(LOG_DIR_ENV) {
			Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
			Ok(_) | Err(env::VarError::NotPresent) => None,
			Err(env::VarError::NotUnicode(s)) => {
				return Err(anyhow!(
					"value of environment variable {LOG_DIR_ENV} is not valid UTF-8: {}",
					s.to_string_lossy()
				));
			}
		};
		let json = match env::var(LOG_JSON_ENV) {
			Ok(value) => parse_flag(&value).ok_or_else(|| {
				anyhow!("value of environment variable {LOG_JSON_ENV} is not a boolean: {value}")
			})?,
			Err(_) => false,
		};
		Ok(Self { log_dir, json })
	}
}

fn parse_flag(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" | "" => Some(false),
		_ => None,
	}
}
