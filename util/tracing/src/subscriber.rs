use crate::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, Registry};

/// The scope guard object for the background writer of the tracing subsystem.
///
/// This object needs to be kept alive for the duration of the program.
#[must_use = "should be dropped at the end of the program scope"]
#[derive(Debug)]
pub struct ScopeGuard(Option<WorkerGuard>);

impl ScopeGuard {
	/// Whether a file writer is attached to this guard.
	pub fn has_file_writer(&self) -> bool {
		self.0.is_some()
	}
}

fn env_filter() -> EnvFilter {
	EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy()
}

/// Sets up the tracing subscribers for a guard process. This should be
/// called at the beginning of a process' `main` function.
///
/// If successful, returns a guard object that should be dropped at the end
/// of the process' `main` function scope.
pub fn init_tracing_subscriber(
	service_name: &'static str,
	config: &Config,
) -> Result<ScopeGuard, anyhow::Error> {
	let stdout_layer = if config.json {
		fmt::layer().json().with_filter(env_filter()).boxed()
	} else {
		fmt::layer().with_filter(env_filter()).boxed()
	};

	let (file_layer, guard) = match &config.log_dir {
		Some(dir) => {
			let appender = tracing_appender::rolling::daily(dir, format!("{service_name}.log"));
			let (writer, guard) = tracing_appender::non_blocking(appender);
			let layer = fmt::layer()
				.with_writer(writer)
				.with_ansi(false)
				.json()
				.with_filter(env_filter());
			(Some(layer), Some(guard))
		}
		None => (None, None),
	};

	Registry::default().with(stdout_layer).with(file_layer).try_init()?;
	tracing::info!("tracing initialized for {service_name}");
	Ok(ScopeGuard(guard))
}
