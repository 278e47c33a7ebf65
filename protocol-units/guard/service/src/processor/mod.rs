pub mod events;
pub mod transactions;

use guard_util::GuardError;
use tracing::{error, warn};

/// Logs a failure of one item without stopping the others.
fn log_failure(what: &str, e: &GuardError) {
	if e.is_fatal() {
		error!("Halting {what}: {e}");
	} else {
		warn!("Failed to process {what}: {e}");
	}
}
