//! Shared application state handed to every axum handler.

use std::sync::Arc;
use std::time::Duration;

use relay_core::{ReferenceStore, RegistryHandle, StatusHandle, WorkerIdGen};

/// Cloned into every request/connection handler. Cloning is cheap: every
/// field is either a `Clone`-able actor handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
	pub registry: RegistryHandle,
	pub status: StatusHandle,
	pub reference_store: Arc<ReferenceStore>,
	pub worker_ids: Arc<WorkerIdGen>,
	/// How long the chunked-HTTP EOS rendezvous waits for the paired
	/// worker to close before giving up. See `SPEC_FULL.md` §4.E.
	pub worker_timeout: Duration,
}
