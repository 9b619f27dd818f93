//! Domain error types for the broker core.
//!
//! `relay-server` is the only place these get turned into HTTP status codes
//! or websocket close frames — nothing in `relay-core` leaks a `RelayError`
//! over the wire.

use thiserror::Error;

/// Errors surfaced by the broker's domain logic.
#[derive(Debug, Error)]
pub enum RelayError {
	/// No worker was idle at pairing time.
	#[error("no worker available")]
	NoWorkerAvailable,

	/// A worker reported an event while it had no paired client.
	#[error("worker {worker} reported an event with no paired client")]
	WorkerProtocolViolation {
		/// The offending worker's registry identifier.
		worker: crate::ids::WorkerId,
	},

	/// The reference-store file could not be read or written.
	#[error("reference store io failure: {0}")]
	ReferenceStoreIoFailure(#[from] std::io::Error),

	/// The reference-store file contained invalid JSON.
	#[error("reference store contains malformed json: {0}")]
	ReferenceStoreMalformed(#[from] serde_json::Error),

	/// A client request was missing a required field (e.g. `Content-Id`).
	#[error("malformed request: {0}")]
	MalformedRequest(String),

	/// The EOS→worker-close rendezvous exceeded its deadline.
	#[error("worker timed out waiting for final result")]
	WorkerTimeout,
}
