//! Worker session: one live connection to a recognition backend.
//!
//! Mirrors the teacher's "weak back-reference" redesign guidance for
//! client↔worker pairing — the peer reference is an `Option`, cleared on
//! release, and every inbound-message site null-checks it rather than
//! assuming it is present.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use relay_proto::RecognitionEvent;

use crate::error::RelayError;
use crate::ids::WorkerId;
use crate::registry::RegistryHandle;
use crate::sink::{WorkerOutbound, WorkerSink};
use crate::status::StatusHandle;

/// The client-side half of a client↔worker pairing, as seen by the worker.
///
/// Object-safe so a `WorkerSession` can hold either a streaming or a
/// chunked-HTTP client session behind one trait object, following the
/// teacher's `LspLauncher` pattern of returning a boxed future from a plain
/// (non-`async fn`) trait method.
pub trait ClientPeer: Send + Sync {
	/// Delivers a recognition event reported by the paired worker.
	fn on_worker_event(&self, event: RecognitionEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

	/// Notifies the client session that its paired worker has closed.
	fn on_worker_closed(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// One live connection to a worker process.
pub struct WorkerSession {
	id: WorkerId,
	sink: WorkerSink,
	registry: RegistryHandle,
	status: StatusHandle,
	client: Mutex<Option<Arc<dyn ClientPeer>>>,
}

impl WorkerSession {
	/// Registers a newly-connected worker as idle and returns its session
	/// handle.
	pub async fn register(
		id: WorkerId,
		sink: WorkerSink,
		registry: RegistryHandle,
		status: StatusHandle,
	) -> Arc<Self> {
		let session = Arc::new(Self {
			id,
			sink,
			registry: registry.clone(),
			status: status.clone(),
			client: Mutex::new(None),
		});
		let size = registry.add(id, session.clone()).await;
		status.worker_count_changed(size).await;
		info!(worker = %id, "worker connected");
		session
	}

	/// Constructs a worker session without registering it — used by tests
	/// that exercise the registry directly.
	#[cfg(test)]
	pub fn new_unregistered(
		id: WorkerId,
		sink: WorkerSink,
		registry: RegistryHandle,
		status: StatusHandle,
	) -> Arc<Self> {
		Arc::new(Self {
			id,
			sink,
			registry,
			status,
			client: Mutex::new(None),
		})
	}

	/// This worker's registry identifier.
	#[must_use]
	pub fn id(&self) -> WorkerId {
		self.id
	}

	/// The channel used to push frames to this worker's transport task.
	#[must_use]
	pub fn sink(&self) -> &WorkerSink {
		&self.sink
	}

	/// Pairs this worker with a client session, or clears the pairing when
	/// `peer` is `None`. Called exactly once at claim time and once at
	/// release, per the pairing contract.
	pub async fn set_client(&self, peer: Option<Arc<dyn ClientPeer>>) {
		*self.client.lock().await = peer;
	}

	/// Handles one inbound JSON message from the worker's transport task.
	///
	/// A message arriving while unpaired is a protocol violation: it is
	/// logged and returned as an error so the caller can close only this
	/// worker session — never the process.
	pub async fn on_message(&self, raw: &str) -> Result<(), RelayError> {
		let client = self.client.lock().await.clone();
		let Some(client) = client else {
			error!(worker = %self.id, "event from worker with no paired client");
			return Err(RelayError::WorkerProtocolViolation { worker: self.id });
		};
		match serde_json::from_str::<RecognitionEvent>(raw) {
			Ok(event) => {
				client.on_worker_event(event).await;
				Ok(())
			}
			Err(err) => {
				warn!(worker = %self.id, error = %err, "malformed event from worker, dropping");
				Ok(())
			}
		}
	}

	/// Handles the worker's socket closing, from either side.
	///
	/// Removes the worker from the registry (a no-op if it was already
	/// claimed), notifies a paired client, clears the pairing, and
	/// publishes the updated worker count.
	pub async fn on_close(&self) {
		let size = self.registry.remove(self.id).await;
		self.status.worker_count_changed(size).await;

		let client = self.client.lock().await.take();
		if let Some(client) = client {
			client.on_worker_closed().await;
		}
		info!(worker = %self.id, "worker disconnected");
	}

	/// Forces this worker's transport task to close its socket. Used on
	/// pairing release and on the chunked-HTTP rendezvous timeout.
	pub fn force_close(&self) {
		let _ = self.sink.send(WorkerOutbound::Close);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::registry::RegistryService;
	use crate::sink::ChannelSink;
	use crate::status::StatusService;
	use tokio::sync::mpsc;

	#[tokio::test(flavor = "current_thread")]
	async fn on_message_while_unpaired_is_a_protocol_violation() {
		let registry = RegistryService::start();
		let status = StatusService::start();
		let (tx, _rx) = mpsc::unbounded_channel();
		let sink = ChannelSink::new(tx);
		let worker = WorkerSession::register(WorkerId(1), sink, registry, status).await;

		let result = worker.on_message(r#"{"status":0}"#).await;
		assert!(matches!(result, Err(RelayError::WorkerProtocolViolation { worker: id }) if id == WorkerId(1)));
	}

	#[tokio::test(flavor = "current_thread")]
	async fn protocol_violation_is_contained_to_the_session_not_the_process() {
		let registry = RegistryService::start();
		let status = StatusService::start();
		let (tx, _rx) = mpsc::unbounded_channel();
		let sink = ChannelSink::new(tx);
		let worker = WorkerSession::register(WorkerId(1), sink, registry.clone(), status).await;

		assert_eq!(registry.size().await, 1);
		assert!(worker.on_message(r#"{"status":0}"#).await.is_err());

		// The caller (the transport task) reacts to the `Err` by tearing
		// down only this worker's session, never the process.
		worker.on_close().await;
		assert_eq!(registry.size().await, 0);
	}
}
