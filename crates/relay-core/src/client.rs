//! Client session state machines: the streaming websocket variant (§4.D)
//! and the chunked-HTTP variant (§4.E).
//!
//! Both variants share the same claim-at-open contract and the same
//! completion discipline: exactly one of "client disconnected" or "worker
//! closed" wins the race to finalize a session, guarded by an `AtomicBool`
//! so the `num_requests_processed` counter in [`crate::status`] is bumped
//! exactly once per paired session, regardless of which side tears down
//! first (spec.md §3 invariant 5).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, oneshot};
use tracing::info;

use relay_proto::{OpeningFrame, RecognitionEvent, SessionId};

use crate::error::RelayError;
use crate::registry::RegistryHandle;
use crate::sink::{ClientOutbound, ClientSink, WorkerOutbound};
use crate::status::StatusHandle;
use crate::worker::{ClientPeer, WorkerSession};

/// Query parameters accepted by both client session variants at open time.
#[derive(Debug, Clone, Default)]
pub struct OpenParams {
	/// `user-id` (streaming) / `device-id` (chunked). Defaults to `"none"`.
	pub user_id: String,
	/// `content-id`. Defaults to `"none"`.
	pub content_id: String,
	/// `Content-Type`, if supplied.
	pub content_type: Option<String>,
}

impl OpenParams {
	fn opening_frame(&self, id: SessionId) -> OpeningFrame {
		OpeningFrame {
			id,
			content_type: self.content_type.clone(),
			user_id: self.user_id.clone(),
			content_id: self.content_id.clone(),
		}
	}
}

async fn claim_and_pair(
	registry: &RegistryHandle,
	status: &StatusHandle,
	peer: Arc<dyn ClientPeer>,
	params: &OpenParams,
	id: SessionId,
) -> Option<Arc<WorkerSession>> {
	let (_worker_id, worker) = registry.claim().await?;
	worker.set_client(Some(peer)).await;
	status.worker_count_changed(registry.size().await).await;
	worker.sink().send(WorkerOutbound::Opening(params.opening_frame(id)));
	Some(worker)
}

/// A streaming websocket client session (spec.md §4.D).
pub struct StreamingClientSession {
	id: SessionId,
	sink: ClientSink,
	worker: Mutex<Option<Arc<WorkerSession>>>,
	status: StatusHandle,
	completed: AtomicBool,
}

impl StreamingClientSession {
	/// Opens a new streaming session: generates no ID (the caller supplies
	/// one, typically freshly minted), attempts to claim a worker, and on
	/// success sends the opening control frame. On failure, sends the
	/// synthetic "no worker available" event and closes the client's
	/// transport — this is never counted as a processed request.
	pub async fn open(
		id: SessionId,
		sink: ClientSink,
		registry: &RegistryHandle,
		status: StatusHandle,
		params: OpenParams,
	) -> Arc<Self> {
		let session = Arc::new(Self {
			id,
			sink,
			worker: Mutex::new(None),
			status,
			completed: AtomicBool::new(false),
		});

		let peer: Arc<dyn ClientPeer> = session.clone();
		match claim_and_pair(registry, &session.status, peer, &params, id).await {
			Some(worker) => {
				*session.worker.lock().await = Some(worker);
				info!(session = %id, "streaming session paired");
			}
			None => {
				let _ = session.sink.send(ClientOutbound::Event(RecognitionEvent::no_worker_available()));
				let _ = session.sink.send(ClientOutbound::Close);
				info!(session = %id, "streaming session: no worker available");
			}
		}
		session
	}

	/// This session's identifier.
	#[must_use]
	pub fn id(&self) -> SessionId {
		self.id
	}

	/// Forwards one inbound audio frame to the paired worker, if any.
	/// A no-op if this session never claimed a worker, or has already
	/// released one.
	pub async fn forward_audio(&self, frame: Vec<u8>) {
		if let Some(worker) = self.worker.lock().await.as_ref() {
			let _ = worker.sink().send(WorkerOutbound::Audio(frame));
		}
	}

	/// Handles the client's transport disconnecting. Releases any paired
	/// worker and finalizes the request. A session that never paired does
	/// not touch the counters (invariant 3 of spec.md §8).
	pub async fn on_client_disconnect(&self) {
		let worker = self.worker.lock().await.take();
		if let Some(worker) = worker {
			worker.set_client(None).await;
			worker.force_close();
			self.complete().await;
		}
	}

	async fn complete(&self) {
		if self.completed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.status.request_completed().await;
		info!(session = %self.id, "streaming session completed");
	}
}

impl ClientPeer for StreamingClientSession {
	fn on_worker_event(&self, event: RecognitionEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
		Box::pin(async move {
			let _ = self.sink.send(ClientOutbound::Event(event));
		})
	}

	fn on_worker_closed(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
		Box::pin(async move {
			*self.worker.lock().await = None;
			let _ = self.sink.send(ClientOutbound::Close);
			self.complete().await;
		})
	}
}

/// A chunked-HTTP client session (spec.md §4.E).
///
/// Accumulates final hypotheses as worker events arrive, and exposes a
/// single-delivery rendezvous (a [`oneshot::Receiver`]) that resolves with
/// the finished transcript once the paired worker closes — or on a
/// server-enforced timeout, whichever comes first. See `SPEC_FULL.md` §4.E
/// for the decided 120s timeout.
pub struct ChunkedClientSession {
	id: SessionId,
	worker: Mutex<Option<Arc<WorkerSession>>>,
	status: StatusHandle,
	final_hyp: Mutex<String>,
	completion: Mutex<Option<oneshot::Sender<String>>>,
	completed: AtomicBool,
}

impl ChunkedClientSession {
	/// Attempts to claim a worker and pair it with a new chunked session.
	/// Returns `Err(RelayError::NoWorkerAvailable)` if the registry was
	/// empty — the caller (the HTTP handler) must respond `503` and never
	/// construct a session in that case.
	pub async fn open(
		id: SessionId,
		registry: &RegistryHandle,
		status: StatusHandle,
		params: OpenParams,
	) -> Result<Arc<Self>, RelayError> {
		let session = Arc::new(Self {
			id,
			worker: Mutex::new(None),
			status,
			final_hyp: Mutex::new(String::new()),
			completion: Mutex::new(None),
			completed: AtomicBool::new(false),
		});

		let peer: Arc<dyn ClientPeer> = session.clone();
		match claim_and_pair(registry, &session.status, peer, &params, id).await {
			Some(worker) => {
				*session.worker.lock().await = Some(worker);
				info!(session = %id, "chunked session paired");
				Ok(session)
			}
			None => Err(RelayError::NoWorkerAvailable),
		}
	}

	/// This session's identifier.
	#[must_use]
	pub fn id(&self) -> SessionId {
		self.id
	}

	/// Forwards one chunk of the request body to the paired worker.
	pub async fn forward_audio(&self, chunk: Vec<u8>) {
		if let Some(worker) = self.worker.lock().await.as_ref() {
			let _ = worker.sink().send(WorkerOutbound::Audio(chunk));
		}
	}

	/// Sends the `"EOS"` marker to the worker and returns a receiver that
	/// resolves once the worker closes with the accumulated transcript.
	/// Must be called at most once per session.
	pub async fn send_eos(&self) -> oneshot::Receiver<String> {
		let (tx, rx) = oneshot::channel();
		*self.completion.lock().await = Some(tx);
		if let Some(worker) = self.worker.lock().await.as_ref() {
			let _ = worker.sink().send(WorkerOutbound::Eos);
		}
		rx
	}

	/// Force-closes the paired worker. Used by the server layer when the
	/// EOS rendezvous times out; the worker's own close callback still
	/// drives `complete()`, so the counter is incremented exactly once
	/// either way.
	pub async fn force_release(&self) {
		if let Some(worker) = self.worker.lock().await.as_ref() {
			worker.force_close();
		}
	}

	async fn complete(&self) {
		if self.completed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.status.request_completed().await;
		let hyp = self.final_hyp.lock().await.clone();
		if let Some(tx) = self.completion.lock().await.take() {
			let _ = tx.send(hyp);
		}
		info!(session = %self.id, "chunked session completed");
	}
}

impl ClientPeer for ChunkedClientSession {
	fn on_worker_event(&self, event: RecognitionEvent) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
		Box::pin(async move {
			let Some(transcript) = event.final_transcript() else {
				return;
			};
			let mut hyp = self.final_hyp.lock().await;
			if hyp.is_empty() {
				hyp.push_str(transcript);
			} else {
				hyp.push(' ');
				hyp.push_str(transcript);
			}
		})
	}

	fn on_worker_closed(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
		Box::pin(async move {
			*self.worker.lock().await = None;
			self.complete().await;
		})
	}
}
