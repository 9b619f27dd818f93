//! Status publisher: fan-out of worker-count and request-count snapshots to
//! attached observers.
//!
//! Same actor shape as [`crate::registry`]. Per the redesign guidance on
//! unbounded observer fan-out, observer channels are bounded (capacity 32)
//! and a full channel is handled with `try_send` plus a logged warning —
//! a slow observer never backpressures the publisher.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::warn;

use relay_proto::StatusFrame;

const OBSERVER_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ObserverId(u64);

#[derive(Debug)]
enum Cmd {
	Attach {
		tx: mpsc::Sender<StatusFrame>,
		reply: tokio::sync::oneshot::Sender<ObserverId>,
	},
	Detach {
		id: ObserverId,
	},
	WorkerCountChanged {
		count: usize,
	},
	RequestCompleted,
}

/// Handle for communicating with the `StatusService`.
#[derive(Clone, Debug)]
pub struct StatusHandle {
	tx: mpsc::Sender<Cmd>,
}

/// A live subscription to status updates, returned by [`StatusHandle::attach`].
pub struct StatusSubscription {
	id: ObserverId,
	status: StatusHandle,
	/// Receives every status frame published after attachment, starting
	/// with the current snapshot sent immediately on attach.
	pub rx: mpsc::Receiver<StatusFrame>,
}

impl StatusSubscription {
	/// Detaches this observer. Also happens implicitly if the subscription
	/// is dropped without the receiver being drained, but calling this
	/// explicitly avoids relying on drop timing.
	pub async fn detach(self) {
		self.status.detach(self.id).await;
	}
}

impl StatusHandle {
	/// Attaches a new observer. It immediately receives the current status
	/// frame on its own channel.
	pub async fn attach(&self) -> StatusSubscription {
		let (tx, rx) = mpsc::channel(OBSERVER_CHANNEL_CAPACITY);
		let (reply, reply_rx) = tokio::sync::oneshot::channel();
		let _ = self.tx.send(Cmd::Attach { tx, reply }).await;
		let id = reply_rx.await.unwrap_or(ObserverId(0));
		StatusSubscription {
			id,
			status: self.clone(),
			rx,
		}
	}

	async fn detach(&self, id: ObserverId) {
		let _ = self.tx.send(Cmd::Detach { id }).await;
	}

	/// Reports a new idle-worker count and publishes it to every observer.
	pub async fn worker_count_changed(&self, count: usize) {
		let _ = self.tx.send(Cmd::WorkerCountChanged { count }).await;
	}

	/// Increments `num_requests_processed` and publishes the new snapshot.
	pub async fn request_completed(&self) {
		let _ = self.tx.send(Cmd::RequestCompleted).await;
	}
}

/// Actor service owning the observer set and the two process-wide counters.
pub struct StatusService {
	rx: mpsc::Receiver<Cmd>,
	observers: HashMap<ObserverId, mpsc::Sender<StatusFrame>>,
	next_observer_id: u64,
	num_workers_available: usize,
	num_requests_processed: u64,
}

impl StatusService {
	/// Spawns the status actor task.
	pub fn start() -> StatusHandle {
		let (tx, rx) = mpsc::channel(256);
		let service = Self {
			rx,
			observers: HashMap::new(),
			next_observer_id: 0,
			num_workers_available: 0,
			num_requests_processed: 0,
		};
		tokio::spawn(service.run());
		StatusHandle { tx }
	}

	fn snapshot(&self) -> StatusFrame {
		StatusFrame {
			num_workers_available: self.num_workers_available,
			num_requests_processed: self.num_requests_processed,
		}
	}

	fn publish(&mut self) {
		let frame = self.snapshot();
		let mut dead = Vec::new();
		for (&id, tx) in &self.observers {
			match tx.try_send(frame) {
				Ok(()) => {}
				Err(mpsc::error::TrySendError::Full(_)) => {
					warn!(?id, "status observer channel full, dropping frame");
				}
				Err(mpsc::error::TrySendError::Closed(_)) => dead.push(id),
			}
		}
		for id in dead {
			self.observers.remove(&id);
		}
	}

	async fn run(mut self) {
		while let Some(cmd) = self.rx.recv().await {
			match cmd {
				Cmd::Attach { tx, reply } => {
					let id = ObserverId(self.next_observer_id);
					self.next_observer_id += 1;
					let _ = tx.try_send(self.snapshot());
					self.observers.insert(id, tx);
					let _ = reply.send(id);
				}
				Cmd::Detach { id } => {
					self.observers.remove(&id);
				}
				Cmd::WorkerCountChanged { count } => {
					self.num_workers_available = count;
					self.publish();
				}
				Cmd::RequestCompleted => {
					self.num_requests_processed += 1;
					self.publish();
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test(flavor = "current_thread")]
	async fn attach_delivers_current_snapshot() {
		let handle = StatusService::start();
		handle.worker_count_changed(3).await;
		let mut sub = handle.attach().await;
		let frame = sub.rx.recv().await.unwrap();
		assert_eq!(frame.num_workers_available, 3);
		assert_eq!(frame.num_requests_processed, 0);
	}

	#[tokio::test(flavor = "current_thread")]
	async fn two_observers_both_see_every_change() {
		let handle = StatusService::start();
		let mut o1 = handle.attach().await;
		let mut o2 = handle.attach().await;
		// Drain the initial snapshot sent on attach.
		o1.rx.recv().await.unwrap();
		o2.rx.recv().await.unwrap();

		handle.worker_count_changed(1).await;
		assert_eq!(o1.rx.recv().await.unwrap().num_workers_available, 1);
		assert_eq!(o2.rx.recv().await.unwrap().num_workers_available, 1);

		handle.request_completed().await;
		assert_eq!(o1.rx.recv().await.unwrap().num_requests_processed, 1);
		assert_eq!(o2.rx.recv().await.unwrap().num_requests_processed, 1);
	}

	#[tokio::test(flavor = "current_thread")]
	async fn detach_stops_further_delivery() {
		let handle = StatusService::start();
		let mut sub = handle.attach().await;
		sub.rx.recv().await.unwrap();
		sub.detach().await;

		handle.worker_count_changed(5).await;
		// Give the actor a chance to process the detach before asserting.
		tokio::task::yield_now().await;
		assert!(handle.attach().await.rx.recv().await.is_some());
	}
}
