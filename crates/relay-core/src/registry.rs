//! Worker registry: the set of currently-idle workers.
//!
//! Implemented as a dedicated actor task, following the teacher's
//! `SessionService` shape: a `Cmd` enum, a cheaply-`Clone`-able `Handle`
//! wrapping an `mpsc::Sender<Cmd>`, and a single task owning the mutable
//! `HashMap`. `claim` pops an arbitrary entry — `HashMap`'s iteration order
//! is unspecified, which is exactly the "arbitrary claim order" the
//! original implementation's `set.pop()` exhibits; this must never be
//! replaced with a FIFO-ordered structure.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::ids::WorkerId;
use crate::worker::WorkerSession;

#[derive(Debug)]
enum Cmd {
	Add {
		id: WorkerId,
		worker: Arc<WorkerSession>,
		reply: oneshot::Sender<usize>,
	},
	Remove {
		id: WorkerId,
		reply: oneshot::Sender<usize>,
	},
	Claim {
		reply: oneshot::Sender<Option<(WorkerId, Arc<WorkerSession>)>>,
	},
	Size {
		reply: oneshot::Sender<usize>,
	},
}

/// Handle for communicating with the `RegistryService`.
#[derive(Clone, Debug)]
pub struct RegistryHandle {
	tx: mpsc::Sender<Cmd>,
}

impl RegistryHandle {
	/// Inserts a worker as idle. Idempotent. Returns the registry's new size.
	pub async fn add(&self, id: WorkerId, worker: Arc<WorkerSession>) -> usize {
		let (reply, rx) = oneshot::channel();
		if self.tx.send(Cmd::Add { id, worker, reply }).await.is_err() {
			return 0;
		}
		rx.await.unwrap_or(0)
	}

	/// Removes a worker if present. Idempotent. Returns the registry's new
	/// size.
	pub async fn remove(&self, id: WorkerId) -> usize {
		let (reply, rx) = oneshot::channel();
		if self.tx.send(Cmd::Remove { id, reply }).await.is_err() {
			return 0;
		}
		rx.await.unwrap_or(0)
	}

	/// Atomically pops an arbitrary idle worker, or `None` if the registry
	/// is empty.
	pub async fn claim(&self) -> Option<(WorkerId, Arc<WorkerSession>)> {
		let (reply, rx) = oneshot::channel();
		self.tx.send(Cmd::Claim { reply }).await.ok()?;
		rx.await.ok().flatten()
	}

	/// Current cardinality of the idle set.
	pub async fn size(&self) -> usize {
		let (reply, rx) = oneshot::channel();
		if self.tx.send(Cmd::Size { reply }).await.is_err() {
			return 0;
		}
		rx.await.unwrap_or(0)
	}
}

/// Actor service owning the idle worker set.
pub struct RegistryService {
	rx: mpsc::Receiver<Cmd>,
	idle: HashMap<WorkerId, Arc<WorkerSession>>,
}

impl RegistryService {
	/// Spawns the registry actor task.
	pub fn start() -> RegistryHandle {
		let (tx, rx) = mpsc::channel(256);
		let service = Self {
			rx,
			idle: HashMap::new(),
		};
		tokio::spawn(service.run());
		RegistryHandle { tx }
	}

	async fn run(mut self) {
		while let Some(cmd) = self.rx.recv().await {
			match cmd {
				Cmd::Add { id, worker, reply } => {
					self.idle.insert(id, worker);
					let _ = reply.send(self.idle.len());
				}
				Cmd::Remove { id, reply } => {
					self.idle.remove(&id);
					let _ = reply.send(self.idle.len());
				}
				Cmd::Claim { reply } => {
					let claimed = self
						.idle
						.keys()
						.next()
						.copied()
						.and_then(|id| self.idle.remove(&id).map(|worker| (id, worker)));
					let _ = reply.send(claimed);
				}
				Cmd::Size { reply } => {
					let _ = reply.send(self.idle.len());
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sink::{ChannelSink, WorkerOutbound};
	use crate::status::StatusService;

	fn test_worker(registry: &RegistryHandle, id: u64) -> (WorkerId, Arc<WorkerSession>) {
		let (tx, _rx) = mpsc::unbounded_channel::<WorkerOutbound>();
		let sink = ChannelSink::new(tx);
		let status = StatusService::start();
		let wid = WorkerId(id);
		(
			wid,
			WorkerSession::new_unregistered(wid, sink, registry.clone(), status),
		)
	}

	#[tokio::test(flavor = "current_thread")]
	async fn add_then_size_reports_one() {
		let handle = RegistryService::start();
		let (id, worker) = test_worker(&handle, 1);
		assert_eq!(handle.add(id, worker).await, 1);
		assert_eq!(handle.size().await, 1);
	}

	#[tokio::test(flavor = "current_thread")]
	async fn claim_empties_registry_and_is_not_reentrant() {
		let handle = RegistryService::start();
		let (id, worker) = test_worker(&handle, 1);
		handle.add(id, worker).await;

		let claimed = handle.claim().await;
		assert!(claimed.is_some());
		assert_eq!(claimed.unwrap().0, id);
		assert_eq!(handle.size().await, 0);
		assert!(handle.claim().await.is_none());
	}

	#[tokio::test(flavor = "current_thread")]
	async fn remove_is_idempotent() {
		let handle = RegistryService::start();
		let (id, worker) = test_worker(&handle, 1);
		handle.add(id, worker).await;
		assert_eq!(handle.remove(id).await, 0);
		assert_eq!(handle.remove(id).await, 0);
	}

	#[tokio::test(flavor = "current_thread")]
	async fn concurrent_claims_yield_exactly_one_winner() {
		let handle = RegistryService::start();
		let (id, worker) = test_worker(&handle, 1);
		handle.add(id, worker).await;

		let h1 = handle.clone();
		let h2 = handle.clone();
		let (a, b) = tokio::join!(async move { h1.claim().await }, async move {
			h2.claim().await
		});
		let winners = [a, b].into_iter().flatten().count();
		assert_eq!(winners, 1);
	}
}
