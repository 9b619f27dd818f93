use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Internal identifier for a worker connection.
///
/// Unlike [`relay_proto::SessionId`], workers are never addressed by clients
/// directly, so a cheap monotonic counter (mirroring the teacher's
/// `next_server_id: AtomicU64`) is enough — no need for a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub u64);

impl fmt::Display for WorkerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "worker-{}", self.0)
	}
}

/// Allocates process-unique [`WorkerId`]s.
#[derive(Debug, Default)]
pub struct WorkerIdGen(AtomicU64);

impl WorkerIdGen {
	/// Returns the next identifier. Never reused within the process.
	pub fn next(&self) -> WorkerId {
		WorkerId(self.0.fetch_add(1, Ordering::Relaxed))
	}
}
