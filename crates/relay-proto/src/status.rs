use serde::{Deserialize, Serialize};

/// Status code sent to a client when no worker is available for its request.
///
/// Matches the value used by `common.STATUS_NOT_AVAILABLE` in the upstream
/// project this protocol is compatible with.
pub const STATUS_NOT_AVAILABLE: i32 = 9;

/// Snapshot broadcast to every attached status listener whenever the worker
/// pool size or request counter changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFrame {
	/// Number of workers currently idle and available for pairing.
	pub num_workers_available: usize,
	/// Total number of client requests completed since process start.
	pub num_requests_processed: u64,
}
