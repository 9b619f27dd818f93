use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Control frame sent to a worker the instant it is paired with a client.
///
/// This is the only message a worker receives before raw audio frames start
/// arriving; it carries everything the worker needs to tag its results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningFrame {
	/// The session the worker has just been paired with.
	pub id: SessionId,
	/// Client-supplied content type for the audio stream, if any.
	pub content_type: Option<String>,
	/// Client-supplied device/user identifier, defaults to `"none"`.
	pub user_id: String,
	/// Client-supplied content identifier, defaults to `"none"`.
	pub content_id: String,
}

/// A recognition event reported by a worker over its websocket.
///
/// Forwarded to the paired client mostly as-is; the chunked-HTTP client
/// session additionally folds final hypotheses into an accumulated
/// transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionEvent {
	/// `0` for a normal result, non-zero (see [`crate::STATUS_NOT_AVAILABLE`])
	/// for an out-of-band status report.
	pub status: i32,
	/// Present when `status == 0`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<RecognitionResult>,
	/// Present on out-of-band status reports.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

/// One recognition result within a [`RecognitionEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
	/// Candidate transcripts, best first.
	pub hypotheses: Vec<WorkerHypothesis>,
	/// Whether this is the final result for the current utterance.
	pub r#final: bool,
}

/// A single candidate transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHypothesis {
	/// The recognized text.
	pub transcript: String,
}

impl RecognitionEvent {
	/// Build the synthetic event sent to a client when no worker is free.
	#[must_use]
	pub fn no_worker_available() -> Self {
		Self {
			status: crate::STATUS_NOT_AVAILABLE,
			result: None,
			message: Some("No decoder available, try again later".to_string()),
		}
	}

	/// The best final-hypothesis transcript carried by this event, if it
	/// represents a successful, final result.
	#[must_use]
	pub fn final_transcript(&self) -> Option<&str> {
		let result = self.result.as_ref()?;
		if self.status != 0 || !result.r#final {
			return None;
		}
		result.hypotheses.first().map(|h| h.transcript.as_str())
	}
}
