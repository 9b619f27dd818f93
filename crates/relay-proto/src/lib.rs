//! Wire types for the relay speech-recognition broker.
//!
//! These are the payloads that cross the process boundary: the JSON control
//! frame a client or worker receives on session open, the JSON event a
//! worker reports back, and the status snapshot broadcast to status
//! listeners. Everything here is transport-agnostic — it knows nothing
//! about websockets, HTTP, or JSON encoding itself, only `serde`-derived
//! shapes; the crates that move bytes decide how to serialize them.

mod ids;
mod status;
mod worker;

pub use ids::SessionId;
pub use status::{StatusFrame, STATUS_NOT_AVAILABLE};
pub use worker::{OpeningFrame, RecognitionEvent, RecognitionResult, WorkerHypothesis};
