//! Outbound message sinks.
//!
//! `relay-core` never touches a socket directly; each connection's transport
//! task (in `relay-server`) owns the real websocket/body writer and exposes
//! it to the domain logic as a plain channel. Sending is best-effort from
//! the domain logic's point of view: a dead sink is just a `false` return,
//! handled the same way a write error is handled in the teacher's
//! `SessionService::do_send`.

use tokio::sync::mpsc;

/// A cheaply-cloneable handle to a connection's outbound channel.
#[derive(Debug)]
pub struct ChannelSink<T> {
	tx: mpsc::UnboundedSender<T>,
}

impl<T> Clone for ChannelSink<T> {
	fn clone(&self) -> Self {
		Self {
			tx: self.tx.clone(),
		}
	}
}

impl<T> ChannelSink<T> {
	/// Wraps a channel sender as a sink.
	pub fn new(tx: mpsc::UnboundedSender<T>) -> Self {
		Self { tx }
	}

	/// Sends a message, returning `false` if the receiving transport task has
	/// gone away.
	pub fn send(&self, msg: T) -> bool {
		self.tx.send(msg).is_ok()
	}
}

/// Frames sent to a worker's transport task.
#[derive(Debug, Clone)]
pub enum WorkerOutbound {
	/// The opening control frame, sent exactly once at pairing time.
	Opening(relay_proto::OpeningFrame),
	/// A binary audio chunk forwarded verbatim from the client.
	Audio(Vec<u8>),
	/// The literal `"EOS"` end-of-stream marker.
	Eos,
	/// Close the worker's socket (release).
	Close,
}

/// Frames sent to a client's transport task.
#[derive(Debug, Clone)]
pub enum ClientOutbound {
	/// A recognition event, forwarded to the client verbatim.
	Event(relay_proto::RecognitionEvent),
	/// Close the client's socket.
	Close,
}

/// Outbound channel to a worker's transport task.
pub type WorkerSink = ChannelSink<WorkerOutbound>;

/// Outbound channel to a streaming client's transport task.
pub type ClientSink = ChannelSink<ClientOutbound>;
