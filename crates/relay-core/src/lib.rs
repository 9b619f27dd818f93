//! Concurrent domain logic for the relay speech-recognition broker.
//!
//! This crate owns every piece of shared mutable state and every session
//! state machine described in `SPEC_FULL.md` §4, but never touches a
//! socket: each of [`registry`], [`status`], [`worker`], [`client`], and
//! [`reference`] is exercised directly by its unit tests, and `relay-server`
//! is the only crate that binds a port.

pub mod client;
pub mod error;
pub mod ids;
pub mod reference;
pub mod registry;
pub mod sink;
pub mod status;
pub mod worker;

pub use client::{ChunkedClientSession, OpenParams, StreamingClientSession};
pub use error::RelayError;
pub use ids::{WorkerId, WorkerIdGen};
pub use reference::{ReferenceEntry, ReferenceStore};
pub use registry::{RegistryHandle, RegistryService};
pub use sink::{ChannelSink, ClientOutbound, ClientSink, WorkerOutbound, WorkerSink};
pub use status::{StatusHandle, StatusService, StatusSubscription};
pub use worker::{ClientPeer, WorkerSession};
