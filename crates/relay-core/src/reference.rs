//! Reference-transcript store.
//!
//! Read-modify-write of a single JSON file, serialized behind one
//! [`tokio::sync::Mutex`] guarding the path — the behavioral fix for the
//! distillation source's unserialized `save_reference`, which could lose an
//! update under concurrent POSTs.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::RelayError;

/// One stored reference transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
	/// The submitted transcript text.
	pub content: String,
	/// The submitting user's identifier, empty if not provided.
	pub user_id: String,
}

/// Serializes access to `reference-content.json`.
pub struct ReferenceStore {
	path: PathBuf,
	lock: Mutex<()>,
}

impl ReferenceStore {
	/// Opens a store rooted at `path`. The file itself need not exist yet.
	#[must_use]
	pub fn new(path: PathBuf) -> Self {
		Self {
			path,
			lock: Mutex::new(()),
		}
	}

	/// Merges `(content_id, entry)` into the store.
	///
	/// Parses the existing file as a JSON object (treating a missing or
	/// corrupt file as empty, matching the distillation's behavior), sets
	/// the entry, and writes the whole object back pretty-printed.
	pub async fn save(&self, content_id: String, entry: ReferenceEntry) -> Result<(), RelayError> {
		let _guard = self.lock.lock().await;

		let mut refs: HashMap<String, ReferenceEntry> = match tokio::fs::read(&self.path).await {
			Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
			Err(_) => HashMap::new(),
		};
		refs.insert(content_id, entry);

		let serialized = serde_json::to_vec_pretty(&refs)?;
		tokio::fs::write(&self.path, serialized).await?;
		Ok(())
	}

	/// Reads back a single entry. Exposed for tests; the broker itself only
	/// writes through this endpoint.
	#[cfg(test)]
	pub async fn load(&self, content_id: &str) -> Option<ReferenceEntry> {
		let bytes = tokio::fs::read(&self.path).await.ok()?;
		let refs: HashMap<String, ReferenceEntry> = serde_json::from_slice(&bytes).ok()?;
		refs.get(content_id).cloned()
	}
}
