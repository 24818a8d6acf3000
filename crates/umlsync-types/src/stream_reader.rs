//! Replication Stream Reader and Writer
//!
//! Traits and types for the volatile update stream of a room. Pending
//! messages sit in the stream until a separate writer persists them into the
//! durable [`UpdateStore`](crate::update_store::UpdateStore).
//!
//! Reads are point-in-time catch-up reads starting from id `"0"`, never tailing
//! or blocking. Payloads are raw bytes: they carry opaque CRDT operations and
//! must not be decoded as text.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// One log entry of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
	/// Log-assigned entry id (e.g. `1700000000000-0`)
	pub id: Box<str>,

	/// Binary payload, `None` when the entry has no payload field
	pub payload: Option<Vec<u8>>,
}

/// All entries read from one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
	/// Stream name as stored in the log (see `umlsync_sync::key`)
	pub name: Vec<u8>,

	pub messages: Vec<StreamMessage>,
}

impl StreamEntry {
	pub fn new(name: impl Into<Vec<u8>>, messages: Vec<StreamMessage>) -> Self {
		Self { name: name.into(), messages }
	}
}

/// Snapshot of the stream entries present at read time.
pub type StreamReply = Vec<StreamEntry>;

/// Stream reader trait.
#[async_trait]
pub trait StreamReader: Debug + Send + Sync {
	/// Namespace prefix of the stream keys this reader serves (e.g. `"y"`).
	fn prefix(&self) -> &str;

	/// Read every entry currently pending for `(room, doc)`.
	///
	/// Returns `None` when the stream does not exist yet. Transport failures
	/// surface as [`Error::StreamRead`].
	async fn read_pending(&self, room: &RoomId, doc: &str) -> UsResult<Option<StreamReply>>;
}

/// Stream writer trait.
///
/// Appends encoded envelopes (see `umlsync_sync::payload`) to the stream of a
/// room document, where the next reconstruction picks them up.
#[async_trait]
pub trait StreamWriter: Debug + Send + Sync {
	/// Append `payload` to the stream of `(room, doc)` and return the entry id.
	async fn append(&self, room: &RoomId, doc: &str, payload: &[u8]) -> UsResult<Box<str>>;
}

// vim: ts=4
