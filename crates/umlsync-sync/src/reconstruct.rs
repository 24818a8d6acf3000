//! Document reconstruction
//!
//! Rebuilds the current CRDT document of a room from the durable update store
//! plus whatever is still pending in the replication stream. Every call builds
//! a fresh [`yrs::Doc`]; nothing is cached and nothing is written back, so
//! concurrent reconstructions of the same room are safe.

use std::sync::Arc;
use yrs::updates::decoder::Decode;
use yrs::{Doc, Transact, TransactionMut, Update};

use umlsync_types::stream_reader::StreamReader;
use umlsync_types::update_store::{StoredDoc, UpdateStore};

use crate::awareness::DisposableAwareness;
use crate::group::{DocMessages, group_messages};
use crate::payload::StreamPayload;
use crate::prelude::*;
use crate::projection;

/// Name of the single CRDT document kept per room.
pub const DEFAULT_DOC_NAME: &str = "index";

#[derive(Debug, Clone)]
pub struct ReconstructorOpts {
	/// CRDT document key inside the room
	pub doc_name: Box<str>,
	/// Root text field used for text projections
	pub text_field: Box<str>,
}

impl Default for ReconstructorOpts {
	fn default() -> Self {
		Self { doc_name: DEFAULT_DOC_NAME.into(), text_field: projection::DEFAULT_TEXT_FIELD.into() }
	}
}

/// A document rebuilt from durable fragments and the stream backlog.
pub struct ReconstructedDoc {
	pub room: RoomId,
	pub doc_name: Box<str>,
	pub doc: Doc,

	/// Last stream entry id consumed, `"0"` if the stream had nothing
	pub last_stream_id: Box<str>,

	/// Durable fragments merged into `doc`
	pub store_references: Vec<RefId>,

	/// Sync updates applied from the stream
	pub stream_updates: usize,

	/// Awareness updates absorbed (and discarded) from the stream
	pub awareness_updates: usize,

	text_field: Box<str>,
}

impl ReconstructedDoc {
	/// Plain text of the diagram source.
	pub fn text(&self) -> String {
		projection::text_content(&self.doc, &self.text_field)
	}

	/// Full state as a v1 update, suitable to seed a client.
	pub fn encode_state(&self) -> Vec<u8> {
		projection::encode_state(&self.doc)
	}
}

impl std::fmt::Debug for ReconstructedDoc {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReconstructedDoc")
			.field("room", &self.room)
			.field("doc_name", &self.doc_name)
			.field("last_stream_id", &self.last_stream_id)
			.field("store_references", &self.store_references)
			.field("stream_updates", &self.stream_updates)
			.field("awareness_updates", &self.awareness_updates)
			.finish_non_exhaustive()
	}
}

/// Rebuilds room documents from an update store and a stream reader.
#[derive(Debug, Clone)]
pub struct Reconstructor {
	store: Arc<dyn UpdateStore>,
	stream: Arc<dyn StreamReader>,
	opts: ReconstructorOpts,
}

impl Reconstructor {
	pub fn new(
		store: Arc<dyn UpdateStore>,
		stream: Arc<dyn StreamReader>,
		opts: ReconstructorOpts,
	) -> Self {
		Self { store, stream, opts }
	}

	/// Reconstruct the current document of `room`.
	///
	/// An unknown room yields an empty document. A malformed stream name
	/// aborts with [`Error::MalformedStreamKey`].
	pub async fn get_doc(&self, room: &RoomId) -> UsResult<ReconstructedDoc> {
		let doc_name = &*self.opts.doc_name;

		// Stream before store: a message persisted in between is then seen
		// twice (merges are idempotent) rather than not at all.
		let reply = self.stream.read_pending(room, doc_name).await?;
		let mut grouped = group_messages(reply.unwrap_or_default(), self.stream.prefix())?;
		let pending = grouped.get_mut(room).and_then(|docs| docs.remove(doc_name));

		let stored = self.store.retrieve(room, doc_name).await?;

		let res = assemble(room, &self.opts, stored, pending)?;
		debug!(
			"Reconstructed {}/{}: {} fragments, {} stream updates, {} awareness updates (last id {})",
			room,
			doc_name,
			res.store_references.len(),
			res.stream_updates,
			res.awareness_updates,
			res.last_stream_id
		);
		Ok(res)
	}

	/// Plain text of the current document of `room`.
	pub async fn get_text(&self, room: &RoomId) -> UsResult<String> {
		Ok(self.get_doc(room).await?.text())
	}
}

fn apply_v1(txn: &mut TransactionMut<'_>, update: &[u8]) -> UsResult<()> {
	let update = Update::decode_v1(update)?;
	txn.apply_update(update).map_err(|e| Error::Decode(format!("update rejected: {}", e)))
}

/// Build the document from the durable state and pending stream messages.
fn assemble(
	room: &RoomId,
	opts: &ReconstructorOpts,
	stored: Option<StoredDoc>,
	pending: Option<DocMessages>,
) -> UsResult<ReconstructedDoc> {
	let doc = Doc::new();
	let mut awareness = DisposableAwareness::new(doc.clone());

	let mut store_references = Vec::new();
	if let Some(stored) = stored {
		apply_v1(&mut doc.transact_mut(), &stored.update)?;
		store_references = stored.references;
	}

	let mut last_stream_id: Box<str> = "0".into();
	let mut stream_updates = 0;
	if let Some(pending) = pending {
		last_stream_id = pending.last_id;

		let mut payloads = Vec::with_capacity(pending.messages.len());
		for message in &pending.messages {
			payloads.push(StreamPayload::decode(message)?);
		}

		// One transaction, so observers see a single jump to the new state
		let mut awareness_updates = Vec::new();
		{
			let mut txn = doc.transact_mut();
			for payload in payloads {
				match payload {
					StreamPayload::SyncUpdate(update) => {
						apply_v1(&mut txn, &update)?;
						stream_updates += 1;
					}
					StreamPayload::Awareness(update) => awareness_updates.push(update),
					StreamPayload::SyncOther(sub) => {
						trace!("Skipping sync message with sub-tag {} in room {}", sub, room);
					}
					StreamPayload::Unknown(tag) => {
						trace!("Skipping stream message with unknown tag {} in room {}", tag, room);
					}
				}
			}
		}

		for update in awareness_updates {
			if let Err(e) = awareness.apply(&update) {
				warn!("Ignoring awareness update in room {}: {}", room, e);
			}
		}
	}

	Ok(ReconstructedDoc {
		room: room.clone(),
		doc_name: opts.doc_name.clone(),
		doc,
		last_stream_id,
		store_references,
		stream_updates,
		awareness_updates: awareness.applied(),
		text_field: opts.text_field.clone(),
	})
}


// vim: ts=4
