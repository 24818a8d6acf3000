//! Durable Update Store
//!
//! Trait and types for pluggable backends that persist binary CRDT update
//! fragments per (room, document) pair using the Yjs v1 update encoding.
//!
//! Fragments are immutable and append-only. Each one is tagged by the backend
//! with a monotonically increasing [`RefId`]. Because CRDT updates commute, the
//! order fragments are read back in does not matter: [`merge_fragments`]
//! combines them with the yrs merge primitive and yields the same document
//! state for every permutation.
//!
//! Each adapter implementation provides its own constructor handling
//! backend-specific initialization (connection string, database path, etc.).

use async_trait::async_trait;
use std::fmt::Debug;
use yrs::Update;
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;

use crate::prelude::*;
use crate::types::RefId;

/// All persisted fragments of one document, merged into a single update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDoc {
	/// Merged v1 update covering every fragment in `references`
	pub update: Vec<u8>,

	/// Reference ids of the fragments that were merged
	pub references: Vec<RefId>,
}

/// Merge binary v1 updates into one v1 update.
///
/// Uses the CRDT merge rather than concatenation so the result is independent
/// of input order.
pub fn merge_fragments<T: AsRef<[u8]>>(fragments: &[T]) -> UsResult<Vec<u8>> {
	let mut updates = Vec::with_capacity(fragments.len());
	for fragment in fragments {
		updates.push(Update::decode_v1(fragment.as_ref())?);
	}
	Ok(Update::merge_updates(updates).encode_v1())
}

/// Encoded state vector of a v1 update.
pub fn state_vector_of(update: &[u8]) -> UsResult<Vec<u8>> {
	Ok(Update::decode_v1(update)?.state_vector().encode_v1())
}

/// Update store trait.
///
/// Implementations must never return partial data: a failed read surfaces as
/// [`Error::Storage`].
#[async_trait]
pub trait UpdateStore: Debug + Send + Sync {
	/// Load and merge every fragment stored for `(room, doc)`.
	///
	/// Returns `None` if no fragment exists.
	async fn retrieve(&self, room: &RoomId, doc: &str) -> UsResult<Option<StoredDoc>>;

	/// Append one update fragment and return its reference.
	async fn persist(&self, room: &RoomId, doc: &str, update: &[u8]) -> UsResult<RefId>;

	/// Encoded state vector of the stored document.
	async fn retrieve_state_vector(&self, room: &RoomId, doc: &str) -> UsResult<Option<Vec<u8>>> {
		match self.retrieve(room, doc).await? {
			Some(stored) => Ok(Some(state_vector_of(&stored.update)?)),
			None => Ok(None),
		}
	}

	/// Remove fragments that were folded into a compacted update.
	///
	/// Unknown references are ignored.
	async fn delete_references(&self, room: &RoomId, doc: &str, refs: &[RefId]) -> UsResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use yrs::{Doc, GetString, ReadTxn, StateVector, Text, Transact};

	fn text_of(update: &[u8]) -> String {
		let doc = Doc::new();
		let text = doc.get_or_insert_text("content");
		let mut txn = doc.transact_mut();
		let Ok(update) = Update::decode_v1(update) else {
			return String::new();
		};
		assert!(txn.apply_update(update).is_ok());
		text.get_string(&txn)
	}

	#[test]
	fn test_merge_fragments_combines_edits() {
		let doc = Doc::new();
		let text = doc.get_or_insert_text("content");
		text.insert(&mut doc.transact_mut(), 0, "abc");
		let first = doc.transact().encode_state_as_update_v1(&StateVector::default());
		let sv = doc.transact().state_vector();
		text.push(&mut doc.transact_mut(), "def");
		let second = doc.transact().encode_state_as_update_v1(&sv);

		let merged = merge_fragments(&[&second, &first]).expect("merge failed");
		assert_eq!(text_of(&merged), "abcdef");
	}

	#[test]
	fn test_merge_rejects_garbage() {
		let res = merge_fragments(&[vec![0xff, 0xff, 0xff]]);
		assert!(matches!(res, Err(Error::Decode(_))));
	}

	#[test]
	fn test_state_vector_of() {
		let doc = Doc::new();
		let text = doc.get_or_insert_text("content");
		text.insert(&mut doc.transact_mut(), 0, "xyz");
		let update = doc.transact().encode_state_as_update_v1(&StateVector::default());

		let sv = state_vector_of(&update).expect("state vector");
		assert_eq!(sv, doc.transact().state_vector().encode_v1());
	}
}

// vim: ts=4
