//! Stream payload codec
//!
//! Payloads use the y-protocols envelope (lib0 varuint tags):
//! ```text
//! [0: sync] [2: update] [len: varuint] [update: len bytes]
//! [0: sync] [other sub-tag] ...            -> ignored
//! [1: awareness] [len: varuint] [awareness update: len bytes]
//! [other tag] ...                          -> ignored
//! ```
//! Unknown tags decode to inert variants so newer writers do not break
//! reconstruction. Truncated input is an [`Error::Decode`].

use yrs::encoding::read::{Cursor, Read};
use yrs::encoding::write::Write;

use crate::prelude::*;

pub const MSG_SYNC: u64 = 0;
pub const MSG_AWARENESS: u64 = 1;

pub const MSG_SYNC_STEP1: u64 = 0;
pub const MSG_SYNC_STEP2: u64 = 1;
pub const MSG_SYNC_UPDATE: u64 = 2;

/// A decoded stream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPayload {
	/// Yjs v1 update to merge into the document
	SyncUpdate(Vec<u8>),
	/// Sync message with a sub-tag other than update
	SyncOther(u64),
	/// Encoded awareness update
	Awareness(Vec<u8>),
	/// Message with an unknown top-level tag
	Unknown(u64),
}

impl StreamPayload {
	pub fn decode(buf: &[u8]) -> UsResult<Self> {
		let mut cursor = Cursor::new(buf);
		let payload = match cursor.read_var::<u64>()? {
			MSG_SYNC => match cursor.read_var::<u64>()? {
				MSG_SYNC_UPDATE => StreamPayload::SyncUpdate(cursor.read_buf()?.to_vec()),
				sub => StreamPayload::SyncOther(sub),
			},
			MSG_AWARENESS => StreamPayload::Awareness(cursor.read_buf()?.to_vec()),
			tag => StreamPayload::Unknown(tag),
		};
		Ok(payload)
	}

	/// Encode back into the envelope. Inert variants have nothing to carry.
	pub fn encode(&self) -> Option<Vec<u8>> {
		match self {
			StreamPayload::SyncUpdate(update) => Some(encode_sync_update(update)),
			StreamPayload::Awareness(update) => Some(encode_awareness(update)),
			StreamPayload::SyncOther(_) | StreamPayload::Unknown(_) => None,
		}
	}
}

pub fn encode_sync_update(update: &[u8]) -> Vec<u8> {
	let mut buf = Vec::with_capacity(update.len() + 8);
	buf.write_var(MSG_SYNC);
	buf.write_var(MSG_SYNC_UPDATE);
	buf.write_buf(update);
	buf
}

pub fn encode_awareness(update: &[u8]) -> Vec<u8> {
	let mut buf = Vec::with_capacity(update.len() + 8);
	buf.write_var(MSG_AWARENESS);
	buf.write_buf(update);
	buf
}

#[cfg(test)]
mod tests {
	use super::*;
	use yrs::sync::{Message, SyncMessage};
	use yrs::updates::encoder::Encode;

	#[test]
	fn test_decode_sync_update() {
		let buf = [0, 2, 3, 0xaa, 0xbb, 0xcc];
		let payload = StreamPayload::decode(&buf).expect("decode");
		assert_eq!(payload, StreamPayload::SyncUpdate(vec![0xaa, 0xbb, 0xcc]));
	}

	#[test]
	fn test_matches_yrs_sync_message() {
		let update = vec![1, 0, 5, 7, 9];
		let ours = encode_sync_update(&update);
		let theirs = Message::Sync(SyncMessage::Update(update.clone())).encode_v1();
		assert_eq!(ours, theirs);
		assert_eq!(StreamPayload::decode(&theirs).expect("decode"), StreamPayload::SyncUpdate(update));
	}

	#[test]
	fn test_decode_awareness() {
		let payload = StreamPayload::decode(&encode_awareness(&[4, 5])).expect("decode");
		assert_eq!(payload, StreamPayload::Awareness(vec![4, 5]));
	}

	#[test]
	fn test_other_sync_subtags_are_inert() {
		let payload = StreamPayload::decode(&[0, 0, 1, 0]).expect("decode");
		assert_eq!(payload, StreamPayload::SyncOther(MSG_SYNC_STEP1));
		let payload = StreamPayload::decode(&[0, 1, 0]).expect("decode");
		assert_eq!(payload, StreamPayload::SyncOther(MSG_SYNC_STEP2));
		assert_eq!(payload.encode(), None);
	}

	#[test]
	fn test_unknown_tag_is_inert() {
		// multi-byte varuint tag (300)
		let payload = StreamPayload::decode(&[0xac, 0x02, 9, 9, 9]).expect("decode");
		assert_eq!(payload, StreamPayload::Unknown(300));
	}

	#[test]
	fn test_truncated_input() {
		assert!(matches!(StreamPayload::decode(&[]), Err(Error::Decode(_))));
		assert!(matches!(StreamPayload::decode(&[0]), Err(Error::Decode(_))));
		// length prefix says 5 bytes, only 2 present
		assert!(matches!(StreamPayload::decode(&[0, 2, 5, 1, 2]), Err(Error::Decode(_))));
		assert!(matches!(StreamPayload::decode(&[1, 3, 1]), Err(Error::Decode(_))));
	}
}

// vim: ts=4
