//! Grouping of raw stream replies by room and document

use std::collections::HashMap;

use umlsync_types::stream_reader::StreamReply;

use crate::key::decode_key;
use crate::prelude::*;

/// Pending messages of one document, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocMessages {
	/// Id of the last stream entry seen for this document
	pub last_id: Box<str>,

	pub messages: Vec<Vec<u8>>,
}

/// room -> doc -> pending messages
pub type GroupedMessages = HashMap<RoomId, HashMap<Box<str>, DocMessages>>;

/// Group a stream reply by the `(room, doc)` decoded from each stream name.
///
/// Entries without a payload still advance `last_id`. A stream name that does
/// not decode fails the whole call, even when the stream carries no messages:
/// without it the payloads cannot be routed.
pub fn group_messages(reply: StreamReply, prefix: &str) -> UsResult<GroupedMessages> {
	let mut grouped = GroupedMessages::new();

	for entry in reply {
		let name = std::str::from_utf8(&entry.name)
			.map_err(|_| Error::MalformedStreamKey(String::from_utf8_lossy(&entry.name).into()))?;
		let key = decode_key(name, prefix)?;
		if entry.messages.is_empty() {
			continue;
		}

		let doc_messages =
			grouped.entry(key.room).or_default().entry(key.doc).or_insert_with(|| DocMessages {
				last_id: "0".into(),
				messages: Vec::new(),
			});
		for message in entry.messages {
			doc_messages.last_id = message.id;
			if let Some(payload) = message.payload {
				doc_messages.messages.push(payload);
			}
		}
	}

	Ok(grouped)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::key::compute_key;
	use umlsync_types::stream_reader::{StreamEntry, StreamMessage};

	fn msg(id: &str, payload: Option<&[u8]>) -> StreamMessage {
		StreamMessage { id: id.into(), payload: payload.map(<[u8]>::to_vec) }
	}

	#[test]
	fn test_group_by_room_and_doc() {
		let reply = vec![
			StreamEntry::new(
				compute_key(&"r1".into(), "index", "y"),
				vec![msg("1-0", Some(&[1])), msg("2-0", None), msg("3-0", Some(&[3]))],
			),
			StreamEntry::new(compute_key(&"r:2".into(), "index", "y"), vec![msg("4-0", Some(&[4]))]),
		];

		let grouped = group_messages(reply, "y").expect("group");
		let r1 = &grouped[&RoomId::from("r1")]["index"];
		assert_eq!(&*r1.last_id, "3-0");
		assert_eq!(r1.messages, vec![vec![1], vec![3]]);

		let r2 = &grouped[&RoomId::from("r:2")]["index"];
		assert_eq!(&*r2.last_id, "4-0");
		assert_eq!(r2.messages, vec![vec![4]]);
	}

	#[test]
	fn test_trailing_entry_without_payload_advances_last_id() {
		let reply = vec![StreamEntry::new(
			compute_key(&"r1".into(), "index", "y"),
			vec![msg("1-0", Some(&[1])), msg("9-0", None)],
		)];
		let grouped = group_messages(reply, "y").expect("group");
		assert_eq!(&*grouped[&RoomId::from("r1")]["index"].last_id, "9-0");
	}

	#[test]
	fn test_empty_reply() {
		assert!(group_messages(Vec::new(), "y").expect("group").is_empty());
	}

	#[test]
	fn test_malformed_name_fails() {
		let reply = vec![StreamEntry::new("garbage", vec![msg("1-0", Some(&[1]))])];
		assert!(matches!(group_messages(reply, "y"), Err(Error::MalformedStreamKey(_))));

		let reply = vec![StreamEntry::new(vec![0xff, 0xfe], vec![msg("1-0", Some(&[1]))])];
		assert!(matches!(group_messages(reply, "y"), Err(Error::MalformedStreamKey(_))));
	}

	#[test]
	fn test_malformed_name_without_messages_fails() {
		let reply = vec![StreamEntry::new("garbage-not-a-key", Vec::new())];
		assert!(matches!(group_messages(reply, "y"), Err(Error::MalformedStreamKey(_))));
	}

	#[test]
	fn test_valid_name_without_messages_is_skipped() {
		let reply = vec![StreamEntry::new(compute_key(&"r1".into(), "index", "y"), Vec::new())];
		assert!(group_messages(reply, "y").expect("group").is_empty());
	}
}

// vim: ts=4
