//! Stream key codec
//!
//! Stream names have the shape `{prefix}:room:{room}:{doc}`. Room and doc are
//! percent-encoded the way `encodeURIComponent` does it, so embedded colons
//! cannot break the layout and keys written by browser clients decode here.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;
use std::sync::LazyLock;

use crate::prelude::*;

/// Characters left unescaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
	.remove(b'-')
	.remove(b'_')
	.remove(b'.')
	.remove(b'!')
	.remove(b'~')
	.remove(b'*')
	.remove(b'\'')
	.remove(b'(')
	.remove(b')');

static KEY_PATTERN: LazyLock<Result<Regex, regex::Error>> =
	LazyLock::new(|| Regex::new(r"^(.*):room:(.*):(.*)$"));

/// Room and document addressed by a stream key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
	pub room: RoomId,
	pub doc: Box<str>,
}

pub fn encode_component(s: &str) -> String {
	utf8_percent_encode(s, URI_COMPONENT).to_string()
}

fn decode_component(s: &str, key: &str) -> UsResult<Box<str>> {
	percent_decode_str(s)
		.decode_utf8()
		.map(|decoded| decoded.into())
		.map_err(|_| Error::MalformedStreamKey(key.into()))
}

/// Stream name of a room document.
pub fn compute_key(room: &RoomId, doc: &str, prefix: &str) -> String {
	format!("{}:room:{}:{}", prefix, encode_component(room.as_str()), encode_component(doc))
}

/// Parse a stream name produced by [`compute_key`].
///
/// Fails with [`Error::MalformedStreamKey`] if the key does not have the
/// expected shape, carries another prefix, or holds invalid percent escapes.
pub fn decode_key(key: &str, expected_prefix: &str) -> UsResult<StreamKey> {
	let pattern = KEY_PATTERN
		.as_ref()
		.map_err(|e| Error::Internal(format!("stream key regex compilation failed: {}", e)))?;

	let caps = pattern.captures(key).ok_or_else(|| Error::MalformedStreamKey(key.into()))?;
	let (Some(prefix), Some(room), Some(doc)) = (caps.get(1), caps.get(2), caps.get(3)) else {
		return Err(Error::MalformedStreamKey(key.into()));
	};
	if prefix.as_str() != expected_prefix {
		return Err(Error::MalformedStreamKey(key.into()));
	}

	Ok(StreamKey {
		room: RoomId(decode_component(room.as_str(), key)?),
		doc: decode_component(doc.as_str(), key)?,
	})
}


// vim: ts=4
