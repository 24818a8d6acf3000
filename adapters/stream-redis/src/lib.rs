//! Redis streams reader and writer
//!
//! Each room document has its own stream named by
//! [`compute_key`](umlsync_sync::key::compute_key). Entries carry the encoded
//! message in field `m`. A read is a single `XREAD STREAMS <key> 0`: it
//! returns everything currently in the stream and never blocks. Appends are
//! `XADD <key> * m <payload>`.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use redis::streams::StreamReadReply;
use tracing::{debug, trace, warn};

use umlsync_sync::key::compute_key;
use umlsync_types::error::{Error, UsResult};
use umlsync_types::stream_reader::{
	StreamEntry, StreamMessage, StreamReader, StreamReply, StreamWriter,
};
use umlsync_types::types::RoomId;

/// Stream entry field holding the binary message.
pub const PAYLOAD_FIELD: &str = "m";

fn stream_error(err: redis::RedisError) -> Error {
	warn!("Redis: {}", err);
	Error::StreamRead(err.to_string())
}

#[derive(Clone)]
pub struct RedisStreamReader {
	conn: ConnectionManager,
	prefix: Box<str>,
}

impl RedisStreamReader {
	/// Connect to `url`; `prefix` namespaces the stream keys (e.g. `"y"`)
	pub async fn new(url: &str, prefix: impl Into<Box<str>>) -> UsResult<Self> {
		let client = redis::Client::open(url).map_err(stream_error)?;
		let conn = ConnectionManager::new(client).await.map_err(stream_error)?;
		let prefix = prefix.into();
		debug!("Connected to redis stream log (prefix {:?})", prefix);
		Ok(Self { conn, prefix })
	}
}

/// Convert a decoded XREAD reply, keeping payloads as raw bytes.
pub fn into_stream_reply(reply: StreamReadReply) -> StreamReply {
	reply
		.keys
		.into_iter()
		.map(|key| {
			let messages = key
				.ids
				.into_iter()
				.map(|entry| {
					let payload = entry.get::<Vec<u8>>(PAYLOAD_FIELD);
					StreamMessage { id: entry.id.into(), payload }
				})
				.collect();
			StreamEntry::new(key.key, messages)
		})
		.collect()
}

#[async_trait]
impl StreamReader for RedisStreamReader {
	fn prefix(&self) -> &str {
		&self.prefix
	}

	async fn read_pending(&self, room: &RoomId, doc: &str) -> UsResult<Option<StreamReply>> {
		let key = compute_key(room, doc, &self.prefix);
		let mut conn = self.conn.clone();

		let reply: Option<StreamReadReply> =
			conn.xread(&[key.as_str()], &["0"]).await.map_err(stream_error)?;

		let reply = reply.map(into_stream_reply);
		trace!(
			"Read {} pending entries from {}",
			reply.as_ref().map_or(0, |r| r.iter().map(|e| e.messages.len()).sum::<usize>()),
			key
		);
		Ok(reply)
	}
}

#[async_trait]
impl StreamWriter for RedisStreamReader {
	async fn append(&self, room: &RoomId, doc: &str, payload: &[u8]) -> UsResult<Box<str>> {
		let key = compute_key(room, doc, &self.prefix);
		let mut conn = self.conn.clone();

		let id: String =
			conn.xadd(&key, "*", &[(PAYLOAD_FIELD, payload)]).await.map_err(stream_error)?;
		trace!("Appended {} bytes to {} as {}", payload.len(), key, id);
		Ok(id.into())
	}
}

impl std::fmt::Debug for RedisStreamReader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RedisStreamReader").field("prefix", &self.prefix).finish_non_exhaustive()
	}
}


// vim: ts=4
