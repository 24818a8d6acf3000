//! Error type shared by the sync core, the adapters and the server.

use axum::{http::StatusCode, response::IntoResponse};

pub type UsResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Durable update store unreachable or query failed
	Storage(String),
	/// Replication stream transport failure (an empty stream is not an error)
	StreamRead(String),
	/// Stream entry name does not match `{prefix}:room:{room}:{doc}`
	MalformedStreamKey(Box<str>),
	/// Truncated or invalid payload / CRDT update bytes
	Decode(String),
	Config(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<yrs::encoding::read::Error> for Error {
	fn from(err: yrs::encoding::read::Error) -> Self {
		Self::Decode(err.to_string())
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Internal(err.to_string())
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::Storage(msg) => write!(f, "storage error: {}", msg),
			Error::StreamRead(msg) => write!(f, "stream read error: {}", msg),
			Error::MalformedStreamKey(key) => write!(f, "malformed stream key: {:?}", key),
			Error::Decode(msg) => write!(f, "decode error: {}", msg),
			Error::Config(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		tracing::warn!("request failed: {}", self);
		(StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
	}
}


// vim: ts=4
