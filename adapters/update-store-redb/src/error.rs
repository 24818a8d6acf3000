//! Error types for the redb update store

use std::fmt;

/// Update store specific errors
#[derive(Debug)]
pub enum Error {
	/// Database operation error
	DbError(String),

	/// I/O error
	IoError(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::DbError(msg) => write!(f, "Database error: {}", msg),
			Error::IoError(msg) => write!(f, "I/O error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<Error> for umlsync_types::error::Error {
	fn from(err: Error) -> Self {
		umlsync_types::error::Error::Storage(err.to_string())
	}
}

/// Helper to convert redb errors
pub fn db_error<E: fmt::Display>(context: &'static str) -> impl FnOnce(E) -> Error {
	move |err| Error::DbError(format!("{}: {}", context, err))
}

// vim: ts=4
