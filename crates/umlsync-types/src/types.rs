//! Common identifier types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Box<str>);

impl RoomId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for RoomId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for RoomId {
	fn from(s: &str) -> Self {
		Self(s.into())
	}
}

impl From<String> for RoomId {
	fn from(s: String) -> Self {
		Self(s.into_boxed_str())
	}
}

impl AsRef<str> for RoomId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Storage-assigned reference of a persisted update fragment.
///
/// Monotonic per store; used by compaction to prune merged fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefId(pub i64);

impl fmt::Display for RefId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

// vim: ts=4
