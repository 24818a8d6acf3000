//! Shared types, adapter traits, and error types for umlsync.
//!
//! This crate contains the foundational types that are shared between the
//! sync core, the server, and all adapter implementations. Keeping them in a
//! separate crate lets adapter crates compile in parallel with the core.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod prelude;
pub mod stream_reader;
pub mod types;
pub mod update_store;

// vim: ts=4
