//! Real-time document synchronization core for umlsync.
//!
//! Reconstructs a room's Yjs document from the durable update store and the
//! pending replication stream:
//!
//! - [`key`]: stream name codec (`{prefix}:room:{room}:{doc}`)
//! - [`group`]: grouping of raw stream replies per room and document
//! - [`payload`]: sync/awareness envelope codec
//! - [`reconstruct`]: the [`Reconstructor`] merging it all into a fresh document
//! - [`projection`]: text and state projections of a document

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod prelude;

pub mod awareness;
pub mod group;
pub mod key;
pub mod payload;
pub mod projection;
pub mod reconstruct;

pub use reconstruct::{ReconstructedDoc, Reconstructor, ReconstructorOpts};

// vim: ts=4
