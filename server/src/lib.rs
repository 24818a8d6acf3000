//! umlsync server: text projection endpoints and the room relay.
//!
//! The HTTP surface exposes the reconstructed PlantUML source of a room and
//! its full Yjs state. The WebSocket relay seeds newly connected clients with
//! the reconstructed state and fans out room events between members.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod prelude;
pub mod room;
pub mod routes;
pub mod uml;
pub mod websocket;

pub use crate::app::{App, AppBuilder, AppState, init_tracing};

// vim: ts=4
