pub use umlsync_types::prelude::*;

// vim: ts=4
