pub use crate::error::{Error, UsResult};
pub use crate::types::{RefId, RoomId};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, trace, warn, warn_span};

// vim: ts=4
