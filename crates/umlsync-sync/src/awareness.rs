//! Throwaway awareness for reconstruction sessions
//!
//! Presence updates found in the stream are applied here so they never reach
//! the document. The local state is cleared on creation and nothing observes
//! or re-encodes this awareness, so a reconstruction never announces itself.

use yrs::Doc;
use yrs::sync::Awareness;
use yrs::sync::awareness::AwarenessUpdate;
use yrs::updates::decoder::Decode;

use crate::prelude::*;

pub struct DisposableAwareness {
	inner: Awareness,
	applied: usize,
}

impl DisposableAwareness {
	pub fn new(doc: Doc) -> Self {
		let mut inner = Awareness::new(doc);
		inner.clean_local_state();
		Self { inner, applied: 0 }
	}

	/// Apply an encoded awareness update.
	pub fn apply(&mut self, update: &[u8]) -> UsResult<()> {
		let update = AwarenessUpdate::decode_v1(update)?;
		self.inner
			.apply_update(update)
			.map_err(|e| Error::Decode(format!("awareness update: {}", e)))?;
		self.applied += 1;
		Ok(())
	}

	pub fn has_local_state(&self) -> bool {
		self.inner.local_state_raw().is_some()
	}

	/// Number of awareness updates absorbed.
	pub fn applied(&self) -> usize {
		self.applied
	}
}

impl std::fmt::Debug for DisposableAwareness {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DisposableAwareness").field("applied", &self.applied).finish()
	}
}

// vim: ts=4
