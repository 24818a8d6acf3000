//! Redb-based durable update store
//!
//! Implements the UpdateStore trait using redb for persistent storage of
//! binary Yjs update fragments. Intended for single-node deployments and
//! tests; production clusters use the Postgres store.
//!
//! # Storage Layout
//!
//! All rooms share one redb file: `{storage_path}/updates.db`
//! - `updates` - fragments indexed by (room, doc, reference)
//! - `counters` - the last reference handed out
//!
//! References are allocated inside the write transaction that stores the
//! fragment, so they are strictly increasing across the whole file.

use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use umlsync_types::error::UsResult;
use umlsync_types::types::{RefId, RoomId};
use umlsync_types::update_store::{StoredDoc, UpdateStore, merge_fragments};

mod error;
pub use error::Error;
use error::db_error;

// Storage table definitions
mod tables {
	use redb::TableDefinition;

	/// Stores binary update fragments: (room, doc, reference) -> update_bytes
	pub const TABLE_UPDATES: TableDefinition<(&str, &str, u64), &[u8]> =
		TableDefinition::new("umlsync_updates");

	/// Stores allocation counters: name -> last value
	pub const TABLE_COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("umlsync_counters");

	pub const COUNTER_REF: &str = "ref";
}

use tables::*;

/// Update store using redb for storage
pub struct UpdateStoreRedb {
	/// Database file
	db_path: PathBuf,

	db: Arc<redb::Database>,
}

impl UpdateStoreRedb {
	/// Open (or create) the update store under `storage_path`
	pub async fn new(storage_path: impl AsRef<Path>) -> UsResult<Self> {
		let storage_path = storage_path.as_ref();

		std::fs::create_dir_all(storage_path).map_err(|e| {
			Error::IoError(format!("Failed to create storage directory: {}", e))
		})?;
		let db_path = storage_path.join("updates.db");

		debug!("Initializing update store at {:?}", db_path);

		let db = redb::Database::create(&db_path).map_err(db_error("Failed to open database"))?;

		// Create tables if they don't exist
		let tx = db.begin_write().map_err(db_error("Failed to begin write transaction"))?;
		tx.open_table(TABLE_UPDATES).map_err(db_error("Failed to create updates table"))?;
		tx.open_table(TABLE_COUNTERS).map_err(db_error("Failed to create counters table"))?;
		tx.commit().map_err(db_error("Failed to commit table creation"))?;

		Ok(Self { db_path, db: Arc::new(db) })
	}

	fn read_fragments(&self, room: &str, doc: &str) -> Result<Vec<(RefId, Vec<u8>)>, Error> {
		let tx = self.db.begin_read().map_err(db_error("Failed to begin read transaction"))?;
		let table = tx.open_table(TABLE_UPDATES).map_err(db_error("Failed to open updates table"))?;

		let range = table
			.range((room, doc, 0u64)..=(room, doc, u64::MAX))
			.map_err(db_error("Failed to read updates"))?;

		let mut fragments = Vec::new();
		for item in range {
			let (key, value) = item.map_err(db_error("Failed to iterate updates"))?;
			let (_, _, r) = key.value();
			let r = i64::try_from(r).map_err(db_error("Reference out of range"))?;
			fragments.push((RefId(r), value.value().to_vec()));
		}
		Ok(fragments)
	}
}

#[async_trait]
impl UpdateStore for UpdateStoreRedb {
	async fn retrieve(&self, room: &RoomId, doc: &str) -> UsResult<Option<StoredDoc>> {
		let fragments = self.read_fragments(room.as_str(), doc)?;
		trace!("Got {} fragments for {}/{}", fragments.len(), room, doc);

		if fragments.is_empty() {
			return Ok(None);
		}
		let (references, updates): (Vec<RefId>, Vec<Vec<u8>>) = fragments.into_iter().unzip();
		Ok(Some(StoredDoc { update: merge_fragments(&updates)?, references }))
	}

	async fn persist(&self, room: &RoomId, doc: &str, update: &[u8]) -> UsResult<RefId> {
		let tx = self.db.begin_write().map_err(db_error("Failed to begin write transaction"))?;

		let r = {
			let mut counters =
				tx.open_table(TABLE_COUNTERS).map_err(db_error("Failed to open counters table"))?;
			let last = counters
				.get(COUNTER_REF)
				.map_err(db_error("Failed to read counter"))?
				.map_or(0, |v| v.value());
			let next = last + 1;
			counters.insert(COUNTER_REF, next).map_err(db_error("Failed to bump counter"))?;

			let mut updates =
				tx.open_table(TABLE_UPDATES).map_err(db_error("Failed to open updates table"))?;
			updates
				.insert((room.as_str(), doc, next), update)
				.map_err(db_error("Failed to insert update"))?;
			next
		};

		tx.commit().map_err(db_error("Failed to commit update"))?;

		trace!("Stored fragment {} for {}/{} ({} bytes)", r, room, doc, update.len());
		Ok(RefId(i64::try_from(r).map_err(db_error("Reference out of range"))?))
	}

	async fn delete_references(&self, room: &RoomId, doc: &str, refs: &[RefId]) -> UsResult<()> {
		let tx = self.db.begin_write().map_err(db_error("Failed to begin write transaction"))?;

		{
			let mut updates =
				tx.open_table(TABLE_UPDATES).map_err(db_error("Failed to open updates table"))?;
			for r in refs {
				let Ok(r) = u64::try_from(r.0) else {
					continue;
				};
				updates
					.remove((room.as_str(), doc, r))
					.map_err(db_error("Failed to delete update"))?;
			}
		}

		tx.commit().map_err(db_error("Failed to commit deletion"))?;

		debug!("Deleted {} fragments of {}/{}", refs.len(), room, doc);
		Ok(())
	}
}

impl std::fmt::Debug for UpdateStoreRedb {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UpdateStoreRedb").field("db_path", &self.db_path).finish()
	}
}

// vim: ts=4
