//! Postgres-based durable update store
//!
//! Fragments live in one append-only table:
//! ```text
//! umlsync_docs_v1 (room text, doc text, r bigserial, update bytea)
//! ```
//! `r` is assigned by Postgres and serves as the fragment reference. Reads
//! merge every row of a (room, doc) pair; row order is irrelevant because the
//! merge is a CRDT merge.

use async_trait::async_trait;
use sqlx::{
	Row,
	postgres::{PgPool, PgPoolOptions},
};
use tracing::{debug, trace, warn};

use umlsync_types::error::{Error, UsResult};
use umlsync_types::types::{RefId, RoomId};
use umlsync_types::update_store::{StoredDoc, UpdateStore, merge_fragments};

mod schema;

fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

fn storage_error(err: sqlx::Error) -> Error {
	inspect(&err);
	Error::Storage(err.to_string())
}

#[derive(Debug, Clone)]
pub struct UpdateStorePostgres {
	db: PgPool,
}

impl UpdateStorePostgres {
	/// Connect to `url` and create the schema if missing
	pub async fn new(url: &str, max_connections: u32) -> UsResult<Self> {
		let db = PgPoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await
			.map_err(storage_error)?;

		Self::from_pool(db).await
	}

	/// Use an existing pool; the schema is created if missing
	pub async fn from_pool(db: PgPool) -> UsResult<Self> {
		schema::init_db(&db).await.map_err(storage_error)?;
		debug!("Update store schema ready");
		Ok(Self { db })
	}
}

#[async_trait]
impl UpdateStore for UpdateStorePostgres {
	async fn retrieve(&self, room: &RoomId, doc: &str) -> UsResult<Option<StoredDoc>> {
		let rows = sqlx::query("SELECT update, r FROM umlsync_docs_v1 WHERE room = $1 AND doc = $2")
			.bind(room.as_str())
			.bind(doc)
			.fetch_all(&self.db)
			.await
			.map_err(storage_error)?;

		if rows.is_empty() {
			return Ok(None);
		}

		let mut updates = Vec::with_capacity(rows.len());
		let mut references = Vec::with_capacity(rows.len());
		for row in rows {
			updates.push(row.try_get::<Vec<u8>, _>("update").map_err(storage_error)?);
			references.push(RefId(row.try_get::<i64, _>("r").map_err(storage_error)?));
		}
		trace!("Got {} fragments for {}/{}", references.len(), room, doc);

		Ok(Some(StoredDoc { update: merge_fragments(&updates)?, references }))
	}

	async fn persist(&self, room: &RoomId, doc: &str, update: &[u8]) -> UsResult<RefId> {
		let row = sqlx::query(
			"INSERT INTO umlsync_docs_v1 (room, doc, update) VALUES ($1, $2, $3) RETURNING r",
		)
		.bind(room.as_str())
		.bind(doc)
		.bind(update)
		.fetch_one(&self.db)
		.await
		.map_err(storage_error)?;

		let r = RefId(row.try_get::<i64, _>("r").map_err(storage_error)?);
		trace!("Stored fragment {} for {}/{} ({} bytes)", r, room, doc, update.len());
		Ok(r)
	}

	async fn delete_references(&self, room: &RoomId, doc: &str, refs: &[RefId]) -> UsResult<()> {
		if refs.is_empty() {
			return Ok(());
		}
		let refs: Vec<i64> = refs.iter().map(|r| r.0).collect();

		let res = sqlx::query("DELETE FROM umlsync_docs_v1 WHERE room = $1 AND doc = $2 AND r = ANY($3)")
			.bind(room.as_str())
			.bind(doc)
			.bind(&refs)
			.execute(&self.db)
			.await
			.map_err(storage_error)?;

		debug!("Deleted {} fragments of {}/{}", res.rows_affected(), room, doc);
		Ok(())
	}
}

// vim: ts=4
