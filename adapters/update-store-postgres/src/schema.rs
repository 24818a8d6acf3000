//! Database schema

use sqlx::PgPool;

pub(crate) async fn init_db(db: &PgPool) -> Result<(), sqlx::Error> {
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS umlsync_docs_v1 (
			room text NOT NULL,
			doc text NOT NULL,
			r bigserial,
			update bytea NOT NULL,
			PRIMARY KEY (room, doc, r)
		)",
	)
	.execute(db)
	.await?;

	Ok(())
}

// vim: ts=4
