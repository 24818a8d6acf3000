use std::sync::Arc;

use umlsync_server::{AppBuilder, init_tracing};
use umlsync_server::config::{Config, StoreKind};
use umlsync_stream_redis::RedisStreamReader;
use umlsync_types::prelude::*;
use umlsync_types::update_store::UpdateStore;
use umlsync_update_store_postgres::UpdateStorePostgres;
use umlsync_update_store_redb::UpdateStoreRedb;

async fn run() -> UsResult<()> {
	init_tracing()?;
	let config = Config::from_env()?;

	let update_store: Arc<dyn UpdateStore> = match config.store {
		StoreKind::Postgres => Arc::new(
			UpdateStorePostgres::new(&config.database_url, config.db_max_connections).await?,
		),
		StoreKind::Redb => Arc::new(UpdateStoreRedb::new(&config.db_dir).await?),
	};
	let stream =
		Arc::new(RedisStreamReader::new(&config.redis_url, config.redis_prefix.clone()).await?);

	let mut builder = AppBuilder::new();
	builder
		.listen(config.listen.clone())
		.text_field(config.text_field.clone())
		.update_store(update_store)
		.stream_reader(stream.clone())
		.stream_writer(stream);
	builder.run().await
}

#[tokio::main]
async fn main() {
	if let Err(err) = run().await {
		error!("FATAL: {}", err);
		eprintln!("umlsync: {}", err);
		std::process::exit(1);
	}
}

// vim: ts=4
