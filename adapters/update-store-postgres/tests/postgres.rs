//! Postgres update store tests
//!
//! Need a disposable database: set `UMLSYNC_TEST_DATABASE_URL`, otherwise the
//! tests return early.

use umlsync_types::types::RoomId;
use umlsync_types::update_store::UpdateStore;
use umlsync_update_store_postgres::UpdateStorePostgres;
use yrs::{Doc, ReadTxn, StateVector, Text, Transact};

async fn create_test_store() -> Option<UpdateStorePostgres> {
	let url = std::env::var("UMLSYNC_TEST_DATABASE_URL").ok()?;
	Some(UpdateStorePostgres::new(&url, 2).await.expect("Failed to connect"))
}

fn random_room() -> RoomId {
	let nanos = std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_nanos())
		.unwrap_or_default();
	format!("test-{}", nanos).into()
}

fn update(content: &str) -> Vec<u8> {
	let doc = Doc::new();
	let text = doc.get_or_insert_text("content");
	text.insert(&mut doc.transact_mut(), 0, content);
	doc.transact().encode_state_as_update_v1(&StateVector::default())
}

#[tokio::test]
async fn test_persist_retrieve_delete() {
	let Some(store) = create_test_store().await else {
		return;
	};
	let room = random_room();

	assert!(store.retrieve(&room, "index").await.expect("retrieve").is_none());

	let r1 = store.persist(&room, "index", &update("A -> B")).await.expect("persist");
	let r2 = store.persist(&room, "index", &update("B -> A")).await.expect("persist");
	assert!(r2 > r1);

	let stored = store.retrieve(&room, "index").await.expect("retrieve").expect("doc");
	let mut references = stored.references.clone();
	references.sort();
	assert_eq!(references, vec![r1, r2]);

	store.delete_references(&room, "index", &[r1, r2]).await.expect("delete");
	assert!(store.retrieve(&room, "index").await.expect("retrieve").is_none());
}

// vim: ts=4
