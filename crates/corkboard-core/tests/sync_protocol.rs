//! Save protocol behaviour across adapters sharing one store.

use std::sync::Arc;
use std::time::Duration;

use corkboard_core::config::SyncConfig;
use corkboard_core::models::{Point, RecordId, StickyNote};
use corkboard_core::record::{fields, FieldValue, Fields, RecordKind};
use corkboard_core::store::{MemoryAssetStore, MemoryRecordStore};
use corkboard_core::sync::EntitySyncAdapter;
use pretty_assertions::assert_eq;

fn adapter(store: &Arc<MemoryRecordStore>) -> EntitySyncAdapter<StickyNote> {
    EntitySyncAdapter::new(
        store.clone(),
        Arc::new(MemoryAssetStore::new()),
        SyncConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn two_devices_editing_one_note_converge_on_the_last_save() {
    let store = Arc::new(MemoryRecordStore::new());
    let board = RecordId::new("board-1");
    let alice = adapter(&store);
    let bob = adapter(&store);

    let note = alice
        .save_now(StickyNote::new(board.clone(), Point::default()).with_text("v1"), board.clone())
        .await
        .unwrap();

    let from_alice = alice.request_save_ticket(note.clone().with_text("alice"), board.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;
    let from_bob = bob.request_save_ticket(note.with_text("bob"), board.clone());

    // Saves on different adapters do not supersede each other.
    assert!(from_alice.outcome().await.unwrap().is_ok());
    assert!(from_bob.outcome().await.unwrap().is_ok());

    let records = store.records_of(RecordKind::StickyNote).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields.text(fields::TEXT).unwrap(), Some("bob"));
}

#[tokio::test(start_paused = true)]
async fn debounced_save_outlasts_foreign_conflicts() {
    let store = Arc::new(MemoryRecordStore::new());
    let board = RecordId::new("board-1");
    let notes = adapter(&store);
    let note = notes
        .save_now(StickyNote::new(board.clone(), Point::default()), board.clone())
        .await
        .unwrap();

    let mut foreign = Fields::new();
    foreign.set(fields::TEXT, FieldValue::Text("someone else".to_string()));
    foreign.set(fields::IS_BOLD, FieldValue::Int(1));
    store.inject_foreign_writes(3, &foreign).await;

    let mut edited = note;
    edited.text = "mine".to_string();
    edited.rotation = 15.0;
    let saved = notes
        .request_save_ticket(edited, board.clone())
        .outcome()
        .await
        .unwrap()
        .unwrap();

    let record = store.get(saved.remote_id.as_ref().unwrap()).await.unwrap();
    assert_eq!(record.fields.text(fields::TEXT).unwrap(), Some("mine"));
    assert_eq!(record.fields.double(fields::ROTATION).unwrap(), Some(15.0));
    assert_eq!(record.fields.flag(fields::IS_BOLD).unwrap(), Some(false));
}

#[tokio::test(start_paused = true)]
async fn cancelled_save_never_reaches_the_store() {
    let store = Arc::new(MemoryRecordStore::new());
    let board = RecordId::new("board-1");
    let notes = adapter(&store);

    let ticket = notes.request_save_ticket(StickyNote::new(board.clone(), Point::default()), board);
    assert!(notes.cancel_pending());
    assert!(ticket.outcome().await.is_none());
    assert_eq!(store.call_counts().await.creates, 0);
}
