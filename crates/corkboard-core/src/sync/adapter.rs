//! Entity sync adapter

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{ImageBlob, LocalId, RecordId};
use crate::record::{fields, FieldValue, Fields, Record, SyncEntity};
use crate::store::{AssetStore, Predicate, RecordStore};
use crate::util::log_excerpt;

use super::debounce::DebounceSlot;
use super::retry::{save_with_conflict_retry, Mutation};

/// Remote id of an entity whose first create went through this adapter.
/// Holding the cell's lock serializes saves of a not-yet-created entity.
type CreateCell = Arc<Mutex<Option<RecordId>>>;

/// Checked when a debounced save fires. An error is reported to the caller
/// instead of writing.
pub type SaveGate = Arc<dyn Fn() -> Result<()> + Send + Sync>;

struct Inner {
    store: Arc<dyn RecordStore>,
    assets: Arc<dyn AssetStore>,
    config: SyncConfig,
    debounce: Arc<DebounceSlot>,
    gate: Option<SaveGate>,
    /// Entries live until the caller saves a copy carrying the remote id,
    /// or deletes the entity.
    creates: Mutex<HashMap<LocalId, CreateCell>>,
}

/// Debounced, conflict-retrying persistence for one entity kind.
///
/// One instance per kind and board view. Clones share the same debounce slot,
/// so a `request_save` through any clone supersedes the pending one.
pub struct EntitySyncAdapter<E> {
    inner: Arc<Inner>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntitySyncAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _entity: PhantomData,
        }
    }
}

/// Outcome of a debounced save.
#[derive(Debug)]
pub struct SaveTicket<E> {
    receiver: oneshot::Receiver<Result<E>>,
}

impl<E> SaveTicket<E> {
    /// Wait for the save. `None` when a later request superseded this one
    /// before its timer fired.
    pub async fn outcome(self) -> Option<Result<E>> {
        self.receiver.await.ok()
    }
}

impl<E: SyncEntity> EntitySyncAdapter<E> {
    pub fn new(
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        config: SyncConfig,
    ) -> Self {
        Self::build(store, assets, config, None)
    }

    /// An adapter whose debounced saves only run while `gate` passes.
    pub fn gated(
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        config: SyncConfig,
        gate: SaveGate,
    ) -> Self {
        Self::build(store, assets, config, Some(gate))
    }

    fn build(
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        config: SyncConfig,
        gate: Option<SaveGate>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                assets,
                config,
                debounce: Arc::new(DebounceSlot::default()),
                gate,
                creates: Mutex::new(HashMap::new()),
            }),
            _entity: PhantomData,
        }
    }

    /// Schedule a save of `entity` after the debounce delay.
    ///
    /// Replaces any save scheduled by this adapter whose timer has not fired;
    /// the replaced request is dropped and its `on_complete` never runs.
    /// Must be called from within a Tokio runtime.
    pub fn request_save<F>(&self, entity: E, board_id: RecordId, on_complete: F)
    where
        F: FnOnce(Result<E>) + Send + 'static,
    {
        let adapter = self.clone();
        let delay = self.inner.config.debounce();
        tracing::debug!(
            "Scheduling {} save for {} in {:?}",
            E::KIND,
            entity.local_id(),
            delay
        );
        self.inner.debounce.schedule(delay, async move {
            let result = match adapter.inner.gate.as_ref().map_or(Ok(()), |gate| gate()) {
                Ok(()) => adapter.save_now(entity, board_id).await,
                Err(error) => Err(error),
            };
            if let Err(error) = &result {
                tracing::warn!("Failed to save {}: {}", E::KIND, error);
            }
            on_complete(result);
        });
    }

    /// Like [`Self::request_save`], returning a ticket instead of taking a callback.
    pub fn request_save_ticket(&self, entity: E, board_id: RecordId) -> SaveTicket<E> {
        let (sender, receiver) = oneshot::channel();
        self.request_save(entity, board_id, move |result| {
            let _ = sender.send(result);
        });
        SaveTicket { receiver }
    }

    /// Drop the scheduled save, if its timer has not fired yet.
    pub fn cancel_pending(&self) -> bool {
        self.inner.debounce.cancel()
    }

    pub fn has_pending(&self) -> bool {
        self.inner.debounce.is_pending()
    }

    /// Persist `entity` immediately and return it with its remote id set.
    pub async fn save_now(&self, mut entity: E, board_id: RecordId) -> Result<E> {
        entity.set_board_id(board_id);
        let outgoing = self.outgoing_fields(&entity).await?;

        if let Some(id) = entity.remote_id().cloned() {
            self.overwrite(&id, &outgoing).await?;
            self.inner.creates.lock().await.remove(&entity.local_id());
            return Ok(entity);
        }

        let cell = self.create_cell(entity.local_id()).await;
        let mut created = cell.lock().await;
        if let Some(id) = created.clone() {
            drop(created);
            self.overwrite(&id, &outgoing).await?;
            entity.set_remote_id(id);
            return Ok(entity);
        }

        let record = self.inner.store.create(E::KIND, outgoing).await?;
        tracing::info!(
            "Created {} {} for {}",
            E::KIND,
            record.id,
            entity.local_id()
        );
        *created = Some(record.id.clone());
        entity.set_remote_id(record.id);
        Ok(entity)
    }

    /// Load every entity of this kind on `board_id`.
    ///
    /// Records that cannot be mapped are skipped with a warning; a missing
    /// image blob leaves the entity without an image.
    pub async fn fetch_all(&self, board_id: &RecordId) -> Result<Vec<E>> {
        let predicate =
            Predicate::equals(fields::BOARD_REF, FieldValue::Reference(board_id.clone()));
        let records = self.inner.store.query(E::KIND, &predicate).await?;
        tracing::debug!("Fetched {} {} records for board {}", records.len(), E::KIND, board_id);

        let mut entities = Vec::with_capacity(records.len());
        for record in records {
            let image = self.download_image(&record).await?;
            match E::from_record(&record, image) {
                Ok(entity) => entities.push(entity),
                Err(error) => tracing::warn!(
                    "Skipping {} {}: {}",
                    record.kind,
                    record.id,
                    log_excerpt(&error.to_string())
                ),
            }
        }
        Ok(entities)
    }

    /// Delete the remote record of `entity`.
    pub async fn delete(&self, entity: &E) -> Result<()> {
        let Some(id) = entity.remote_id() else {
            return Err(Error::InvalidReference(format!(
                "{} {} was never saved",
                E::KIND,
                entity.local_id()
            )));
        };
        self.inner.store.delete(id).await?;
        self.inner.creates.lock().await.remove(&entity.local_id());
        tracing::info!("Deleted {} {}", E::KIND, id);
        Ok(())
    }

    async fn outgoing_fields(&self, entity: &E) -> Result<Fields> {
        let mut outgoing = Fields::new();
        entity.write_fields(&mut outgoing);
        outgoing.set(
            fields::BOARD_REF,
            FieldValue::Reference(entity.board_id().clone()),
        );
        if let Some(blob) = entity.image() {
            let asset = self.inner.assets.put(blob).await?;
            outgoing.set(fields::IMAGE, FieldValue::Asset(asset));
        }
        Ok(outgoing)
    }

    async fn overwrite(&self, id: &RecordId, outgoing: &Fields) -> Result<Record> {
        let current = self
            .inner
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} {}", E::KIND, id)))?;
        save_with_conflict_retry(
            self.inner.store.as_ref(),
            current,
            self.inner.config.max_conflict_retries,
            |record| {
                record.fields.merge_from(outgoing);
                Ok(Mutation::Changed)
            },
        )
        .await
    }

    async fn create_cell(&self, local_id: LocalId) -> CreateCell {
        let mut creates = self.inner.creates.lock().await;
        Arc::clone(creates.entry(local_id).or_default())
    }

    async fn download_image(&self, record: &Record) -> Result<Option<ImageBlob>> {
        let Some(asset) = record.fields.asset(fields::IMAGE)? else {
            return Ok(None);
        };
        match self.inner.assets.get(asset).await {
            Ok(blob) => Ok(Some(blob)),
            Err(Error::NotFound(_)) => {
                tracing::warn!("Asset {} of {} {} is missing", asset, record.kind, record.id);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, Sticker, StickyNote};
    use crate::record::RecordKind;
    use crate::store::{MemoryAssetStore, MemoryRecordStore, StoreCallCounts};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct Fixture {
        store: Arc<MemoryRecordStore>,
        assets: Arc<MemoryAssetStore>,
        board: RecordId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(MemoryRecordStore::new()),
                assets: Arc::new(MemoryAssetStore::new()),
                board: RecordId::new("board-1"),
            }
        }

        fn adapter<E: SyncEntity>(&self) -> EntitySyncAdapter<E> {
            self.adapter_with(SyncConfig::default())
        }

        fn adapter_with<E: SyncEntity>(&self, config: SyncConfig) -> EntitySyncAdapter<E> {
            EntitySyncAdapter::new(self.store.clone(), self.assets.clone(), config)
        }

        fn note(&self, text: &str) -> StickyNote {
            StickyNote::new(self.board.clone(), Point::new(10.0, 20.0)).with_text(text)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_requests_coalesce_into_one_write() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();
        let mut note = fixture.note("draft");

        let mut tickets = Vec::new();
        for text in ["a", "ab", "abc", "abcd"] {
            note.text = text.to_string();
            tickets.push(adapter.request_save_ticket(note.clone(), fixture.board.clone()));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let last = tickets.pop().unwrap().outcome().await.unwrap().unwrap();
        for superseded in tickets {
            assert!(superseded.outcome().await.is_none());
        }

        let records = fixture.store.records_of(RecordKind::StickyNote).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.text(fields::TEXT).unwrap(), Some("abcd"));
        assert_eq!(last.remote_id.as_ref(), Some(&records[0].id));
        assert_eq!(fixture.store.call_counts().await.creates, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_receives_canonical_entity() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();
        let (sender, receiver) = oneshot::channel();

        adapter.request_save(fixture.note("hello"), fixture.board.clone(), move |result| {
            let _ = sender.send(result);
        });
        assert!(adapter.has_pending());

        let saved = receiver.await.unwrap().unwrap();
        assert!(saved.remote_id.is_some());
        assert_eq!(saved.board_id, fixture.board);
        assert!(!adapter.has_pending());
    }

    #[tokio::test]
    async fn unsaved_entity_is_created_once() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();
        let note = fixture.note("one");

        let first = adapter.save_now(note.clone(), fixture.board.clone()).await.unwrap();
        // The caller's copy still lacks the remote id.
        let second = adapter.save_now(note.with_text("two"), fixture.board.clone()).await.unwrap();

        assert_eq!(first.remote_id, second.remote_id);
        let records = fixture.store.records_of(RecordKind::StickyNote).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fields.text(fields::TEXT).unwrap(), Some("two"));
    }

    #[tokio::test]
    async fn create_tracking_ends_once_remote_id_is_reconciled() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();

        let saved = adapter.save_now(fixture.note("one"), fixture.board.clone()).await.unwrap();
        assert_eq!(adapter.inner.creates.lock().await.len(), 1);

        adapter.save_now(saved.with_text("two"), fixture.board.clone()).await.unwrap();
        assert!(adapter.inner.creates.lock().await.is_empty());
        assert_eq!(fixture.store.records_of(RecordKind::StickyNote).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_gate_stops_a_debounced_save() {
        let fixture = Fixture::new();
        let open = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let flag = Arc::clone(&open);
        let adapter: EntitySyncAdapter<StickyNote> = EntitySyncAdapter::gated(
            fixture.store.clone(),
            fixture.assets.clone(),
            SyncConfig::default(),
            Arc::new(move || {
                if flag.load(std::sync::atomic::Ordering::SeqCst) {
                    Ok(())
                } else {
                    Err(Error::BoardExpired("board-1".to_string()))
                }
            }),
        );

        let ticket = adapter.request_save_ticket(fixture.note("late"), fixture.board.clone());
        open.store(false, std::sync::atomic::Ordering::SeqCst);

        let outcome = ticket.outcome().await.unwrap();
        assert!(matches!(outcome, Err(Error::BoardExpired(_))));
        assert_eq!(fixture.store.call_counts().await, StoreCallCounts::default());
    }

    #[tokio::test]
    async fn concurrent_first_saves_share_one_create() {
        let fixture = Fixture::new();
        let store = Arc::new(MemoryRecordStore::new().with_latency(Duration::from_millis(20)));
        let adapter: EntitySyncAdapter<StickyNote> =
            EntitySyncAdapter::new(store.clone(), fixture.assets.clone(), SyncConfig::default());
        let note = fixture.note("race");

        let (left, right) = tokio::join!(
            adapter.save_now(note.clone(), fixture.board.clone()),
            adapter.save_now(note.clone(), fixture.board.clone()),
        );

        assert_eq!(left.unwrap().remote_id, right.unwrap().remote_id);
        assert_eq!(store.call_counts().await.creates, 1);
    }

    #[tokio::test]
    async fn conflicts_are_retried_and_caller_wins() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();
        let saved = adapter.save_now(fixture.note("v1"), fixture.board.clone()).await.unwrap();

        let mut theirs = Fields::new();
        theirs.set(fields::TEXT, FieldValue::Text("theirs".to_string()));
        fixture.store.inject_foreign_writes(4, &theirs).await;

        let mut edited = saved.clone();
        edited.text = "mine".to_string();
        adapter.save_now(edited, fixture.board.clone()).await.unwrap();

        let record = fixture.store.get(saved.remote_id.as_ref().unwrap()).await.unwrap();
        assert_eq!(record.fields.text(fields::TEXT).unwrap(), Some("mine"));
        assert_eq!(fixture.store.call_counts().await.conditional_saves, 5);
    }

    #[tokio::test]
    async fn conflicts_past_the_bound_are_reported() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter_with::<StickyNote>(SyncConfig {
            max_conflict_retries: 2,
            ..SyncConfig::default()
        });
        let saved = adapter.save_now(fixture.note("v1"), fixture.board.clone()).await.unwrap();
        fixture.store.inject_foreign_writes(10, &Fields::new()).await;

        let error = adapter.save_now(saved, fixture.board.clone()).await.unwrap_err();
        assert!(matches!(error, Error::ConflictExhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn saving_a_deleted_record_is_not_found() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();
        let saved = adapter.save_now(fixture.note("gone"), fixture.board.clone()).await.unwrap();
        adapter.delete(&saved).await.unwrap();

        let error = adapter.save_now(saved, fixture.board.clone()).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();
        let saved = adapter.save_now(fixture.note("v1"), fixture.board.clone()).await.unwrap();
        fixture.store.set_unreachable(true).await;

        let error = adapter.save_now(saved, fixture.board.clone()).await.unwrap_err();
        assert!(matches!(error, Error::Transport(_)));
        assert_eq!(fixture.store.call_counts().await.fetches, 1);
    }

    #[tokio::test]
    async fn deleting_unsaved_entity_never_calls_the_store() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();

        let error = adapter.delete(&fixture.note("local")).await.unwrap_err();
        assert!(matches!(error, Error::InvalidReference(_)));
        assert_eq!(fixture.store.call_counts().await, StoreCallCounts::default());
    }

    #[tokio::test]
    async fn fetch_all_on_empty_board_is_empty() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<Sticker>();
        let stickers = adapter.fetch_all(&fixture.board).await.unwrap();
        assert!(stickers.is_empty());
    }

    #[tokio::test]
    async fn images_travel_through_the_asset_store() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<Sticker>();
        let sticker = Sticker::new(
            fixture.board.clone(),
            ImageBlob::png(vec![1, 2, 3]),
            Point::new(5.0, 5.0),
        );
        adapter.save_now(sticker, fixture.board.clone()).await.unwrap();

        let other_board = fixture.adapter::<Sticker>();
        let fetched = other_board.fetch_all(&fixture.board).await.unwrap();

        assert_eq!(fixture.assets.len().await, 1);
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].image.bytes, vec![1, 2, 3]);
        assert!(fetched[0].remote_id.is_some());
    }

    #[tokio::test]
    async fn fetch_all_only_returns_items_of_the_board() {
        let fixture = Fixture::new();
        let adapter = fixture.adapter::<StickyNote>();
        adapter.save_now(fixture.note("mine"), fixture.board.clone()).await.unwrap();
        let elsewhere = StickyNote::new(RecordId::new("board-2"), Point::default());
        adapter.save_now(elsewhere, RecordId::new("board-2")).await.unwrap();

        let notes = adapter.fetch_all(&fixture.board).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text, "mine");
    }
}
