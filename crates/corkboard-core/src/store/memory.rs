//! In-memory stores used by tests and the offline demo.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{new_asset_name, AssetStore, Predicate, RecordStore};
use crate::error::{Error, Result};
use crate::models::{ImageBlob, RecordId};
use crate::record::{AssetRef, Fields, Record, RecordKind, Revision};

/// Number of calls each store operation received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCallCounts {
    pub creates: usize,
    pub fetches: usize,
    pub queries: usize,
    pub conditional_saves: usize,
    pub deletes: usize,
}

#[derive(Default)]
struct MemoryState {
    records: HashMap<RecordId, Record>,
    counts: StoreCallCounts,
    /// Writes other clients land right before our next conditional saves
    foreign_writes: Vec<Fields>,
    unreachable: bool,
}

/// Record store held in process memory.
///
/// Besides plain storage it can simulate the two failure modes the sync layer
/// cares about: concurrent writers (revision conflicts) and an unreachable
/// backend.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
    revision_counter: Arc<AtomicU64>,
    latency: Option<Duration>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` to mimic a network round trip.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next `count` conditional saves lose a race against another
    /// client that writes `fields` to the same record first.
    pub async fn inject_foreign_writes(&self, count: usize, fields: &Fields) {
        let mut state = self.state.lock().await;
        state
            .foreign_writes
            .extend(std::iter::repeat_with(|| fields.clone()).take(count));
    }

    /// Fail every call with a transport error while set.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().await.unreachable = unreachable;
    }

    pub async fn call_counts(&self) -> StoreCallCounts {
        self.state.lock().await.counts
    }

    pub async fn get(&self, id: &RecordId) -> Option<Record> {
        self.state.lock().await.records.get(id).cloned()
    }

    /// Snapshot of all stored records of one kind.
    pub async fn records_of(&self, kind: RecordKind) -> Vec<Record> {
        let state = self.state.lock().await;
        let mut records: Vec<Record> = state
            .records
            .values()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    fn next_revision(&self) -> Revision {
        let value = self.revision_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Revision::new(format!("rev-{value}"))
    }

    async fn round_trip(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn ensure_reachable(state: &MemoryState) -> Result<()> {
    if state.unreachable {
        Err(Error::Transport("record store unreachable".to_string()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, kind: RecordKind, fields: Fields) -> Result<Record> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        state.counts.creates += 1;
        ensure_reachable(&state)?;

        let mut record = Record::new(RecordId::generate(), kind, fields);
        record.revision = Some(self.next_revision());
        state.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn fetch(&self, id: &RecordId) -> Result<Option<Record>> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        state.counts.fetches += 1;
        ensure_reachable(&state)?;
        Ok(state.records.get(id).cloned())
    }

    async fn query(&self, kind: RecordKind, predicate: &Predicate) -> Result<Vec<Record>> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        state.counts.queries += 1;
        ensure_reachable(&state)?;

        let mut records: Vec<Record> = state
            .records
            .values()
            .filter(|record| record.kind == kind && predicate.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    async fn conditional_save(&self, mut record: Record) -> Result<Record> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        state.counts.conditional_saves += 1;
        ensure_reachable(&state)?;

        if !state.records.contains_key(&record.id) {
            return Err(Error::NotFound(record.id.to_string()));
        }

        if !state.foreign_writes.is_empty() {
            let foreign = state.foreign_writes.remove(0);
            let revision = self.next_revision();
            if let Some(stored) = state.records.get_mut(&record.id) {
                stored.fields.merge_from(&foreign);
                stored.revision = Some(revision);
            }
        }

        let stored_revision = state
            .records
            .get(&record.id)
            .and_then(|stored| stored.revision.clone());
        if stored_revision != record.revision {
            return Err(Error::Conflict(record.id));
        }

        record.revision = Some(self.next_revision());
        state.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        state.counts.deletes += 1;
        ensure_reachable(&state)?;

        state
            .records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

/// Asset store held in process memory.
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    blobs: Arc<Mutex<HashMap<AssetRef, ImageBlob>>>,
}

impl MemoryAssetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn put(&self, blob: &ImageBlob) -> Result<AssetRef> {
        let reference = AssetRef::new(new_asset_name(blob.format));
        self.blobs
            .lock()
            .await
            .insert(reference.clone(), blob.clone());
        Ok(reference)
    }

    async fn get(&self, reference: &AssetRef) -> Result<ImageBlob> {
        self.blobs
            .lock()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("asset {reference}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    fn title(value: &str) -> Fields {
        let mut fields = Fields::new();
        fields.set("title", FieldValue::Text(value.to_string()));
        fields
    }

    #[tokio::test]
    async fn create_assigns_id_and_revision() {
        let store = MemoryRecordStore::new();
        let record = store.create(RecordKind::Board, title("a")).await.unwrap();

        assert!(record.revision.is_some());
        assert_eq!(store.get(&record.id).await, Some(record));
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let store = MemoryRecordStore::new();
        let created = store.create(RecordKind::Board, title("a")).await.unwrap();

        let mut first = created.clone();
        first.fields = title("b");
        store.conditional_save(first).await.unwrap();

        let mut stale = created;
        stale.fields = title("c");
        let error = store.conditional_save(stale).await.unwrap_err();
        assert!(error.is_conflict());
    }

    #[tokio::test]
    async fn foreign_writes_land_before_conflict() {
        let store = MemoryRecordStore::new();
        let created = store.create(RecordKind::Board, title("a")).await.unwrap();
        store.inject_foreign_writes(1, &title("theirs")).await;

        let error = store.conditional_save(created.clone()).await.unwrap_err();
        assert!(error.is_conflict());

        let stored = store.get(&created.id).await.unwrap();
        assert_eq!(stored.fields.text("title").unwrap(), Some("theirs"));
        assert_ne!(stored.revision, created.revision);
    }

    #[tokio::test]
    async fn unreachable_store_fails_with_transport_error() {
        let store = MemoryRecordStore::new();
        store.set_unreachable(true).await;
        let error = store
            .query(RecordKind::Board, &Predicate::equals("x", FieldValue::Int(1)))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Transport(_)));
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let store = MemoryRecordStore::new();
        let error = store.delete(&RecordId::from("nope")).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert_eq!(store.call_counts().await.deletes, 1);
    }

    #[tokio::test]
    async fn asset_roundtrip() {
        let assets = MemoryAssetStore::new();
        let reference = assets.put(&ImageBlob::png(vec![7, 8])).await.unwrap();
        assert_eq!(assets.get(&reference).await.unwrap().bytes, vec![7, 8]);
        assert_eq!(assets.len().await, 1);
    }
}
