//! Optimistic-concurrency save loop shared by every entity kind.

use crate::error::{Error, Result};
use crate::record::Record;
use crate::store::RecordStore;

/// What a write closure did to the record it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Fields changed; the record must be saved
    Changed,
    /// The current revision already holds the desired state
    Unchanged,
}

/// Apply `write` to `current` and save it conditionally.
///
/// On a revision conflict the now-current revision is fetched and the same
/// write is applied again. Conflicts are retried sequentially, at most
/// `max_retries` times; every other error is returned as is.
pub async fn save_with_conflict_retry<F>(
    store: &dyn RecordStore,
    mut current: Record,
    max_retries: u32,
    mut write: F,
) -> Result<Record>
where
    F: FnMut(&mut Record) -> Result<Mutation> + Send,
{
    let mut conflicts = 0u32;
    loop {
        if write(&mut current)? == Mutation::Unchanged {
            return Ok(current);
        }

        match store.conditional_save(current.clone()).await {
            Ok(saved) => {
                if conflicts > 0 {
                    tracing::debug!(
                        "Saved {} {} after {} conflicting attempts",
                        saved.kind,
                        saved.id,
                        conflicts
                    );
                }
                return Ok(saved);
            }
            Err(Error::Conflict(id)) => {
                conflicts += 1;
                if conflicts > max_retries {
                    tracing::warn!("Giving up on {} after {} conflicts", id, conflicts);
                    return Err(Error::ConflictExhausted {
                        record: id,
                        attempts: conflicts,
                    });
                }
                tracing::warn!(
                    "Revision conflict on {} (attempt {}), refetching",
                    id,
                    conflicts
                );
                current = store
                    .fetch(&id)
                    .await?
                    .ok_or_else(|| Error::NotFound(id.to_string()))?;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldValue, Fields, RecordKind};
    use crate::store::MemoryRecordStore;

    fn text(value: &str) -> Fields {
        let mut fields = Fields::new();
        fields.set("text", FieldValue::Text(value.to_string()));
        fields
    }

    fn overwrite_with(value: &'static str) -> impl FnMut(&mut Record) -> Result<Mutation> + Send {
        move |record: &mut Record| {
            record.fields.merge_from(&text(value));
            Ok(Mutation::Changed)
        }
    }

    #[tokio::test]
    async fn retries_until_conflicts_clear() {
        let store = MemoryRecordStore::new();
        let record = store.create(RecordKind::StickyNote, text("v0")).await.unwrap();
        store.inject_foreign_writes(3, &text("theirs")).await;

        let saved = save_with_conflict_retry(&store, record, 10, overwrite_with("mine"))
            .await
            .unwrap();

        assert_eq!(saved.fields.text("text").unwrap(), Some("mine"));
        let counts = store.call_counts().await;
        assert_eq!(counts.conditional_saves, 4);
        assert_eq!(counts.fetches, 3);
    }

    #[tokio::test]
    async fn gives_up_past_the_bound() {
        let store = MemoryRecordStore::new();
        let record = store.create(RecordKind::StickyNote, text("v0")).await.unwrap();
        store.inject_foreign_writes(5, &text("theirs")).await;

        let error = save_with_conflict_retry(&store, record, 2, overwrite_with("mine"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::ConflictExhausted { attempts: 3, .. }
        ));
        assert_eq!(store.call_counts().await.conditional_saves, 3);
    }

    #[tokio::test]
    async fn unchanged_write_skips_the_save() {
        let store = MemoryRecordStore::new();
        let record = store.create(RecordKind::Board, text("v0")).await.unwrap();

        let result = save_with_conflict_retry(&store, record.clone(), 3, |_: &mut Record| {
            Ok(Mutation::Unchanged)
        })
        .await
        .unwrap();

        assert_eq!(result, record);
        assert_eq!(store.call_counts().await.conditional_saves, 0);
    }

    #[tokio::test]
    async fn record_deleted_mid_retry_is_not_found() {
        let store = MemoryRecordStore::new();
        let record = store.create(RecordKind::Sticker, text("v0")).await.unwrap();
        store.delete(&record.id).await.unwrap();

        let error = save_with_conflict_retry(&store, record, 3, overwrite_with("mine"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }
}
