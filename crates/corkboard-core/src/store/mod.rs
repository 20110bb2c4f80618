//! Remote collaborators: the record store and the asset blob store.
//!
//! Both are consumed through traits so callers can inject a network client in
//! production and the in-memory implementations in tests.

mod file_assets;
mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ImageBlob, ImageFormat, RecordId};
use crate::record::{AssetRef, FieldValue, Fields, Record, RecordKind};

pub use file_assets::FileAssetStore;
pub use memory::{MemoryAssetStore, MemoryRecordStore, StoreCallCounts};

/// Query filter over record fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value exactly
    Equals { field: String, value: FieldValue },
    /// Reference-list field contains the reference
    Contains { field: String, reference: RecordId },
}

impl Predicate {
    #[must_use]
    pub fn equals(field: &str, value: FieldValue) -> Self {
        Self::Equals {
            field: field.to_string(),
            value,
        }
    }

    #[must_use]
    pub fn contains(field: &str, reference: RecordId) -> Self {
        Self::Contains {
            field: field.to_string(),
            reference,
        }
    }

    /// Whether a record satisfies the predicate.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Equals { field, value } => record.fields.get(field) == Some(value),
            Self::Contains { field, reference } => matches!(
                record.fields.get(field),
                Some(FieldValue::ReferenceList(items)) if items.contains(reference)
            ),
        }
    }
}

/// Shared, queryable, schema-less record database.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record; the store assigns its name and first revision.
    async fn create(&self, kind: RecordKind, fields: Fields) -> Result<Record>;

    /// Fetch the current revision of a record, `None` when absent.
    async fn fetch(&self, id: &RecordId) -> Result<Option<Record>>;

    /// All records of `kind` matching the predicate.
    async fn query(&self, kind: RecordKind, predicate: &Predicate) -> Result<Vec<Record>>;

    /// Save only if `record.revision` still matches the stored revision.
    ///
    /// Returns [`crate::Error::Conflict`] on mismatch and
    /// [`crate::Error::NotFound`] when the record is gone.
    async fn conditional_save(&self, record: Record) -> Result<Record>;

    async fn delete(&self, id: &RecordId) -> Result<()>;
}

/// Out-of-line binary storage referenced from records.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn put(&self, blob: &ImageBlob) -> Result<AssetRef>;

    async fn get(&self, reference: &AssetRef) -> Result<ImageBlob>;
}

/// Name for a new asset: unique, carrying the format extension.
pub(crate) fn new_asset_name(format: ImageFormat) -> String {
    format!("{}.{}", uuid::Uuid::now_v7(), format.extension())
}
