//! Generic record shape exchanged with the remote store.
//!
//! The store is schema-less: a record is a kind, a name, a revision tag and a
//! bag of named fields. Typed entities convert to and from this shape through
//! the mappings in [`mapping`].

pub mod fields;
pub mod mapping;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::RecordId;

pub use mapping::{board_from_record, board_to_fields, SyncEntity};

/// Record types the app stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Board,
    StickyNote,
    Sticker,
    BoardImage,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Board => "Board",
            Self::StickyNote => "StickyNote",
            Self::Sticker => "Sticker",
            Self::BoardImage => "BoardImage",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque revision token; a conditional save only lands if it still matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference to an out-of-line blob held by the asset store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Double(f64),
    Int(i64),
    Timestamp(DateTime<Utc>),
    Reference(RecordId),
    ReferenceList(Vec<RecordId>),
    Asset(AssetRef),
}

/// Named fields of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Overwrite every field present in `other`, keeping the rest.
    pub fn merge_from(&mut self, other: &Self) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text field, `None` when missing. Wrong type is an error.
    pub fn text(&self, name: &str) -> Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Text(value)) => Ok(Some(value)),
            Some(other) => Err(type_mismatch(name, "text", other)),
        }
    }

    /// Numeric field as f64; integers widen.
    #[allow(clippy::cast_precision_loss)]
    pub fn double(&self, name: &str) -> Result<Option<f64>> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Double(value)) => Ok(Some(*value)),
            Some(FieldValue::Int(value)) => Ok(Some(*value as f64)),
            Some(other) => Err(type_mismatch(name, "double", other)),
        }
    }

    /// 0/1 flag. Any non-zero integer reads as set.
    pub fn flag(&self, name: &str) -> Result<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Int(value)) => Ok(Some(*value != 0)),
            Some(other) => Err(type_mismatch(name, "flag", other)),
        }
    }

    pub fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Timestamp(value)) => Ok(Some(*value)),
            Some(other) => Err(type_mismatch(name, "timestamp", other)),
        }
    }

    pub fn reference(&self, name: &str) -> Result<Option<&RecordId>> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Reference(value)) => Ok(Some(value)),
            Some(other) => Err(type_mismatch(name, "reference", other)),
        }
    }

    pub fn references(&self, name: &str) -> Result<Vec<RecordId>> {
        match self.get(name) {
            None => Ok(Vec::new()),
            Some(FieldValue::ReferenceList(values)) => Ok(values.clone()),
            Some(other) => Err(type_mismatch(name, "reference list", other)),
        }
    }

    pub fn asset(&self, name: &str) -> Result<Option<&AssetRef>> {
        match self.get(name) {
            None => Ok(None),
            Some(FieldValue::Asset(value)) => Ok(Some(value)),
            Some(other) => Err(type_mismatch(name, "asset", other)),
        }
    }
}

fn type_mismatch(name: &str, expected: &str, found: &FieldValue) -> Error {
    Error::MalformedRecord(format!(
        "field '{name}' should be {expected}, found {found:?}"
    ))
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
    /// `None` on records that were never saved
    pub revision: Option<Revision>,
    pub fields: Fields,
}

impl Record {
    #[must_use]
    pub const fn new(id: RecordId, kind: RecordKind, fields: Fields) -> Self {
        Self {
            id,
            kind,
            revision: None,
            fields,
        }
    }
}
