//! Bidirectional mapping between typed entities and generic records

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{
    Board, BoardImage, Color, ImageBlob, ImageFormat, LocalId, Point, RecordId, Size, Sticker,
    StickyNote, UserId, DEFAULT_FRAME_SIDE,
};

use super::fields;
use super::{AssetRef, FieldValue, Fields, Record, RecordKind};

const DEFAULT_NOTE_COLOR: &str = "#FFFF00";

/// An entity persisted as one record owned by a board.
///
/// Implementors write their scalar fields only. The board reference and the
/// image asset are attached by the sync adapter, which owns the upload.
pub trait SyncEntity: Clone + Send + Sync + 'static {
    /// Record type stored for this entity
    const KIND: RecordKind;

    fn local_id(&self) -> LocalId;

    fn remote_id(&self) -> Option<&RecordId>;

    fn set_remote_id(&mut self, id: RecordId);

    fn board_id(&self) -> &RecordId;

    fn set_board_id(&mut self, board_id: RecordId);

    /// Blob persisted out of line under the `image` field.
    fn image(&self) -> Option<&ImageBlob> {
        None
    }

    /// Write every scalar field of the entity into `fields`.
    fn write_fields(&self, fields: &mut Fields);

    /// Rebuild the entity from a stored record and its downloaded image.
    fn from_record(record: &Record, image: Option<ImageBlob>) -> Result<Self>;
}

fn required_board_ref(record: &Record) -> Result<RecordId> {
    record
        .fields
        .reference(fields::BOARD_REF)?
        .cloned()
        .ok_or_else(|| {
            Error::MalformedRecord(format!(
                "{} {} has no board reference",
                record.kind, record.id
            ))
        })
}

fn read_position(record: &Record) -> Result<Point> {
    Ok(Point::new(
        record.fields.double(fields::POSITION_X)?.unwrap_or(0.0),
        record.fields.double(fields::POSITION_Y)?.unwrap_or(0.0),
    ))
}

fn write_position(position: Point, target: &mut Fields) {
    target.set(fields::POSITION_X, FieldValue::Double(position.x));
    target.set(fields::POSITION_Y, FieldValue::Double(position.y));
}

impl SyncEntity for StickyNote {
    const KIND: RecordKind = RecordKind::StickyNote;

    fn local_id(&self) -> LocalId {
        self.local_id
    }

    fn remote_id(&self) -> Option<&RecordId> {
        self.remote_id.as_ref()
    }

    fn set_remote_id(&mut self, id: RecordId) {
        self.remote_id = Some(id);
    }

    fn board_id(&self) -> &RecordId {
        &self.board_id
    }

    fn set_board_id(&mut self, board_id: RecordId) {
        self.board_id = board_id;
    }

    fn write_fields(&self, target: &mut Fields) {
        target.set(fields::TEXT, FieldValue::Text(self.text.clone()));
        write_position(self.position, target);
        target.set(fields::SCALE, FieldValue::Double(self.scale));
        target.set(fields::COLOR, FieldValue::Text(self.color.to_hex()));
        target.set(fields::IS_BOLD, FieldValue::Int(i64::from(self.is_bold)));
        target.set(fields::ROTATION, FieldValue::Double(self.rotation));
    }

    fn from_record(record: &Record, _image: Option<ImageBlob>) -> Result<Self> {
        let values = &record.fields;
        Ok(Self {
            local_id: LocalId::new(),
            remote_id: Some(record.id.clone()),
            board_id: required_board_ref(record)?,
            text: values.text(fields::TEXT)?.unwrap_or_default().to_string(),
            position: read_position(record)?,
            scale: values.double(fields::SCALE)?.unwrap_or(1.0),
            color: Color::from_hex(values.text(fields::COLOR)?.unwrap_or(DEFAULT_NOTE_COLOR)),
            is_bold: values.flag(fields::IS_BOLD)?.unwrap_or(false),
            rotation: values.double(fields::ROTATION)?.unwrap_or(0.0),
        })
    }
}

impl SyncEntity for Sticker {
    const KIND: RecordKind = RecordKind::Sticker;

    fn local_id(&self) -> LocalId {
        self.local_id
    }

    fn remote_id(&self) -> Option<&RecordId> {
        self.remote_id.as_ref()
    }

    fn set_remote_id(&mut self, id: RecordId) {
        self.remote_id = Some(id);
    }

    fn board_id(&self) -> &RecordId {
        &self.board_id
    }

    fn set_board_id(&mut self, board_id: RecordId) {
        self.board_id = board_id;
    }

    fn image(&self) -> Option<&ImageBlob> {
        Some(&self.image)
    }

    fn write_fields(&self, target: &mut Fields) {
        write_position(self.position, target);
        target.set(fields::SCALE, FieldValue::Double(self.scale));
    }

    fn from_record(record: &Record, image: Option<ImageBlob>) -> Result<Self> {
        Ok(Self {
            local_id: LocalId::new(),
            remote_id: Some(record.id.clone()),
            board_id: required_board_ref(record)?,
            image: image.unwrap_or_else(|| ImageBlob::new(ImageFormat::Png, Vec::new())),
            position: read_position(record)?,
            scale: record.fields.double(fields::SCALE)?.unwrap_or(1.0),
        })
    }
}

impl SyncEntity for BoardImage {
    const KIND: RecordKind = RecordKind::BoardImage;

    fn local_id(&self) -> LocalId {
        self.local_id
    }

    fn remote_id(&self) -> Option<&RecordId> {
        self.remote_id.as_ref()
    }

    fn set_remote_id(&mut self, id: RecordId) {
        self.remote_id = Some(id);
    }

    fn board_id(&self) -> &RecordId {
        &self.board_id
    }

    fn set_board_id(&mut self, board_id: RecordId) {
        self.board_id = board_id;
    }

    fn image(&self) -> Option<&ImageBlob> {
        Some(&self.image)
    }

    fn write_fields(&self, target: &mut Fields) {
        write_position(self.position, target);
        target.set(fields::FRAME_WIDTH, FieldValue::Double(self.frame.width));
        target.set(fields::FRAME_HEIGHT, FieldValue::Double(self.frame.height));
    }

    fn from_record(record: &Record, image: Option<ImageBlob>) -> Result<Self> {
        let values = &record.fields;
        Ok(Self {
            local_id: LocalId::new(),
            remote_id: Some(record.id.clone()),
            board_id: required_board_ref(record)?,
            image: image.unwrap_or_else(|| ImageBlob::new(ImageFormat::Jpeg, Vec::new())),
            position: read_position(record)?,
            frame: Size::new(
                values.double(fields::FRAME_WIDTH)?.unwrap_or(DEFAULT_FRAME_SIDE),
                values.double(fields::FRAME_HEIGHT)?.unwrap_or(DEFAULT_FRAME_SIDE),
            ),
        })
    }
}

/// Fields of a board record. The cover asset must already be uploaded.
#[must_use]
pub fn board_to_fields(board: &Board, cover: Option<AssetRef>) -> Fields {
    let mut target = Fields::new();
    target.set(fields::BOARD_CODE, FieldValue::Text(board.code.clone()));
    target.set(fields::TITLE, FieldValue::Text(board.title.clone()));
    target.set(fields::OWNER, FieldValue::Reference(board.owner.to_record_id()));
    target.set(
        fields::MEMBERS,
        FieldValue::ReferenceList(board.members.iter().map(UserId::to_record_id).collect()),
    );
    target.set(
        fields::IS_ACCEPTING_MEMBERS,
        FieldValue::Int(i64::from(board.accepting_members)),
    );
    target.set(
        fields::BOARD_CREATION_DATE,
        FieldValue::Timestamp(board.created_at),
    );
    if let Some(cover) = cover {
        target.set(fields::IMAGE, FieldValue::Asset(cover));
    }
    target
}

/// Rebuild a board from its record and downloaded cover image.
pub fn board_from_record(record: &Record, cover: Option<ImageBlob>) -> Result<Board> {
    if record.kind != RecordKind::Board {
        return Err(Error::MalformedRecord(format!(
            "expected Board record, found {}",
            record.kind
        )));
    }
    let values = &record.fields;
    let owner = values.reference(fields::OWNER)?.ok_or_else(|| {
        Error::MalformedRecord(format!("board {} has no owner", record.id))
    })?;
    let created_at = values
        .timestamp(fields::BOARD_CREATION_DATE)?
        .ok_or_else(|| {
            Error::MalformedRecord(format!("board {} has no creation date", record.id))
        })?;
    let members: BTreeSet<UserId> = values
        .references(fields::MEMBERS)?
        .iter()
        .map(UserId::from_record_id)
        .collect();

    Ok(Board {
        local_id: LocalId::new(),
        remote_id: Some(record.id.clone()),
        code: values
            .text(fields::BOARD_CODE)?
            .unwrap_or_default()
            .to_string(),
        title: values.text(fields::TITLE)?.unwrap_or_default().to_string(),
        owner: UserId::from_record_id(owner),
        created_at,
        accepting_members: values.flag(fields::IS_ACCEPTING_MEMBERS)?.unwrap_or(false),
        members,
        cover,
    })
}
