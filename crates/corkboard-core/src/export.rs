//! Board snapshot export in JSON and Markdown.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::format_countdown;
use crate::models::{Board, BoardImage, Sticker, StickyNote};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// A board and every item on it, as loaded at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub board: Board,
    pub notes: Vec<StickyNote>,
    pub stickers: Vec<Sticker>,
    pub images: Vec<BoardImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBoard {
    pub code: String,
    pub title: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub members: Vec<String>,
    pub notes: Vec<ExportNote>,
    pub stickers: Vec<ExportSticker>,
    pub images: Vec<ExportImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNote {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub color: String,
    pub is_bold: bool,
    pub rotation: f64,
}

/// Blobs are summarized by format and size, never embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSticker {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub format: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportImage {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub format: String,
    pub bytes: usize,
}

/// Convert a snapshot into its export form. Notes keep their stored order.
#[must_use]
pub fn snapshot_to_export(snapshot: &BoardSnapshot) -> ExportBoard {
    let board = &snapshot.board;
    ExportBoard {
        code: board.code.clone(),
        title: board.title.clone(),
        owner: board.owner.to_string(),
        created_at: board.created_at,
        expires_at: board.expires_at(),
        members: board.members.iter().map(ToString::to_string).collect(),
        notes: snapshot
            .notes
            .iter()
            .map(|note| ExportNote {
                text: note.text.clone(),
                x: note.position.x,
                y: note.position.y,
                scale: note.scale,
                color: note.color.to_hex(),
                is_bold: note.is_bold,
                rotation: note.rotation,
            })
            .collect(),
        stickers: snapshot
            .stickers
            .iter()
            .map(|sticker| ExportSticker {
                x: sticker.position.x,
                y: sticker.position.y,
                scale: sticker.scale,
                format: sticker.image.format.extension().to_string(),
                bytes: sticker.image.bytes.len(),
            })
            .collect(),
        images: snapshot
            .images
            .iter()
            .map(|image| ExportImage {
                x: image.position.x,
                y: image.position.y,
                width: image.frame.width,
                height: image.frame.height,
                format: image.image.format.extension().to_string(),
                bytes: image.image.bytes.len(),
            })
            .collect(),
    }
}

/// Render a snapshot as pretty-printed JSON.
pub fn render_json_export(snapshot: &BoardSnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&snapshot_to_export(snapshot))
}

/// Render a snapshot as Markdown with a frontmatter block.
#[must_use]
pub fn render_markdown_export(snapshot: &BoardSnapshot, now: DateTime<Utc>) -> String {
    let export = snapshot_to_export(snapshot);
    let mut output = String::new();

    let _ = writeln!(output, "---");
    let _ = writeln!(output, "code: {}", export.code);
    let _ = writeln!(output, "owner: {}", export.owner);
    let _ = writeln!(output, "created_at: {}", export.created_at.to_rfc3339());
    let _ = writeln!(output, "expires_at: {}", export.expires_at.to_rfc3339());
    let _ = writeln!(output, "members:");
    for member in &export.members {
        let _ = writeln!(output, "  - {member}");
    }
    let _ = writeln!(output, "---");
    let _ = writeln!(output);
    let _ = writeln!(output, "# {}", export.title);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Time left: {}",
        format_countdown(export.expires_at - now)
    );

    if !export.notes.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Notes");
        for note in &export.notes {
            let _ = writeln!(output);
            let text = if note.is_bold {
                format!("**{}**", note.text)
            } else {
                note.text.clone()
            };
            let _ = writeln!(output, "- {} ({}, {:.0}°)", text, note.color, note.rotation);
        }
    }

    if !export.stickers.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Stickers");
        let _ = writeln!(output);
        for sticker in &export.stickers {
            let _ = writeln!(
                output,
                "- {} at ({:.0}, {:.0}), {} bytes",
                sticker.format, sticker.x, sticker.y, sticker.bytes
            );
        }
    }

    if !export.images.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Images");
        let _ = writeln!(output);
        for image in &export.images {
            let _ = writeln!(
                output,
                "- {} at ({:.0}, {:.0}), {:.0}x{:.0}, {} bytes",
                image.format, image.x, image.y, image.width, image.height, image.bytes
            );
        }
    }

    output
}

/// Render a snapshot in the selected format.
pub fn render_board_export(
    snapshot: &BoardSnapshot,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(snapshot),
        ExportFormat::Markdown => Ok(render_markdown_export(snapshot, now)),
    }
}

/// Default file name for an export of the board with share code `code`.
#[must_use]
pub fn suggested_export_file_name(code: &str, format: ExportFormat, timestamp_ms: i64) -> String {
    format!("corkboard-{code}-{timestamp_ms}.{}", format.extension())
}
