//! Sticky note model

use serde::{Deserialize, Serialize};

use super::{Color, LocalId, Point, RecordId, ScaleRange};

/// A text note pinned to a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyNote {
    /// Client-side identity
    pub local_id: LocalId,
    /// Remote record name, `None` until the first successful save
    pub remote_id: Option<RecordId>,
    /// Owning board record
    pub board_id: RecordId,
    pub text: String,
    pub position: Point,
    pub scale: f64,
    pub color: Color,
    pub is_bold: bool,
    /// Rotation in degrees
    pub rotation: f64,
}

impl StickyNote {
    /// Create an empty yellow note at the given position.
    #[must_use]
    pub fn new(board_id: RecordId, position: Point) -> Self {
        Self {
            local_id: LocalId::new(),
            remote_id: None,
            board_id,
            text: String::new(),
            position,
            scale: 1.0,
            color: Color::YELLOW,
            is_bold: false,
            rotation: 0.0,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Apply a pinch gesture; the result is clamped into `limits`.
    pub fn apply_scale(&mut self, scale: f64, limits: &ScaleRange) {
        self.scale = limits.clamp(scale);
    }

    /// Apply a rotation gesture, normalized into `[0, 360)`.
    pub fn apply_rotation(&mut self, degrees: f64) {
        self.rotation = degrees.rem_euclid(360.0);
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position.translated(dx, dy);
    }

    /// Check if note text is empty (whitespace-only counts as empty)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
