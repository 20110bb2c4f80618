//! Sticker model

use serde::{Deserialize, Serialize};

use super::{ImageBlob, LocalId, Point, RecordId, ScaleRange};

/// Scale a freshly placed sticker starts at.
pub const INITIAL_STICKER_SCALE: f64 = 0.9;

/// An image sticker placed on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub local_id: LocalId,
    pub remote_id: Option<RecordId>,
    pub board_id: RecordId,
    pub image: ImageBlob,
    pub position: Point,
    pub scale: f64,
}

impl Sticker {
    #[must_use]
    pub fn new(board_id: RecordId, image: ImageBlob, position: Point) -> Self {
        Self {
            local_id: LocalId::new(),
            remote_id: None,
            board_id,
            image,
            position,
            scale: INITIAL_STICKER_SCALE,
        }
    }

    pub fn apply_scale(&mut self, scale: f64, limits: &ScaleRange) {
        self.scale = limits.clamp(scale);
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position.translated(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sticker_uses_initial_scale() {
        let sticker = Sticker::new(
            RecordId::from("board-1"),
            ImageBlob::png(vec![0x89, 0x50]),
            Point::default(),
        );
        assert!((sticker.scale - INITIAL_STICKER_SCALE).abs() < f64::EPSILON);
        assert!(sticker.remote_id.is_none());
    }

    #[test]
    fn test_sticker_scale_clamped() {
        let mut sticker = Sticker::new(
            RecordId::from("board-1"),
            ImageBlob::png(vec![1]),
            Point::default(),
        );
        sticker.apply_scale(4.0, &ScaleRange::new(0.5, 2.0));
        assert!((sticker.scale - 2.0).abs() < f64::EPSILON);
    }
}
