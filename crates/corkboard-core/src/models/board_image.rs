//! Board image model

use serde::{Deserialize, Serialize};

use super::{ImageBlob, LocalId, Point, RecordId, ScaleRange, Size};

/// Frame side used when a stored record carries no frame size.
pub const DEFAULT_FRAME_SIDE: f64 = 200.0;

/// A photo placed on a board inside a square frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardImage {
    pub local_id: LocalId,
    pub remote_id: Option<RecordId>,
    pub board_id: RecordId,
    pub image: ImageBlob,
    pub position: Point,
    pub frame: Size,
}

impl BoardImage {
    #[must_use]
    pub fn new(board_id: RecordId, image: ImageBlob, position: Point) -> Self {
        Self {
            local_id: LocalId::new(),
            remote_id: None,
            board_id,
            image,
            position,
            frame: Size::square(DEFAULT_FRAME_SIDE),
        }
    }

    /// Apply a magnification gesture relative to the current frame width.
    ///
    /// The frame stays square; its side is clamped into `limits`.
    pub fn apply_magnification(&mut self, factor: f64, limits: &ScaleRange) {
        let side = limits.clamp(self.frame.width * factor);
        self.frame = Size::square(side);
    }

    pub fn move_by(&mut self, dx: f64, dy: f64) {
        self.position = self.position.translated(dx, dy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> BoardImage {
        BoardImage::new(
            RecordId::from("board-1"),
            ImageBlob::jpeg(vec![0xFF, 0xD8]),
            Point::new(40.0, 40.0),
        )
    }

    #[test]
    fn test_magnification_clamps_frame() {
        let limits = ScaleRange::new(150.0, 400.0);
        let mut image = image();
        image.apply_magnification(3.0, &limits);
        assert_eq!(image.frame, Size::square(400.0));
        image.apply_magnification(0.1, &limits);
        assert_eq!(image.frame, Size::square(150.0));
        image.apply_magnification(1.5, &limits);
        assert_eq!(image.frame, Size::square(225.0));
    }
}
