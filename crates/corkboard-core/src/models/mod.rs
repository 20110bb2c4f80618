//! Data models for Corkboard

mod board;
mod board_image;
mod color;
mod geometry;
mod ids;
mod image;
mod sticker;
mod sticky_note;

pub use board::{generate_board_code, Board, BOARD_CODE_DIGITS, BOARD_CODE_LETTERS};
pub use board_image::{BoardImage, DEFAULT_FRAME_SIDE};
pub use color::Color;
pub use geometry::{Point, ScaleRange, Size};
pub use ids::{LocalId, RecordId, UserId};
pub use image::{ImageBlob, ImageFormat};
pub use sticker::{Sticker, INITIAL_STICKER_SCALE};
pub use sticky_note::StickyNote;
