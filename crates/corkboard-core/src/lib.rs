//! corkboard-core - Core library for Corkboard
//!
//! This crate contains the shared models, record mapping, sync adapters, and
//! board lifecycle logic used by every Corkboard client.

pub mod boards;
pub mod config;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod preferences;
pub mod record;
pub mod reminders;
pub mod session;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Board, BoardImage, LocalId, RecordId, Sticker, StickyNote, UserId};
