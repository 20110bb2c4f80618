//! A board opened for viewing and editing.

use std::sync::Arc;

use crate::config::{CorkboardConfig, GestureLimits};
use crate::error::{Error, Result};
use crate::export::{render_board_export, BoardSnapshot, ExportFormat};
use crate::lifecycle::{BoardPhase, Clock, Countdown, LifecycleTimer};
use crate::models::{Board, BoardImage, RecordId, Sticker, StickyNote};
use crate::store::{AssetStore, RecordStore};
use crate::sync::{EntitySyncAdapter, SaveGate, SaveTicket, SyncEntity};

/// Item kinds a session syncs, each through its own adapter.
pub trait BoardItem: SyncEntity {
    fn adapter(session: &BoardSession) -> &EntitySyncAdapter<Self>;
}

impl BoardItem for StickyNote {
    fn adapter(session: &BoardSession) -> &EntitySyncAdapter<Self> {
        &session.notes
    }
}

impl BoardItem for Sticker {
    fn adapter(session: &BoardSession) -> &EntitySyncAdapter<Self> {
        &session.stickers
    }
}

impl BoardItem for BoardImage {
    fn adapter(session: &BoardSession) -> &EntitySyncAdapter<Self> {
        &session.images
    }
}

/// Composes the item adapters of one board with its lifecycle timer.
///
/// Edits are rejected with [`Error::BoardExpired`] once the board expired;
/// loading and exporting keep working.
pub struct BoardSession {
    board: Board,
    board_id: RecordId,
    timer: Arc<LifecycleTimer>,
    clock: Arc<dyn Clock>,
    gestures: GestureLimits,
    notes: EntitySyncAdapter<StickyNote>,
    stickers: EntitySyncAdapter<Sticker>,
    images: EntitySyncAdapter<BoardImage>,
}

impl BoardSession {
    /// Open a persisted board.
    pub fn open(
        board: Board,
        store: Arc<dyn RecordStore>,
        assets: Arc<dyn AssetStore>,
        config: &CorkboardConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let Some(board_id) = board.remote_id.clone() else {
            return Err(Error::InvalidReference(format!(
                "board {} was never saved",
                board.code
            )));
        };
        let timer = Arc::new(LifecycleTimer::with_clock(board.created_at, clock.clone()));
        let gate = expiry_gate(&timer, &board.code);
        Ok(Self {
            notes: EntitySyncAdapter::gated(
                store.clone(),
                assets.clone(),
                config.sync,
                gate.clone(),
            ),
            stickers: EntitySyncAdapter::gated(
                store.clone(),
                assets.clone(),
                config.sync,
                gate.clone(),
            ),
            images: EntitySyncAdapter::gated(store, assets, config.sync, gate),
            board,
            board_id,
            timer,
            clock,
            gestures: config.gestures,
        })
    }

    pub const fn board(&self) -> &Board {
        &self.board
    }

    pub const fn board_id(&self) -> &RecordId {
        &self.board_id
    }

    pub const fn timer(&self) -> &Arc<LifecycleTimer> {
        &self.timer
    }

    pub fn phase(&self) -> BoardPhase {
        self.timer.phase()
    }

    pub fn countdown(&self) -> Countdown {
        self.timer.countdown()
    }

    /// Fetch every item on the board.
    pub async fn load(&self) -> Result<BoardSnapshot> {
        let (notes, stickers, images) = tokio::try_join!(
            self.notes.fetch_all(&self.board_id),
            self.stickers.fetch_all(&self.board_id),
            self.images.fetch_all(&self.board_id),
        )?;
        tracing::debug!(
            "Loaded board {}: {} notes, {} stickers, {} images",
            self.board_id,
            notes.len(),
            stickers.len(),
            images.len()
        );
        Ok(BoardSnapshot {
            board: self.board.clone(),
            notes,
            stickers,
            images,
        })
    }

    /// Debounced save of `item` on this board. Expiry is checked again when
    /// the save fires.
    pub fn request_save<E: BoardItem>(&self, item: E) -> Result<SaveTicket<E>> {
        self.ensure_active()?;
        Ok(E::adapter(self).request_save_ticket(item, self.board_id.clone()))
    }

    /// Immediate save of `item` on this board.
    pub async fn save_now<E: BoardItem>(&self, item: E) -> Result<E> {
        self.ensure_active()?;
        E::adapter(self).save_now(item, self.board_id.clone()).await
    }

    pub async fn delete<E: BoardItem>(&self, item: &E) -> Result<()> {
        self.ensure_active()?;
        E::adapter(self).delete(item).await
    }

    /// Pinch on a sticky note, clamped to the configured range.
    pub fn resize_note(&self, note: &mut StickyNote, scale: f64) -> Result<()> {
        self.ensure_active()?;
        note.apply_scale(scale, &self.gestures.sticky_note_scale);
        Ok(())
    }

    pub fn resize_sticker(&self, sticker: &mut Sticker, scale: f64) -> Result<()> {
        self.ensure_active()?;
        sticker.apply_scale(scale, &self.gestures.sticker_scale);
        Ok(())
    }

    /// Pinch on a board image scales its square frame by `factor`.
    pub fn magnify_image(&self, image: &mut BoardImage, factor: f64) -> Result<()> {
        self.ensure_active()?;
        image.apply_magnification(factor, &self.gestures.board_image_frame);
        Ok(())
    }

    /// Load the board and render it. Allowed in every phase.
    pub async fn export(&self, format: ExportFormat) -> Result<String> {
        let snapshot = self.load().await?;
        Ok(render_board_export(&snapshot, format, self.clock.now())?)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.timer.is_expired() {
            return Err(Error::BoardExpired(self.board.code.clone()));
        }
        Ok(())
    }
}

/// Fails debounced saves that fire after the board expired.
fn expiry_gate(timer: &Arc<LifecycleTimer>, code: &str) -> SaveGate {
    let timer = Arc::clone(timer);
    let code = code.to_string();
    Arc::new(move || {
        if timer.is_expired() {
            Err(Error::BoardExpired(code.clone()))
        } else {
            Ok(())
        }
    })
}
