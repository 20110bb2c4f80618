use std::path::Path;
use std::sync::Arc;

use corkboard_core::boards::BoardService;
use corkboard_core::config::CorkboardConfig;
use corkboard_core::export::suggested_export_file_name;
use corkboard_core::lifecycle::SystemClock;
use corkboard_core::models::{BoardImage, ImageBlob, Point, Sticker, StickyNote, UserId};
use corkboard_core::session::BoardSession;
use corkboard_core::store::{FileAssetStore, MemoryRecordStore};
use corkboard_core::util::unix_millis_now;

use crate::cli::ExportFormat;
use crate::error::CliError;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MARKERS: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xD9];

/// Share code and rendered export of a freshly populated board.
pub struct DemoExport {
    pub code: String,
    pub rendered: String,
}

pub async fn run_demo(
    config: &CorkboardConfig,
    format: ExportFormat,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    assets_dir: Option<&Path>,
) -> Result<(), CliError> {
    let assets = match assets_dir {
        Some(dir) => FileAssetStore::open(dir)?,
        None => FileAssetStore::scratch()?,
    };
    let export = build_demo_export(config, format, assets).await?;

    let target = match (output, output_dir) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(dir)) => Some(dir.join(suggested_export_file_name(
            &export.code,
            format.into(),
            unix_millis_now(),
        ))),
        (None, None) => None,
    };

    if let Some(path) = target {
        std::fs::write(&path, export.rendered)?;
        println!("{}", path.display());
    } else {
        println!("{}", export.rendered);
    }

    Ok(())
}

/// Create a board in memory with blobs in `assets`, edit it the way a client
/// would, and export it.
pub async fn build_demo_export(
    config: &CorkboardConfig,
    format: ExportFormat,
    assets: FileAssetStore,
) -> Result<DemoExport, CliError> {
    let store = Arc::new(MemoryRecordStore::new());
    let assets = Arc::new(assets);
    let boards = BoardService::new(store.clone(), assets.clone(), config.sync);

    let owner = UserId::new("demo-owner");
    let board = boards.create_board("Demo board", &owner, None).await?;
    let board = boards.join_board(&board.code, &UserId::new("demo-guest")).await?;
    tracing::info!("Demo board {} ready", board.code);
    let code = board.code.clone();

    let session = BoardSession::open(board, store, assets, config, Arc::new(SystemClock))?;
    let board_id = session.board_id().clone();

    let mut note = StickyNote::new(board_id.clone(), Point::new(40.0, 60.0));
    session.resize_note(&mut note, 1.4)?;
    let mut last_ticket = None;
    for draft in ["Bring", "Bring snacks", "Bring snacks and a blanket"] {
        note.text = draft.to_string();
        last_ticket = Some(session.request_save(note.clone())?);
    }
    if let Some(ticket) = last_ticket {
        ticket.outcome().await.ok_or(CliError::SaveSuperseded)??;
    }

    let mut sticker = Sticker::new(
        board_id.clone(),
        ImageBlob::png(PNG_SIGNATURE.to_vec()),
        Point::new(220.0, 80.0),
    );
    session.resize_sticker(&mut sticker, 1.2)?;
    session.save_now(sticker).await?;

    let mut image = BoardImage::new(
        board_id,
        ImageBlob::jpeg(JPEG_MARKERS.to_vec()),
        Point::new(120.0, 300.0),
    );
    session.magnify_image(&mut image, 1.5)?;
    session.save_now(image).await?;

    let rendered = session.export(format.into()).await?;
    Ok(DemoExport { code, rendered })
}
