//! Record field names. These are the wire contract with the record store.

pub const BOARD_CODE: &str = "boardID";
pub const TITLE: &str = "title";
pub const OWNER: &str = "owner";
pub const MEMBERS: &str = "members";
pub const IS_ACCEPTING_MEMBERS: &str = "isAcceptingMembers";
pub const BOARD_CREATION_DATE: &str = "boardCreationDate";

/// Reference from an item to its board. Same name as the board's share code
/// field, but holds a reference instead of text.
pub const BOARD_REF: &str = "boardID";

pub const TEXT: &str = "text";
pub const POSITION_X: &str = "positionX";
pub const POSITION_Y: &str = "positionY";
pub const SCALE: &str = "scale";
pub const COLOR: &str = "color";
pub const IS_BOLD: &str = "isBold";
pub const ROTATION: &str = "rotation";
pub const FRAME_WIDTH: &str = "frameWidth";
pub const FRAME_HEIGHT: &str = "frameHeight";
pub const IMAGE: &str = "image";
