//! Core logic for the flagbook guestbook.
//! The grid allocator here is the single source of truth for where a
//! signature may go and how wide it may be.

pub mod db;
pub mod grid;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod upload;

pub use grid::{
    cell_key, compute_grid_info, parse_key, Allocation, Cell, CellStatus, GridInfo, GridStatus,
    Placement, PlacementError,
};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LogConfig};
pub use model::message::{Message, MessageId, Payload, PayloadValidationError};
pub use model::signature::{InkSize, Signature, DEFAULT_COLOR};
pub use repo::message_repo::{MessageRepository, RepoError, RepoResult, SqliteMessageRepository};
pub use service::guestbook_service::{GuestbookService, SignError, SignOptions};
pub use upload::{ImageStore, StoredImage, UploadError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
