//! Message repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Store messages with their grid placement and a JSON-encoded payload.
//! - Serve the placement snapshot the grid core derives state from.
//!
//! # Invariants
//! - `(grid_row, grid_col)` is unique; a violating insert maps to
//!   `RepoError::OriginTaken`.
//! - Listing order is `created_at ASC, id ASC`.
//! - Payloads are opaque here: encoded with `serde_json` and decoded back
//!   into the caller's payload type.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::grid::{Cell, Placement};
use crate::model::message::{Message, MessageId, Payload};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MESSAGE_SELECT_SQL: &str = "SELECT
    id,
    grid_row,
    grid_col,
    span_cols,
    payload,
    created_at
FROM messages";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for message persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Another message already starts at this cell.
    OriginTaken(Cell),
    NotFound(MessageId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Payload could not be encoded for storage.
    Encode(serde_json::Error),
    /// Persisted row cannot be converted into a valid message.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::OriginTaken(cell) => write!(f, "origin cell {cell} is already claimed"),
            Self::NotFound(id) => write!(f, "message not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "message repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Encode(err) => write!(f, "failed to encode message payload: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted message data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::OriginTaken(_) => None,
            Self::NotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for guestbook messages carrying payload `P`.
pub trait MessageRepository<P> {
    /// Persists a new message. Fails with `OriginTaken` when its origin cell
    /// is already claimed.
    fn create_message(&self, message: &Message<P>) -> RepoResult<MessageId>;
    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message<P>>>;
    /// Lists every message, oldest first.
    fn list_messages(&self) -> RepoResult<Vec<Message<P>>>;
    /// Lists the placement of every message; the grid snapshot source.
    fn list_placements(&self) -> RepoResult<Vec<Placement>>;
    fn count_messages(&self) -> RepoResult<u64>;
}

/// SQLite-backed message repository.
pub struct SqliteMessageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMessageRepository<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// Rejects connections whose schema is not fully migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl<P: Payload> MessageRepository<P> for SqliteMessageRepository<'_> {
    fn create_message(&self, message: &Message<P>) -> RepoResult<MessageId> {
        let payload = serde_json::to_string(&message.payload).map_err(RepoError::Encode)?;
        let placement = message.placement;

        let result = self.conn.execute(
            "INSERT INTO messages (
                id,
                grid_row,
                grid_col,
                span_cols,
                payload,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                message.id.to_string(),
                placement.row,
                placement.col,
                placement.effective_span(),
                payload,
                message.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(message.id),
            Err(err) if is_origin_conflict(&err) => Err(RepoError::OriginTaken(placement.origin())),
            Err(err) => Err(err.into()),
        }
    }

    fn get_message(&self, id: MessageId) -> RepoResult<Option<Message<P>>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MESSAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_message_row(row)?));
        }
        Ok(None)
    }

    fn list_messages(&self) -> RepoResult<Vec<Message<P>>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MESSAGE_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_message_row(row)?);
        }
        Ok(messages)
    }

    fn list_placements(&self) -> RepoResult<Vec<Placement>> {
        let mut stmt = self
            .conn
            .prepare("SELECT grid_row, grid_col, span_cols FROM messages;")?;
        let mut rows = stmt.query([])?;
        let mut placements = Vec::new();
        while let Some(row) = rows.next()? {
            placements.push(parse_placement(row)?);
        }
        Ok(placements)
    }

    fn count_messages(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM messages;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative message count {count}")))
    }
}

fn parse_message_row<P: Payload>(row: &Row<'_>) -> RepoResult<Message<P>> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in messages.id"))
    })?;

    let payload_text: String = row.get("payload")?;
    let payload = serde_json::from_str(&payload_text).map_err(|err| {
        RepoError::InvalidData(format!("undecodable payload for message {id}: {err}"))
    })?;

    Ok(Message {
        id,
        placement: parse_placement(row)?,
        created_at: row.get("created_at")?,
        payload,
    })
}

fn parse_placement(row: &Row<'_>) -> RepoResult<Placement> {
    Ok(Placement::new(
        read_u32(row, "grid_row")?,
        read_u32(row, "grid_col")?,
        read_u32(row, "span_cols")?,
    ))
}

fn read_u32(row: &Row<'_>, column: &str) -> RepoResult<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid value `{value}` in messages.{column}"))
    })
}

fn is_origin_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            failure.code == ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|text| text.contains("messages.grid_row"))
        }
        _ => false,
    }
}
