//! Guestbook use-case service.
//!
//! # Responsibility
//! - Serve fresh grid snapshots for status reads.
//! - Place and persist new signed messages.
//!
//! # Invariants
//! - Every read and every write attempt derives grid state from a fresh
//!   placement snapshot; no grid state is kept between calls.
//! - Reserved, taken, full and out-of-bounds targets are distinct errors.
//! - A write that loses the origin-uniqueness race is re-validated against a
//!   new snapshot, up to `SignOptions::max_attempts` times.

use crate::grid::{compute_grid_info, Allocation, Cell, GridInfo, GridStatus, PlacementError};
use crate::model::message::{Message, MessageId, Payload, PayloadValidationError};
use crate::repo::message_repo::{MessageRepository, RepoError, RepoResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

/// Default number of snapshot/allocate/insert rounds per signature.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Tuning for the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignOptions {
    /// Rounds before giving up on origin conflicts. Values below 1 act as 1.
    pub max_attempts: u32,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Service error for guestbook use-cases.
#[derive(Debug)]
pub enum SignError {
    /// Payload failed its own validation.
    InvalidPayload(PayloadValidationError),
    /// Target cell is outside the current grid.
    OutOfBounds { cell: Cell, rows: u32, cols: u32 },
    /// Target cell lies on a reserved zone of the flag.
    ReservedCell(Cell),
    /// Target cell already holds a message.
    CellTaken(Cell),
    /// No free cell left at the last subdivision level.
    GridFull { level: u32 },
    /// Origin conflicts persisted through every attempt.
    Contention { cell: Cell, attempts: u32 },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for SignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPayload(err) => write!(f, "invalid signature: {err}"),
            Self::OutOfBounds { cell, rows, cols } => {
                write!(f, "cell {cell} is outside the {rows}x{cols} flag grid")
            }
            Self::ReservedCell(cell) => {
                write!(f, "cell {cell} is part of the flag artwork and cannot be signed")
            }
            Self::CellTaken(cell) => write!(f, "cell {cell} has already been signed"),
            Self::GridFull { level } => {
                write!(f, "the flag is full (level {level}); no cell is left to sign")
            }
            Self::Contention { cell, attempts } => write!(
                f,
                "cell {cell} kept being claimed concurrently; gave up after {attempts} attempts"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SignError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPayload(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SignError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PayloadValidationError> for SignError {
    fn from(value: PayloadValidationError) -> Self {
        Self::InvalidPayload(value)
    }
}

impl From<PlacementError> for SignError {
    fn from(value: PlacementError) -> Self {
        match value {
            PlacementError::OutOfBounds { cell, rows, cols } => {
                Self::OutOfBounds { cell, rows, cols }
            }
            PlacementError::Reserved(cell) => Self::ReservedCell(cell),
            PlacementError::Occupied(cell) => Self::CellTaken(cell),
            PlacementError::GridFull { level } => Self::GridFull { level },
        }
    }
}

/// Guestbook facade over a message repository.
pub struct GuestbookService<R, P> {
    repo: R,
    options: SignOptions,
    _payload: PhantomData<fn() -> P>,
}

impl<R, P> GuestbookService<R, P>
where
    R: MessageRepository<P>,
    P: Payload,
{
    /// Creates a service with default options.
    pub fn new(repo: R) -> Self {
        Self::with_options(repo, SignOptions::default())
    }

    pub fn with_options(repo: R, options: SignOptions) -> Self {
        Self {
            repo,
            options,
            _payload: PhantomData,
        }
    }

    /// Derives grid state from the current stored placements.
    pub fn grid_info(&self) -> RepoResult<GridInfo> {
        let placements = self.repo.list_placements()?;
        Ok(compute_grid_info(&placements))
    }

    /// Serializable grid summary for status reads.
    pub fn grid_status(&self) -> RepoResult<GridStatus> {
        Ok(self.grid_info()?.status())
    }

    pub fn list_messages(&self) -> RepoResult<Vec<Message<P>>> {
        self.repo.list_messages()
    }

    pub fn get_message(&self, id: MessageId) -> RepoResult<Option<Message<P>>> {
        self.repo.get_message(id)
    }

    /// Validates `origin` and sizes a message of `text_len` characters
    /// without persisting anything.
    pub fn preview(&self, origin: Cell, text_len: usize) -> Result<Allocation, SignError> {
        let info = self.grid_info()?;
        Ok(info.allocate(origin, text_len)?)
    }

    /// Largest span a message could take at `cell` right now.
    pub fn max_span_at(&self, cell: Cell) -> RepoResult<Option<u32>> {
        Ok(self.grid_info()?.max_span_at(cell))
    }

    /// Places and persists a new message starting at `origin`.
    ///
    /// # Contract
    /// - Span is sized from `payload.text_len()` and truncated to what fits.
    /// - Rejections (`ReservedCell`, `CellTaken`, `GridFull`, `OutOfBounds`)
    ///   persist nothing.
    /// - A lost origin race is retried against a fresh snapshot; the retry
    ///   surfaces as `CellTaken` once the winner is visible.
    pub fn sign(&self, origin: Cell, payload: P) -> Result<Message<P>, SignError> {
        payload.validate()?;
        let text_len = payload.text_len();
        let max_attempts = self.options.max_attempts.max(1);
        let mut payload = payload;

        for attempt in 1..=max_attempts {
            let info = self.grid_info()?;
            let allocation = match info.allocate(origin, text_len) {
                Ok(allocation) => allocation,
                Err(err) => {
                    info!(
                        "event=sign module=service status=rejected cell={} level={} attempt={} reason={}",
                        origin, info.level, attempt, err
                    );
                    return Err(err.into());
                }
            };

            let message = Message::new(allocation.placement(), payload);
            match self.repo.create_message(&message) {
                Ok(_) => {
                    info!(
                        "event=sign module=service status=ok cell={} level={} span={} desired_span={} attempt={}",
                        origin, info.level, allocation.span, allocation.desired_span, attempt
                    );
                    return Ok(message);
                }
                Err(RepoError::OriginTaken(cell)) => {
                    warn!(
                        "event=sign module=service status=conflict cell={} attempt={} max_attempts={}",
                        cell, attempt, max_attempts
                    );
                    payload = message.payload;
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(SignError::Contention {
            cell: origin,
            attempts: max_attempts,
        })
    }
}
