//! Stored message record.
//!
//! # Responsibility
//! - Pair a stable identity and grid placement with an opaque payload.
//! - Define the contract a payload must meet to be placed and stored.
//!
//! # Invariants
//! - `id` is stable and never reused for another message.
//! - `placement.span` is the span allocated at creation time and is never
//!   recomputed.

use crate::grid::Placement;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of a stored message.
pub type MessageId = Uuid;

/// Payload validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadValidationError {
    /// Required field is missing or blank.
    MissingField(&'static str),
    /// Field is present but malformed.
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl Display for PayloadValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
            Self::InvalidField { field, message } => {
                write!(f, "field `{field}` is invalid: {message}")
            }
        }
    }
}

impl Error for PayloadValidationError {}

/// Data attached to a message that the grid core does not interpret.
///
/// Only `text_len` feeds into span allocation.
pub trait Payload: Serialize + DeserializeOwned {
    /// Length of the message body in UTF-16 code units.
    fn text_len(&self) -> usize;

    /// Checks payload-level invariants before placement.
    fn validate(&self) -> Result<(), PayloadValidationError>;
}

/// One signed message on the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<P> {
    pub id: MessageId,
    pub placement: Placement,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub payload: P,
}

impl<P> Message<P> {
    /// Creates a message with a generated id, stamped now.
    pub fn new(placement: Placement, payload: P) -> Self {
        Self {
            id: Uuid::new_v4(),
            placement,
            created_at: now_epoch_ms(),
            payload,
        }
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
