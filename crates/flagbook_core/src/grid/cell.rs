//! Cell coordinates and their string keys.
//!
//! # Responsibility
//! - Address one grid cell by `(row, col)` at the current resolution.
//! - Encode/decode the `"{row}-{col}"` key used by callers as map/set keys.
//!
//! # Invariants
//! - Keys are only comparable within one resolution snapshot; the same key
//!   names a different image area after the grid subdivides.
//! - `Ord` is row-major, so ordered sets enumerate cells in reading order.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One grid cell. Serialized as its string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Returns the cell `offset` columns to the right on the same row.
    pub fn right(self, offset: u32) -> Self {
        Self::new(self.row, self.col + offset)
    }
}

/// Error returned when a string is not a valid cell key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellKeyError {
    key: String,
}

impl Display for CellKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid cell key `{}`; expected `row-col`", self.key)
    }
}

impl Error for CellKeyError {}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

impl FromStr for Cell {
    type Err = CellKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || CellKeyError {
            key: value.to_string(),
        };
        let (row, col) = value.split_once('-').ok_or_else(invalid)?;
        let row = parse_index(row).ok_or_else(invalid)?;
        let col = parse_index(col).ok_or_else(invalid)?;
        Ok(Self::new(row, col))
    }
}

/// Canonical decimal only: no sign, no leading zeros. `u32::from_str` alone
/// also takes a `+` sign.
fn parse_index(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

impl From<Cell> for String {
    fn from(value: Cell) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Cell {
    type Error = CellKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Builds the string key for a cell.
pub fn cell_key(row: u32, col: u32) -> String {
    Cell::new(row, col).to_string()
}

/// Parses a string key back into a cell.
pub fn parse_key(key: &str) -> Result<Cell, CellKeyError> {
    key.parse()
}
