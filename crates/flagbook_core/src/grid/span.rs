//! Horizontal span allocation.
//!
//! # Responsibility
//! - Size a message in columns from its text length.
//! - Shrink that size to what fits at a concrete origin.
//!
//! # Invariants
//! - Spans grow to the right only and never wrap to the next row.
//! - Actual span is within `1..=desired`; the origin itself is never
//!   re-checked (callers verify it before allocating).

use crate::grid::cell::Cell;
use std::collections::BTreeSet;

/// Widest span a message may claim.
pub const MAX_SPAN: u32 = 4;

/// Text length thresholds (inclusive) for spans 1, 2 and 3.
const SPAN_THRESHOLDS: [usize; 3] = [20, 50, 100];

/// Returns the span a message of `message_length` characters would like.
pub fn compute_desired_span(message_length: usize) -> u32 {
    SPAN_THRESHOLDS
        .iter()
        .position(|limit| message_length <= *limit)
        .map_or(MAX_SPAN, |index| index as u32 + 1)
}

/// Returns the span a message can actually take at `(row, col)`.
///
/// The span is clamped to the row end, then truncated before the first
/// reserved or occupied cell to the right of the origin.
pub fn compute_actual_span(
    desired_span: u32,
    row: u32,
    col: u32,
    cols: u32,
    reserved_cells: &BTreeSet<Cell>,
    occupied_cells: &BTreeSet<Cell>,
) -> u32 {
    let span = desired_span.min(cols.saturating_sub(col));
    let origin = Cell::new(row, col);
    let blocked = (1..span).map(|offset| origin.right(offset)).position(|cell| {
        reserved_cells.contains(&cell) || occupied_cells.contains(&cell)
    });
    match blocked {
        Some(index) => index as u32 + 1,
        None => span.max(1),
    }
}
