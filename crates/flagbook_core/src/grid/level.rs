//! Subdivision level resolver.
//!
//! # Responsibility
//! - Map a total occupied-cell count to the grid subdivision level.
//! - Size the grid for a level.
//!
//! # Invariants
//! - Level is monotonic non-decreasing in the occupied count.
//! - Each level doubles rows and columns of the previous one.
//! - Level never exceeds `MAX_LEVEL`; demand beyond its capacity is not
//!   representable and must be caught by callers as a full grid.

use crate::grid::zone::reserved_cells;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Columns at level 1.
pub const BASE_COLS: u32 = 16;
/// Rows at level 1.
pub const BASE_ROWS: u32 = 10;
/// First subdivision level.
pub const MIN_LEVEL: u32 = 1;
/// Last subdivision level.
pub const MAX_LEVEL: u32 = 5;

// Zones are constant, so free-cell capacity per level never changes.
static LEVEL_CAPACITY: Lazy<Vec<usize>> = Lazy::new(|| {
    (MIN_LEVEL..=MAX_LEVEL)
        .map(|level| {
            let dims = grid_dimensions(level);
            dims.cell_count() - reserved_cells(dims.rows, dims.cols).len()
        })
        .collect()
});

/// Grid size at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: u32,
    pub cols: u32,
}

impl GridDimensions {
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// Returns the grid size for a level.
///
/// Levels outside `MIN_LEVEL..=MAX_LEVEL` are clamped into range.
pub fn grid_dimensions(level: u32) -> GridDimensions {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    let factor = 1u32 << (level - 1);
    GridDimensions {
        rows: BASE_ROWS * factor,
        cols: BASE_COLS * factor,
    }
}

/// Returns how many cells of an empty grid at `level` are signable.
pub fn level_capacity(level: u32) -> usize {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    LEVEL_CAPACITY[(level - MIN_LEVEL) as usize]
}

/// Returns the subdivision level for a total occupied-cell count.
///
/// The first level whose capacity is strictly greater than the count wins;
/// counts at or beyond the last level's capacity stay at `MAX_LEVEL`.
pub fn compute_grid_level(occupied_cell_count: usize) -> u32 {
    (MIN_LEVEL..=MAX_LEVEL)
        .find(|level| occupied_cell_count < level_capacity(*level))
        .unwrap_or(MAX_LEVEL)
}
