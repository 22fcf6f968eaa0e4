//! Reserved-zone classifier.
//!
//! # Responsibility
//! - Describe the non-signable regions of the flag artwork.
//! - Decide whether a cell coincides with one of those regions at any
//!   grid resolution.
//!
//! # Invariants
//! - Zones are expressed in image fractions (`0.0..=1.0`) and never change,
//!   so reserved regions track the artwork at every subdivision level.
//! - A cell is reserved iff its center lies inside a zone, bounds inclusive.

use crate::grid::cell::Cell;
use std::collections::BTreeSet;

/// Axis-aligned rectangle over the flag image, in image fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReservedZone {
    /// Label for diagnostics only.
    pub name: &'static str,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl ReservedZone {
    /// Returns whether the point lies inside the closed rectangle.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }
}

/// Non-signable regions of the flag. The bear is split into three boxes to
/// follow its silhouette and free the cells around it.
pub const RESERVED_ZONES: [ReservedZone; 7] = [
    ReservedZone {
        name: "star",
        x1: 0.07,
        y1: 0.05,
        x2: 0.17,
        y2: 0.20,
    },
    ReservedZone {
        name: "bear-back",
        x1: 0.27,
        y1: 0.20,
        x2: 0.77,
        y2: 0.34,
    },
    ReservedZone {
        name: "bear-body",
        x1: 0.21,
        y1: 0.34,
        x2: 0.77,
        y2: 0.52,
    },
    ReservedZone {
        name: "bear-legs",
        x1: 0.21,
        y1: 0.52,
        x2: 0.77,
        y2: 0.59,
    },
    ReservedZone {
        name: "grass",
        x1: 0.17,
        y1: 0.57,
        x2: 0.82,
        y2: 0.67,
    },
    ReservedZone {
        name: "text",
        x1: 0.14,
        y1: 0.69,
        x2: 0.86,
        y2: 0.80,
    },
    ReservedZone {
        name: "stripe",
        x1: 0.0,
        y1: 0.84,
        x2: 1.0,
        y2: 1.0,
    },
];

/// Returns the center of a cell in image fractions as `(x, y)`.
pub fn cell_center(row: u32, col: u32, total_rows: u32, total_cols: u32) -> (f64, f64) {
    let cx = (f64::from(col) + 0.5) / f64::from(total_cols);
    let cy = (f64::from(row) + 0.5) / f64::from(total_rows);
    (cx, cy)
}

/// Returns the first zone covering the cell center, if any.
pub fn zone_at(
    row: u32,
    col: u32,
    total_rows: u32,
    total_cols: u32,
) -> Option<&'static ReservedZone> {
    let (cx, cy) = cell_center(row, col, total_rows, total_cols);
    RESERVED_ZONES.iter().find(|zone| zone.contains(cx, cy))
}

/// Returns whether the cell falls inside a reserved zone.
pub fn is_cell_reserved(row: u32, col: u32, total_rows: u32, total_cols: u32) -> bool {
    zone_at(row, col, total_rows, total_cols).is_some()
}

/// Enumerates every reserved cell for a grid size.
pub fn reserved_cells(rows: u32, cols: u32) -> BTreeSet<Cell> {
    let mut reserved = BTreeSet::new();
    for row in 0..rows {
        for col in 0..cols {
            if is_cell_reserved(row, col, rows, cols) {
                reserved.insert(Cell::new(row, col));
            }
        }
    }
    reserved
}

#[cfg(test)]
mod tests {
    use super::{is_cell_reserved, reserved_cells, zone_at};
    use crate::grid::cell::Cell;

    #[test]
    fn top_left_corner_is_free_at_base_resolution() {
        assert!(!is_cell_reserved(0, 0, 10, 16));
    }

    #[test]
    fn star_bounds_are_inclusive() {
        // Center y of row 0 at 10 rows is exactly 0.05, the star's top edge.
        assert_eq!(zone_at(0, 1, 10, 16).map(|zone| zone.name), Some("star"));
    }

    #[test]
    fn stripe_covers_the_bottom_rows_at_every_level() {
        for level in 1..=5u32 {
            let factor = 1u32 << (level - 1);
            let rows = 10 * factor;
            let cols = 16 * factor;
            for col in 0..cols {
                assert!(is_cell_reserved(rows - 1, col, rows, cols));
            }
        }
    }

    #[test]
    fn same_fractional_point_is_reserved_alike_across_levels() {
        for (rows, cols) in [(10, 16), (20, 32), (40, 64)] {
            for row in 0..rows {
                for col in 0..cols {
                    let x = (f64::from(col) + 0.5) / f64::from(cols);
                    let y = (f64::from(row) + 0.5) / f64::from(rows);
                    let expected = super::RESERVED_ZONES
                        .iter()
                        .any(|zone| zone.contains(x, y));
                    assert_eq!(is_cell_reserved(row, col, rows, cols), expected);
                }
            }
        }
        // (1, 1) at 10x16 and (4, 4) at 30x48 share the center (0.09375, 0.15).
        assert_eq!(
            is_cell_reserved(1, 1, 10, 16),
            is_cell_reserved(4, 4, 30, 48)
        );
    }

    #[test]
    fn base_resolution_reserves_ninety_three_cells() {
        let reserved = reserved_cells(10, 16);
        assert_eq!(reserved.len(), 93);
        assert!(reserved.contains(&Cell::new(2, 4)));
        assert!(!reserved.contains(&Cell::new(2, 3)));
    }
}
