//! Grid state aggregation and placement validation.
//!
//! # Responsibility
//! - Derive the full grid state from a snapshot of message placements.
//! - Validate a candidate origin and allocate its span against that state.
//!
//! # Invariants
//! - Grid state is recomputed from scratch for every snapshot; nothing here
//!   is cached or mutated incrementally.
//! - `reserved_cells`, `occupied_cells` and `available_cells` partition the
//!   cells of the computed resolution.
//! - A stored message keeps its `(row, col)` across subdivisions. If one of
//!   its cells lands on a reserved zone at a finer resolution, the cell is
//!   reported occupied, not reserved.

use crate::grid::cell::Cell;
use crate::grid::level::{compute_grid_level, grid_dimensions};
use crate::grid::span::{compute_actual_span, compute_desired_span, MAX_SPAN};
use crate::grid::zone::reserved_cells;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Grid-relevant fields of one stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub row: u32,
    pub col: u32,
    /// Columns claimed to the right, origin included. `0` is read as `1`.
    pub span: u32,
}

impl Placement {
    pub fn new(row: u32, col: u32, span: u32) -> Self {
        Self { row, col, span }
    }

    pub fn origin(&self) -> Cell {
        Cell::new(self.row, self.col)
    }

    pub fn effective_span(&self) -> u32 {
        self.span.max(1)
    }

    /// Cells covered by this placement, origin first.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let origin = self.origin();
        (0..self.effective_span()).map(move |offset| origin.right(offset))
    }
}

/// Classification of one cell in a grid snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Available,
    Reserved,
    Occupied,
    OutOfBounds,
}

/// Why a cell cannot receive a new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// Origin lies outside the current grid.
    OutOfBounds { cell: Cell, rows: u32, cols: u32 },
    /// Origin lies on a reserved zone.
    Reserved(Cell),
    /// Origin is already covered by a message.
    Occupied(Cell),
    /// No free cell is left at the last subdivision level.
    GridFull { level: u32 },
}

impl Display for PlacementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds { cell, rows, cols } => {
                write!(f, "cell {cell} is outside the {rows}x{cols} grid")
            }
            Self::Reserved(cell) => write!(f, "cell {cell} is in a reserved zone"),
            Self::Occupied(cell) => write!(f, "cell {cell} is already taken"),
            Self::GridFull { level } => write!(f, "grid is full at level {level}"),
        }
    }
}

impl Error for PlacementError {}

/// Span decision for a new message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub origin: Cell,
    /// Span wanted by the text length alone.
    pub desired_span: u32,
    /// Span that fits at the origin; what gets persisted.
    pub span: u32,
}

impl Allocation {
    pub fn placement(&self) -> Placement {
        Placement::new(self.origin.row, self.origin.col, self.span)
    }
}

/// Serializable grid summary for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStatus {
    pub level: u32,
    pub cols: u32,
    pub rows: u32,
    pub reserved_cells: Vec<Cell>,
    pub occupied_cells: Vec<Cell>,
    pub available_count: usize,
}

/// Authoritative grid state derived from one placement snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridInfo {
    pub level: u32,
    pub rows: u32,
    pub cols: u32,
    pub reserved_cells: BTreeSet<Cell>,
    pub occupied_cells: BTreeSet<Cell>,
    /// Free cells in row-major order.
    pub available_cells: Vec<Cell>,
}

/// Derives grid state from every stored placement.
pub fn compute_grid_info(placements: &[Placement]) -> GridInfo {
    let total_occupied = placements
        .iter()
        .map(|placement| placement.effective_span() as usize)
        .sum();

    let level = compute_grid_level(total_occupied);
    let dims = grid_dimensions(level);
    let mut reserved = reserved_cells(dims.rows, dims.cols);

    let mut occupied = BTreeSet::new();
    for cell in placements.iter().flat_map(Placement::cells) {
        if cell.row >= dims.rows || cell.col >= dims.cols {
            continue;
        }
        reserved.remove(&cell);
        occupied.insert(cell);
    }

    let mut available = Vec::new();
    for row in 0..dims.rows {
        for col in 0..dims.cols {
            let cell = Cell::new(row, col);
            if !reserved.contains(&cell) && !occupied.contains(&cell) {
                available.push(cell);
            }
        }
    }

    GridInfo {
        level,
        rows: dims.rows,
        cols: dims.cols,
        reserved_cells: reserved,
        occupied_cells: occupied,
        available_cells: available,
    }
}

impl GridInfo {
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn available_count(&self) -> usize {
        self.available_cells.len()
    }

    /// Returns whether no message can be placed anywhere.
    pub fn is_full(&self) -> bool {
        self.available_cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn status_of(&self, cell: Cell) -> CellStatus {
        if !self.contains(cell) {
            CellStatus::OutOfBounds
        } else if self.occupied_cells.contains(&cell) {
            CellStatus::Occupied
        } else if self.reserved_cells.contains(&cell) {
            CellStatus::Reserved
        } else {
            CellStatus::Available
        }
    }

    /// Checks that a new message may start at `cell`.
    pub fn check_origin(&self, cell: Cell) -> Result<(), PlacementError> {
        if !self.contains(cell) {
            return Err(PlacementError::OutOfBounds {
                cell,
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.is_full() {
            return Err(PlacementError::GridFull { level: self.level });
        }
        match self.status_of(cell) {
            CellStatus::Reserved => Err(PlacementError::Reserved(cell)),
            CellStatus::Occupied => Err(PlacementError::Occupied(cell)),
            CellStatus::OutOfBounds => Err(PlacementError::OutOfBounds {
                cell,
                rows: self.rows,
                cols: self.cols,
            }),
            CellStatus::Available => Ok(()),
        }
    }

    /// Validates `origin` and sizes a message of `text_len` characters.
    pub fn allocate(&self, origin: Cell, text_len: usize) -> Result<Allocation, PlacementError> {
        self.check_origin(origin)?;
        let desired_span = compute_desired_span(text_len);
        let span = compute_actual_span(
            desired_span,
            origin.row,
            origin.col,
            self.cols,
            &self.reserved_cells,
            &self.occupied_cells,
        );
        Ok(Allocation {
            origin,
            desired_span,
            span,
        })
    }

    /// Largest span any message could take at `cell`, or `None` when the
    /// cell cannot take a message at all.
    pub fn max_span_at(&self, cell: Cell) -> Option<u32> {
        if self.status_of(cell) != CellStatus::Available {
            return None;
        }
        Some(compute_actual_span(
            MAX_SPAN,
            cell.row,
            cell.col,
            self.cols,
            &self.reserved_cells,
            &self.occupied_cells,
        ))
    }

    pub fn status(&self) -> GridStatus {
        GridStatus {
            level: self.level,
            cols: self.cols,
            rows: self.rows,
            reserved_cells: self.reserved_cells.iter().copied().collect(),
            occupied_cells: self.occupied_cells.iter().copied().collect(),
            available_count: self.available_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{compute_grid_info, CellStatus, Placement, PlacementError};
    use crate::grid::cell::Cell;

    #[test]
    fn empty_grid_is_level_one() {
        let info = compute_grid_info(&[]);
        assert_eq!((info.level, info.rows, info.cols), (1, 10, 16));
        assert_eq!(info.reserved_cells.len(), 93);
        assert!(info.occupied_cells.is_empty());
        assert_eq!(info.available_count(), 67);
        assert_eq!(info.available_cells.first(), Some(&Cell::new(0, 0)));
    }

    #[test]
    fn spans_mark_cells_to_the_right() {
        let info = compute_grid_info(&[Placement::new(0, 4, 3)]);
        for col in 4..7 {
            assert_eq!(info.status_of(Cell::new(0, col)), CellStatus::Occupied);
        }
        assert_eq!(info.status_of(Cell::new(0, 7)), CellStatus::Available);
    }

    #[test]
    fn zero_span_counts_as_one() {
        let info = compute_grid_info(&[Placement::new(0, 0, 0)]);
        assert_eq!(info.occupied_cells.len(), 1);
        assert_eq!(info.available_count(), 66);
    }

    #[test]
    fn origin_checks_are_distinct() {
        let info = compute_grid_info(&[Placement::new(0, 0, 1)]);
        assert_eq!(
            info.check_origin(Cell::new(0, 0)),
            Err(PlacementError::Occupied(Cell::new(0, 0)))
        );
        assert_eq!(
            info.check_origin(Cell::new(9, 0)),
            Err(PlacementError::Reserved(Cell::new(9, 0)))
        );
        assert!(matches!(
            info.check_origin(Cell::new(0, 16)),
            Err(PlacementError::OutOfBounds { rows: 10, cols: 16, .. })
        ));
        assert_eq!(info.check_origin(Cell::new(0, 3)), Ok(()));
    }

    #[test]
    fn cells_past_any_edge_are_never_accepted() {
        let info = compute_grid_info(&[]);
        for cell in [Cell::new(10, 0), Cell::new(0, 16), Cell::new(u32::MAX, u32::MAX)] {
            assert_eq!(info.status_of(cell), CellStatus::OutOfBounds);
            assert!(matches!(
                info.check_origin(cell),
                Err(PlacementError::OutOfBounds { rows: 10, cols: 16, .. })
            ));
            assert!(info.allocate(cell, 5).is_err());
        }
    }

    #[test]
    fn allocation_truncates_before_reserved_cell() {
        let info = compute_grid_info(&[]);
        // Row 2 is free at cols 2 and 3, reserved from col 4.
        let allocation = info.allocate(Cell::new(2, 2), 60).unwrap();
        assert_eq!(allocation.desired_span, 3);
        assert_eq!(allocation.span, 2);
    }

    #[test]
    fn max_span_only_for_available_cells() {
        let info = compute_grid_info(&[Placement::new(0, 6, 1)]);
        assert_eq!(info.max_span_at(Cell::new(0, 3)), Some(3));
        assert_eq!(info.max_span_at(Cell::new(0, 6)), None);
        assert_eq!(info.max_span_at(Cell::new(9, 9)), None);
    }

    #[test]
    fn status_lists_cell_keys() {
        let info = compute_grid_info(&[Placement::new(0, 3, 2)]);
        let json = serde_json::to_value(info.status()).unwrap();
        assert_eq!(json["level"], 1);
        assert_eq!(json["occupiedCells"], serde_json::json!(["0-3", "0-4"]));
        assert_eq!(json["availableCount"], 65);
        assert_eq!(json["reservedCells"].as_array().map(Vec::len), Some(93));
    }
}
