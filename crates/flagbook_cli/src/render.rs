//! Text rendering of a grid snapshot.
//!
//! `.` free, `@` signed, `#` reserved. With zone labels on, reserved cells
//! show the 1-based index of their zone and a legend follows the map.

use flagbook_core::grid::{zone_at, RESERVED_ZONES};
use flagbook_core::{Cell, CellStatus, GridInfo};
use std::fmt::Write;

pub(crate) fn render_grid(grid: &GridInfo, zones: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "level {} ({}x{}), {} free, {} signed",
        grid.level,
        grid.rows,
        grid.cols,
        grid.available_count(),
        grid.occupied_cells.len()
    );

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            out.push(cell_glyph(grid, Cell::new(row, col), zones));
        }
        out.push('\n');
    }

    if zones {
        for (index, zone) in RESERVED_ZONES.iter().enumerate() {
            let _ = writeln!(out, "{} {}", index + 1, zone.name);
        }
    }
    out
}

fn cell_glyph(grid: &GridInfo, cell: Cell, zones: bool) -> char {
    match grid.status_of(cell) {
        CellStatus::Available => '.',
        CellStatus::Occupied => '@',
        CellStatus::Reserved if zones => zone_glyph(grid, cell),
        CellStatus::Reserved | CellStatus::OutOfBounds => '#',
    }
}

fn zone_glyph(grid: &GridInfo, cell: Cell) -> char {
    zone_at(cell.row, cell.col, grid.rows, grid.cols)
        .and_then(|zone| {
            RESERVED_ZONES
                .iter()
                .position(|candidate| candidate.name == zone.name)
        })
        .and_then(|index| char::from_digit(index as u32 + 1, 10))
        .unwrap_or('#')
}
