//! Grid allocation core.
//!
//! # Responsibility
//! - Classify cells against the fixed reserved zones of the flag artwork.
//! - Resolve the subdivision level from the occupied-cell count.
//! - Allocate horizontal spans for new messages.
//! - Aggregate all of the above into one derived grid snapshot.
//!
//! # Invariants
//! - Everything here is pure: no I/O, no shared mutable state.
//! - Grid state is derived from the message placements on every call.

pub mod cell;
pub mod info;
pub mod level;
pub mod span;
pub mod zone;

pub use cell::{cell_key, parse_key, Cell, CellKeyError};
pub use info::{
    compute_grid_info, Allocation, CellStatus, GridInfo, GridStatus, Placement, PlacementError,
};
pub use level::{
    compute_grid_level, grid_dimensions, level_capacity, GridDimensions, BASE_COLS, BASE_ROWS,
    MAX_LEVEL, MIN_LEVEL,
};
pub use span::{compute_actual_span, compute_desired_span, MAX_SPAN};
pub use zone::{is_cell_reserved, reserved_cells, zone_at, ReservedZone, RESERVED_ZONES};
