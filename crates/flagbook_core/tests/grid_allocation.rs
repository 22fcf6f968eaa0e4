use flagbook_core::grid::{
    compute_actual_span, compute_desired_span, compute_grid_info, compute_grid_level,
    grid_dimensions, level_capacity, reserved_cells, Cell, CellStatus, GridInfo, Placement,
    PlacementError, MAX_LEVEL, MAX_SPAN,
};
use std::collections::BTreeSet;

fn assert_partition(info: &GridInfo) {
    let available: BTreeSet<Cell> = info.available_cells.iter().copied().collect();
    assert_eq!(available.len(), info.available_cells.len(), "duplicate free cell");
    assert!(info.reserved_cells.is_disjoint(&info.occupied_cells));
    assert!(info.reserved_cells.is_disjoint(&available));
    assert!(info.occupied_cells.is_disjoint(&available));
    assert_eq!(
        info.reserved_cells.len() + info.occupied_cells.len() + available.len(),
        info.cell_count()
    );
    for cell in info
        .reserved_cells
        .iter()
        .chain(info.occupied_cells.iter())
        .chain(available.iter())
    {
        assert!(info.contains(*cell), "cell {cell} outside grid");
    }
}

/// Fills every free cell of the current snapshot with single-cell messages.
fn fill_level(placements: &mut Vec<Placement>) {
    let info = compute_grid_info(placements);
    placements.extend(
        info.available_cells
            .iter()
            .map(|cell| Placement::new(cell.row, cell.col, 1)),
    );
}

#[test]
fn empty_grid_resolves_to_base_level() {
    let info = compute_grid_info(&[]);

    assert_eq!(info.level, 1);
    assert_eq!((info.rows, info.cols), (10, 16));
    assert_eq!(info.cell_count(), 160);
    assert_eq!(
        info.available_count(),
        160 - reserved_cells(10, 16).len()
    );
    assert_partition(&info);
}

#[test]
fn short_message_at_free_corner_takes_one_cell() {
    let empty = compute_grid_info(&[]);
    let allocation = empty.allocate(Cell::new(0, 0), 5).unwrap();
    assert_eq!(allocation.span, 1);

    let next = compute_grid_info(&[allocation.placement()]);
    assert_eq!(next.status_of(Cell::new(0, 0)), CellStatus::Occupied);
    assert_eq!(next.status_of(Cell::new(0, 1)), CellStatus::Reserved);
    assert_partition(&next);
}

#[test]
fn long_message_is_truncated_before_reserved_cell() {
    let info = compute_grid_info(&[]);

    // Row 3 is free at cols 0..=2 and reserved from col 3.
    let tight = info.allocate(Cell::new(3, 2), 60).unwrap();
    assert_eq!((tight.desired_span, tight.span), (3, 1));

    // Row 2 is free at cols 0..=3 and reserved from col 4.
    let roomy = info.allocate(Cell::new(2, 2), 60).unwrap();
    assert_eq!((roomy.desired_span, roomy.span), (3, 2));
}

#[test]
fn crossing_capacity_subdivides_and_keeps_placements() {
    let mut placements = Vec::new();
    fill_level(&mut placements);
    assert_eq!(placements.len(), level_capacity(1));

    let info = compute_grid_info(&placements);
    assert_eq!(info.level, 2);
    assert_eq!((info.rows, info.cols), (20, 32));
    for cell in placements.iter().flat_map(Placement::cells) {
        assert_eq!(info.status_of(cell), CellStatus::Occupied, "cell {cell}");
    }
    assert_partition(&info);
}

#[test]
fn one_short_of_capacity_stays_on_base_level() {
    let mut placements = Vec::new();
    fill_level(&mut placements);
    placements.pop();

    let info = compute_grid_info(&placements);
    assert_eq!(info.level, 1);
    assert_eq!(info.available_count(), 1);
}

#[test]
fn wide_spans_count_towards_level() {
    // Four-cell messages on the free right side of rows 0 and 1.
    let mut placements = vec![
        Placement::new(0, 4, 4),
        Placement::new(0, 8, 4),
        Placement::new(0, 12, 4),
        Placement::new(1, 4, 4),
        Placement::new(1, 8, 4),
        Placement::new(1, 12, 4),
    ];
    let info = compute_grid_info(&placements);
    assert_eq!(info.occupied_cells.len(), 24);
    assert_eq!(info.level, 1);

    fill_level(&mut placements);
    assert_eq!(compute_grid_info(&placements).level, 2);
}

#[test]
fn partition_holds_across_levels() {
    let mut placements = Vec::new();
    for _ in 0..2 {
        fill_level(&mut placements);
        let info = compute_grid_info(&placements);
        assert_partition(&info);
    }
    let info = compute_grid_info(&placements);
    assert_eq!(info.level, 3);
}

#[test]
fn level_resolver_matches_dimension_growth() {
    for level in 1..=MAX_LEVEL {
        let dims = grid_dimensions(level);
        assert_eq!(dims.rows, 10 << (level - 1));
        assert_eq!(dims.cols, 16 << (level - 1));
        let capacity = level_capacity(level);
        if level < MAX_LEVEL {
            assert_eq!(compute_grid_level(capacity - 1), level);
            assert_eq!(compute_grid_level(capacity), level + 1);
        }
    }
}

#[test]
fn actual_span_never_overlaps_existing_cells() {
    let info = compute_grid_info(&[
        Placement::new(0, 6, 1),
        Placement::new(0, 10, 2),
        Placement::new(1, 9, 1),
    ]);

    for cell in &info.available_cells {
        for length in [0, 20, 21, 50, 51, 100, 101, 500] {
            let desired = compute_desired_span(length);
            let span = compute_actual_span(
                desired,
                cell.row,
                cell.col,
                info.cols,
                &info.reserved_cells,
                &info.occupied_cells,
            );
            assert!((1..=desired).contains(&span));
            assert!(span <= MAX_SPAN);
            let placed = Placement::new(cell.row, cell.col, span);
            for covered in placed.cells() {
                assert!(info.contains(covered));
                assert!(!info.reserved_cells.contains(&covered));
                assert!(!info.occupied_cells.contains(&covered));
            }
        }
    }
}

#[test]
fn full_grid_at_last_level_is_reported_as_full() {
    let dims = grid_dimensions(MAX_LEVEL);
    let reserved = reserved_cells(dims.rows, dims.cols);
    let mut placements = Vec::new();
    for row in 0..dims.rows {
        for col in 0..dims.cols {
            if !reserved.contains(&Cell::new(row, col)) {
                placements.push(Placement::new(row, col, 1));
            }
        }
    }

    let info = compute_grid_info(&placements);
    assert_eq!(info.level, MAX_LEVEL);
    assert!(info.is_full());
    assert_eq!(
        info.check_origin(Cell::new(0, 0)),
        Err(PlacementError::GridFull { level: MAX_LEVEL })
    );
    assert!(matches!(
        info.check_origin(Cell::new(dims.rows, 0)),
        Err(PlacementError::OutOfBounds { .. })
    ));
    assert_partition(&info);
}
