//! Expanding ring searches used to resolve anchors to concrete tiles.

use maze_escape_core::CellCoord;

/// Visits tiles at increasing Chebyshev radius around `anchor` and returns the
/// first one accepted by `predicate`.
///
/// Within a ring tiles are visited row by row, left to right, so the result is
/// deterministic for a given anchor and grid.
pub fn nearest_matching<F>(
    columns: u32,
    rows: u32,
    anchor: CellCoord,
    mut predicate: F,
) -> Option<CellCoord>
where
    F: FnMut(CellCoord) -> bool,
{
    let max_radius = i64::from(columns.max(rows));
    for radius in 0..=max_radius {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() != radius && dy.abs() != radius {
                    continue;
                }
                let Some(cell) = anchor.offset(dx, dy, columns, rows) else {
                    continue;
                };
                if predicate(cell) {
                    return Some(cell);
                }
            }
        }
    }
    None
}

/// Converts a fractional anchor into a clamped tile coordinate.
#[must_use]
pub fn fractional_anchor(columns: u32, rows: u32, fx: f32, fy: f32, jitter: (i64, i64)) -> CellCoord {
    let column = (columns as f32 * fx).floor() as i64 + jitter.0;
    let row = (rows as f32 * fy).floor() as i64 + jitter.1;
    let max_column = i64::from(columns.saturating_sub(1));
    let max_row = i64::from(rows.saturating_sub(1));
    CellCoord::new(
        column.clamp(0, max_column) as u32,
        row.clamp(0, max_row) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_itself_wins_when_accepted() {
        let anchor = CellCoord::new(3, 3);
        assert_eq!(nearest_matching(8, 8, anchor, |_| true), Some(anchor));
    }

    #[test]
    fn inner_rings_are_exhausted_first() {
        let anchor = CellCoord::new(4, 4);
        let found = nearest_matching(10, 10, anchor, |cell| {
            cell.chebyshev_distance(anchor) == 2 && cell.column() == 6
        });
        assert_eq!(found, Some(CellCoord::new(6, 2)));
    }

    #[test]
    fn exhausted_search_returns_none() {
        assert_eq!(nearest_matching(4, 4, CellCoord::new(0, 0), |_| false), None);
    }

    #[test]
    fn fractional_anchor_clamps_to_grid() {
        assert_eq!(
            fractional_anchor(30, 30, 0.8, 0.2, (0, 0)),
            CellCoord::new(24, 6)
        );
        assert_eq!(
            fractional_anchor(30, 30, 1.0, 0.0, (1, -1)),
            CellCoord::new(29, 0)
        );
    }
}
