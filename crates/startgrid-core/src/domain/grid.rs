//! Grid geometry and collision detection.
//!
//! The grid is a fixed number of columns wide and grows downward without a
//! ceiling.  Coordinates are 1-based: the top-left cell is `(1, 1)`.
//!
//! A tile at `(x, y)` with span `w × h` covers the half-open rectangle
//! `[x, x + w) × [y, y + h)`.  Two tiles that only share a border do not
//! overlap.
//!
//! All functions here are pure.  They are called on every drag-move event, so
//! each is at most a single linear pass over the layout.

use serde::{Deserialize, Serialize};

use super::item::PlacedItem;

/// Number of columns used by the start page unless configured otherwise.
pub const DEFAULT_COLUMNS: u32 = 12;

/// Rows scanned by [`find_free_slot`] before giving up.
pub const DEFAULT_MAX_ROWS_SCANNED: u32 = 100;

/// A 1-based cell coordinate.  `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
}

impl GridCoord {
    pub const ORIGIN: GridCoord = GridCoord { x: 1, y: 1 };

    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Width and height of a tile in whole cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub w: u32,
    pub h: u32,
}

impl Span {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Returns `true` if both dimensions are at least one cell.
    pub fn is_positive(&self) -> bool {
        self.w > 0 && self.h > 0
    }
}

/// An axis-aligned rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub fn new(at: GridCoord, span: Span) -> Self {
        Self {
            x: at.x,
            y: at.y,
            w: span.w,
            h: span.h,
        }
    }

    /// First column to the right of the rectangle (exclusive).
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// First row below the rectangle (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// Returns `true` if this rectangle shares at least one cell with `other`.
    pub fn overlaps(&self, other: &GridRect) -> bool {
        overlaps(self, other)
    }
}

/// Grid dimensions shared by placement, migration and drag validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    /// Number of columns.  Tiles must fit entirely within `1..=columns`.
    pub columns: u32,
    /// Row limit for the free-slot search.
    pub max_rows_scanned: u32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            max_rows_scanned: DEFAULT_MAX_ROWS_SCANNED,
        }
    }
}

impl GridSpec {
    pub fn new(columns: u32, max_rows_scanned: u32) -> Self {
        Self {
            columns,
            max_rows_scanned,
        }
    }

    /// [`find_free_slot`] with this grid's dimensions.
    pub fn find_free_slot(&self, span: Span, layout: &[PlacedItem]) -> GridCoord {
        find_free_slot(span, layout, self.columns, self.max_rows_scanned)
    }

    /// [`find_free_slot_checked`] with this grid's dimensions.
    pub fn find_free_slot_checked(&self, span: Span, layout: &[PlacedItem]) -> Option<GridCoord> {
        find_free_slot_checked(span, layout, self.columns, self.max_rows_scanned)
    }
}

/// Returns `true` if a tile of `span` placed at `at` lies inside the grid.
///
/// The tile must start at column ≥ 1 and row ≥ 1 and must end at or before
/// the last column.  There is no row ceiling.  A zero-sized span is never in
/// bounds.
pub fn bounds_check(span: Span, at: GridCoord, columns: u32) -> bool {
    span.is_positive() && at.x >= 1 && at.y >= 1 && at.x.saturating_add(span.w - 1) <= columns
}

/// Returns `true` if the two half-open rectangles intersect on both axes.
///
/// Touching edges (e.g. `a.right() == b.x`) is not an overlap.
pub fn overlaps(a: &GridRect, b: &GridRect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Returns `true` if `candidate` overlaps any tile in `layout` other than the
/// one whose id is `exclude_id`.
pub fn collides_with_any(
    candidate: &GridRect,
    layout: &[PlacedItem],
    exclude_id: Option<&str>,
) -> bool {
    layout
        .iter()
        .filter(|item| Some(item.id.as_str()) != exclude_id)
        .any(|item| overlaps(candidate, &item.rect()))
}

/// Finds the earliest free slot for `span` in row-major order.
///
/// Scans `(1,1), (2,1), …` until the span would cross the last column, then
/// wraps to the next row.  The first position that is in bounds and
/// collision-free wins, so the result depends only on the inputs.
///
/// If nothing is free within the first `max_rows_scanned` rows this returns
/// `(1, 1)`, which may overlap an existing tile.  Use
/// [`find_free_slot_checked`] to get `None` instead.
pub fn find_free_slot(
    span: Span,
    layout: &[PlacedItem],
    columns: u32,
    max_rows_scanned: u32,
) -> GridCoord {
    find_free_slot_checked(span, layout, columns, max_rows_scanned).unwrap_or(GridCoord::ORIGIN)
}

/// Same scan as [`find_free_slot`] but reports an exhausted search as `None`.
pub fn find_free_slot_checked(
    span: Span,
    layout: &[PlacedItem],
    columns: u32,
    max_rows_scanned: u32,
) -> Option<GridCoord> {
    for y in 1..=max_rows_scanned {
        let mut x = 1;
        while bounds_check(span, GridCoord::new(x, y), columns) {
            let candidate = GridRect::new(GridCoord::new(x, y), span);
            if !collides_with_any(&candidate, layout, None) {
                return Some(GridCoord::new(x, y));
            }
            x += 1;
        }
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::WidgetKind;

    fn tile(id: &str, x: u32, y: u32, w: u32, h: u32) -> PlacedItem {
        PlacedItem::new(id, WidgetKind::History, GridCoord::new(x, y), Span::new(w, h))
    }

    fn rect(x: u32, y: u32, w: u32, h: u32) -> GridRect {
        GridRect::new(GridCoord::new(x, y), Span::new(w, h))
    }

    // ── bounds_check ──────────────────────────────────────────────────────────

    #[test]
    fn test_bounds_check_accepts_span_ending_on_last_column() {
        assert!(bounds_check(Span::new(2, 1), GridCoord::new(11, 1), 12));
    }

    #[test]
    fn test_bounds_check_rejects_one_column_past_right_edge() {
        // x = COLS - w + 2
        assert!(!bounds_check(Span::new(2, 1), GridCoord::new(12, 1), 12));
    }

    #[test]
    fn test_bounds_check_rejects_zero_coordinates() {
        assert!(!bounds_check(Span::new(1, 1), GridCoord::new(0, 1), 12));
        assert!(!bounds_check(Span::new(1, 1), GridCoord::new(1, 0), 12));
    }

    #[test]
    fn test_bounds_check_has_no_row_ceiling() {
        assert!(bounds_check(Span::new(1, 4), GridCoord::new(1, 10_000), 12));
    }

    #[test]
    fn test_bounds_check_rejects_zero_span() {
        assert!(!bounds_check(Span::new(0, 1), GridCoord::new(1, 1), 12));
        assert!(!bounds_check(Span::new(1, 0), GridCoord::new(1, 1), 12));
    }

    #[test]
    fn test_bounds_check_does_not_overflow_near_u32_max() {
        assert!(!bounds_check(Span::new(3, 1), GridCoord::new(u32::MAX, 1), 12));
    }

    // ── overlaps ──────────────────────────────────────────────────────────────

    #[test]
    fn test_overlaps_when_rectangles_share_a_cell() {
        assert!(overlaps(&rect(1, 1, 2, 2), &rect(2, 2, 2, 2)));
    }

    #[test]
    fn test_overlaps_is_false_for_touching_edges() {
        assert!(!overlaps(&rect(1, 1, 2, 1), &rect(3, 1, 2, 1)));
        assert!(!overlaps(&rect(1, 1, 1, 2), &rect(1, 3, 1, 1)));
    }

    #[test]
    fn test_overlaps_when_one_contains_the_other() {
        assert!(overlaps(&rect(1, 1, 4, 4), &rect(2, 2, 1, 1)));
    }

    // ── collides_with_any ─────────────────────────────────────────────────────

    #[test]
    fn test_collides_with_any_ignores_excluded_item() {
        let layout = vec![tile("a", 1, 1, 2, 2)];
        let candidate = rect(2, 1, 2, 2);
        assert!(collides_with_any(&candidate, &layout, None));
        assert!(!collides_with_any(&candidate, &layout, Some("a")));
    }

    #[test]
    fn test_collides_with_any_is_false_for_empty_layout() {
        assert!(!collides_with_any(&rect(1, 1, 12, 8), &[], None));
    }

    // ── find_free_slot ────────────────────────────────────────────────────────

    #[test]
    fn test_find_free_slot_skips_adjacent_items_on_first_row() {
        let layout = vec![tile("a", 1, 1, 2, 1), tile("b", 3, 1, 2, 1)];
        let slot = find_free_slot(Span::new(2, 1), &layout, 12, 100);
        assert_eq!(slot, GridCoord::new(5, 1));
    }

    #[test]
    fn test_find_free_slot_wraps_to_next_row_when_row_is_full() {
        let layout = vec![tile("a", 1, 1, 11, 1)];
        let slot = find_free_slot(Span::new(2, 1), &layout, 12, 100);
        assert_eq!(slot, GridCoord::new(1, 2));
    }

    #[test]
    fn test_find_free_slot_returns_origin_on_empty_layout() {
        assert_eq!(find_free_slot(Span::new(3, 2), &[], 12, 100), GridCoord::ORIGIN);
    }

    #[test]
    fn test_find_free_slot_is_deterministic() {
        let layout = vec![tile("a", 2, 1, 3, 2), tile("b", 7, 2, 2, 2)];
        let first = find_free_slot(Span::new(2, 2), &layout, 12, 100);
        let second = find_free_slot(Span::new(2, 2), &layout, 12, 100);
        assert_eq!(first, second);
        assert_eq!(first, GridCoord::new(5, 1));
    }

    #[test]
    fn test_find_free_slot_falls_back_to_origin_when_scan_is_exhausted() {
        let layout = vec![tile("wall", 1, 1, 12, 3)];
        let slot = find_free_slot(Span::new(1, 1), &layout, 12, 3);
        assert_eq!(slot, GridCoord::ORIGIN);
        assert_eq!(find_free_slot_checked(Span::new(1, 1), &layout, 12, 3), None);
    }

    #[test]
    fn test_find_free_slot_checked_is_none_for_span_wider_than_grid() {
        assert_eq!(find_free_slot_checked(Span::new(13, 1), &[], 12, 100), None);
    }

    #[test]
    fn test_grid_spec_default_is_twelve_columns_and_hundred_rows() {
        let grid = GridSpec::default();
        assert_eq!(grid.columns, 12);
        assert_eq!(grid.max_rows_scanned, 100);
    }
}
