//! The layout store: an ordered collection of tiles that keeps the grid
//! invariants after every committed mutation.
//!
//! Invariants, checked by every mutation that touches geometry:
//!
//! - **In bounds** – `x ≥ 1`, `y ≥ 1`, `x + w − 1 ≤ columns`.
//! - **No overlap** – no two tiles share a cell.
//!
//! Insertion order is kept for stable rendering and scanning; it carries no
//! z-order or tab-order meaning.
//!
//! Invalid moves are an ordinary outcome of dropping a tile somewhere it does
//! not fit, so [`LayoutCollection::try_move`] reports them as a
//! [`MoveOutcome::Rejected`] value and leaves the collection untouched.

use std::mem;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::grid::{bounds_check, collides_with_any, GridCoord, GridRect, Span};
use super::item::{PlacedItem, WidgetKind};

/// Errors raised by layout mutations that must not silently proceed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// An item with the same id is already in the layout.
    #[error("duplicate item id: {0}")]
    DuplicateId(String),

    /// No item with the given id exists.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// The item would extend past the grid edge.
    #[error("item {id} at ({x}, {y}) does not fit inside the grid")]
    OutOfBounds { id: String, x: u32, y: u32 },

    /// The item would share a cell with another item.
    #[error("item {id} overlaps an existing item")]
    Overlap { id: String },

    /// The free-slot search found nothing within its row limit.
    #[error("no free {w}x{h} slot within the scanned rows")]
    NoFreeSlot { w: u32, h: u32 },

    /// The span is not allowed for this kind of item.
    #[error("invalid {w}x{h} size for {kind} item")]
    InvalidSpan { kind: &'static str, w: u32, h: u32 },

    /// A field update tried to turn the item into a different kind.
    #[error("field update changed the kind of item {0}")]
    KindChanged(String),
}

/// Why a move or resize was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The item is not in the layout.
    UnknownItem,
    /// The target rectangle crosses the grid edge.
    OutOfBounds,
    /// The target rectangle overlaps another item.
    Collision,
    /// The item's kind has a fixed size.
    FixedSize,
}

/// Result of [`LayoutCollection::try_move`] and [`LayoutCollection::try_resize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted,
    Rejected(Rejection),
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted)
    }
}

/// Ordered collection of placed tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutCollection {
    items: Vec<PlacedItem>,
}

impl LayoutCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already-placed items without validating them.
    ///
    /// Used by migration, which places items itself; call
    /// [`check_invariants`](Self::check_invariants) when the source is untrusted.
    pub fn from_items(items: Vec<PlacedItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<PlacedItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PlacedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    /// Appends an item whose position the caller has already chosen.
    ///
    /// The store does not search for a slot; use
    /// [`GridSpec::find_free_slot_checked`](super::grid::GridSpec::find_free_slot_checked)
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::DuplicateId`], [`LayoutError::OutOfBounds`] or
    /// [`LayoutError::Overlap`] instead of committing an invalid item.
    pub fn add_item(&mut self, item: PlacedItem, columns: u32) -> Result<(), LayoutError> {
        if self.contains(&item.id) {
            return Err(LayoutError::DuplicateId(item.id));
        }
        if !bounds_check(item.span(), item.coord(), columns) {
            return Err(LayoutError::OutOfBounds {
                id: item.id,
                x: item.x,
                y: item.y,
            });
        }
        if collides_with_any(&item.rect(), &self.items, None) {
            return Err(LayoutError::Overlap { id: item.id });
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes the item with `id`.  Absent ids are a no-op.
    pub fn remove_item(&mut self, id: &str) -> Option<PlacedItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Applies `apply` to the payload of the item with `id`.
    ///
    /// Geometry is not reachable from the closure; moves and resizes go
    /// through [`try_move`](Self::try_move) and [`try_resize`](Self::try_resize).
    /// Returns `Ok(false)` if no such item exists.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::KindChanged`] (and restores the old payload) if
    /// the closure replaced the kind with a different variant.
    pub fn update_item_fields<F>(&mut self, id: &str, apply: F) -> Result<bool, LayoutError>
    where
        F: FnOnce(&mut WidgetKind),
    {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        let before = item.kind.clone();
        apply(&mut item.kind);
        if mem::discriminant(&before) != mem::discriminant(&item.kind) {
            item.kind = before;
            return Err(LayoutError::KindChanged(id.to_string()));
        }
        Ok(true)
    }

    /// Checks whether the item `id` could occupy `span` at `target`.
    ///
    /// This is the single placement predicate shared by committed moves and
    /// the live drag preview.  The item's own current rectangle is ignored.
    pub fn check_placement(
        &self,
        id: &str,
        target: GridCoord,
        span: Span,
        columns: u32,
    ) -> Result<(), Rejection> {
        if !self.contains(id) {
            return Err(Rejection::UnknownItem);
        }
        if !bounds_check(span, target, columns) {
            return Err(Rejection::OutOfBounds);
        }
        if collides_with_any(&GridRect::new(target, span), &self.items, Some(id)) {
            return Err(Rejection::Collision);
        }
        Ok(())
    }

    /// [`check_placement`](Self::check_placement) using the item's current span.
    pub fn check_move(&self, id: &str, target: GridCoord, columns: u32) -> Result<(), Rejection> {
        let span = self.get(id).ok_or(Rejection::UnknownItem)?.span();
        self.check_placement(id, target, span, columns)
    }

    /// Moves the item `id` so its top-left corner is at `target`.
    ///
    /// Rejected moves leave the collection unchanged.
    pub fn try_move(&mut self, id: &str, target: GridCoord, columns: u32) -> MoveOutcome {
        if let Err(reason) = self.check_move(id, target, columns) {
            debug!(item = id, x = target.x, y = target.y, ?reason, "move rejected");
            return MoveOutcome::Rejected(reason);
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.x = target.x;
            item.y = target.y;
        }
        MoveOutcome::Accepted
    }

    /// Changes the span of a resizable item, keeping its top-left corner.
    ///
    /// Uses the same bounds and collision predicate as [`try_move`](Self::try_move).
    pub fn try_resize(&mut self, id: &str, span: Span, columns: u32) -> MoveOutcome {
        let Some(item) = self.get(id) else {
            return MoveOutcome::Rejected(Rejection::UnknownItem);
        };
        if item.kind.validate_span(span).is_err() {
            return MoveOutcome::Rejected(Rejection::FixedSize);
        }
        if let Err(reason) = self.check_placement(id, item.coord(), span, columns) {
            debug!(item = id, w = span.w, h = span.h, ?reason, "resize rejected");
            return MoveOutcome::Rejected(reason);
        }
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.w = span.w;
            item.h = span.h;
        }
        MoveOutcome::Accepted
    }

    /// Verifies both grid invariants and unique ids over the whole collection.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in insertion order.
    pub fn check_invariants(&self, columns: u32) -> Result<(), LayoutError> {
        for (index, item) in self.items.iter().enumerate() {
            if !bounds_check(item.span(), item.coord(), columns) {
                return Err(LayoutError::OutOfBounds {
                    id: item.id.clone(),
                    x: item.x,
                    y: item.y,
                });
            }
            let earlier = &self.items[..index];
            if earlier.iter().any(|other| other.id == item.id) {
                return Err(LayoutError::DuplicateId(item.id.clone()));
            }
            if collides_with_any(&item.rect(), earlier, None) {
                return Err(LayoutError::Overlap {
                    id: item.id.clone(),
                });
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
