//! Drag session controller.
//!
//! Tracks the one tile currently being dragged and reports whether the cell
//! under the pointer would accept it.
//!
//! ```text
//!            begin(id)                 end(Some(target)) / end(None) / cancel()
//!   Idle ───────────────► Dragging ─────────────────────────────────────────► Idle
//!                         │     ▲
//!                         └─────┘ update(target)   recompute validity
//! ```
//!
//! The preview never mutates the layout.  Validity is computed with
//! [`LayoutCollection::check_move`], the same predicate
//! [`LayoutCollection::try_move`] applies on commit, so the feedback shown
//! while dragging always matches what the drop will do.

use tracing::debug;

use super::grid::GridCoord;
use super::layout::{LayoutCollection, MoveOutcome, Rejection};

/// Current state of the drag session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item_id: String,
        /// Whether dropping at the last reported target would be accepted.
        valid: bool,
    },
}

/// What happened when a drag ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The tile moved to `to`.
    Committed { item_id: String, to: GridCoord },
    /// The drop target was refused; the layout is unchanged.
    Rejected { item_id: String, reason: Rejection },
    /// The drag ended with no target (pointer left the grid, escape, lost
    /// pointer); the layout is unchanged.
    Cancelled { item_id: String },
    /// `end` or `cancel` was called with no drag in progress.
    NotDragging,
}

/// State machine for one pointer-driven tile drag.
#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Id of the tile being dragged, if any.
    pub fn active_item(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { item_id, .. } => Some(item_id),
            DragState::Idle => None,
        }
    }

    /// Current validity flag for `item_id`, or `None` if it is not being dragged.
    pub fn validity_of(&self, item_id: &str) -> Option<bool> {
        match &self.state {
            DragState::Dragging { item_id: id, valid } if id == item_id => Some(*valid),
            _ => None,
        }
    }

    /// Starts dragging `item_id`.  The drag starts out valid.
    ///
    /// Beginning a new drag while one is active abandons the old one.
    pub fn begin(&mut self, item_id: impl Into<String>) {
        let item_id = item_id.into();
        if let Some(previous) = self.active_item() {
            debug!(previous, next = %item_id, "drag replaced before drop");
        }
        self.state = DragState::Dragging {
            item_id,
            valid: true,
        };
    }

    /// Recomputes validity for a pointer over `target` (`None` when the
    /// pointer is outside the grid).
    ///
    /// Returns `Some(valid)` only when the flag changed, so callers can skip
    /// redundant redraws.  Returns `None` when idle.
    pub fn update(
        &mut self,
        layout: &LayoutCollection,
        columns: u32,
        target: Option<GridCoord>,
    ) -> Option<bool> {
        let DragState::Dragging { item_id, valid } = &mut self.state else {
            return None;
        };
        let now_valid = match target {
            Some(target) => layout.check_move(item_id, target, columns).is_ok(),
            None => false,
        };
        if now_valid == *valid {
            return None;
        }
        *valid = now_valid;
        Some(now_valid)
    }

    /// Ends the drag, committing the move if `target` accepts the tile.
    ///
    /// Always returns to [`DragState::Idle`].
    pub fn end(
        &mut self,
        layout: &mut LayoutCollection,
        columns: u32,
        target: Option<GridCoord>,
    ) -> DropOutcome {
        let DragState::Dragging { item_id, .. } = std::mem::take(&mut self.state) else {
            return DropOutcome::NotDragging;
        };
        let Some(target) = target else {
            return DropOutcome::Cancelled { item_id };
        };
        match layout.try_move(&item_id, target, columns) {
            MoveOutcome::Accepted => DropOutcome::Committed {
                item_id,
                to: target,
            },
            MoveOutcome::Rejected(reason) => DropOutcome::Rejected { item_id, reason },
        }
    }

    /// Abandons the drag without touching the layout.
    pub fn cancel(&mut self) -> DropOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Dragging { item_id, .. } => DropOutcome::Cancelled { item_id },
            DragState::Idle => DropOutcome::NotDragging,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
