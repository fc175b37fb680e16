//! The dashboard: the single owner of the session's configuration.
//!
//! Every change the shell can make goes through a method here.  Geometry
//! changes are validated by the layout store; settings changes are applied
//! directly.  Each successful change bumps [`Dashboard::revision`], which the
//! shell compares to decide whether to re-render and hand a snapshot to the
//! autosave task.

use thiserror::Error;
use tracing::{debug, info};

use startgrid_core::{
    clamp_blur, ClockStyle, Configuration, DragSession, DropOutcome, GridCoord, GridDensity,
    GridSpec, IconType, ItemIdGenerator, LayoutCollection, LayoutError, MoveOutcome, PlacedItem,
    SearchProvider, Settings, Shortcut, Span, Theme, Wallpaper, WidgetKind,
};

/// Largest accepted uploaded wallpaper, in bytes of its data URL.
pub const MAX_WALLPAPER_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Largest accepted uploaded shortcut icon, in bytes of its data URL.
pub const MAX_ICON_UPLOAD_BYTES: usize = 500 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("upload of {size} bytes exceeds the {limit} byte limit")]
    UploadTooLarge { size: usize, limit: usize },
}

/// Session state: the configuration plus the in-progress drag, if any.
#[derive(Debug)]
pub struct Dashboard {
    config: Configuration,
    grid: GridSpec,
    ids: ItemIdGenerator,
    drag: DragSession,
    revision: u64,
}

impl Dashboard {
    /// Takes ownership of a loaded configuration.
    pub fn new(config: Configuration, grid: GridSpec) -> Self {
        let ids = ItemIdGenerator::seeded_from(config.layout.ids());
        Self {
            config,
            grid,
            ids,
            drag: DragSession::new(),
            revision: 0,
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn layout(&self) -> &LayoutCollection {
        &self.config.layout
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Incremented by every change to the configuration.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ── Layout ────────────────────────────────────────────────────────────────

    /// Adds a tile of `kind` at its default size in the first free slot.
    ///
    /// Returns the new tile's id.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NoFreeSlot`] if the scanned rows are full.
    pub fn add_widget(&mut self, kind: WidgetKind) -> Result<String, DashboardError> {
        let span = kind.default_span();
        self.place(kind, span)
    }

    /// Adds a shortcut of the chosen size in the first free slot.
    ///
    /// An empty URL icon is replaced with the site's favicon.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UploadTooLarge`] for an oversized uploaded
    /// icon, [`LayoutError::InvalidSpan`] for a size outside 1–2 × 1–2, and
    /// [`LayoutError::NoFreeSlot`] if the scanned rows are full.
    pub fn add_shortcut(
        &mut self,
        shortcut: Shortcut,
        span: Span,
    ) -> Result<String, DashboardError> {
        check_icon(&shortcut)?;
        let kind = WidgetKind::Shortcut(shortcut.with_favicon_fallback());
        let span = kind.validate_span(span)?;
        self.place(kind, span)
    }

    fn place(&mut self, kind: WidgetKind, span: Span) -> Result<String, DashboardError> {
        let at = self
            .grid
            .find_free_slot_checked(span, self.config.layout.items())
            .ok_or(LayoutError::NoFreeSlot {
                w: span.w,
                h: span.h,
            })?;
        let id = self.ids.next_id();
        let wire = kind.wire_name();
        self.config
            .layout
            .add_item(PlacedItem::new(id.clone(), kind, at, span), self.grid.columns)?;
        self.touch();
        info!(item = %id, kind = wire, x = at.x, y = at.y, "tile added");
        Ok(id)
    }

    /// Deletes the tile `id`.  Returns `false` if there was no such tile.
    pub fn remove_item(&mut self, id: &str) -> bool {
        if self.drag.active_item() == Some(id) {
            self.drag.cancel();
        }
        let removed = self.config.layout.remove_item(id).is_some();
        if removed {
            self.touch();
            info!(item = id, "tile removed");
        }
        removed
    }

    /// Edits the payload of tile `id`.  Returns `Ok(false)` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::KindChanged`] if `apply` swapped the kind, and
    /// [`DashboardError::UploadTooLarge`] if it set an oversized uploaded
    /// icon.  Either way the tile is left as it was.
    pub fn update_item_fields<F>(&mut self, id: &str, apply: F) -> Result<bool, DashboardError>
    where
        F: FnOnce(&mut WidgetKind),
    {
        let Some(before) = self.config.layout.get(id).map(|item| item.kind.clone()) else {
            return Ok(false);
        };
        self.config.layout.update_item_fields(id, apply)?;
        let icon_check = match self.config.layout.get(id).map(|item| &item.kind) {
            Some(WidgetKind::Shortcut(shortcut)) => check_icon(shortcut),
            _ => Ok(()),
        };
        if let Err(e) = icon_check {
            self.config.layout.update_item_fields(id, |kind| *kind = before)?;
            return Err(e);
        }
        self.touch();
        Ok(true)
    }

    /// Changes the size of a shortcut, keeping its top-left corner.
    pub fn resize_shortcut(&mut self, id: &str, span: Span) -> MoveOutcome {
        let outcome = self.config.layout.try_resize(id, span, self.grid.columns);
        if outcome.is_accepted() {
            self.touch();
        }
        outcome
    }

    /// Moves a tile directly, without a drag session.
    pub fn move_item(&mut self, id: &str, target: GridCoord) -> MoveOutcome {
        let outcome = self.config.layout.try_move(id, target, self.grid.columns);
        if outcome.is_accepted() {
            self.touch();
        }
        outcome
    }

    // ── Drag ──────────────────────────────────────────────────────────────────

    /// Starts dragging tile `id`.  Returns `false` for an unknown id.
    pub fn begin_drag(&mut self, id: &str) -> bool {
        if !self.config.layout.contains(id) {
            return false;
        }
        self.drag.begin(id);
        true
    }

    /// Reports the pointer over `target` (`None` when outside the grid).
    ///
    /// Returns the new validity flag only when it changed.
    pub fn drag_over(&mut self, target: Option<GridCoord>) -> Option<bool> {
        self.drag.update(&self.config.layout, self.grid.columns, target)
    }

    /// Drops the dragged tile at `target`.
    pub fn end_drag(&mut self, target: Option<GridCoord>) -> DropOutcome {
        let outcome = self
            .drag
            .end(&mut self.config.layout, self.grid.columns, target);
        match &outcome {
            DropOutcome::Committed { item_id, to } => {
                self.touch();
                debug!(item = %item_id, x = to.x, y = to.y, "drop committed");
            }
            DropOutcome::Rejected { item_id, reason } => {
                debug!(item = %item_id, ?reason, "drop rejected");
            }
            DropOutcome::Cancelled { .. } | DropOutcome::NotDragging => {}
        }
        outcome
    }

    pub fn cancel_drag(&mut self) -> DropOutcome {
        self.drag.cancel()
    }

    /// Validity flag of the tile being dragged, or `None` if `id` is not.
    pub fn drag_validity(&self, id: &str) -> Option<bool> {
        self.drag.validity_of(id)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    pub fn set_wallpaper_url(&mut self, url: impl Into<String>) {
        self.config.settings.wallpaper = Wallpaper::Url(url.into());
        self.touch();
    }

    /// Sets an uploaded wallpaper (a data URL).
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UploadTooLarge`] above 3 MiB.
    pub fn set_wallpaper_upload(&mut self, data: impl Into<String>) -> Result<(), DashboardError> {
        let data = data.into();
        if data.len() > MAX_WALLPAPER_UPLOAD_BYTES {
            return Err(DashboardError::UploadTooLarge {
                size: data.len(),
                limit: MAX_WALLPAPER_UPLOAD_BYTES,
            });
        }
        self.config.settings.wallpaper = Wallpaper::Upload(data);
        self.touch();
        Ok(())
    }

    /// Sets the background blur, clamped to `0..=20`.  Returns the value set.
    pub fn set_blur(&mut self, blur: i64) -> u8 {
        let blur = clamp_blur(blur);
        self.config.settings.blur = blur;
        self.touch();
        blur
    }

    /// Shows or hides the clock.  Returns the new visibility.
    pub fn toggle_clock(&mut self) -> bool {
        self.config.settings.show_clock = !self.config.settings.show_clock;
        self.touch();
        self.config.settings.show_clock
    }

    pub fn toggle_clock_seconds(&mut self) -> bool {
        self.config.settings.clock_show_seconds = !self.config.settings.clock_show_seconds;
        self.touch();
        self.config.settings.clock_show_seconds
    }

    pub fn set_clock_style(&mut self, style: ClockStyle) {
        self.config.settings.clock_style = style;
        self.touch();
    }

    pub fn set_search_provider(&mut self, provider: SearchProvider) {
        self.config.settings.search_engine = provider;
        self.touch();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.config.settings.theme = theme;
        self.touch();
    }

    pub fn set_grid_density(&mut self, density: GridDensity) {
        self.config.settings.grid_size = density;
        self.touch();
    }

    // ── Whole configuration ───────────────────────────────────────────────────

    /// Replaces the configuration, e.g. with an imported one.
    ///
    /// Any drag in progress is abandoned.  New ids stay above every id issued
    /// so far and every id in `config`.
    pub fn replace_configuration(&mut self, config: Configuration) {
        self.drag.cancel();
        let floor = self.ids.last_issued().to_string();
        self.ids = ItemIdGenerator::seeded_from(
            config.layout.ids().chain(std::iter::once(floor.as_str())),
        );
        self.config = config;
        self.touch();
        info!(items = self.config.layout.len(), "configuration replaced");
    }

    /// Restores the default configuration.
    pub fn reset(&mut self) {
        self.replace_configuration(Configuration::default());
    }
}

fn check_icon(shortcut: &Shortcut) -> Result<(), DashboardError> {
    if shortcut.icon_type == IconType::Upload && shortcut.icon.len() > MAX_ICON_UPLOAD_BYTES {
        return Err(DashboardError::UploadTooLarge {
            size: shortcut.icon.len(),
            limit: MAX_ICON_UPLOAD_BYTES,
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
