//! # startgrid-core
//!
//! Pure domain library for the StartGrid start page: the spatial layout engine
//! that places tiles on a fixed-column grid, the drag session state machine,
//! and the serialisable settings/configuration model.
//!
//! This crate performs no I/O.  Persistence (primary store, blob store,
//! migration, import/export) lives in `startgrid-app`.
//!
//! # Architecture overview
//!
//! A start page is a background canvas holding a grid of tiles: shortcuts and
//! live widgets (weather, news, notes, ...).  Every tile occupies a rectangle
//! of whole grid cells.  Two rules hold for every committed layout:
//!
//! - **In bounds** – a tile never extends past the last column, and never
//!   starts above row 1 or left of column 1.  Rows grow downward without limit.
//! - **No overlap** – no two tiles share a cell.
//!
//! The crate is split into:
//!
//! - **`domain::grid`** – pure geometry: bounds check, rectangle overlap,
//!   collision scan, and the deterministic row-major free-slot search.
//! - **`domain::item`** – the tile model (`PlacedItem`) and the closed set of
//!   widget kinds with their payloads and default sizes.
//! - **`domain::layout`** – the ordered tile collection and its validated
//!   mutations (`add_item`, `remove_item`, `update_item_fields`, `try_move`).
//! - **`domain::drag`** – the drag session controller that gives live validity
//!   feedback while a tile is being dragged and commits on drop.
//! - **`domain::settings`** – appearance settings and the top-level
//!   `Configuration` document.
//! - **`domain::id`** – monotonic, time-derived tile id generation.

pub mod domain;

pub use domain::drag::{DragSession, DragState, DropOutcome};
pub use domain::grid::{
    bounds_check, collides_with_any, find_free_slot, find_free_slot_checked, overlaps, GridCoord,
    GridRect, GridSpec, Span,
};
pub use domain::id::ItemIdGenerator;
pub use domain::item::{
    IconType, ImageCategory, NewsSource, PlacedItem, Shortcut, TodoEntry, WidgetKind,
};
pub use domain::layout::{LayoutCollection, LayoutError, MoveOutcome, Rejection};
pub use domain::settings::{
    clamp_blur, deserialize_settings, ClockStyle, Configuration, GridDensity, SearchProvider,
    Settings, Theme, Wallpaper, CURRENT_VERSION, WALLPAPER_PLACEHOLDER,
};
