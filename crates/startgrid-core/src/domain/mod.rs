//! Domain entities for StartGrid.
//!
//! Everything in this module is pure business logic: no file system, no
//! storage backends, no async runtime.  The application crate depends on
//! these types; they never depend on the application crate.  That keeps the
//! layout rules testable in isolation and lets the drag predicate run on every
//! pointer event without touching anything slower than a slice scan.

/// Grid geometry: bounds, overlap, collision and free-slot search.
pub mod grid;

/// Monotonic tile id generation.
pub mod id;

/// Tiles and widget kinds.
pub mod item;

/// The ordered, invariant-preserving tile collection.
pub mod layout;

/// Drag session state machine.
pub mod drag;

/// Appearance settings and the top-level configuration document.
pub mod settings;
