//! StartGrid application crate.
//!
//! - [`application`] – the dashboard state object the shell drives, and the
//!   debounced autosave task.
//! - [`infrastructure`] – key-value stores, configuration persistence with
//!   blob indirection and migration, and the TOML runtime configuration.

pub mod application;
pub mod infrastructure;
