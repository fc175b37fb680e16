//! Application layer for StartGrid.
//!
//! The shell (a browser page, a desktop window or the bundled CLI) talks to
//! exactly one object, [`dashboard::Dashboard`], which owns the configuration
//! for the session and exposes every permitted mutation.  Persistence is not
//! the dashboard's concern: the shell hands changed snapshots to
//! [`autosave::Autosave`], which writes them after a quiet period.
//!
//! # Sub-modules
//!
//! - **`dashboard`** – tile placement, removal, payload edits, shortcut
//!   resizing, drag sessions, settings changes, import and reset.
//! - **`autosave`** – debounced background saving through the
//!   configuration repository.

pub mod autosave;
pub mod dashboard;
