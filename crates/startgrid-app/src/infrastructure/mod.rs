//! Infrastructure layer for StartGrid.
//!
//! Everything that touches durable storage lives here:
//!
//! - `storage::store` – the async key-value store trait and its file-backed
//!   and in-memory implementations.
//! - `storage::migration` – lenient parsing of stored documents and the
//!   legacy-layout migration.
//! - `storage::repository` – load/save/export/import of the configuration
//!   document, with uploaded wallpapers redirected to a blob store.
//! - `storage::app_config` – the engine's own TOML settings file.

pub mod storage;
