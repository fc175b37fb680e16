//! Durable storage for the StartGrid configuration.
//!
//! Two key-value namespaces are used: the primary store holds the
//! configuration document under [`repository::CONFIG_KEY`], and the blob
//! store holds large uploaded wallpapers under
//! [`repository::WALLPAPER_BLOB_KEY`] so the primary document stays small.

pub mod app_config;
pub mod migration;
pub mod repository;
pub mod store;
