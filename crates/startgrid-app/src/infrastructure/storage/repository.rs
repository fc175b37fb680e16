//! Loading, saving, exporting and importing the configuration document.
//!
//! The document lives in the primary store under [`CONFIG_KEY`].  An
//! uploaded wallpaper can be several megabytes, so its bytes are written to
//! the blob store under [`WALLPAPER_BLOB_KEY`] and the primary record keeps
//! only [`WALLPAPER_PLACEHOLDER`] in its place.  Loading reverses the
//! substitution.
//!
//! Failure policy:
//!
//! - [`ConfigRepository::load`] never fails.  A missing or unreadable
//!   document yields the default configuration.  A malformed document is
//!   first copied to [`CORRUPT_CONFIG_KEY`] so the next save cannot destroy it.
//! - If the blob write fails on save, the wallpaper stays inline in the
//!   primary record.  A placeholder is only written once its blob exists.
//! - If the blob cannot be read on load, the placeholder stays in memory and
//!   [`ConfigRepository::export`] refuses to produce an incomplete backup.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use startgrid_core::{Configuration, GridSpec, Wallpaper, WALLPAPER_PLACEHOLDER};

use super::migration::{migrate, StoredConfiguration};
use super::store::{KeyValueStore, StoreError};

/// Primary-store key of the configuration document.
pub const CONFIG_KEY: &str = "config";

/// Blob-store key of the uploaded wallpaper.
pub const WALLPAPER_BLOB_KEY: &str = "custom_wallpaper";

/// Primary-store key a malformed document is preserved under.
pub const CORRUPT_CONFIG_KEY: &str = "config_corrupt";

/// Errors from [`ConfigRepository::save`] and [`ConfigRepository::export`].
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The uploaded wallpaper is only known by its placeholder.
    #[error("uploaded wallpaper could not be read from the blob store")]
    UnresolvedWallpaper,
}

/// Why an import file was refused.  The current configuration is untouched.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file is not JSON at all.
    #[error("import file is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("import file has no version string")]
    MissingVersion,

    #[error("import file has no layout array")]
    MissingLayout,

    /// JSON with the right top-level shape but fields of the wrong type.
    #[error("import file is malformed: {0}")]
    Invalid(#[source] serde_json::Error),
}

/// File name suggested for an export made on `date` (`YYYY-MM-DD`).
pub fn backup_file_name(date: &str) -> String {
    format!("startgrid_backup_{date}.json")
}

/// Validates and migrates an import file.
///
/// The top level must be an object with a string `version` and an array
/// `layout`.  Missing settings fields are filled with their defaults.
///
/// # Errors
///
/// Returns [`ImportError::Parse`] for non-JSON input and one of the other
/// variants for JSON with the wrong shape.
pub fn parse_import(raw: &str, grid: &GridSpec) -> Result<Configuration, ImportError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(ImportError::Parse)?;
    if !value.get("version").is_some_and(serde_json::Value::is_string) {
        return Err(ImportError::MissingVersion);
    }
    if !value.get("layout").is_some_and(serde_json::Value::is_array) {
        return Err(ImportError::MissingLayout);
    }
    let stored: StoredConfiguration =
        serde_json::from_value(value).map_err(ImportError::Invalid)?;
    Ok(migrate(stored, grid))
}

/// Persistence entry points over a primary store and a blob store.
pub struct ConfigRepository {
    primary: Arc<dyn KeyValueStore>,
    blobs: Arc<dyn KeyValueStore>,
    grid: GridSpec,
}

impl ConfigRepository {
    pub fn new(
        primary: Arc<dyn KeyValueStore>,
        blobs: Arc<dyn KeyValueStore>,
        grid: GridSpec,
    ) -> Self {
        Self {
            primary,
            blobs,
            grid,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Reads, migrates and resolves the stored configuration.
    pub async fn load(&self) -> Configuration {
        let raw = match self.primary.get(CONFIG_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("no stored configuration, starting with defaults");
                return Configuration::default();
            }
            Err(e) => {
                error!(error = %e, "failed to read stored configuration, starting with defaults");
                return Configuration::default();
            }
        };

        let stored = match serde_json::from_str::<StoredConfiguration>(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "stored configuration is malformed, starting with defaults");
                self.preserve_corrupt(&raw).await;
                return Configuration::default();
            }
        };

        let mut config = migrate(stored, &self.grid);
        self.resolve_wallpaper(&mut config).await;
        debug!(items = config.layout.len(), "configuration loaded");
        config
    }

    /// Writes `config`, moving uploaded wallpaper bytes to the blob store.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the primary record cannot be written.  A
    /// failed blob write is logged and does not fail the save.
    pub async fn save(&self, config: &Configuration) -> Result<(), PersistError> {
        let mut record = config.clone();
        if let Some(data) = config.settings.wallpaper.upload_data() {
            match self.blobs.set(WALLPAPER_BLOB_KEY, data).await {
                Ok(()) => {
                    record.settings.wallpaper = Wallpaper::Upload(WALLPAPER_PLACEHOLDER.to_string());
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        bytes = data.len(),
                        "wallpaper blob write failed, keeping it in the primary record"
                    );
                }
            }
        }

        let json = serde_json::to_string(&record)?;
        self.primary.set(CONFIG_KEY, &json).await?;
        debug!(bytes = json.len(), items = record.layout.len(), "configuration saved");
        Ok(())
    }

    /// Serialises `config` as a self-contained backup document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::UnresolvedWallpaper`] if the wallpaper is a
    /// placeholder whose blob cannot be read.
    pub async fn export(&self, config: &Configuration) -> Result<String, PersistError> {
        let mut snapshot = config.clone();
        if snapshot.settings.wallpaper.is_placeholder() {
            self.resolve_wallpaper(&mut snapshot).await;
            if snapshot.settings.wallpaper.is_placeholder() {
                return Err(PersistError::UnresolvedWallpaper);
            }
        }
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// [`parse_import`] with this repository's grid.
    pub fn import(&self, raw: &str) -> Result<Configuration, ImportError> {
        parse_import(raw, &self.grid)
    }

    async fn resolve_wallpaper(&self, config: &mut Configuration) {
        if !config.settings.wallpaper.is_placeholder() {
            return;
        }
        match self.blobs.get(WALLPAPER_BLOB_KEY).await {
            Ok(Some(data)) => config.settings.wallpaper = Wallpaper::Upload(data),
            Ok(None) => warn!("uploaded wallpaper missing from blob store"),
            Err(e) => warn!(error = %e, "failed to read uploaded wallpaper"),
        }
    }

    async fn preserve_corrupt(&self, raw: &str) {
        if let Err(e) = self.primary.set(CORRUPT_CONFIG_KEY, raw).await {
            error!(error = %e, "failed to preserve malformed configuration");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::store::{MemoryStore, MockKeyValueStore};
    use serde_json::json;
    use startgrid_core::{
        ClockStyle, GridCoord, PlacedItem, SearchProvider, Span, Theme, WidgetKind,
    };

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg==";

    fn memory_repo() -> (ConfigRepository, Arc<MemoryStore>, Arc<MemoryStore>) {
        let primary = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryStore::new());
        let repo = ConfigRepository::new(
            Arc::clone(&primary) as Arc<dyn KeyValueStore>,
            Arc::clone(&blobs) as Arc<dyn KeyValueStore>,
            GridSpec::default(),
        );
        (repo, primary, blobs)
    }

    fn with_upload() -> Configuration {
        let mut config = Configuration::default();
        config.settings.wallpaper = Wallpaper::Upload(IMAGE.to_string());
        config
            .layout
            .add_item(
                PlacedItem::new(
                    "1",
                    WidgetKind::Weather {
                        city: "Hangzhou".into(),
                    },
                    GridCoord::new(1, 1),
                    Span::new(3, 2),
                ),
                12,
            )
            .unwrap();
        config
    }

    // ── load ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_load_without_document_returns_default() {
        let (repo, _, _) = memory_repo();
        assert_eq!(repo.load().await, Configuration::default());
    }

    #[tokio::test]
    async fn test_load_malformed_document_returns_default_and_preserves_raw() {
        // Arrange
        let (repo, primary, _) = memory_repo();
        primary.set(CONFIG_KEY, "{ not json").await.unwrap();

        // Act
        let config = repo.load().await;

        // Assert
        assert_eq!(config, Configuration::default());
        assert_eq!(
            primary.get(CORRUPT_CONFIG_KEY).await.unwrap().as_deref(),
            Some("{ not json")
        );
    }

    #[tokio::test]
    async fn test_load_unreadable_primary_returns_default() {
        let mut primary = MockKeyValueStore::new();
        primary
            .expect_get()
            .returning(|_| Err(StoreError::Unavailable("disk gone".into())));
        let repo = ConfigRepository::new(
            Arc::new(primary),
            Arc::new(MemoryStore::new()),
            GridSpec::default(),
        );

        assert_eq!(repo.load().await, Configuration::default());
    }

    #[tokio::test]
    async fn test_load_with_null_settings_field_keeps_layout() {
        // Arrange
        let (repo, primary, _) = memory_repo();
        let stored = json!({
            "version": "1.0.0",
            "settings": { "blur": null, "theme": "light" },
            "layout": [
                { "id": "a", "type": "history", "x": 1, "y": 1 },
                { "id": "b", "type": "history", "x": 3, "y": 1 }
            ]
        });
        primary.set(CONFIG_KEY, &stored.to_string()).await.unwrap();

        // Act
        let config = repo.load().await;

        // Assert
        assert_eq!(config.layout.len(), 2);
        assert_eq!(config.settings.blur, 3);
        assert_eq!(config.settings.theme, Theme::Light);
        assert_eq!(primary.get(CORRUPT_CONFIG_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_with_null_settings_object_keeps_layout() {
        let (repo, primary, _) = memory_repo();
        let stored = json!({
            "version": "1.0.0",
            "settings": null,
            "layout": [ { "id": "a", "type": "history", "x": 1, "y": 1 } ]
        });
        primary.set(CONFIG_KEY, &stored.to_string()).await.unwrap();

        let config = repo.load().await;

        assert_eq!(config.layout.len(), 1);
        assert_eq!(config.settings, startgrid_core::Settings::default());
    }

    #[tokio::test]
    async fn test_load_keeps_placeholder_when_blob_missing() {
        let (repo, primary, _) = memory_repo();
        primary
            .set(
                CONFIG_KEY,
                &json!({
                    "version": "1.0.0",
                    "settings": { "wallpaper": { "type": "upload", "value": WALLPAPER_PLACEHOLDER } },
                    "layout": []
                })
                .to_string(),
            )
            .await
            .unwrap();

        let config = repo.load().await;

        assert!(config.settings.wallpaper.is_placeholder());
    }

    // ── save ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_save_moves_upload_to_blob_store_and_load_restores_it() {
        // Arrange
        let (repo, primary, blobs) = memory_repo();
        let config = with_upload();

        // Act
        repo.save(&config).await.unwrap();

        // Assert: primary holds the placeholder, blob store holds the bytes.
        let raw = primary.get(CONFIG_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["settings"]["wallpaper"]["value"], WALLPAPER_PLACEHOLDER);
        assert_eq!(
            blobs.get(WALLPAPER_BLOB_KEY).await.unwrap().as_deref(),
            Some(IMAGE)
        );
        assert_eq!(repo.load().await, config);
    }

    #[tokio::test]
    async fn test_save_keeps_upload_inline_when_blob_write_fails() {
        // Arrange
        let primary = Arc::new(MemoryStore::new());
        let mut blobs = MockKeyValueStore::new();
        blobs
            .expect_set()
            .withf(|key, _| key == WALLPAPER_BLOB_KEY)
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("quota exceeded".into())));
        let repo = ConfigRepository::new(
            Arc::clone(&primary) as Arc<dyn KeyValueStore>,
            Arc::new(blobs),
            GridSpec::default(),
        );

        // Act
        let result = repo.save(&with_upload()).await;

        // Assert: no orphaned placeholder was written.
        assert!(result.is_ok());
        let raw = primary.get(CONFIG_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["settings"]["wallpaper"]["value"], IMAGE);
    }

    #[tokio::test]
    async fn test_save_with_url_wallpaper_does_not_touch_blob_store() {
        let mut blobs = MockKeyValueStore::new();
        blobs.expect_set().never();
        let repo = ConfigRepository::new(
            Arc::new(MemoryStore::new()),
            Arc::new(blobs),
            GridSpec::default(),
        );

        assert!(repo.save(&Configuration::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_propagates_primary_failure() {
        let mut primary = MockKeyValueStore::new();
        primary
            .expect_set()
            .returning(|_, _| Err(StoreError::Unavailable("read-only".into())));
        let repo = ConfigRepository::new(
            Arc::new(primary),
            Arc::new(MemoryStore::new()),
            GridSpec::default(),
        );

        let result = repo.save(&Configuration::default()).await;

        assert!(matches!(result, Err(PersistError::Store(_))));
    }

    // ── export / import ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_export_then_import_round_trips() {
        let (repo, _, _) = memory_repo();
        let mut config = with_upload();
        config.settings.theme = Theme::Light;
        config.settings.blur = 11;

        let exported = repo.export(&config).await.unwrap();
        let imported = repo.import(&exported).unwrap();

        assert_eq!(imported, config);
    }

    #[tokio::test]
    async fn test_export_resolves_placeholder_from_blob_store() {
        let (repo, _, blobs) = memory_repo();
        blobs.set(WALLPAPER_BLOB_KEY, IMAGE).await.unwrap();
        let mut config = Configuration::default();
        config.settings.wallpaper = Wallpaper::Upload(WALLPAPER_PLACEHOLDER.to_string());

        let exported = repo.export(&config).await.unwrap();

        assert!(exported.contains(IMAGE));
        assert!(!exported.contains(WALLPAPER_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_export_fails_for_unresolvable_placeholder() {
        let (repo, _, _) = memory_repo();
        let mut config = Configuration::default();
        config.settings.wallpaper = Wallpaper::Upload(WALLPAPER_PLACEHOLDER.to_string());

        let result = repo.export(&config).await;

        assert!(matches!(result, Err(PersistError::UnresolvedWallpaper)));
    }

    #[test]
    fn test_import_without_settings_uses_defaults() {
        let config = parse_import(r#"{"version":"1.0.0","layout":[]}"#, &GridSpec::default())
            .unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_import_rejects_non_json_as_parse_error() {
        let result = parse_import("version: 1", &GridSpec::default());
        assert!(matches!(result, Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_import_rejects_missing_version() {
        let result = parse_import(r#"{"layout":[]}"#, &GridSpec::default());
        assert!(matches!(result, Err(ImportError::MissingVersion)));
    }

    #[test]
    fn test_import_rejects_numeric_version() {
        let result = parse_import(r#"{"version":1,"layout":[]}"#, &GridSpec::default());
        assert!(matches!(result, Err(ImportError::MissingVersion)));
    }

    #[test]
    fn test_import_rejects_non_array_layout() {
        let result = parse_import(r#"{"version":"1.0.0","layout":{}}"#, &GridSpec::default());
        assert!(matches!(result, Err(ImportError::MissingLayout)));
    }

    #[test]
    fn test_import_defaults_null_and_empty_settings_fields() {
        // Arrange
        let raw = json!({
            "version": "1.0.0",
            "settings": { "theme": 42, "clockStyle": null, "searchEngine": "", "blur": 6 },
            "layout": [ { "id": "h", "type": "history", "x": 1, "y": 1 } ]
        })
        .to_string();

        // Act
        let config = parse_import(&raw, &GridSpec::default()).unwrap();

        // Assert
        assert_eq!(config.settings.theme, Theme::Dark);
        assert_eq!(config.settings.blur, 6);
        assert_eq!(config.settings.clock_style, ClockStyle::Default);
        assert_eq!(config.settings.search_engine, SearchProvider::Bing);
        assert_eq!(config.layout.len(), 1);
    }

    #[test]
    fn test_import_keeps_tiles_with_string_and_float_geometry() {
        let raw = json!({
            "version": "1.0.0",
            "layout": [
                { "id": "a", "type": "history", "x": "3", "y": "1" },
                { "id": "b", "type": "notes", "x": 2.0, "y": 5, "w": 2, "h": 2 }
            ]
        })
        .to_string();

        let config = parse_import(&raw, &GridSpec::default()).unwrap();

        assert_eq!(config.layout.get("a").unwrap().coord(), GridCoord::new(3, 1));
        assert_eq!(config.layout.get("b").unwrap().coord(), GridCoord::new(2, 5));
    }

    #[test]
    fn test_backup_file_name_embeds_date() {
        assert_eq!(backup_file_name("2026-10-19"), "startgrid_backup_2026-10-19.json");
    }
}
