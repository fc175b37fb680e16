//! TOML runtime configuration of the StartGrid engine itself.
//!
//! This is not the user's dashboard document (that lives in the key-value
//! stores, see [`super::repository`]).  It holds the grid geometry and where
//! the stores live on disk:
//!
//! - Windows:  `%APPDATA%\StartGrid\startgrid.toml`
//! - Linux:    `~/.config/startgrid/startgrid.toml`
//! - macOS:    `~/Library/Application Support/StartGrid/startgrid.toml`
//!
//! ```toml
//! [grid]
//! columns = 12
//! visible_rows = 8
//! max_rows_scanned = 100
//!
//! [storage]
//! data_dir = "/home/me/.local/share/startgrid"
//! autosave_debounce_ms = 500
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section or
//! a missing key all fall back to the built-in value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use startgrid_core::GridSpec;

/// Error type for runtime configuration operations.
#[derive(Debug, Error)]
pub enum AppConfigError {
    /// Neither `storage.data_dir` nor a platform data directory is available.
    #[error("could not determine platform data directory")]
    NoPlatformDataDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The grid section describes an unusable grid.
    #[error("invalid grid configuration: {0}")]
    InvalidGrid(&'static str),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    /// Number of columns tiles are laid out in.
    #[serde(default = "default_columns")]
    pub columns: u32,
    /// Rows the shell renders; the grid itself has no row limit.
    #[serde(default = "default_visible_rows")]
    pub visible_rows: u32,
    /// Row limit of the free-slot search.
    #[serde(default = "default_max_rows_scanned")]
    pub max_rows_scanned: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Quiet period before a changed configuration is written.
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_columns() -> u32 {
    12
}
fn default_visible_rows() -> u32 {
    8
}
fn default_max_rows_scanned() -> u32 {
    100
}
fn default_autosave_debounce_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            visible_rows: default_visible_rows(),
            max_rows_scanned: default_max_rows_scanned(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave_debounce_ms: default_autosave_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GridConfig {
    /// The grid dimensions used by placement and migration.
    ///
    /// # Errors
    ///
    /// Returns [`AppConfigError::InvalidGrid`] for zero columns or a zero
    /// scan limit.
    pub fn spec(&self) -> Result<GridSpec, AppConfigError> {
        if self.columns == 0 {
            return Err(AppConfigError::InvalidGrid("columns must be at least 1"));
        }
        if self.max_rows_scanned == 0 {
            return Err(AppConfigError::InvalidGrid(
                "max_rows_scanned must be at least 1",
            ));
        }
        Ok(GridSpec::new(self.columns, self.max_rows_scanned))
    }
}

impl StorageConfig {
    /// The configured data directory, or the platform default.
    ///
    /// # Errors
    ///
    /// Returns [`AppConfigError::NoPlatformDataDir`] if no override is set and
    /// the platform directory cannot be determined.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, AppConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => platform_data_dir().ok_or(AppConfigError::NoPlatformDataDir),
        }
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

/// Default location of the runtime configuration file, if the platform
/// config directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    platform_config_dir().map(|dir| dir.join("startgrid.toml"))
}

/// Loads the runtime configuration from `path`, or from
/// [`default_config_path`] when `path` is `None`.
///
/// A file that does not exist yields [`AppConfig::default()`].
///
/// # Errors
///
/// Returns [`AppConfigError::Io`] for file-system errors other than "not
/// found", and [`AppConfigError::Parse`] if the TOML is malformed.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig, AppConfigError> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return Ok(AppConfig::default());
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(AppConfigError::Io { path, source: e }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`AppConfigError::Io`] for file-system failures or
/// [`AppConfigError::Serialize`] if serialization fails.
pub fn save_app_config(config: &AppConfig, path: &Path) -> Result<(), AppConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| AppConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| AppConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("StartGrid"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("startgrid"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("StartGrid")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

fn platform_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(|p| PathBuf::from(p).join("StartGrid"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_DATA_HOME or ~/.local/share
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })?;
        Some(base.join("startgrid"))
    }

    #[cfg(target_os = "macos")]
    {
        platform_config_dir()
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
