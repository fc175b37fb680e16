//! Appearance settings and the top-level configuration document.
//!
//! # Serde default values
//!
//! [`Settings`] decodes through [`RawSettings`], where every field is
//! optional and lenient.  A document written by an older version that lacks
//! a newer field therefore still loads, with the missing field set to its
//! current default.  A field that is present but `null`, empty or of an
//! unknown value is replaced by its default and logged; it never fails the
//! document.  Backfilling is additive only: valid fields that are present
//! are never overwritten.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::layout::LayoutCollection;

/// Schema version written into new documents.
pub const CURRENT_VERSION: &str = "1.0.0";

/// Value stored in the primary document in place of an uploaded wallpaper
/// whose bytes live in the blob store.
pub const WALLPAPER_PLACEHOLDER: &str = "indexeddb";

/// Upper bound of the background blur slider.
pub const MAX_BLUR: u8 = 20;

/// Wallpaper used until the user picks one.
pub const DEFAULT_WALLPAPER_URL: &str =
    "https://images.unsplash.com/photo-1477346611705-65d1883cee1e?q=80&w=2070&auto=format&fit=crop";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Tile size class used by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridDensity {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStyle {
    #[default]
    Default,
    Electronic,
    Mechanical,
    Alarm,
}

/// Search engine used by the search box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    #[default]
    Bing,
    Google,
    Baidu,
}

impl SearchProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            SearchProvider::Bing => "Bing",
            SearchProvider::Google => "Google",
            SearchProvider::Baidu => "Baidu",
        }
    }

    /// URL the encoded query string is appended to.
    pub fn query_url_prefix(&self) -> &'static str {
        match self {
            SearchProvider::Bing => "https://www.bing.com/search?q=",
            SearchProvider::Google => "https://www.google.com/search?q=",
            SearchProvider::Baidu => "https://www.baidu.com/s?wd=",
        }
    }
}

/// Background image descriptor.
///
/// Stored as `{"type": "url" | "upload", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Wallpaper {
    /// A remote image URL.
    Url(String),
    /// An uploaded image, usually a data URL.  In the primary store this may
    /// be [`WALLPAPER_PLACEHOLDER`].
    Upload(String),
}

impl Default for Wallpaper {
    fn default() -> Self {
        Wallpaper::Url(DEFAULT_WALLPAPER_URL.to_string())
    }
}

impl Wallpaper {
    /// Returns `true` for an upload whose value is the blob-store placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Wallpaper::Upload(value) if value == WALLPAPER_PLACEHOLDER)
    }

    /// The uploaded bytes, if this is an upload holding real data.
    pub fn upload_data(&self) -> Option<&str> {
        match self {
            Wallpaper::Upload(value) if value != WALLPAPER_PLACEHOLDER && !value.is_empty() => {
                Some(value)
            }
            _ => None,
        }
    }
}

/// User-editable appearance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSettings")]
pub struct Settings {
    pub theme: Theme,
    pub grid_size: GridDensity,
    pub wallpaper: Wallpaper,
    /// Background blur in pixels, `0..=20`.
    pub blur: u8,
    pub show_clock: bool,
    pub clock_style: ClockStyle,
    pub clock_show_seconds: bool,
    pub search_engine: SearchProvider,
}

fn default_blur() -> u8 {
    3
}

/// Clamps a requested blur value into `0..=MAX_BLUR`.
pub fn clamp_blur(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_BLUR)) as u8
}

/// A stored field that may be absent, valid, or present with a value that
/// does not decode.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
    #[serde(skip_deserializing)]
    Missing,
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Lenient::Missing
    }
}

impl<T> Lenient<T> {
    fn or_default_with(self, field: &'static str, default: impl FnOnce() -> T) -> T {
        match self {
            Lenient::Valid(value) => value,
            Lenient::Invalid(_) => {
                warn!(field, "invalid stored setting, using default");
                default()
            }
            Lenient::Missing => default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BlurValue {
    Int(i64),
    Float(f64),
}

impl BlurValue {
    fn clamped(self) -> u8 {
        let raw = match self {
            BlurValue::Int(i) => i,
            BlurValue::Float(f) => f.round() as i64,
        };
        let clamped = clamp_blur(raw);
        if i64::from(clamped) != raw {
            warn!(blur = raw, clamped, "stored blur out of range, clamping");
        }
        clamped
    }
}

/// Wire form of [`Settings`] as read from storage or an import file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSettings {
    theme: Lenient<Theme>,
    grid_size: Lenient<GridDensity>,
    wallpaper: Lenient<Wallpaper>,
    blur: Lenient<BlurValue>,
    show_clock: Lenient<bool>,
    clock_style: Lenient<ClockStyle>,
    clock_show_seconds: Lenient<bool>,
    search_engine: Lenient<SearchProvider>,
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        Self {
            theme: raw.theme.or_default_with("theme", Theme::default),
            grid_size: raw.grid_size.or_default_with("gridSize", GridDensity::default),
            wallpaper: raw.wallpaper.or_default_with("wallpaper", Wallpaper::default),
            blur: raw
                .blur
                .or_default_with("blur", || BlurValue::Int(i64::from(default_blur())))
                .clamped(),
            show_clock: raw.show_clock.or_default_with("showClock", || true),
            clock_style: raw.clock_style.or_default_with("clockStyle", ClockStyle::default),
            clock_show_seconds: raw
                .clock_show_seconds
                .or_default_with("clockShowSeconds", || true),
            search_engine: raw
                .search_engine
                .or_default_with("searchEngine", SearchProvider::default),
        }
    }
}

/// Decodes a `settings` object, falling back to the defaults when it is
/// `null` or not an object at all.
pub fn deserialize_settings<'de, D>(deserializer: D) -> Result<Settings, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Lenient::<Settings>::deserialize(deserializer)?;
    Ok(raw.or_default_with("settings", Settings::default))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            grid_size: GridDensity::default(),
            wallpaper: Wallpaper::default(),
            blur: default_blur(),
            show_clock: true,
            clock_style: ClockStyle::default(),
            clock_show_seconds: true,
            search_engine: SearchProvider::default(),
        }
    }
}

/// The complete persisted document: settings plus layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub version: String,
    #[serde(default, deserialize_with = "deserialize_settings")]
    pub settings: Settings,
    #[serde(default)]
    pub layout: LayoutCollection,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            settings: Settings::default(),
            layout: LayoutCollection::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_configuration_has_empty_layout_and_current_version() {
        let config = Configuration::default();
        assert_eq!(config.version, "1.0.0");
        assert!(config.layout.is_empty());
        assert_eq!(config.settings.blur, 3);
        assert!(config.settings.show_clock);
        assert_eq!(config.settings.search_engine, SearchProvider::Bing);
    }

    #[test]
    fn test_settings_use_camel_case_wire_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(value["gridSize"], "medium");
        assert_eq!(value["clockShowSeconds"], true);
        assert_eq!(value["clockStyle"], "default");
        assert_eq!(value["searchEngine"], "bing");
        assert_eq!(value["wallpaper"]["type"], "url");
    }

    #[test]
    fn test_missing_settings_fields_are_backfilled() {
        let settings: Settings = serde_json::from_value(json!({ "theme": "light" })).unwrap();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.blur, 3);
        assert!(settings.clock_show_seconds);
        assert_eq!(settings.wallpaper, Wallpaper::default());
    }

    #[test]
    fn test_missing_settings_object_is_backfilled() {
        let config: Configuration =
            serde_json::from_value(json!({ "version": "1.0.0", "layout": [] })).unwrap();
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_blur_is_clamped_on_deserialize() {
        let high: Settings = serde_json::from_value(json!({ "blur": 55 })).unwrap();
        let low: Settings = serde_json::from_value(json!({ "blur": -4 })).unwrap();
        let float: Settings = serde_json::from_value(json!({ "blur": 7.6 })).unwrap();
        assert_eq!(high.blur, 20);
        assert_eq!(low.blur, 0);
        assert_eq!(float.blur, 8);
    }

    // ── Lenient decoding ──────────────────────────────────────────────────────

    #[test]
    fn test_null_and_empty_settings_fields_fall_back_to_defaults() {
        // Arrange
        let value = json!({
            "theme": "light",
            "clockStyle": null,
            "searchEngine": "",
            "blur": null,
            "showClock": null,
            "clockShowSeconds": "yes",
            "wallpaper": { "type": "upload", "value": null }
        });

        // Act
        let settings: Settings = serde_json::from_value(value).unwrap();

        // Assert: the valid field survives, every other one is defaulted.
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.clock_style, ClockStyle::Default);
        assert_eq!(settings.search_engine, SearchProvider::Bing);
        assert_eq!(settings.blur, 3);
        assert!(settings.show_clock);
        assert!(settings.clock_show_seconds);
        assert_eq!(settings.wallpaper, Wallpaper::default());
    }

    #[test]
    fn test_unknown_theme_and_density_fall_back_to_defaults() {
        let settings: Settings =
            serde_json::from_value(json!({ "theme": "sepia", "gridSize": "huge", "blur": 9 }))
                .unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.grid_size, GridDensity::Medium);
        assert_eq!(settings.blur, 9);
    }

    #[test]
    fn test_null_or_non_object_settings_default_as_a_whole() {
        for settings in [json!(null), json!("dark"), json!([1, 2])] {
            let config: Configuration = serde_json::from_value(
                json!({ "version": "1.0.0", "settings": settings, "layout": [] }),
            )
            .unwrap();
            assert_eq!(config.settings, Settings::default());
        }
    }

    #[test]
    fn test_settings_round_trip_through_wire_format() {
        let settings = Settings {
            theme: Theme::Light,
            grid_size: GridDensity::Large,
            wallpaper: Wallpaper::Upload("data:image/png;base64,AAAA".to_string()),
            blur: 11,
            show_clock: false,
            clock_style: ClockStyle::Alarm,
            clock_show_seconds: false,
            search_engine: SearchProvider::Baidu,
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(serde_json::from_value::<Settings>(value).unwrap(), settings);
    }

    #[test]
    fn test_wallpaper_placeholder_detection() {
        assert!(Wallpaper::Upload(WALLPAPER_PLACEHOLDER.to_string()).is_placeholder());
        assert!(!Wallpaper::Url(WALLPAPER_PLACEHOLDER.to_string()).is_placeholder());
        assert_eq!(
            Wallpaper::Upload("data:image/png;base64,AAAA".to_string()).upload_data(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(
            Wallpaper::Upload(WALLPAPER_PLACEHOLDER.to_string()).upload_data(),
            None
        );
    }

    #[test]
    fn test_wallpaper_wire_shape() {
        let value = serde_json::to_value(Wallpaper::Upload("abc".to_string())).unwrap();
        assert_eq!(value, json!({ "type": "upload", "value": "abc" }));
    }

    #[test]
    fn test_search_provider_query_prefixes() {
        assert_eq!(SearchProvider::Baidu.query_url_prefix(), "https://www.baidu.com/s?wd=");
        assert_eq!(SearchProvider::Google.display_name(), "Google");
    }
}
