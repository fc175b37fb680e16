//! Tiles placed on the grid and the closed set of widget kinds.
//!
//! A [`PlacedItem`] is one rectangular occupant of the grid.  Its
//! [`WidgetKind`] selects what the tile shows and carries the kind-specific
//! payload (a shortcut's URL, a todo list's entries, ...).
//!
//! # Wire format
//!
//! Items are stored as flat JSON objects with a `type` discriminant, the
//! geometry fields, and the payload fields side by side:
//!
//! ```json
//! { "id": "1712345678901", "type": "weather", "city": "", "x": 1, "y": 1, "w": 3, "h": 2 }
//! ```
//!
//! The three curated-image categories are three separate `type` values
//! (`heisi`, `baisi`, `jk`) on the wire but one [`WidgetKind::CuratedImage`]
//! variant in memory; the private `WireKind` enum does the mapping.

use serde::{Deserialize, Serialize};

use super::grid::{GridCoord, GridRect, Span};
use super::layout::LayoutError;

/// Largest width or height a shortcut may be resized to.
pub const MAX_SHORTCUT_CELLS: u32 = 2;

/// How a shortcut's `icon` field is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconType {
    /// `icon` is an image URL (or empty, meaning "use the site favicon").
    #[default]
    Url,
    /// `icon` is an uploaded image as a data URL.
    Upload,
    /// `icon` is one or two characters drawn on `background_color`.
    Text,
}

/// A link tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortcut {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub icon_type: IconType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl Shortcut {
    /// Fills an empty URL icon with the site's favicon service URL.
    pub fn with_favicon_fallback(mut self) -> Self {
        if self.icon_type == IconType::Url && self.icon.is_empty() && !self.url.is_empty() {
            self.icon = format!(
                "https://www.google.com/s2/favicons?domain={}&sz=128",
                self.url
            );
        }
        self
    }
}

/// Hot-list provider shown by a news widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsSource {
    #[default]
    Weibo,
    Douyin,
}

/// Category of a curated random-image widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCategory {
    Heisi,
    Baisi,
    Jk,
}

/// One entry of a todo-list widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoEntry {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// What a tile is, together with its kind-specific payload.
///
/// Matching on this enum is exhaustive everywhere a kind is interpreted, so
/// adding a kind is a compile error until every site handles it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireKind", into = "WireKind")]
pub enum WidgetKind {
    Shortcut(Shortcut),
    /// Empty `city` means "detect from the user's location".
    Weather { city: String },
    News { source: NewsSource },
    History,
    ImageOfTheDay,
    CuratedImage { category: ImageCategory },
    Note { content: String },
    TodoList { todos: Vec<TodoEntry> },
    /// `target_date` is an ISO-8601 calendar date, or empty when unset.
    Countdown { title: String, target_date: String },
}

impl WidgetKind {
    /// Size a new tile of this kind gets.  Only shortcuts may differ from it.
    pub fn default_span(&self) -> Span {
        match self {
            WidgetKind::Shortcut(_) => Span::new(1, 1),
            WidgetKind::Weather { .. } => Span::new(3, 2),
            WidgetKind::News { .. } => Span::new(3, 4),
            WidgetKind::History => Span::new(2, 3),
            WidgetKind::ImageOfTheDay => Span::new(4, 3),
            WidgetKind::CuratedImage { .. } => Span::new(3, 4),
            WidgetKind::Note { .. } => Span::new(2, 2),
            WidgetKind::TodoList { .. } => Span::new(2, 3),
            WidgetKind::Countdown { .. } => Span::new(2, 2),
        }
    }

    /// Returns `true` for kinds whose size the user may choose.
    pub fn is_resizable(&self) -> bool {
        matches!(self, WidgetKind::Shortcut(_))
    }

    /// The `type` value this kind is stored under.
    pub fn wire_name(&self) -> &'static str {
        match self {
            WidgetKind::Shortcut(_) => "icon",
            WidgetKind::Weather { .. } => "weather",
            WidgetKind::News { .. } => "news",
            WidgetKind::History => "history",
            WidgetKind::ImageOfTheDay => "bing",
            WidgetKind::CuratedImage { category } => match category {
                ImageCategory::Heisi => "heisi",
                ImageCategory::Baisi => "baisi",
                ImageCategory::Jk => "jk",
            },
            WidgetKind::Note { .. } => "notes",
            WidgetKind::TodoList { .. } => "todo",
            WidgetKind::Countdown { .. } => "countdown",
        }
    }

    /// Validates a user-chosen span for this kind.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidSpan`] if a shortcut span is outside
    /// `1..=2 × 1..=2`, or if a fixed-size kind is given anything other than
    /// its default span.
    pub fn validate_span(&self, span: Span) -> Result<Span, LayoutError> {
        let ok = if self.is_resizable() {
            (1..=MAX_SHORTCUT_CELLS).contains(&span.w) && (1..=MAX_SHORTCUT_CELLS).contains(&span.h)
        } else {
            span == self.default_span()
        };
        if ok {
            Ok(span)
        } else {
            Err(LayoutError::InvalidSpan {
                kind: self.wire_name(),
                w: span.w,
                h: span.h,
            })
        }
    }
}

/// A tile on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    /// Opaque id, stable for the tile's lifetime.
    pub id: String,
    #[serde(flatten)]
    pub kind: WidgetKind,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PlacedItem {
    pub fn new(id: impl Into<String>, kind: WidgetKind, at: GridCoord, span: Span) -> Self {
        Self {
            id: id.into(),
            kind,
            x: at.x,
            y: at.y,
            w: span.w,
            h: span.h,
        }
    }

    pub fn coord(&self) -> GridCoord {
        GridCoord::new(self.x, self.y)
    }

    pub fn span(&self) -> Span {
        Span::new(self.w, self.h)
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.coord(), self.span())
    }
}

// ── Wire representation ───────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireKind {
    Icon(Shortcut),
    Weather {
        #[serde(default)]
        city: String,
    },
    News {
        #[serde(default)]
        source: NewsSource,
    },
    History,
    Bing,
    Heisi,
    Baisi,
    Jk,
    Notes {
        #[serde(default)]
        content: String,
    },
    Todo {
        #[serde(default)]
        todos: Vec<TodoEntry>,
    },
    Countdown {
        #[serde(default)]
        title: String,
        #[serde(default, rename = "targetDate")]
        target_date: String,
    },
}

impl From<WireKind> for WidgetKind {
    fn from(wire: WireKind) -> Self {
        match wire {
            WireKind::Icon(shortcut) => WidgetKind::Shortcut(shortcut),
            WireKind::Weather { city } => WidgetKind::Weather { city },
            WireKind::News { source } => WidgetKind::News { source },
            WireKind::History => WidgetKind::History,
            WireKind::Bing => WidgetKind::ImageOfTheDay,
            WireKind::Heisi => WidgetKind::CuratedImage {
                category: ImageCategory::Heisi,
            },
            WireKind::Baisi => WidgetKind::CuratedImage {
                category: ImageCategory::Baisi,
            },
            WireKind::Jk => WidgetKind::CuratedImage {
                category: ImageCategory::Jk,
            },
            WireKind::Notes { content } => WidgetKind::Note { content },
            WireKind::Todo { todos } => WidgetKind::TodoList { todos },
            WireKind::Countdown { title, target_date } => {
                WidgetKind::Countdown { title, target_date }
            }
        }
    }
}

impl From<WidgetKind> for WireKind {
    fn from(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Shortcut(shortcut) => WireKind::Icon(shortcut),
            WidgetKind::Weather { city } => WireKind::Weather { city },
            WidgetKind::News { source } => WireKind::News { source },
            WidgetKind::History => WireKind::History,
            WidgetKind::ImageOfTheDay => WireKind::Bing,
            WidgetKind::CuratedImage { category } => match category {
                ImageCategory::Heisi => WireKind::Heisi,
                ImageCategory::Baisi => WireKind::Baisi,
                ImageCategory::Jk => WireKind::Jk,
            },
            WidgetKind::Note { content } => WireKind::Notes { content },
            WidgetKind::TodoList { todos } => WireKind::Todo { todos },
            WidgetKind::Countdown { title, target_date } => {
                WireKind::Countdown { title, target_date }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
