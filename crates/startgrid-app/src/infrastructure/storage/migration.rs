//! Lenient stored-document types and the layout migration.
//!
//! Documents written by older versions may have tiles with no `x`/`y` (the
//! layout used to be a flat list), geometry stored as strings or floats,
//! sizes that do not match the kind, numeric ids, or tile kinds this build
//! does not know.  [`StoredConfiguration`]
//! accepts all of those, and [`migrate`] turns it into a [`Configuration`]
//! whose layout satisfies the grid invariants.
//!
//! # Placement rules
//!
//! 1. Tiles with valid coordinates keep them, in document order, unless they
//!    cross the grid edge or overlap a tile kept before them.
//! 2. Every other tile (legacy or displaced) is placed in document order at
//!    the first row-major free slot among the tiles placed so far.  If the
//!    scan finds nothing, the tile goes below everything else.
//! 3. The result keeps the original document order.
//!
//! A migrated layout passes rule 1 unchanged, so `migrate` is idempotent.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use startgrid_core::{
    bounds_check, Configuration, GridCoord, GridRect, GridSpec, LayoutCollection, PlacedItem,
    Settings, Span, WidgetKind, CURRENT_VERSION,
};

/// A configuration document as found in storage or an import file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConfiguration {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, deserialize_with = "startgrid_core::deserialize_settings")]
    pub settings: Settings,
    #[serde(default, deserialize_with = "deserialize_items")]
    pub layout: Vec<StoredItem>,
}

/// A tile whose geometry may be missing or invalid.
///
/// Geometry that is not an integral number (or a string holding one) is
/// read as missing, as are coordinates and sizes below 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(flatten)]
    pub kind: WidgetKind,
    #[serde(
        default,
        deserialize_with = "deserialize_grid_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub x: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_grid_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub y: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_grid_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub w: Option<i64>,
    #[serde(
        default,
        deserialize_with = "deserialize_grid_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub h: Option<i64>,
}

fn default_version() -> String {
    CURRENT_VERSION.to_string()
}

/// Accepts `"1712345678901"` and `1712345678901` alike.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Int(i64),
        Float(f64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Int(i) => i.to_string(),
        StringOrNumber::Float(f) => f.to_string(),
    })
}

/// Reads `3`, `3.0` and `"3"` as `Some(3)`; anything else is `None`.
fn deserialize_grid_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    if number.is_none() && !value.is_null() {
        warn!(value = %value, "unreadable item geometry, treating as missing");
    }
    Ok(number)
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15).then(|| f as i64)
}

/// Decodes each tile on its own and drops the ones that do not decode
/// (unknown kind, missing id) instead of failing the whole document.
fn deserialize_items<'de, D>(deserializer: D) -> Result<Vec<StoredItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let mut items = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<StoredItem>(value) {
            Ok(item) => items.push(item),
            Err(e) => warn!(index, error = %e, "dropping undecodable layout item"),
        }
    }
    Ok(items)
}

impl From<PlacedItem> for StoredItem {
    fn from(item: PlacedItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind,
            x: Some(i64::from(item.x)),
            y: Some(i64::from(item.y)),
            w: Some(i64::from(item.w)),
            h: Some(i64::from(item.h)),
        }
    }
}

impl From<Configuration> for StoredConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            version: config.version,
            settings: config.settings,
            layout: config
                .layout
                .into_items()
                .into_iter()
                .map(StoredItem::from)
                .collect(),
        }
    }
}

/// Returns the value as a 1-based grid number, or `None` if missing or < 1.
fn positive(value: Option<i64>) -> Option<u32> {
    value
        .filter(|v| *v >= 1)
        .and_then(|v| u32::try_from(v).ok())
}

impl StoredItem {
    fn stored_coord(&self) -> Option<GridCoord> {
        Some(GridCoord::new(positive(self.x)?, positive(self.y)?))
    }

    /// Stored span with missing sides backfilled from the kind default.
    /// Weather tiles are always 3×2.
    fn repaired_span(&self) -> Span {
        let default = self.kind.default_span();
        if matches!(self.kind, WidgetKind::Weather { .. }) {
            return default;
        }
        Span::new(
            positive(self.w).unwrap_or(default.w),
            positive(self.h).unwrap_or(default.h),
        )
    }
}

/// Converts a stored document into a valid [`Configuration`].
pub fn migrate(stored: StoredConfiguration, grid: &GridSpec) -> Configuration {
    let total = stored.layout.len();
    let mut kept: Vec<(usize, PlacedItem)> = Vec::with_capacity(total);
    let mut pending: Vec<(usize, String, WidgetKind, Span)> = Vec::new();

    for (index, item) in stored.layout.into_iter().enumerate() {
        let span = item.repaired_span();
        let coord = item.stored_coord();
        let id = unique_id(item.id, &kept, &pending);
        match coord {
            Some(at) if fits(&kept, at, span, grid.columns) => {
                kept.push((index, PlacedItem::new(id, item.kind, at, span)));
            }
            Some(at) => {
                warn!(item = %id, x = at.x, y = at.y, "stored item does not fit, relocating");
                pending.push((index, id, item.kind, span));
            }
            None => pending.push((index, id, item.kind, span)),
        }
    }

    if !pending.is_empty() {
        info!(count = pending.len(), "placing layout items without a valid position");
    }

    for (index, id, kind, span) in pending {
        let span = Span::new(span.w.min(grid.columns), span.h);
        let placed: Vec<PlacedItem> = kept.iter().map(|(_, item)| item.clone()).collect();
        let at = grid
            .find_free_slot_checked(span, &placed)
            .unwrap_or_else(|| GridCoord::new(1, first_empty_row(&placed)));
        kept.push((index, PlacedItem::new(id, kind, at, span)));
    }

    kept.sort_by_key(|(index, _)| *index);
    Configuration {
        version: stored.version,
        settings: stored.settings,
        layout: LayoutCollection::from_items(kept.into_iter().map(|(_, item)| item).collect()),
    }
}

fn fits(kept: &[(usize, PlacedItem)], at: GridCoord, span: Span, columns: u32) -> bool {
    if !bounds_check(span, at, columns) {
        return false;
    }
    let candidate = GridRect::new(at, span);
    !kept.iter().any(|(_, item)| candidate.overlaps(&item.rect()))
}

/// Row just below the lowest tile.
fn first_empty_row(placed: &[PlacedItem]) -> u32 {
    placed
        .iter()
        .map(|item| item.rect().bottom())
        .max()
        .unwrap_or(1)
}

/// Returns `id`, or `id-2`, `id-3`, ... if it is already taken.
fn unique_id(
    id: String,
    kept: &[(usize, PlacedItem)],
    pending: &[(usize, String, WidgetKind, Span)],
) -> String {
    let taken = |candidate: &str| {
        kept.iter().any(|(_, item)| item.id == candidate)
            || pending.iter().any(|(_, other, _, _)| other == candidate)
    };
    if !taken(&id) {
        return id;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{id}-{suffix}");
        if !taken(&candidate) {
            warn!(original = %id, renamed = %candidate, "duplicate item id in stored layout");
            return candidate;
        }
        suffix += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
