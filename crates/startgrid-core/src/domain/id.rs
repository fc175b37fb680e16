//! Time-derived tile ids.
//!
//! New tiles get an id equal to the current Unix time in milliseconds, as a
//! decimal string.  Two tiles created in the same millisecond would collide,
//! so the generator remembers the last id it issued and never issues a value
//! less than or equal to it: the second tile gets `last + 1`.
//!
//! Tiles loaded from storage already carry ids minted this way.  Seeding the
//! generator with them via [`ItemIdGenerator::seeded_from`] guarantees new ids
//! are larger than every numeric id already in the layout, even if the system
//! clock has gone backwards since they were created.
//!
//! # Thread safety
//!
//! The last issued value is an `AtomicU64` advanced with `fetch_update`, so
//! concurrent callers never receive the same id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A lock-free, strictly increasing id source.
///
/// # Examples
///
/// ```rust
/// use startgrid_core::ItemIdGenerator;
///
/// let ids = ItemIdGenerator::new();
/// let a: u64 = ids.next_id().parse().unwrap();
/// let b: u64 = ids.next_id().parse().unwrap();
/// assert!(b > a);
/// ```
#[derive(Debug, Default)]
pub struct ItemIdGenerator {
    last: AtomicU64,
}

impl ItemIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that will only issue ids above every numeric id in
    /// `existing`.  Non-numeric ids are ignored; they cannot collide with the
    /// decimal strings this generator produces.
    pub fn seeded_from<'a, I>(existing: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let last = existing
            .into_iter()
            .filter_map(|id| id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            last: AtomicU64::new(last),
        }
    }

    /// Returns a new id derived from the current wall-clock time.
    pub fn next_id(&self) -> String {
        self.next_at(now_millis()).to_string()
    }

    /// Returns `max(now_ms, last + 1)` and records it as the last issued id.
    pub fn next_at(&self, now_ms: u64) -> u64 {
        let previous = self
            .last
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(now_ms.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now_ms.max(previous.saturating_add(1))
    }

    /// The most recently issued id, or the seed if none has been issued yet.
    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
