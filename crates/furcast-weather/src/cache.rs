//! In-memory snapshot cache with a fixed time-to-live.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::types::WeatherSnapshot;

/// Snapshots older than this are fetched again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A fully assembled snapshot and when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: Arc<WeatherSnapshot>,
    pub fetched_at: Instant,
}

/// Snapshots keyed by coordinate string.
///
/// Only complete snapshots are ever inserted, so a lookup either finds a
/// valid entry or nothing. Concurrent inserts for one key: last write wins.
pub struct SnapshotCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached snapshot for `key` if it is younger than the TTL.
    pub fn get(&self, key: &str) -> Option<Arc<WeatherSnapshot>> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            Some(entry.snapshot.clone())
        } else {
            None
        }
    }

    /// Store `snapshot` under `key`, replacing any previous entry.
    pub fn insert(&self, key: impl Into<String>, snapshot: Arc<WeatherSnapshot>) {
        let entry = CacheEntry {
            snapshot,
            fetched_at: self.clock.now(),
        };
        self.entries.lock().insert(key.into(), entry);
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.fetched_at) < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clock moved by hand, for expiry tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
