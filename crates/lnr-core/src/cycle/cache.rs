use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{ConfigError, ConfigLocator};

use super::CycleSnapshot;

const CYCLE_LIST_KEY: &str = "cycle-list";

/// Cycles change rarely; a day-long TTL keeps most invocations off the
/// network. Boundary crossing can still invalidate sooner.
pub const DEFAULT_CYCLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Key -> string store with a per-read TTL. Keys are opaque.
pub trait CacheStore {
    fn get(&self, key: &str, ttl: Duration) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// File-per-key store rooted in the user cache directory. TTL is measured
/// against file modification time. Another invocation may rewrite or remove
/// an entry at any moment, so every read failure is just a miss.
pub struct FileCacheStore {
    root: PathBuf,
}

impl FileCacheStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn with_default_locator() -> Result<Self, ConfigError> {
        let locator = ConfigLocator::new()?;
        Ok(Self::new(locator.cache_dir().to_path_buf()))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str, ttl: Duration) -> Option<String> {
        let path = self.entry_path(key);
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        if age >= ttl {
            return None;
        }
        fs::read_to_string(&path).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.entry_path(key), value)?;
        Ok(())
    }
}

/// TTL-bounded cache of the remote cycle list, invalidated early when real
/// time crosses the end boundary of the cycle flagged active.
///
/// Construct one explicitly and pass it as `Option<&CycleCache>`; callers
/// without a cache get a guaranteed miss on read and a no-op on write.
pub struct CycleCache {
    store: Box<dyn CacheStore>,
    ttl: Duration,
}

impl CycleCache {
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self::with_ttl(store, DEFAULT_CYCLE_TTL)
    }

    pub fn with_ttl(store: Box<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Returns the cached snapshot if it is within TTL and not
    /// boundary-crossed at `now`. A corrupt payload is a miss, not an error.
    pub fn get(&self, now: DateTime<Utc>) -> Option<CycleSnapshot> {
        let raw = self.store.get(CYCLE_LIST_KEY, self.ttl)?;
        let snapshot: CycleSnapshot = serde_json::from_str(&raw).ok()?;
        if boundary_crossed(&snapshot, now) {
            return None;
        }
        Some(snapshot)
    }

    /// Unconditionally overwrites the previous entry.
    pub fn put(&self, snapshot: &CycleSnapshot) -> Result<(), CacheError> {
        let payload = serde_json::to_string(snapshot)?;
        self.store.set(CYCLE_LIST_KEY, &payload)
    }
}

/// Whether real time has passed the end of the cycle the snapshot flags as
/// active. The relative-position flags are point-in-time, so once `now`
/// reaches that boundary the snapshot is wrong even inside its TTL. A
/// snapshot with no active cycle is treated as already stale.
pub fn boundary_crossed(snapshot: &CycleSnapshot, now: DateTime<Utc>) -> bool {
    match snapshot.cycles.iter().find(|cycle| cycle.is_active) {
        Some(active) => active.ends_at <= now,
        None => true,
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::test_support::{instant, record};
    use crate::cycle::CycleRecord;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn active_until(ends_at: DateTime<Utc>) -> CycleSnapshot {
        let mut active = record(11, true, false, false);
        active.ends_at = ends_at;
        CycleSnapshot {
            fetched_at: instant(2026, 7, 1),
            cycles: vec![record(10, false, false, true), active],
        }
    }

    #[test]
    fn boundary_not_crossed_before_end() {
        let end = instant(2026, 7, 15);
        let snapshot = active_until(end);
        let just_before = end - chrono::Duration::seconds(1);
        assert!(!boundary_crossed(&snapshot, just_before));
    }

    #[test]
    fn boundary_crossed_at_and_after_end() {
        let end = instant(2026, 7, 15);
        let snapshot = active_until(end);
        assert!(boundary_crossed(&snapshot, end));
        assert!(boundary_crossed(&snapshot, end + chrono::Duration::days(3)));
    }

    #[test]
    fn snapshot_without_active_cycle_is_stale() {
        let snapshot = CycleSnapshot {
            fetched_at: instant(2026, 7, 1),
            cycles: vec![record(10, false, false, true)],
        };
        assert!(boundary_crossed(&snapshot, instant(2026, 7, 2)));
    }

    fn file_cache(temp_dir: &TempDir) -> CycleCache {
        CycleCache::new(Box::new(FileCacheStore::new(temp_dir.path().to_path_buf())))
    }

    #[test]
    fn round_trip_within_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let cache = file_cache(&temp_dir);
        let end = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        let snapshot = active_until(end);
        cache.put(&snapshot).unwrap();

        let loaded = cache.get(instant(2026, 7, 2)).expect("cache hit");
        assert_eq!(loaded.cycles.len(), 2);
        assert_eq!(loaded.cycles[1].number, 11);
    }

    #[test]
    fn boundary_crossing_beats_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let cache = file_cache(&temp_dir);
        let end = instant(2026, 7, 15);
        cache.put(&active_until(end)).unwrap();

        // Entry was written moments ago, so the TTL has not elapsed.
        assert!(cache.get(end - chrono::Duration::seconds(1)).is_some());
        assert!(cache.get(end).is_none());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp_dir.path().to_path_buf());
        let cache = CycleCache::with_ttl(Box::new(store), Duration::ZERO);
        let end = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        cache.put(&active_until(end)).unwrap();
        assert!(cache.get(instant(2026, 7, 2)).is_none());
    }

    #[test]
    fn corrupt_payload_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp_dir.path().to_path_buf());
        store.set(CYCLE_LIST_KEY, "not json").unwrap();
        let cache = CycleCache::new(Box::new(FileCacheStore::new(
            temp_dir.path().to_path_buf(),
        )));
        assert!(cache.get(instant(2026, 7, 2)).is_none());
    }

    #[test]
    fn missing_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = file_cache(&temp_dir);
        assert!(cache.get(instant(2026, 7, 2)).is_none());
    }

    #[test]
    fn put_overwrites_previous_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = file_cache(&temp_dir);
        let end = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        cache.put(&active_until(end)).unwrap();

        let replacement = CycleSnapshot {
            fetched_at: instant(2026, 7, 3),
            cycles: vec![{
                let mut c: CycleRecord = record(12, true, false, false);
                c.ends_at = end;
                c
            }],
        };
        cache.put(&replacement).unwrap();

        let loaded = cache.get(instant(2026, 7, 4)).expect("cache hit");
        assert_eq!(loaded.cycles.len(), 1);
        assert_eq!(loaded.cycles[0].number, 12);
    }
}
