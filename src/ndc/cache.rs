use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::ndc::types::{NdcRecord, NdcTable};

/// Metadata about the snapshot currently installed
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub records: usize,
    pub eligible: usize,
    pub loaded_at: DateTime<Utc>,
}

impl SnapshotInfo {
    /// Counts for `table`, stamped with the current time
    pub fn of(table: &NdcTable) -> Self {
        Self {
            records: table.len(),
            eligible: table.eligible_count(),
            loaded_at: Utc::now(),
        }
    }
}

struct Snapshot {
    table: Arc<NdcTable>,
    info: Option<SnapshotInfo>,
}

/// In-memory 340B eligibility table.
///
/// The table is never mutated in place. `load` swaps in a whole new
/// snapshot under the write lock; readers clone the `Arc` or read a single
/// record under the read lock, so they only ever see one complete table.
/// A replaced snapshot is freed once the last reader drops its `Arc`.
pub struct EligibilityCache {
    current: RwLock<Snapshot>,
}

impl EligibilityCache {
    /// Create an empty cache; nothing is eligible until the first `load`
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Snapshot {
                table: Arc::new(NdcTable::new()),
                info: None,
            }),
        }
    }

    /// Install `table` as the current snapshot
    pub fn load(&self, table: NdcTable) -> SnapshotInfo {
        let info = SnapshotInfo::of(&table);
        let table = Arc::new(table);

        let previous = {
            let mut current = self.current.write();
            let previous = std::mem::replace(&mut current.table, table);
            current.info = Some(info.clone());
            previous
        };
        // Drop the old table outside the lock
        drop(previous);

        info!("NDC cache updated with {} records", info.records);
        info
    }

    /// Point lookup against the current snapshot
    pub fn lookup(&self, ndc: &str) -> Option<NdcRecord> {
        self.current.read().table.get(ndc).cloned()
    }

    /// Shared handle to the whole current snapshot
    pub fn snapshot(&self) -> Arc<NdcTable> {
        Arc::clone(&self.current.read().table)
    }

    pub fn len(&self) -> usize {
        self.current.read().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn info(&self) -> Option<SnapshotInfo> {
        self.current.read().info.clone()
    }

    /// Human-readable description of the snapshot for tool responses
    pub fn describe(&self) -> String {
        match self.info() {
            Some(info) => format!(
                "Loaded on startup: {} records at {}",
                info.records,
                info.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => "Not loaded".to_string(),
        }
    }
}

impl Default for EligibilityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn record(ndc: &str, is_340b: bool) -> NdcRecord {
        NdcRecord {
            ndc: ndc.to_string(),
            drug_name: format!("Drug {}", ndc),
            strength: "10".to_string(),
            unit_of_measure: "MG".to_string(),
            route: "ORAL".to_string(),
            manufacturer: "Acme".to_string(),
            package_size: "30".to_string(),
            is_340b,
        }
    }

    fn table(prefix: &str, size: usize) -> NdcTable {
        (0..size)
            .map(|i| record(&format!("{}-{:04}", prefix, i), i % 2 == 0))
            .collect()
    }

    #[test]
    fn test_empty_cache() {
        let cache = EligibilityCache::new();
        assert!(cache.is_empty());
        assert!(cache.info().is_none());
        assert!(cache.lookup("00000-0000").is_none());
        assert_eq!(cache.describe(), "Not loaded");
    }

    #[test]
    fn test_load_and_lookup() {
        let cache = EligibilityCache::new();
        let info = cache.load(table("a", 10));

        assert_eq!(info.records, 10);
        assert_eq!(info.eligible, 5);
        assert_eq!(cache.info(), Some(info));
        assert_eq!(cache.lookup("a-0000"), Some(record("a-0000", true)));
        assert_eq!(cache.lookup("a-0001").map(|r| r.is_340b), Some(false));
        assert!(cache.lookup("b-0000").is_none());
        assert!(cache.describe().starts_with("Loaded on startup: 10 records"));
    }

    #[test]
    fn test_snapshot_info_of_table() {
        let info = SnapshotInfo::of(&table("a", 7));
        assert_eq!(info.records, 7);
        assert_eq!(info.eligible, 4);

        let empty = SnapshotInfo::of(&NdcTable::new());
        assert_eq!((empty.records, empty.eligible), (0, 0));
    }

    #[test]
    fn test_load_replaces_whole_table() {
        let cache = EligibilityCache::new();
        cache.load(table("a", 10));
        let old = cache.snapshot();

        cache.load(table("b", 3));

        assert_eq!(cache.len(), 3);
        assert!(cache.lookup("a-0000").is_none());
        assert!(cache.lookup("b-0002").is_some());
        // Readers holding the old snapshot keep a complete table
        assert_eq!(old.len(), 10);
        assert!(old.get("a-0009").is_some());
    }

    #[test]
    fn test_concurrent_lookups_during_swaps() {
        let cache = EligibilityCache::new();
        cache.load(table("a", 500));
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Relaxed) {
                        let snapshot = cache.snapshot();
                        let prefix = match snapshot.len() {
                            500 => "a",
                            200 => "b",
                            n => panic!("observed partial table with {} records", n),
                        };
                        for i in 0..snapshot.len() {
                            let key = format!("{}-{:04}", prefix, i);
                            assert!(snapshot.get(&key).is_some(), "missing {}", key);
                        }
                        let _ = cache.lookup("a-0001");
                    }
                });
            }

            for round in 0..50 {
                if round % 2 == 0 {
                    cache.load(table("b", 200));
                } else {
                    cache.load(table("a", 500));
                }
            }
            done.store(true, Ordering::Relaxed);
        });
    }
}
