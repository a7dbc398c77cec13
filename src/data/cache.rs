use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::loader::load_file;
use super::model::BookingTable;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// TableCache – loaded tables keyed by path
// ---------------------------------------------------------------------------

struct CacheEntry {
    /// Modification time seen when the file was read.
    modified: Option<SystemTime>,
    table: Arc<BookingTable>,
}

/// Hit / miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Process-lifetime cache of loaded booking tables.
///
/// An entry is reused while the file's modification time is unchanged.
/// Tables are shared read-only through `Arc`.
#[derive(Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CacheEntry>,
    stats: CacheStats,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the table for `path`, reading the file only on a miss or when
    /// it changed on disk.  Failed loads are not cached.
    pub fn load(&mut self, path: &Path) -> Result<Arc<BookingTable>, DashboardError> {
        let modified = modified_time(path);

        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified && modified.is_some() {
                self.stats.hits += 1;
                log::debug!("Cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.table));
            }
            log::debug!("{} changed on disk, reloading", path.display());
        }

        self.stats.misses += 1;
        let table = Arc::new(load_file(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop the entry for `path`; the next `load` re-reads it.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
