//! The page cache.
//!
//! A process-wide map from normalized logical path to an immutable page
//! snapshot, owned by the [`crate::Site`] instance (never a global, so
//! several sites can coexist in one process). Entries re-validate against
//! the backing file's size and mtime, debounced to one stat per entry per
//! 3-second window; a duplicate refresh under load is only wasted work,
//! never a correctness problem.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime};

use gw_vfs::Vfs;

use crate::page::Page;

/// How long a cached entry is served without re-statting its file.
const STAT_WINDOW: Duration = Duration::from_secs(3);

/// Stat fingerprint used for invalidation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FileStamp {
    pub size: u64,
    pub mtime: SystemTime,
}

#[derive(Clone)]
struct Entry {
    page: Arc<Page>,
    /// Canonical URL for redirect decisions (`redirect` front-matter wins
    /// over the computed `url`).
    canonical: String,
    stamp: FileStamp,
    checked: Instant,
}

/// Mapping from logical path to cached page.
#[derive(Default)]
pub(crate) struct PageCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl PageCache {
    /// Look up `path`, re-validating stale entries against the file system.
    pub fn get(&self, path: &str, vfs: &dyn Vfs) -> Option<(Arc<Page>, String)> {
        let entry = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.get(path)?.clone()
        };

        if entry.checked.elapsed() < STAT_WINDOW {
            return Some((entry.page, entry.canonical));
        }

        // Stale: one stat decides between refresh-in-place and eviction.
        let current = vfs.stat(entry.page.file()).ok().map(|info| FileStamp {
            size: info.size,
            mtime: info.mtime,
        });
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if current == Some(entry.stamp) {
            if let Some(e) = entries.get_mut(path) {
                e.checked = Instant::now();
            }
            return Some((entry.page, entry.canonical));
        }
        entries.remove(path);
        None
    }

    /// Store a freshly loaded page.
    pub fn insert(&self, path: &str, page: Arc<Page>, canonical: String, stamp: FileStamp) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            path.to_owned(),
            Entry {
                page,
                canonical,
                stamp,
                checked: Instant::now(),
            },
        );
    }
}
