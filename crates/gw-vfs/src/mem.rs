//! In-memory backend for tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::vfs::{DirEntry, FileHandle, FileInfo, Vfs, VfsError, check_path};

#[derive(Clone, Debug)]
struct MemFile {
    data: Vec<u8>,
    mtime: SystemTime,
}

/// In-memory [`Vfs`] for tests.
///
/// Directories are implied by file paths. Every write bumps an internal
/// clock, so mtime-based cache invalidation can be exercised without
/// sleeping.
///
/// # Example
///
/// ```
/// use gw_vfs::{MemFs, Vfs};
///
/// let fs = MemFs::new()
///     .with_file("doc/a.md", "# A")
///     .with_file("doc/b.md", "# B");
/// assert_eq!(fs.read_to_string("doc/a.md").unwrap(), "# A");
/// ```
#[derive(Debug, Default)]
pub struct MemFs {
    files: RwLock<BTreeMap<String, MemFile>>,
    clock: RwLock<u64>,
}

impl MemFs {
    /// Create an empty file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder form).
    ///
    /// # Panics
    ///
    /// Panics on an invalid path; test fixtures should be well-formed.
    #[must_use]
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.write_file(path, content);
        self
    }

    /// Add or replace a file, advancing its mtime.
    ///
    /// # Panics
    ///
    /// Panics on an invalid path or a poisoned lock.
    pub fn write_file(&self, path: &str, content: impl Into<Vec<u8>>) {
        check_path(path).expect("invalid fixture path");
        let mut clock = self.clock.write().unwrap();
        *clock += 1;
        let mtime = UNIX_EPOCH + Duration::from_secs(*clock);
        self.files.write().unwrap().insert(
            path.to_owned(),
            MemFile {
                data: content.into(),
                mtime,
            },
        );
    }

    /// Remove a file.
    ///
    /// # Panics
    ///
    /// Panics on a poisoned lock.
    pub fn remove_file(&self, path: &str) {
        self.files.write().unwrap().remove(path);
    }

    /// True when any file lives under directory `dir`.
    fn is_dir(files: &BTreeMap<String, MemFile>, dir: &str) -> bool {
        if dir == "." {
            return true;
        }
        let prefix = format!("{dir}/");
        files.range(prefix.clone()..).next().is_some_and(|(k, _)| k.starts_with(&prefix))
    }
}

impl Vfs for MemFs {
    fn open(&self, path: &str) -> Result<FileHandle, VfsError> {
        let data = self.read(path)?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        check_path(path)?;
        let files = self.files.read().unwrap();
        files
            .get(path)
            .map(|f| f.data.clone())
            .ok_or_else(|| VfsError::not_found(path))
    }

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        check_path(path)?;
        let files = self.files.read().unwrap();
        if let Some(f) = files.get(path) {
            let name = path.rsplit('/').next().unwrap_or(path).to_owned();
            return Ok(FileInfo {
                name,
                size: f.data.len() as u64,
                mtime: f.mtime,
                is_dir: false,
            });
        }
        if Self::is_dir(&files, path) {
            let name = if path == "." {
                ".".to_owned()
            } else {
                path.rsplit('/').next().unwrap_or(path).to_owned()
            };
            return Ok(FileInfo {
                name,
                size: 0,
                mtime: UNIX_EPOCH,
                is_dir: true,
            });
        }
        Err(VfsError::not_found(path))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        check_path(path)?;
        let files = self.files.read().unwrap();
        if path != "." && !Self::is_dir(&files, path) {
            return Err(VfsError::not_found(path));
        }

        let prefix = if path == "." {
            String::new()
        } else {
            format!("{path}/")
        };

        // BTreeMap iteration keeps the listing sorted by name.
        let mut names = BTreeSet::new();
        let mut entries = Vec::new();
        for key in files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    if names.insert(dir.to_owned()) {
                        entries.push(DirEntry {
                            name: dir.to_owned(),
                            is_dir: true,
                        });
                    }
                }
                None => {
                    if names.insert(rest.to_owned()) {
                        entries.push(DirEntry {
                            name: rest.to_owned(),
                            is_dir: false,
                        });
                    }
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
