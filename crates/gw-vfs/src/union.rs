//! Ordered overlay of several file systems.

use std::sync::Arc;

use crate::vfs::{DirEntry, FileHandle, FileInfo, Vfs, VfsError};

/// Union of file systems, preferring earlier layers.
///
/// `open`, `read` and `stat` return the first layer's successful result; when
/// every layer fails, the first error encountered is returned. `read_dir`
/// concatenates all layers' listings, suppressing later duplicates by base
/// name and preserving the order of the first layer that saw each name.
///
/// Note the deliberate asymmetry: files at the same path are *not* merged
/// across layers for `open`; only directory listings merge. This keeps
/// `open` a single probe per layer, which is how callers consume the API.
#[derive(Clone)]
pub struct UnionFs {
    layers: Vec<Arc<dyn Vfs>>,
}

impl UnionFs {
    /// Create a union over `layers`, ordered by decreasing precedence.
    #[must_use]
    pub fn new(layers: Vec<Arc<dyn Vfs>>) -> Self {
        Self { layers }
    }

    /// Run `f` over layers until the first success; keep the first error.
    fn first_ok<T>(
        &self,
        path: &str,
        f: impl Fn(&dyn Vfs) -> Result<T, VfsError>,
    ) -> Result<T, VfsError> {
        let mut first_err = None;
        for layer in &self.layers {
            match f(layer.as_ref()) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        Err(first_err.unwrap_or_else(|| VfsError::not_found(path)))
    }
}

impl Vfs for UnionFs {
    fn open(&self, path: &str) -> Result<FileHandle, VfsError> {
        self.first_ok(path, |fs| fs.open(path))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        self.first_ok(path, |fs| fs.read(path))
    }

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        self.first_ok(path, |fs| fs.stat(path))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let mut merged: Vec<DirEntry> = Vec::new();
        // Allocated lazily: most paths exist in a single layer, and a lone
        // listing needs no duplicate suppression.
        let mut seen: Option<std::collections::HashSet<String>> = None;
        let mut first_err = None;
        let mut any_ok = false;

        for layer in &self.layers {
            match layer.read_dir(path) {
                Ok(entries) => {
                    if !any_ok {
                        any_ok = true;
                        merged = entries;
                    } else if merged.is_empty() {
                        merged = entries;
                    } else {
                        let seen = seen.get_or_insert_with(|| {
                            merged.iter().map(|e| e.name.clone()).collect()
                        });
                        for entry in entries {
                            if seen.insert(entry.name.clone()) {
                                merged.push(entry);
                            }
                        }
                    }
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        if !any_ok {
            return Err(first_err.unwrap_or_else(|| VfsError::not_found(path)));
        }
        Ok(merged)
    }
}

#[cfg(test)]
#[cfg(feature = "mem")]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::MemFs;

    fn union(a: MemFs, b: MemFs) -> UnionFs {
        UnionFs::new(vec![Arc::new(a), Arc::new(b)])
    }

    #[test]
    fn test_open_prefers_first_layer() {
        let a = MemFs::new().with_file("y", "1");
        let b = MemFs::new().with_file("y", "2").with_file("z", "2");
        let fs = union(a, b);

        assert_eq!(fs.read("y").unwrap(), b"1");
        assert_eq!(fs.read("z").unwrap(), b"2");
    }

    #[test]
    fn test_read_dir_merges_and_dedupes() {
        let a = MemFs::new().with_file("x", "1").with_file("y", "1");
        let b = MemFs::new().with_file("y", "2").with_file("z", "2");
        let fs = union(a, b);

        let names: Vec<_> = fs
            .read_dir(".")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_missing_everywhere_is_first_error() {
        let fs = union(MemFs::new(), MemFs::new());
        assert!(fs.read("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_dir_in_second_layer_only() {
        let a = MemFs::new().with_file("top.md", "");
        let b = MemFs::new().with_file("sub/inner.md", "");
        let fs = union(a, b);

        let names: Vec<_> = fs
            .read_dir("sub")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["inner.md"]);
    }

    #[test]
    fn test_glob_through_union() {
        let a = MemFs::new().with_file("doc/a.md", "");
        let b = MemFs::new().with_file("doc/b.md", "").with_file("doc/a.md", "");
        let fs = union(a, b);

        assert_eq!(fs.glob("doc/*.md").unwrap(), vec!["doc/a.md", "doc/b.md"]);
    }
}
