//! OS-directory backend.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::vfs::{DirEntry, FileHandle, FileInfo, Vfs, VfsError, check_path};

/// A [`Vfs`] rooted at an OS directory.
///
/// Path validation happens before any I/O, so a request can never escape the
/// root via `..` elements.
#[derive(Clone, Debug)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    /// Create a file system rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory this file system serves from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a slash-separated path to an OS path under the root.
    fn os_path(&self, path: &str) -> Result<PathBuf, VfsError> {
        check_path(path)?;
        if path == "." {
            return Ok(self.root.clone());
        }
        let mut out = self.root.clone();
        for elem in path.split('/') {
            out.push(elem);
        }
        Ok(out)
    }
}

/// Build a [`FileInfo`] from OS metadata.
fn file_info(name: String, meta: &fs::Metadata) -> FileInfo {
    FileInfo {
        name,
        size: meta.len(),
        mtime: meta.modified().unwrap_or(UNIX_EPOCH),
        is_dir: meta.is_dir(),
    }
}

/// Base name of a slash-separated path (`"."` stays `"."`).
fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl Vfs for DirFs {
    fn open(&self, path: &str) -> Result<FileHandle, VfsError> {
        let os = self.os_path(path)?;
        let file = fs::File::open(&os).map_err(|e| VfsError::io(e, path))?;
        Ok(Box::new(file))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError> {
        let os = self.os_path(path)?;
        fs::read(&os).map_err(|e| VfsError::io(e, path))
    }

    fn stat(&self, path: &str) -> Result<FileInfo, VfsError> {
        let os = self.os_path(path)?;
        let meta = fs::metadata(&os).map_err(|e| VfsError::io(e, path))?;
        Ok(file_info(base_name(path).to_owned(), &meta))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let os = self.os_path(path)?;
        let iter = fs::read_dir(&os).map_err(|e| VfsError::io(e, path))?;

        let mut entries = Vec::new();
        for entry in iter {
            let entry = entry.map_err(|e| VfsError::io(e, path))?;
            // Entries with non-UTF-8 names cannot be addressed through the
            // VFS path grammar at all, so they are not listed either.
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!(dir = %path, "skipping entry with non-UTF-8 name");
                continue;
            };
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            entries.push(DirEntry { name, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_read_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "doc/a.md", "hello");

        let fs = DirFs::new(tmp.path());
        assert_eq!(fs.read("doc/a.md").unwrap(), b"hello");
        assert_eq!(fs.read_to_string("doc/a.md").unwrap(), "hello");
    }

    #[test]
    fn test_open_streams_content() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.txt", "stream me");

        let fs = DirFs::new(tmp.path());
        let mut handle = fs.open("a.txt").unwrap();
        let mut buf = String::new();
        handle.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "stream me");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFs::new(tmp.path());
        assert!(fs.read("nope.md").unwrap_err().is_not_found());
    }

    #[test]
    fn test_invalid_path_rejected_before_io() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = DirFs::new(tmp.path());
        let err = fs.read("../etc/passwd").unwrap_err();
        assert_eq!(err.kind(), crate::VfsErrorKind::InvalidPath);
    }

    #[test]
    fn test_stat_file_and_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "doc/a.md", "hello");

        let fs = DirFs::new(tmp.path());
        let info = fs.stat("doc/a.md").unwrap();
        assert_eq!(info.name, "a.md");
        assert_eq!(info.size, 5);
        assert!(!info.is_dir);

        let info = fs.stat("doc").unwrap();
        assert!(info.is_dir);
    }

    #[test]
    fn test_read_dir_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b.md", "");
        write(tmp.path(), "a.md", "");
        write(tmp.path(), "sub/c.md", "");

        let fs = DirFs::new(tmp.path());
        let names: Vec<_> = fs
            .read_dir(".")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.md", "b.md", "sub"]);
    }

    #[test]
    fn test_glob() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "doc/a.md", "");
        write(tmp.path(), "doc/b.html", "");
        write(tmp.path(), "doc/sub/c.md", "");

        let fs = DirFs::new(tmp.path());
        assert_eq!(fs.glob("doc/*.md").unwrap(), vec!["doc/a.md"]);
        assert_eq!(
            fs.glob("doc/**/*.md").unwrap(),
            vec!["doc/a.md", "doc/sub/c.md"]
        );
    }
}
