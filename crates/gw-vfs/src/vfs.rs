//! The [`Vfs`] trait and its error type.
//!
//! Backends implement `open`, `read`, `stat` and `read_dir`; `glob` and
//! `read_to_string` have default implementations in terms of the others.

use std::io::Read;
use std::time::SystemTime;

use glob::{MatchOptions, Pattern};

/// A readable file handle returned by [`Vfs::open`].
pub type FileHandle = Box<dyn Read + Send>;

/// Metadata for a single file or directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    /// Base name of the entry (the last path element, or `"."` for the root).
    pub name: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Modification time.
    pub mtime: SystemTime,
    /// True if the entry is a directory.
    pub is_dir: bool,
}

/// A single entry returned by [`Vfs::read_dir`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    /// Base name of the entry.
    pub name: String,
    /// True if the entry is a directory.
    pub is_dir: bool,
}

/// Semantic error categories for VFS operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum VfsErrorKind {
    /// The path does not exist.
    NotFound,
    /// The path is not a valid slash-separated path.
    InvalidPath,
    /// Underlying I/O failure.
    Io,
}

/// VFS error with a semantic kind and optional path context.
#[derive(Debug)]
pub struct VfsError {
    kind: VfsErrorKind,
    path: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl VfsError {
    /// Create a new error of the given kind.
    #[must_use]
    pub fn new(kind: VfsErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not-found error for `path`.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::new(VfsErrorKind::NotFound).with_path(path)
    }

    /// Create an invalid-path error for `path`.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::new(VfsErrorKind::InvalidPath).with_path(path)
    }

    /// Create an error from an I/O error, mapping `NotFound` to the
    /// distinguished kind and leaving everything else as `Io`.
    #[must_use]
    pub fn io(err: std::io::Error, path: impl Into<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => VfsErrorKind::NotFound,
            _ => VfsErrorKind::Io,
        };
        Self::new(kind).with_path(path).with_source(err)
    }

    /// The semantic error kind.
    #[must_use]
    pub fn kind(&self) -> VfsErrorKind {
        self.kind
    }

    /// The path the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// True if the error means the path does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == VfsErrorKind::NotFound
    }
}

impl std::fmt::Display for VfsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            VfsErrorKind::NotFound => "not found",
            VfsErrorKind::InvalidPath => "invalid path",
            VfsErrorKind::Io => "I/O error",
        };
        write!(f, "{kind}")?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }
        Ok(())
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Validate a slash-separated path.
///
/// The literal path `"."` denotes the root and is valid. Any other path must
/// be non-empty, have no leading or trailing slash, and contain no empty,
/// `.` or `..` elements.
///
/// # Errors
///
/// Returns [`VfsErrorKind::InvalidPath`] when the path breaks any rule.
pub fn check_path(path: &str) -> Result<(), VfsError> {
    if path == "." {
        return Ok(());
    }
    if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
        return Err(VfsError::invalid_path(path));
    }
    for elem in path.split('/') {
        if elem.is_empty() || elem == "." || elem == ".." {
            return Err(VfsError::invalid_path(path));
        }
    }
    Ok(())
}

/// Directory part of a path (`"."` for top-level names).
#[must_use]
pub fn path_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => ".",
    }
}

/// Join a directory and a base name, collapsing the root marker.
#[must_use]
pub fn path_join(dir: &str, name: &str) -> String {
    if dir == "." || dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}

/// Extension of a path's base name, without the dot.
#[must_use]
pub fn file_ext(path: &str) -> Option<&str> {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some(ext),
        _ => None,
    }
}

/// Read-only hierarchical file namespace.
///
/// Implementations must be cheap to call concurrently; the site engine reads
/// through a shared reference on every request.
pub trait Vfs: Send + Sync {
    /// Open a file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`VfsErrorKind::NotFound`] for missing paths,
    /// [`VfsErrorKind::InvalidPath`] for malformed ones, and
    /// [`VfsErrorKind::Io`] for backend failures.
    fn open(&self, path: &str) -> Result<FileHandle, VfsError>;

    /// Read a whole file into memory.
    ///
    /// # Errors
    ///
    /// Same failure semantics as [`open`](Self::open).
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError>;

    /// Stat a file or directory.
    ///
    /// # Errors
    ///
    /// Same failure semantics as [`open`](Self::open).
    fn stat(&self, path: &str) -> Result<FileInfo, VfsError>;

    /// List a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Same failure semantics as [`open`](Self::open).
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, VfsError>;

    /// Read a whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read); invalid UTF-8 is reported as an I/O error.
    fn read_to_string(&self, path: &str) -> Result<String, VfsError> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes)
            .map_err(|e| VfsError::new(VfsErrorKind::Io).with_path(path).with_source(e))
    }

    /// Return all file paths matching a glob pattern, sorted.
    ///
    /// `*` does not cross `/` boundaries; use `**` for recursive matches.
    ///
    /// # Errors
    ///
    /// Returns [`VfsErrorKind::InvalidPath`] for a malformed pattern and
    /// propagates directory listing errors.
    fn glob(&self, pattern: &str) -> Result<Vec<String>, VfsError> {
        let pat = Pattern::new(pattern)
            .map_err(|e| VfsError::invalid_path(pattern).with_source(e))?;
        let mut out = Vec::new();
        self.glob_into(".", &pat, &mut out)?;
        out.sort();
        Ok(out)
    }

    /// Recursive helper for the default [`glob`](Self::glob).
    #[doc(hidden)]
    fn glob_into(&self, dir: &str, pat: &Pattern, out: &mut Vec<String>) -> Result<(), VfsError> {
        let opts = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::default()
        };
        for entry in self.read_dir(dir)? {
            let path = path_join(dir, &entry.name);
            if entry.is_dir {
                self.glob_into(&path, pat, out)?;
            } else if pat.matches_with(&path, opts) {
                out.push(path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_path_root() {
        assert!(check_path(".").is_ok());
    }

    #[test]
    fn test_check_path_valid() {
        assert!(check_path("doc").is_ok());
        assert!(check_path("doc/install.md").is_ok());
        assert!(check_path("a/b/c").is_ok());
    }

    #[test]
    fn test_check_path_rejects_empty() {
        assert!(check_path("").is_err());
    }

    #[test]
    fn test_check_path_rejects_slashes() {
        assert!(check_path("/doc").is_err());
        assert!(check_path("doc/").is_err());
        assert!(check_path("doc//x").is_err());
    }

    #[test]
    fn test_check_path_rejects_dot_elements() {
        assert!(check_path("./doc").is_err());
        assert!(check_path("doc/..").is_err());
        assert!(check_path("a/./b").is_err());
    }

    #[test]
    fn test_path_dir() {
        assert_eq!(path_dir("doc/install.md"), "doc");
        assert_eq!(path_dir("install.md"), ".");
        assert_eq!(path_dir("a/b/c"), "a/b");
    }

    #[test]
    fn test_path_join() {
        assert_eq!(path_join(".", "x"), "x");
        assert_eq!(path_join("doc", "x.md"), "doc/x.md");
    }

    #[test]
    fn test_file_ext() {
        assert_eq!(file_ext("a.md"), Some("md"));
        assert_eq!(file_ext("doc/a.html"), Some("html"));
        assert_eq!(file_ext("doc/README"), None);
        assert_eq!(file_ext("doc.d/README"), None);
        assert_eq!(file_ext(".gitignore"), None);
    }

    #[test]
    fn test_error_display() {
        let err = VfsError::not_found("doc/x.md");
        assert_eq!(err.to_string(), "not found (path: doc/x.md)");
    }

    #[test]
    fn test_error_io_maps_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = VfsError::io(io, "x");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_io_maps_other() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = VfsError::io(io, "x");
        assert_eq!(err.kind(), VfsErrorKind::Io);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VfsError>();
    }
}
