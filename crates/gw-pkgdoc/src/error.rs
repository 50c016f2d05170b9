//! Doc-page error type.

use gw_vfs::VfsError;

/// Errors from package documentation construction.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    /// The import path names no directory.
    #[error("unknown package: {0}")]
    UnknownPackage(String),
    /// Underlying file system failure.
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl DocError {
    /// True when the error should surface as a 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::UnknownPackage(_) => true,
            Self::Vfs(e) => e.is_not_found(),
        }
    }
}
