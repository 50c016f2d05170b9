//! Site error type.

use gw_vfs::VfsError;

/// Errors surfaced while resolving or rendering a page.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// No page or file backs the requested path.
    #[error("page not found: {0}")]
    NotFound(String),
    /// A named layout template does not exist.
    #[error("layout not found: {0}")]
    LayoutNotFound(String),
    /// Template parse or render failure.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    /// Underlying file system failure.
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

impl SiteError {
    /// True when the error maps to a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::LayoutNotFound(_) => true,
            Self::Vfs(e) => e.is_not_found(),
            Self::Template(_) => false,
        }
    }
}
