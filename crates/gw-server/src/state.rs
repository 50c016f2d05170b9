//! Shared application state.

use gw_pkgdoc::DocRenderer;
use gw_site::Site;

/// State shared by all handlers.
pub(crate) struct AppState {
    /// The content site.
    pub site: Site,
    /// Package documentation renderer (`None` when no Go root is
    /// configured).
    pub docs: Option<DocRenderer>,
}
