//! Page resolution, layouts and template evaluation.
//!
//! A [`Site`] owns a read-only [`gw_vfs::Vfs`] of content and serves logical
//! URL paths from it: Markdown and HTML pages with front-matter, layered
//! layout templates, YAML data files, and the fixed template function set
//! content authors see. [`Site::respond`] is the whole request lifecycle
//! short of HTTP itself; the server crate maps [`SiteResponse`] onto status
//! codes and headers.

mod cache;
mod error;
mod frontmatter;
mod funcs;
mod layout;
mod page;
mod render;
mod site;

pub use error::SiteError;
pub use frontmatter::parse_frontmatter;
pub use layout::find_layout;
pub use page::Page;
pub use site::{Query, Site, SiteConfig, SiteResponse};
