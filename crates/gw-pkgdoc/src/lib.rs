//! Package documentation pages.
//!
//! Builds the doc view of a Go package directory: the filtered directory
//! tree with synopses, the API database that annotates struct fields with
//! the release they appeared in, and the [`DocPage`] model that the site's
//! templates render.

mod apidb;
mod error;
mod page;
mod render;
mod tree;

pub use apidb::ApiDb;
pub use error::DocError;
pub use page::{DocItem, DocPage, DocRenderer, Example, Mode, SubDir};
pub use tree::{DirNode, build_tree, subdirs};
