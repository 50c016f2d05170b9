//! Markdown rendering for the goweb site engine.
//!
//! Wraps pulldown-cmark with the site's house rules:
//! - tabs are expanded to 4-column stops before parsing
//! - headings get stable, de-duplicated anchor IDs
//! - bare `http://`/`https://` URLs in prose are auto-linked (never e-mail)
//! - every absolute `http(s)` link gets `rel="noreferrer" target="_blank"`
//! - raw inline HTML passes through (several documents rely on HTML tables)
//!
//! [`to_html`] renders a whole document; [`fragment`] renders an inline
//! snippet, unwrapping the outer paragraph when the result is exactly one.

mod render;
mod tabs;

pub use render::{escape_html, fragment, slugify, to_html};
pub use tabs::expand_tabs;
