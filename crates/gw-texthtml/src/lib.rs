//! Source-text HTML formatting.
//!
//! Renders source text to HTML with overlaid selection layers: tokenized
//! comments, a highlight layer (user regex or `// HL<tag>` markers), an
//! explicit byte selection, and identifier links. The layers are merged in
//! lock-step into class-tagged spans; the interior text is HTML-escaped.
//!
//! [`code`] implements the snippet extraction used by the `code`/`play`
//! template functions: line, range and `/regex/` selectors, `OMIT` line
//! dropping and common-indent stripping.

pub mod code;
mod format;

pub use format::{Config, NumberStyle, escape_html, format};
