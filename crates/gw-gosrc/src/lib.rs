//! Go source scanning and declaration parsing.
//!
//! The site engine needs just enough Go understanding to format source as
//! HTML and to build package documentation pages: token classes for comment
//! spans, top-level declarations with doc comments and struct fields,
//! import tables for identifier linking, and build-constraint evaluation for
//! per-target file selection.
//!
//! This is deliberately not a full parser. Function bodies are skipped as
//! balanced-brace blobs; expressions are never analyzed. Anything the doc
//! renderer does not consume is not modeled.

mod build;
mod doc;
mod links;
mod parse;
mod scan;

pub use build::{BuildContext, has_build_tag, matches_context};
pub use doc::{ExampleName, bug_notes, example_name, synopsis};
pub use links::{LinkSpan, LinkTarget, PackageScope, link_spans};
pub use parse::{
    Decl, DeclKind, GoFile, Import, LineIndex, ParseError, StructField, comment_text, parse_file,
};
pub use scan::{Span, Token, TokenKind, comment_spans, tokenize};
