//! Identifier link resolution for formatted source.
//!
//! Walks the token stream of a declaration and decides, per identifier,
//! whether it links somewhere: qualified `pkg.X` references link into the
//! other package's doc page, exported package-level names link to their
//! anchor on the current page, and the names a value declaration defines
//! become anchors themselves.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::parse::Import;
use crate::scan::{Span, TokenKind, tokenize};

/// Where an identifier points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkTarget {
    /// Wrap the span in `<a href="…">`.
    Href(String),
    /// Emit a `<span id="…">` definition anchor around the span.
    Anchor(String),
}

/// One resolved identifier, with its span relative to the formatted region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSpan {
    pub span: Span,
    pub target: LinkTarget,
}

/// Names declared at package level across all files of a package.
#[derive(Clone, Debug, Default)]
pub struct PackageScope {
    names: HashSet<String>,
}

impl PackageScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declared name.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// True when `name` is declared at package level.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Compute link spans for the `region` slice of `src`.
///
/// `defs` carries the byte offsets of names the region itself defines (value
/// declarations); those become anchors. Spans in the result are relative to
/// `region.start`, ready for the formatter.
#[must_use]
pub fn link_spans(
    src: &str,
    imports: &[Import],
    scope: &PackageScope,
    region: Span,
    defs: &[(String, usize)],
) -> Vec<LinkSpan> {
    let import_paths: HashMap<&str, &str> = imports
        .iter()
        .filter_map(|i| i.local_name().map(|n| (n, i.path.as_str())))
        .collect();
    let def_offsets: HashMap<usize, &str> =
        defs.iter().map(|(name, off)| (*off, name.as_str())).collect();

    let toks: Vec<_> = tokenize(src)
        .into_iter()
        .filter(|t| t.span.start >= region.start && t.span.end <= region.end)
        .filter(|t| !matches!(t.kind, TokenKind::Comment))
        .collect();

    let mut out = Vec::new();
    let mut i = 0;
    while i < toks.len() {
        let t = toks[i];
        if t.kind != TokenKind::Ident {
            i += 1;
            continue;
        }
        let name = &src[t.span.start..t.span.end];
        let rel = Span::new(t.span.start - region.start, t.span.end - region.start);

        // A name this declaration defines: anchor, never a link.
        if let Some(def) = def_offsets.get(&t.span.start) {
            out.push(LinkSpan {
                span: rel,
                target: LinkTarget::Anchor((*def).to_owned()),
            });
            i += 1;
            continue;
        }

        // Qualified reference `pkg.Sel`: two links.
        let dotted = toks.get(i + 1).is_some_and(|d| {
            d.kind == TokenKind::Punct && &src[d.span.start..d.span.end] == "."
        });
        if dotted {
            if let (Some(path), Some(sel)) = (import_paths.get(name), toks.get(i + 2)) {
                if sel.kind == TokenKind::Ident {
                    let sel_name = &src[sel.span.start..sel.span.end];
                    out.push(LinkSpan {
                        span: rel,
                        target: LinkTarget::Href(format!("/pkg/{path}/")),
                    });
                    out.push(LinkSpan {
                        span: Span::new(
                            sel.span.start - region.start,
                            sel.span.end - region.start,
                        ),
                        target: LinkTarget::Href(format!("/pkg/{path}/#{sel_name}")),
                    });
                    i += 3;
                    continue;
                }
            }
            // Unknown qualifier: skip the whole selector expression.
            i += 2;
            continue;
        }

        // Exported package-level name: same-page anchor link.
        if is_exported(name) && scope.contains(name) {
            out.push(LinkSpan {
                span: rel,
                target: LinkTarget::Href(format!("#{name}")),
            });
        }
        i += 1;
    }
    out
}
