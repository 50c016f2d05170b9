//! Declaration rendering through the source-text formatter.

use gw_gosrc::{Decl, DeclKind, GoFile, LineIndex, PackageScope, link_spans};
use gw_texthtml::{Config, format};

use crate::apidb::ApiDb;

/// Render one declaration to HTML.
///
/// The identifier layer is always on; struct types additionally get field
/// anchors and, where the API database knows better, per-field version
/// notes (only when the field arrived later than its type).
pub(crate) fn render_decl(
    src: &str,
    file: &GoFile,
    scope: &PackageScope,
    decl: &Decl,
    import_path: &str,
    apidb: &ApiDb,
) -> String {
    let links = link_spans(src, &file.imports, scope, decl.span, &decl.name_offsets);

    let mut field_anchors = Vec::new();
    let mut field_notes = Vec::new();
    if decl.kind == DeclKind::Type && !decl.fields.is_empty() {
        let lines = LineIndex::new(src);
        let base_line = lines.line_of(decl.span.start);
        let type_since = apidb.since(import_path, "type", "", &decl.name);

        for field in &decl.fields {
            for name in &field.names {
                let anchor_offset = field.doc_span.map_or(field.span.start, |d| d.start);
                field_anchors.push((
                    format!("{}.{}", decl.name, name),
                    lines.line_of(anchor_offset) - base_line,
                ));

                if let Some(since) = apidb.since(import_path, "field", &decl.name, name) {
                    if Some(since) != type_since {
                        field_notes.push((
                            lines.line_of(field.span.start) - base_line,
                            format!("Go {since}"),
                        ));
                    }
                }
            }
        }
    }

    let cfg = Config {
        go_comments: true,
        links,
        field_anchors,
        field_notes,
        ..Config::default()
    };
    format(&src[decl.span.start..decl.span.end], &cfg)
}

/// Render an example function: the whole declaration, comments marked.
pub(crate) fn render_example(src: &str, decl: &Decl) -> String {
    let cfg = Config {
        go_comments: true,
        ..Config::default()
    };
    format(&src[decl.span.start..decl.span.end], &cfg)
}
