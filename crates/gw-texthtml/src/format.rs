//! The selection-layer merger.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use gw_gosrc::{LinkSpan, LinkTarget, Span, comment_spans};
use regex::Regex;

/// Line numbering style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NumberStyle {
    /// `<span id="L7" class="ln">7</span>`: clickable line anchors.
    #[default]
    Standard,
    /// `<span class="ln">7</span>`: compact form for playground snippets.
    Compact,
}

/// Formatter configuration.
///
/// The zero value formats plain escaped text with no layers.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// First line number; 0 disables numbering.
    pub line: usize,
    /// Numbering style when `line >= 1`.
    pub number_style: NumberStyle,
    /// Tokenize the text as Go and mark comment spans.
    pub go_comments: bool,
    /// Snippet is playable (consumed by the snippet assembler, not here).
    pub playground: bool,
    /// Highlight regex; overrides the `// HL` marker convention.
    pub highlight: Option<String>,
    /// Active `// HL<tag>` marker tag ("" selects bare `// HL`).
    pub hl_marker: String,
    /// Explicit byte selection.
    pub selection: Option<Span>,
    /// Identifier layer: resolved link spans.
    pub links: Vec<LinkSpan>,
    /// `<span id="…"></span>` anchors to insert, by 0-based output line.
    pub field_anchors: Vec<(String, usize)>,
    /// Notes to append to output lines, by 0-based output line.
    pub field_notes: Vec<(usize, String)>,
}

/// Format `src` per the configuration.
#[must_use]
pub fn format(src: &str, cfg: &Config) -> String {
    // HL markers are always blanked out of the text; matching ones
    // contribute highlight spans.
    let (text, hl_spans) = strip_hl_markers(src, &cfg.hl_marker);

    let comments = if cfg.go_comments {
        comment_spans(&text)
    } else {
        Vec::new()
    };

    let highlights = match &cfg.highlight {
        Some(pattern) => match Regex::new(pattern) {
            Ok(re) => re
                .find_iter(&text)
                .map(|m| Span::new(m.start(), m.end()))
                .collect(),
            Err(_) => Vec::new(),
        },
        None => hl_spans,
    };

    let selections = cfg.selection.into_iter().collect::<Vec<_>>();

    let mut html = merge(&text, &comments, &highlights, &selections, &cfg.links);

    if !cfg.field_anchors.is_empty() {
        html = insert_anchors(&html, &cfg.field_anchors);
    }
    if !cfg.field_notes.is_empty() {
        html = append_notes(&html, &cfg.field_notes);
    }
    if cfg.line >= 1 {
        html = number_lines(&html, cfg.line, cfg.number_style);
    }
    html
}

/// Blank `// HL<tag>` line suffixes; collect highlight spans for lines whose
/// tag equals `marker`.
fn strip_hl_markers(src: &str, marker: &str) -> (String, Vec<Span>) {
    if !src.contains("// HL") {
        return (src.to_owned(), Vec::new());
    }

    let mut out = String::with_capacity(src.len());
    let mut spans = Vec::new();
    let mut offset = 0;

    for line in src.split_inclusive('\n') {
        let body = line.strip_suffix('\n').unwrap_or(line);
        let had_newline = body.len() != line.len();

        if let Some(pos) = body.rfind("// HL") {
            let tag = &body[pos + "// HL".len()..];
            let valid_tag = tag.chars().all(|c| c.is_ascii_alphanumeric());
            if valid_tag {
                if tag == marker {
                    // Highlight the code portion only, not the blank pad.
                    let code_end = body[..pos].trim_end().len();
                    spans.push(Span::new(offset, offset + code_end));
                }
                out.push_str(&body[..pos]);
                for _ in 0..body.len() - pos {
                    out.push(' ');
                }
                if had_newline {
                    out.push('\n');
                }
                offset += line.len();
                continue;
            }
        }
        out.push_str(line);
        offset += line.len();
    }
    (out, spans)
}

/// Merge the four layers into span-tagged HTML.
///
/// Every layer boundary (and every newline) is a segment boundary; each
/// segment is emitted with the classes of the layers active inside it, and
/// link open/close tags are placed at their exact boundaries.
fn merge(
    text: &str,
    comments: &[Span],
    highlights: &[Span],
    selections: &[Span],
    links: &[LinkSpan],
) -> String {
    let mut bounds = BTreeSet::new();
    bounds.insert(0);
    bounds.insert(text.len());
    for span in comments.iter().chain(highlights).chain(selections) {
        bounds.insert(span.start);
        bounds.insert(span.end);
    }
    let mut link_open: HashMap<usize, &LinkSpan> = HashMap::new();
    let mut link_close: BTreeSet<usize> = BTreeSet::new();
    for link in links {
        bounds.insert(link.span.start);
        bounds.insert(link.span.end);
        link_open.insert(link.span.start, link);
        link_close.insert(link.span.end);
    }
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            bounds.insert(i);
            bounds.insert(i + 1);
        }
    }

    let bounds: Vec<usize> = bounds.into_iter().collect();
    let mut out = String::with_capacity(text.len() * 2);

    for pair in bounds.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a >= text.len() {
            break;
        }
        let segment = &text[a..b];

        if let Some(link) = link_open.get(&a) {
            match &link.target {
                LinkTarget::Href(href) => {
                    let _ = write!(out, "<a href=\"{}\">", escape_html(href));
                }
                LinkTarget::Anchor(id) => {
                    let _ = write!(out, "<span id=\"{}\">", escape_html(id));
                }
            }
        }

        if segment == "\n" {
            out.push('\n');
        } else {
            let mut classes = Vec::new();
            if contains(selections, a) {
                classes.push("selection");
            }
            if contains(highlights, a) {
                classes.push("highlight");
            }
            if contains(comments, a) {
                classes.push("comment");
            }

            // Trim trailing spaces at end-of-line (blanked HL markers leave
            // them behind).
            let at_eol = b >= text.len() || text[b..].starts_with('\n');
            let visible = if at_eol {
                segment.trim_end_matches(' ')
            } else {
                segment
            };

            if visible.is_empty() {
                // Nothing to emit for this segment.
            } else if classes.is_empty() {
                out.push_str(&escape_html(visible));
            } else {
                let _ = write!(
                    out,
                    "<span class=\"{}\">{}</span>",
                    classes.join(" "),
                    escape_html(visible)
                );
            }
        }

        if link_close.contains(&b) {
            match link_open
                .values()
                .find(|l| l.span.end == b)
                .map(|l| &l.target)
            {
                Some(LinkTarget::Href(_)) => out.push_str("</a>"),
                Some(LinkTarget::Anchor(_)) => out.push_str("</span>"),
                None => {}
            }
        }
    }
    out
}

/// True when `pos` falls inside any span of a sorted-or-not span list.
fn contains(spans: &[Span], pos: usize) -> bool {
    spans.iter().any(|s| s.start <= pos && pos < s.end)
}

/// Insert `<span id="…"></span>` anchors at the start of the given lines.
fn insert_anchors(html: &str, anchors: &[(String, usize)]) -> String {
    let mut by_line: HashMap<usize, Vec<&str>> = HashMap::new();
    for (id, line) in anchors {
        by_line.entry(*line).or_default().push(id);
    }

    let mut out = String::with_capacity(html.len() + anchors.len() * 24);
    for (i, line) in html.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if let Some(ids) = by_line.get(&i) {
            for id in ids {
                let _ = write!(out, "<span id=\"{}\"></span>", escape_html(id));
            }
        }
        out.push_str(line);
    }
    out
}

/// Append version notes to lines: `; added in <note>` inside a trailing
/// comment span, or a bare `// <note>` when the line has no comment.
fn append_notes(html: &str, notes: &[(usize, String)]) -> String {
    let by_line: HashMap<usize, &str> = notes.iter().map(|(l, n)| (*l, n.as_str())).collect();

    let mut out = String::with_capacity(html.len() + notes.len() * 24);
    for (i, line) in html.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match by_line.get(&i) {
            None => out.push_str(line),
            Some(note) => {
                let commented = line.contains("class=\"comment\"") && line.ends_with("</span>");
                if commented {
                    let cut = line.len() - "</span>".len();
                    let _ = write!(out, "{}; added in {}</span>", &line[..cut], escape_html(note));
                } else if line.trim().is_empty() {
                    out.push_str(line);
                } else {
                    let _ = write!(out, "{} // {}", line, escape_html(note));
                }
            }
        }
    }
    out
}

/// Prefix each line with a line-number span.
fn number_lines(html: &str, start: usize, style: NumberStyle) -> String {
    let mut out = String::with_capacity(html.len() * 2);
    for (i, line) in html.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let n = start + i;
        match style {
            NumberStyle::Standard => {
                let _ = write!(out, "<span id=\"L{n}\" class=\"ln\">{n}</span>{line}");
            }
            NumberStyle::Compact => {
                let _ = write!(out, "<span class=\"ln\">{n}</span>{line}");
            }
        }
    }
    out
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_plain_text_escaped() {
        let html = format("a < b\n", &Config::default());
        assert_eq!(html, "a &lt; b\n");
    }

    #[test]
    fn test_comment_layer() {
        let cfg = Config {
            go_comments: true,
            ..Config::default()
        };
        let html = format("x := 1 // note\n", &cfg);
        assert!(
            html.contains(r#"<span class="comment">// note</span>"#),
            "{html}"
        );
        assert!(html.starts_with("x := 1 "), "{html}");
    }

    #[test]
    fn test_hl_marker_highlights_and_strips() {
        let cfg = Config {
            go_comments: true,
            hl_marker: String::new(),
            ..Config::default()
        };
        let html = format("a := 1 // HL\nb := 2\n", &cfg);
        assert!(!html.contains("HL"), "{html}");
        assert!(
            html.contains(r#"<span class="highlight">a := 1</span>"#),
            "{html}"
        );
        assert!(html.contains("b := 2"), "{html}");
    }

    #[test]
    fn test_hl_tag_must_match() {
        let cfg = Config {
            hl_marker: "xxx".to_owned(),
            ..Config::default()
        };
        let html = format("a := 1 // HLxxx\nb := 2 // HLyyy\n", &cfg);
        assert!(!html.contains("HL"), "{html}");
        assert!(html.contains(r#"<span class="highlight">a := 1</span>"#), "{html}");
        assert!(!html.contains(r#"<span class="highlight">b := 2</span>"#), "{html}");
    }

    #[test]
    fn test_highlight_regex() {
        let cfg = Config {
            highlight: Some("b+".to_owned()),
            ..Config::default()
        };
        let html = format("abba\n", &cfg);
        assert_eq!(html, "a<span class=\"highlight\">bb</span>a\n");
    }

    #[test]
    fn test_selection_layer_combines() {
        let cfg = Config {
            go_comments: true,
            selection: Some(Span::new(0, 14)),
            ..Config::default()
        };
        let html = format("x := 1 // note\n", &cfg);
        assert!(html.contains(r#"<span class="selection">x := 1 </span>"#), "{html}");
        assert!(
            html.contains(r#"<span class="selection comment">// note</span>"#),
            "{html}"
        );
    }

    #[test]
    fn test_link_layer() {
        let cfg = Config {
            links: vec![LinkSpan {
                span: Span::new(0, 3),
                target: LinkTarget::Href("/pkg/fmt/".to_owned()),
            }],
            ..Config::default()
        };
        let html = format("fmt.Println(x)\n", &cfg);
        assert!(html.starts_with(r#"<a href="/pkg/fmt/">fmt</a>"#), "{html}");
    }

    #[test]
    fn test_anchor_link() {
        let cfg = Config {
            links: vec![LinkSpan {
                span: Span::new(6, 11),
                target: LinkTarget::Anchor("Limit".to_owned()),
            }],
            ..Config::default()
        };
        let html = format("const Limit = 10\n", &cfg);
        assert!(html.contains(r#"<span id="Limit">Limit</span>"#), "{html}");
    }

    #[test]
    fn test_multiline_comment_split_per_line() {
        let cfg = Config {
            go_comments: true,
            ..Config::default()
        };
        let html = format("/* a\nb */\n", &cfg);
        assert_eq!(
            html,
            "<span class=\"comment\">/* a</span>\n<span class=\"comment\">b */</span>\n"
        );
    }

    #[test]
    fn test_line_numbering_standard() {
        let cfg = Config {
            line: 5,
            ..Config::default()
        };
        let html = format("a\nb", &cfg);
        assert_eq!(
            html,
            "<span id=\"L5\" class=\"ln\">5</span>a\n<span id=\"L6\" class=\"ln\">6</span>b"
        );
    }

    #[test]
    fn test_line_numbering_compact() {
        let cfg = Config {
            line: 1,
            number_style: NumberStyle::Compact,
            ..Config::default()
        };
        let html = format("a", &cfg);
        assert_eq!(html, "<span class=\"ln\">1</span>a");
    }

    #[test]
    fn test_trailing_spaces_trimmed() {
        let html = format("x   \ny\n", &Config::default());
        assert_eq!(html, "x\ny\n");
    }

    #[test]
    fn test_field_anchor_insertion() {
        let cfg = Config {
            field_anchors: vec![("T.Addr".to_owned(), 1)],
            ..Config::default()
        };
        let html = format("type T struct {\n\tAddr string\n}\n", &cfg);
        let line2 = html.split('\n').nth(1).unwrap();
        assert!(line2.starts_with(r#"<span id="T.Addr"></span>"#), "{line2}");
    }

    #[test]
    fn test_field_note_on_bare_line() {
        let cfg = Config {
            field_notes: vec![(1, "Go 1.12".to_owned())],
            ..Config::default()
        };
        let html = format("type T struct {\n\tF int\n}\n", &cfg);
        let line2 = html.split('\n').nth(1).unwrap();
        assert!(line2.ends_with("// Go 1.12"), "{line2}");
    }

    #[test]
    fn test_field_note_merges_into_comment() {
        let cfg = Config {
            go_comments: true,
            field_notes: vec![(1, "Go 1.12".to_owned())],
            ..Config::default()
        };
        let html = format("type T struct {\n\tF int // frob count\n}\n", &cfg);
        let line2 = html.split('\n').nth(1).unwrap();
        assert!(
            line2.ends_with("// frob count; added in Go 1.12</span>"),
            "{line2}"
        );
    }

    #[test]
    fn test_hl_marker_never_in_output() {
        let cfg = Config {
            go_comments: true,
            hl_marker: "tag".to_owned(),
            ..Config::default()
        };
        let src = "a := 1 // HLtag\nb := 2 // HL\nc := 3 // HLother\n";
        let html = format(src, &cfg);
        assert!(!html.contains("// HL"), "{html}");
    }
}
