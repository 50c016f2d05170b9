//! Event-level rendering pipeline.
//!
//! Parsing happens once; two passes over the event stream assign heading IDs
//! and rewrite links before the HTML is pushed out.

use std::collections::HashMap;
use std::sync::LazyLock;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::tabs::expand_tabs;

/// Bare URLs recognized by the auto-linker. Only `http` and `https`;
/// e-mail addresses are deliberately never linked.
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"]+"#).unwrap());

/// Render a Markdown document to HTML.
#[must_use]
pub fn to_html(input: &str) -> String {
    let text = expand_tabs(input);
    let events: Vec<Event<'_>> = Parser::new_ext(&text, options()).collect();
    let events = assign_heading_ids(events);
    let events = rewrite_links(events);

    let mut html = String::with_capacity(text.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    html
}

/// Render a Markdown fragment, unwrapping a lone outer paragraph.
///
/// Inline uses (template-generated link text, synopsis cells) need inline
/// HTML; a single `<p>…</p>` wrapper is removed, anything else is returned
/// unchanged.
#[must_use]
pub fn fragment(input: &str) -> String {
    let html = to_html(input);
    let trimmed = html.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
    {
        if !inner.contains("<p>") {
            return inner.to_owned();
        }
    }
    html
}

/// Parser options: heading attributes, typographer substitutions and
/// definition lists. Raw inline HTML is always allowed by the parser.
fn options() -> Options {
    Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_DEFINITION_LIST
}

/// Give every heading an anchor ID.
///
/// Explicit `{#id}` attributes are kept; generated IDs are slugs of the
/// heading text, de-duplicated with a `-N` suffix.
fn assign_heading_ids(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut used: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();

    while let Some(ev) = iter.next() {
        let Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs,
        }) = ev
        else {
            out.push(ev);
            continue;
        };

        // Buffer the heading body so its text can seed the slug.
        let mut inner = Vec::new();
        let mut text = String::new();
        for ev in iter.by_ref() {
            let done = matches!(ev, Event::End(TagEnd::Heading(_)));
            if let Event::Text(t) | Event::Code(t) = &ev {
                text.push_str(t);
            }
            inner.push(ev);
            if done {
                break;
            }
        }

        let id = match id {
            Some(explicit) => {
                used.entry(explicit.to_string()).or_insert(1);
                Some(explicit)
            }
            None => Some(CowStr::from(unique_id(&mut used, &slugify(&text)))),
        };
        out.push(Event::Start(Tag::Heading {
            level,
            id,
            classes,
            attrs,
        }));
        out.append(&mut inner);
    }
    out
}

/// Allocate a unique ID from a base slug.
fn unique_id(used: &mut HashMap<String, usize>, base: &str) -> String {
    let base = if base.is_empty() { "heading" } else { base };
    let count = used.entry(base.to_owned()).or_default();
    let id = match *count {
        0 => base.to_owned(),
        n => format!("{base}-{n}"),
    };
    *count += 1;
    id
}

/// Rewrite links: absolute `http(s)` destinations get
/// `rel="noreferrer" target="_blank"`, and bare URLs in prose become links.
fn rewrite_links(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut in_code = 0usize;
    let mut in_link = 0usize;
    let mut replaced = Vec::new();

    for ev in events {
        match ev {
            Event::Start(Tag::CodeBlock(kind)) => {
                in_code += 1;
                out.push(Event::Start(Tag::CodeBlock(kind)));
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code = in_code.saturating_sub(1);
                out.push(Event::End(TagEnd::CodeBlock));
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) => {
                in_link += 1;
                if is_external(&dest_url) {
                    replaced.push(true);
                    out.push(Event::Html(CowStr::from(external_anchor(&dest_url, &title))));
                } else {
                    replaced.push(false);
                    out.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url,
                        title,
                        id,
                    }));
                }
            }
            Event::End(TagEnd::Link) => {
                in_link = in_link.saturating_sub(1);
                if replaced.pop().unwrap_or(false) {
                    out.push(Event::Html(CowStr::from("</a>")));
                } else {
                    out.push(Event::End(TagEnd::Link));
                }
            }
            Event::Text(t) if in_code == 0 && in_link == 0 && URL_RE.is_match(&t) => {
                linkify_into(&t, &mut out);
            }
            other => out.push(other),
        }
    }
    out
}

/// True for destinations the new-window/noreferrer policy applies to.
fn is_external(dest: &str) -> bool {
    dest.starts_with("http://") || dest.starts_with("https://")
}

/// Opening `<a>` tag for an external destination.
fn external_anchor(dest: &str, title: &str) -> String {
    let mut tag = format!("<a href=\"{}\"", escape_html(dest));
    if !title.is_empty() {
        tag.push_str(&format!(" title=\"{}\"", escape_html(title)));
    }
    tag.push_str(" rel=\"noreferrer\" target=\"_blank\">");
    tag
}

/// Split a text run around bare URLs, linking each one.
fn linkify_into(text: &str, out: &mut Vec<Event<'_>>) {
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        let url = trim_url(m.as_str());
        if url.is_empty() {
            continue;
        }
        if m.start() > last {
            out.push(Event::Text(CowStr::from(text[last..m.start()].to_owned())));
        }
        out.push(Event::Html(CowStr::from(external_anchor(url, ""))));
        out.push(Event::Text(CowStr::from(url.to_owned())));
        out.push(Event::Html(CowStr::from("</a>")));
        last = m.start() + url.len();
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_owned())));
    }
}

/// Strip trailing punctuation that prose attaches to a URL.
fn trim_url(url: &str) -> &str {
    let mut end = url.len();
    while let Some(c) = url[..end].chars().next_back() {
        match c {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' => end -= c.len_utf8(),
            ')' if !url[..end].contains('(') => end -= 1,
            _ => break,
        }
    }
    &url[..end]
}

/// Convert text to a URL-safe slug.
///
/// Lowercases ASCII alphanumerics, collapses whitespace/dashes/underscores
/// into single dashes, drops everything else.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }
    if result.ends_with('-') {
        result.pop();
    }
    result
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
