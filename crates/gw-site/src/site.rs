//! The site: page loading and request dispatch.

use std::sync::Arc;

use minijinja::Value;

use gw_gosrc::Span;
use gw_pkgdoc::{DocItem, DocPage, Example, SubDir};
use gw_texthtml::{Config, escape_html, format};
use gw_vfs::{Vfs, check_path, file_ext};

use crate::cache::{FileStamp, PageCache};
use crate::error::SiteError;
use crate::frontmatter::parse_frontmatter;
use crate::page::Page;
use crate::render::{render_layout, render_page};

/// Site configuration: the layout names used for the synthetic pages.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Layout for error pages.
    pub error_layout: String,
    /// Layout for directory listings.
    pub dirlist_layout: String,
    /// Layout for rendered source files.
    pub source_layout: String,
    /// Layout for package documentation pages.
    pub package_layout: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            error_layout: "error".to_owned(),
            dirlist_layout: "dirlist".to_owned(),
            source_layout: "source".to_owned(),
            package_layout: "package".to_owned(),
        }
    }
}

/// Query parameters the content dispatcher understands.
#[derive(Clone, Debug, Default)]
pub struct Query {
    /// `m=text`: raw text instead of a rendered source view.
    pub text: bool,
    /// `h=<re>`: highlight regex for source views.
    pub highlight: Option<String>,
    /// `s=lo:hi`: byte-offset selection (half-open).
    pub selection: Option<(usize, usize)>,
}

/// The outcome of a dispatch, one step short of HTTP.
#[derive(Debug)]
pub enum SiteResponse {
    /// 200 with an HTML body.
    Html(String),
    /// 301 to the given location.
    Redirect(String),
    /// 200 with a plain-text body.
    Text(String),
    /// 200 with a verbatim file body.
    Raw {
        content: Vec<u8>,
        content_type: &'static str,
    },
    /// 404 with the error-page body.
    NotFound(String),
    /// 404 with the error-page body (render or I/O failure; the default
    /// template deliberately does not distinguish).
    Error(String),
}

/// Shared site state: the content VFS and the page cache.
pub(crate) struct SiteInner {
    vfs: Arc<dyn Vfs>,
    cache: PageCache,
}

impl SiteInner {
    pub(crate) fn vfs(&self) -> &dyn Vfs {
        self.vfs.as_ref()
    }

    pub(crate) fn vfs_arc(&self) -> &Arc<dyn Vfs> {
        &self.vfs
    }

    /// Load the page for a logical path, through the cache.
    ///
    /// Returns the shared page snapshot and its canonical URL (the
    /// `redirect` front-matter value when set, the computed URL otherwise).
    pub(crate) fn load_page(&self, logical: &str) -> Result<(Arc<Page>, String), SiteError> {
        let norm = normalize(logical);
        check_path(&norm).map_err(|_| SiteError::NotFound(logical.to_owned()))?;

        if let Some(hit) = self.cache.get(&norm, self.vfs()) {
            return Ok(hit);
        }

        let (probe, info) = probes(&norm)
            .into_iter()
            .find_map(|p| {
                let info = self.vfs.stat(&p).ok().filter(|i| !i.is_dir)?;
                Some((p, info))
            })
            .ok_or_else(|| SiteError::NotFound(logical.to_owned()))?;

        let raw = self.vfs.read_to_string(&probe)?;
        let (meta, body) = parse_frontmatter(&raw);

        let url = if probe == "index.md" || probe == "index.html" {
            "/".to_owned()
        } else if probe.ends_with("/index.md") || probe.ends_with("/index.html") {
            format!("/{norm}/")
        } else {
            let stem = probe
                .strip_suffix(".md")
                .or_else(|| probe.strip_suffix(".html"))
                .unwrap_or(&probe);
            format!("/{stem}")
        };

        let page = Arc::new(Page::new(meta, url, probe, body));
        let canonical = page.redirect().unwrap_or(page.url()).to_owned();
        self.cache.insert(
            &norm,
            Arc::clone(&page),
            canonical.clone(),
            FileStamp {
                size: info.size,
                mtime: info.mtime,
            },
        );
        Ok((page, canonical))
    }
}

/// A content site over a read-only file system.
pub struct Site {
    inner: Arc<SiteInner>,
    config: SiteConfig,
}

impl Site {
    /// Create a site serving from `vfs`.
    #[must_use]
    pub fn new(vfs: Arc<dyn Vfs>, config: SiteConfig) -> Self {
        Self {
            inner: Arc::new(SiteInner {
                vfs,
                cache: PageCache::default(),
            }),
            config,
        }
    }

    /// Load a page by logical path (exposed for tests and the server).
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::NotFound`] when no backing file exists.
    pub fn page(&self, logical: &str) -> Result<Arc<Page>, SiteError> {
        self.inner.load_page(logical).map(|(page, _)| page)
    }

    /// Dispatch one request path.
    pub fn respond(&self, path: &str, query: &Query) -> SiteResponse {
        // /index.html always redirects to the bare directory form.
        if let Some(stripped) = path.strip_suffix("/index.html") {
            return SiteResponse::Redirect(format!("{stripped}/"));
        }

        let clean = clean_path(path);
        let rel = match clean.trim_matches('/') {
            "" => ".",
            rel => rel,
        };

        match self.inner.load_page(rel) {
            Ok((page, canonical)) => {
                if canonical != clean {
                    return SiteResponse::Redirect(canonical);
                }
                return match render_page(&self.inner, &page, &clean) {
                    Ok(html) => SiteResponse::Html(html),
                    Err(e) => self.error_response(&clean, &e),
                };
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return self.error_response(&clean, &e),
        }

        match self.inner.vfs.stat(rel) {
            Ok(info) if info.is_dir => self.dir_listing(rel, &clean),
            Ok(_) => {
                // A stat-able file requested with a trailing slash redirects
                // to the trimmed form.
                if clean.len() > 1 && clean.ends_with('/') {
                    return SiteResponse::Redirect(clean.trim_end_matches('/').to_owned());
                }
                self.serve_file(rel, &clean, query)
            }
            Err(e) if e.is_not_found() => {
                self.error_response(&clean, &SiteError::NotFound(clean.clone()))
            }
            Err(e) => self.error_response(&clean, &SiteError::Vfs(e)),
        }
    }

    /// Serve a non-page file: raw text, source view, or verbatim bytes.
    fn serve_file(&self, rel: &str, clean: &str, query: &Query) -> SiteResponse {
        let content = match self.inner.vfs.read(rel) {
            Ok(c) => c,
            Err(e) => return self.error_response(clean, &SiteError::Vfs(e)),
        };

        if is_text_view(rel, &content) {
            let text = String::from_utf8_lossy(&content).into_owned();
            if query.text {
                return SiteResponse::Text(text);
            }
            return self.source_view(rel, clean, &text, query);
        }

        if query.text {
            return SiteResponse::Text(String::from_utf8_lossy(&content).into_owned());
        }
        SiteResponse::Raw {
            content,
            content_type: content_type(rel),
        }
    }

    /// Rendered source view with highlight and selection layers.
    fn source_view(&self, rel: &str, clean: &str, text: &str, query: &Query) -> SiteResponse {
        let cfg = Config {
            line: 1,
            go_comments: file_ext(rel) == Some("go"),
            highlight: query.highlight.clone(),
            selection: query.selection.map(|(lo, hi)| Span::new(lo, hi)),
            ..Config::default()
        };
        let body = format!("<pre class=\"source\">{}</pre>", format(text, &cfg));

        let ctx = Value::from_iter([
            ("title".to_owned(), Value::from(clean)),
            ("content".to_owned(), Value::from_safe_string(body.clone())),
        ]);
        match render_layout(&self.inner, &self.config.source_layout, ctx, clean) {
            Ok(Some(html)) => SiteResponse::Html(html),
            Ok(None) => SiteResponse::Html(bare_page(clean, &body)),
            Err(e) => self.error_response(clean, &e),
        }
    }

    /// Directory listing page, directories first.
    fn dir_listing(&self, rel: &str, clean: &str) -> SiteResponse {
        let mut entries = match self.inner.vfs.read_dir(rel) {
            Ok(entries) => entries,
            Err(e) => return self.error_response(clean, &SiteError::Vfs(e)),
        };
        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));

        let base = if clean.ends_with('/') {
            clean.to_owned()
        } else {
            format!("{clean}/")
        };
        let items: Vec<Value> = entries
            .iter()
            .map(|e| {
                Value::from_iter([
                    ("name".to_owned(), Value::from(e.name.clone())),
                    ("is_dir".to_owned(), Value::from(e.is_dir)),
                    ("url".to_owned(), Value::from(format!("{base}{}", e.name))),
                ])
            })
            .collect();
        let ctx = Value::from_iter([
            ("title".to_owned(), Value::from(clean)),
            ("entries".to_owned(), Value::from(items)),
        ]);

        match render_layout(&self.inner, &self.config.dirlist_layout, ctx, clean) {
            Ok(Some(html)) => SiteResponse::Html(html),
            Ok(None) => {
                let mut body = format!("<h1>{}</h1>\n<ul>\n", escape_html(clean));
                for e in &entries {
                    let slash = if e.is_dir { "/" } else { "" };
                    body.push_str(&format!(
                        "<li><a href=\"{base}{0}{slash}\">{0}{slash}</a></li>\n",
                        escape_html(&e.name)
                    ));
                }
                body.push_str("</ul>\n");
                SiteResponse::Html(bare_page(clean, &body))
            }
            Err(e) => self.error_response(clean, &e),
        }
    }

    /// Render a package documentation page through the template engine.
    ///
    /// # Errors
    ///
    /// Returns template errors; a missing `package` layout falls back to
    /// builtin markup and never fails.
    pub fn render_doc_page(&self, doc: &DocPage, request_path: &str) -> Result<String, SiteError> {
        let ctx = doc_page_context(doc);
        match render_layout(&self.inner, &self.config.package_layout, ctx, request_path)? {
            Some(html) => Ok(html),
            None => Ok(bare_page(request_path, &builtin_doc_html(doc))),
        }
    }

    /// The error page for a path that does not resolve. The doc handlers
    /// use this for unknown packages.
    #[must_use]
    pub fn not_found_page(&self, path: &str) -> String {
        self.error_html(path, &SiteError::NotFound(path.to_owned()))
    }

    /// The error page: rendered via the error layout when present. The
    /// response is always a 404; the engine does not distinguish
    /// not-found from render failure in the default template.
    fn error_response(&self, path: &str, err: &SiteError) -> SiteResponse {
        if !err.is_not_found() {
            tracing::error!(path = %path, error = %err, "request failed");
        }
        let html = self.error_html(path, err);
        if err.is_not_found() {
            SiteResponse::NotFound(html)
        } else {
            SiteResponse::Error(html)
        }
    }

    fn error_html(&self, path: &str, err: &SiteError) -> String {
        let ctx = Value::from_iter([
            ("title".to_owned(), Value::from(path)),
            ("error".to_owned(), Value::from(err.to_string())),
        ]);
        match render_layout(&self.inner, &self.config.error_layout, ctx, path) {
            Ok(Some(html)) => html,
            _ => bare_page(
                path,
                &format!(
                    "<h1>{}</h1>\n<p>{}</p>\n",
                    escape_html(path),
                    escape_html(&err.to_string())
                ),
            ),
        }
    }
}

/// Minimal page shell for responses with no layout template.
fn bare_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>{}</title></head>\n<body>\n{body}\n</body></html>\n",
        escape_html(title)
    )
}

/// Normalize a logical path to the cache key form: no leading/trailing
/// slashes, no `index.md`/`index.html` suffix, `"."` for the root.
fn normalize(logical: &str) -> String {
    let mut p = logical.trim_matches('/');
    for suffix in ["index.md", "index.html"] {
        if p == suffix {
            p = "";
        } else if let Some(s) = p.strip_suffix(suffix) {
            // Only a whole path element counts as an index file.
            if s.ends_with('/') {
                p = s.trim_end_matches('/');
            }
        }
    }
    if p.is_empty() {
        ".".to_owned()
    } else {
        p.to_owned()
    }
}

/// The four file probes for a logical path, in resolution order.
fn probes(norm: &str) -> Vec<String> {
    if norm == "." {
        return vec!["index.md".to_owned(), "index.html".to_owned()];
    }
    vec![
        format!("{norm}.md"),
        format!("{norm}.html"),
        format!("{norm}/index.md"),
        format!("{norm}/index.html"),
    ]
}

/// Clean a URL path: collapse empty and dot segments, keep one leading
/// slash, preserve a trailing slash.
fn clean_path(path: &str) -> String {
    let trailing = path.len() > 1 && path.ends_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            seg => parts.push(seg),
        }
    }
    let mut out = format!("/{}", parts.join("/"));
    if trailing && out != "/" {
        out.push('/');
    }
    out
}

/// Extensions always served as static files, never as a source view.
const RAW_EXTENSIONS: &[&str] = &["css", "js", "svg", "ts"];

/// Extensions recognized as text without sniffing.
const TEXT_EXTENSIONS: &[&str] = &[
    "go", "txt", "text", "mod", "sum", "s", "c", "h", "sh", "bash", "py", "xml", "json",
    "yaml", "yml", "tmpl",
];

/// Decide whether a file gets the rendered source view.
fn is_text_view(rel: &str, content: &[u8]) -> bool {
    if rel == "robots.txt" || rel.starts_with("doc/play/") {
        return false;
    }
    let ext = file_ext(rel).unwrap_or_default();
    if RAW_EXTENSIONS.contains(&ext) {
        return false;
    }
    if TEXT_EXTENSIONS.contains(&ext) {
        return true;
    }
    utf8_text_sniff(content)
}

/// Sniff the first 1024 bytes: valid UTF-8 (a trailing partial sequence is
/// fine) with no control bytes other than whitespace.
fn utf8_text_sniff(content: &[u8]) -> bool {
    let head = &content[..content.len().min(1024)];
    let text = match std::str::from_utf8(head) {
        Ok(t) => t,
        Err(e) if e.valid_up_to() + 4 >= head.len() && head.len() == 1024 => {
            // A multi-byte sequence cut by the window.
            std::str::from_utf8(&head[..e.valid_up_to()]).unwrap_or("")
        }
        Err(_) => return false,
    };
    !text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c'))
}

/// Content type by extension for static serving.
fn content_type(rel: &str) -> &'static str {
    match file_ext(rel).unwrap_or_default() {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "ts" => "text/javascript; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Template context for a package doc page, declaration HTML pre-marked
/// safe.
fn doc_page_context(doc: &DocPage) -> Value {
    fn example_value(e: &Example) -> Value {
        Value::from_iter([
            ("name".to_owned(), Value::from(e.name.clone())),
            ("label".to_owned(), Value::from(e.label.clone())),
            ("doc".to_owned(), Value::from(e.doc.clone())),
            ("code".to_owned(), Value::from_safe_string(e.code_html.clone())),
        ])
    }

    fn item_value(item: &DocItem) -> Value {
        Value::from_iter([
            ("name".to_owned(), Value::from(item.name.clone())),
            ("names".to_owned(), Value::from(item.names.clone())),
            ("doc".to_owned(), Value::from(item.doc.clone())),
            (
                "decl".to_owned(),
                Value::from_safe_string(format!("<pre>{}</pre>", item.decl_html)),
            ),
            (
                "methods".to_owned(),
                Value::from(item.methods.iter().map(item_value).collect::<Vec<_>>()),
            ),
            (
                "examples".to_owned(),
                Value::from(item.examples.iter().map(example_value).collect::<Vec<_>>()),
            ),
        ])
    }

    fn subdir_value(s: &SubDir) -> Value {
        Value::from_iter([
            ("name".to_owned(), Value::from(s.name.clone())),
            ("path".to_owned(), Value::from(s.path.clone())),
            ("synopsis".to_owned(), Value::from(s.synopsis.clone())),
            ("has_pkg".to_owned(), Value::from(s.has_pkg)),
        ])
    }

    Value::from_iter([
        ("import_path".to_owned(), Value::from(doc.import_path.clone())),
        ("package_name".to_owned(), Value::from(doc.package_name.clone())),
        ("is_command".to_owned(), Value::from(doc.is_command)),
        ("doc".to_owned(), Value::from(doc.doc.clone())),
        ("bugs".to_owned(), Value::from(doc.bugs.clone())),
        ("goos".to_owned(), Value::from(doc.goos.clone())),
        ("goarch".to_owned(), Value::from(doc.goarch.clone())),
        (
            "consts".to_owned(),
            Value::from(doc.consts.iter().map(item_value).collect::<Vec<_>>()),
        ),
        (
            "vars".to_owned(),
            Value::from(doc.vars.iter().map(item_value).collect::<Vec<_>>()),
        ),
        (
            "funcs".to_owned(),
            Value::from(doc.funcs.iter().map(item_value).collect::<Vec<_>>()),
        ),
        (
            "types".to_owned(),
            Value::from(doc.types.iter().map(item_value).collect::<Vec<_>>()),
        ),
        (
            "examples".to_owned(),
            Value::from(doc.examples.iter().map(example_value).collect::<Vec<_>>()),
        ),
        (
            "subdirs".to_owned(),
            Value::from(doc.subdirs.iter().map(subdir_value).collect::<Vec<_>>()),
        ),
    ])
}

/// Builtin fallback markup for doc pages when no `package` layout exists.
fn builtin_doc_html(doc: &DocPage) -> String {
    let mut out = String::new();
    let title = if doc.is_command {
        format!("Command {}", doc.import_path)
    } else if doc.package_name.is_empty() {
        format!("Directory {}", doc.import_path)
    } else {
        format!("Package {}", doc.package_name)
    };
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&title)));
    if !doc.doc.is_empty() {
        out.push_str(&format!("<p>{}</p>\n", escape_html(&doc.doc)));
    }

    for (heading, items) in [
        ("Constants", &doc.consts),
        ("Variables", &doc.vars),
        ("Functions", &doc.funcs),
        ("Types", &doc.types),
    ] {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("<h2>{heading}</h2>\n"));
        for item in items {
            if !item.name.is_empty() {
                out.push_str(&format!("<h3 id=\"{0}\">{0}</h3>\n", escape_html(&item.name)));
            }
            out.push_str(&format!("<pre>{}</pre>\n", item.decl_html));
            if !item.doc.is_empty() {
                out.push_str(&format!("<p>{}</p>\n", escape_html(&item.doc)));
            }
            for m in &item.methods {
                out.push_str(&format!(
                    "<h4 id=\"{0}.{1}\">func ({0}) {1}</h4>\n",
                    escape_html(&item.name),
                    escape_html(&m.name)
                ));
                out.push_str(&format!("<pre>{}</pre>\n", m.decl_html));
                if !m.doc.is_empty() {
                    out.push_str(&format!("<p>{}</p>\n", escape_html(&m.doc)));
                }
            }
        }
    }

    if !doc.bugs.is_empty() {
        out.push_str("<h2>Bugs</h2>\n<ul>\n");
        for bug in &doc.bugs {
            out.push_str(&format!("<li>{}</li>\n", escape_html(bug)));
        }
        out.push_str("</ul>\n");
    }

    if !doc.subdirs.is_empty() {
        out.push_str("<h2>Directories</h2>\n<ul>\n");
        for sub in &doc.subdirs {
            out.push_str(&format!(
                "<li><a href=\"/pkg/{0}/\">{1}</a> {2}</li>\n",
                escape_html(&sub.path),
                escape_html(&sub.name),
                escape_html(&sub.synopsis)
            ));
        }
        out.push_str("</ul>\n");
    }
    out
}
