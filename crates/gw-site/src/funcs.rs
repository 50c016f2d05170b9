//! The template function set.
//!
//! Content authors see a fixed set of functions: arithmetic, page/data/file
//! lookup, code-sample extraction, Markdown rendering, YAML parsing, and
//! exposed subsets of path and string utilities. Relative path arguments
//! resolve against the page's own directory; absolute ones against the
//! file-system root.

use std::sync::Arc;

use minijinja::value::{Object, Rest, from_args};
use minijinja::{Environment, Error, ErrorKind, State, Value};

use gw_texthtml::code::{Pattern, extract};
use gw_texthtml::{Config, format};
use gw_vfs::file_ext;

use crate::site::SiteInner;

/// Resolve a template path argument against the page directory.
///
/// Absolute paths (leading `/`) are root-relative; everything else is
/// relative to `page_dir`. `.` and `..` elements are folded away.
pub(crate) fn resolve_path(page_dir: &str, arg: &str) -> String {
    let (base, rest) = if let Some(stripped) = arg.strip_prefix('/') {
        ("", stripped)
    } else {
        (page_dir, arg)
    };

    let mut parts: Vec<&str> = Vec::new();
    if base != "." {
        parts.extend(base.split('/').filter(|s| !s.is_empty()));
    }
    for elem in rest.split('/') {
        match elem {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(elem),
        }
    }
    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, msg.into())
}

/// Register the function set on an environment.
pub(crate) fn register(
    env: &mut Environment<'static>,
    site: Arc<SiteInner>,
    page_dir: String,
    request_path: String,
) {
    env.add_function("add", |a: i64, b: i64| a + b);
    env.add_function("sub", |a: i64, b: i64| a - b);
    env.add_function("mul", |a: i64, b: i64| a * b);
    env.add_function("div", |a: i64, b: i64| -> Result<i64, Error> {
        if b == 0 {
            return Err(invalid("division by zero"));
        }
        Ok(a / b)
    });

    env.add_function("first", |n: usize, list: Value| -> Result<Value, Error> {
        let items: Vec<Value> = list.try_iter()?.take(n).collect();
        Ok(Value::from(items))
    });

    env.add_function("raw", |s: String| Value::from_safe_string(s));

    env.add_function("markdown", |s: String| {
        Value::from_safe_string(gw_markdown::fragment(&s))
    });

    env.add_function("yaml", |s: String| -> Result<Value, Error> {
        let v: serde_json::Value =
            serde_yaml::from_str(&s).map_err(|e| invalid(format!("yaml: {e}")))?;
        Ok(Value::from_serialize(&v))
    });

    env.add_function("present_style", |s: String| {
        Value::from_safe_string(present_style(&s))
    });

    {
        let site = Arc::clone(&site);
        let page_dir = page_dir.clone();
        env.add_function("data", move |path: String| -> Result<Value, Error> {
            let full = resolve_path(&page_dir, &path);
            let text = site
                .vfs()
                .read_to_string(&full)
                .map_err(|e| invalid(format!("data {full}: {e}")))?;
            let v: serde_json::Value = serde_yaml::from_str(&text)
                .map_err(|e| invalid(format!("data {full}: {e}")))?;
            Ok(Value::from_serialize(&v))
        });
    }

    {
        let site = Arc::clone(&site);
        let page_dir = page_dir.clone();
        env.add_function("file", move |path: String| -> Result<String, Error> {
            let full = resolve_path(&page_dir, &path);
            site.vfs()
                .read_to_string(&full)
                .map_err(|e| invalid(format!("file {full}: {e}")))
        });
    }

    {
        let site = Arc::clone(&site);
        let page_dir = page_dir.clone();
        env.add_function("page", move |url: String| -> Result<Value, Error> {
            let logical = resolve_path(&page_dir, &url);
            let (page, _) = site
                .load_page(&logical)
                .map_err(|e| invalid(format!("page {url}: {e}")))?;
            Ok(Value::from_serialize(page.data()))
        });
    }

    {
        let site = Arc::clone(&site);
        let page_dir = page_dir.clone();
        env.add_function("pages", move |glob: String| -> Result<Value, Error> {
            let pattern = resolve_path(&page_dir, &glob);
            let matches = site
                .vfs()
                .glob(&pattern)
                .map_err(|e| invalid(format!("pages {glob}: {e}")))?;

            let mut pages = Vec::new();
            for file in matches {
                let Some(logical) = file
                    .strip_suffix(".md")
                    .or_else(|| file.strip_suffix(".html"))
                else {
                    continue;
                };
                if let Ok((page, _)) = site.load_page(logical) {
                    pages.push(page);
                }
            }
            pages.sort_by(|a, b| a.url().cmp(b.url()));
            pages.dedup_by(|a, b| a.url() == b.url());
            let values: Vec<Value> = pages
                .iter()
                .map(|p| Value::from_serialize(p.data()))
                .collect();
            Ok(Value::from(values))
        });
    }

    {
        let site = Arc::clone(&site);
        let page_dir = page_dir.clone();
        env.add_function("code", move |file: String, args: Rest<Value>| {
            snippet(site.as_ref(), &page_dir, &file, &args.0, false)
        });
    }

    {
        let site = Arc::clone(&site);
        let page_dir = page_dir.clone();
        env.add_function("play", move |file: String, args: Rest<Value>| {
            snippet(site.as_ref(), &page_dir, &file, &args.0, true)
        });
    }

    {
        let request_path = request_path.clone();
        env.add_function("request", move || {
            Value::from_serialize(&serde_json::json!({ "path": request_path }))
        });
    }

    env.add_function("path", || Value::from_object(PathNamespace));
    env.add_function("strings", || Value::from_object(StringsNamespace));
}

/// Build one `code`/`play` snippet.
fn snippet(
    site: &SiteInner,
    page_dir: &str,
    file: &str,
    args: &[Value],
    playable: bool,
) -> Result<Value, Error> {
    let full = resolve_path(page_dir, file);
    let text = site
        .vfs()
        .read_to_string(&full)
        .map_err(|e| invalid(format!("code {full}: {e}")))?;

    let patterns: Vec<Pattern> = args
        .iter()
        .map(|v| {
            if let Some(n) = v.as_i64() {
                usize::try_from(n)
                    .map(Pattern::Line)
                    .map_err(|_| invalid(format!("bad line {n}")))
            } else {
                let s = v.as_str().unwrap_or_default();
                Pattern::parse(s)
                    .ok_or_else(|| invalid(format!("bad selector {s:?}")))
            }
        })
        .collect::<Result<_, Error>>()?;
    if patterns.len() > 2 {
        return Err(invalid("code takes at most two selectors"));
    }

    let snip = extract(&text, patterns.first(), patterns.get(1))
        .map_err(|e| invalid(format!("code {full}: {e}")))?;

    let cfg = Config {
        go_comments: file_ext(&full) == Some("go"),
        playground: playable,
        ..Config::default()
    };
    let html = format(&snip.text, &cfg);
    let wrapped = if playable {
        format!("<div class=\"playground\"><pre>{html}</pre></div>")
    } else {
        format!("<pre>{html}</pre>")
    };
    Ok(Value::from_safe_string(wrapped))
}

/// Inline styling used by slide-style text: `*bold*`, `_italic_`,
/// `` `code` ``.
fn present_style(s: &str) -> String {
    let escaped = gw_markdown::escape_html(s);
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    while let Some(c) = chars.next() {
        let (open, close) = match c {
            '*' => ("<b>", "</b>"),
            '_' => ("<i>", "</i>"),
            '`' => ("<code>", "</code>"),
            _ => {
                out.push(c);
                continue;
            }
        };
        // A style marker only applies when it encloses a non-empty run.
        let rest: String = chars.clone().collect();
        if let Some(end) = rest.find(c) {
            if end > 0 {
                out.push_str(open);
                out.push_str(&rest[..end]);
                out.push_str(close);
                for _ in 0..=end {
                    chars.next();
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// `path()` namespace: slash-path helpers.
#[derive(Debug)]
struct PathNamespace;

impl Object for PathNamespace {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match name {
            "base" => {
                let (s,): (String,) = from_args(args)?;
                Ok(Value::from(
                    s.rsplit('/').next().unwrap_or(s.as_str()).to_owned(),
                ))
            }
            "dir" => {
                let (s,): (String,) = from_args(args)?;
                Ok(Value::from(match s.rsplit_once('/') {
                    Some((dir, _)) if !dir.is_empty() => dir.to_owned(),
                    Some(_) => "/".to_owned(),
                    None => ".".to_owned(),
                }))
            }
            "ext" => {
                let (s,): (String,) = from_args(args)?;
                let base = s.rsplit('/').next().unwrap_or(&s);
                Ok(Value::from(match base.rfind('.') {
                    Some(i) if i > 0 => base[i..].to_owned(),
                    _ => String::new(),
                }))
            }
            "join" => {
                let parts: Vec<String> = args
                    .iter()
                    .map(|v| v.as_str().unwrap_or_default().to_owned())
                    .collect();
                let joined = parts
                    .iter()
                    .filter(|p| !p.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("/");
                Ok(Value::from(resolve_path(".", &joined)))
            }
            _ => Err(invalid(format!("unknown path method {name}"))),
        }
    }
}

/// `strings()` namespace: the string helpers templates may use.
#[derive(Debug)]
struct StringsNamespace;

impl Object for StringsNamespace {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match name {
            "trim_prefix" => {
                let (s, prefix): (String, String) = from_args(args)?;
                Ok(Value::from(
                    s.strip_prefix(&prefix).unwrap_or(&s).to_owned(),
                ))
            }
            "trim_suffix" => {
                let (s, suffix): (String, String) = from_args(args)?;
                Ok(Value::from(
                    s.strip_suffix(&suffix).unwrap_or(&s).to_owned(),
                ))
            }
            "trim_space" => {
                let (s,): (String,) = from_args(args)?;
                Ok(Value::from(s.trim().to_owned()))
            }
            "has_prefix" => {
                let (s, prefix): (String, String) = from_args(args)?;
                Ok(Value::from(s.starts_with(&prefix)))
            }
            "has_suffix" => {
                let (s, suffix): (String, String) = from_args(args)?;
                Ok(Value::from(s.ends_with(&suffix)))
            }
            "contains" => {
                let (s, sub): (String, String) = from_args(args)?;
                Ok(Value::from(s.contains(&sub)))
            }
            "split" => {
                let (s, sep): (String, String) = from_args(args)?;
                let parts: Vec<Value> = s.split(sep.as_str()).map(Value::from).collect();
                Ok(Value::from(parts))
            }
            "join" => {
                let (list, sep): (Value, String) = from_args(args)?;
                let parts: Vec<String> = list
                    .try_iter()?
                    .map(|v| v.as_str().unwrap_or_default().to_owned())
                    .collect();
                Ok(Value::from(parts.join(&sep)))
            }
            "replace_all" => {
                let (s, from, to): (String, String, String) = from_args(args)?;
                Ok(Value::from(s.replace(&from, &to)))
            }
            "to_lower" => {
                let (s,): (String,) = from_args(args)?;
                Ok(Value::from(s.to_lowercase()))
            }
            "to_upper" => {
                let (s,): (String,) = from_args(args)?;
                Ok(Value::from(s.to_uppercase()))
            }
            "repeat" => {
                let (s, n): (String, usize) = from_args(args)?;
                Ok(Value::from(s.repeat(n)))
            }
            _ => Err(invalid(
                format!("unknown strings method {name}"),
            )),
        }
    }
}
