//! Build-constraint evaluation and per-target file selection.
//!
//! Implements the subset of Go's file selection the doc renderer needs:
//! `_test.go` exclusion is the caller's job; this module answers whether a
//! file belongs to a `(GOOS, GOARCH)` target, combining filename suffixes
//! with `//go:build` expressions (and legacy `// +build` lines).

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "illumos", "ios", "js", "linux",
    "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mips64", "mips64le", "mipsle",
    "ppc64", "ppc64le", "riscv64", "s390x", "wasm",
];

/// A compilation target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
}

impl BuildContext {
    /// Create a context for `goos`/`goarch`.
    #[must_use]
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    /// True when `tag` holds for this context.
    ///
    /// Matching tags are the OS, the architecture, and `unix` for the
    /// POSIX-ish OS list.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch {
            return true;
        }
        if tag == "unix" {
            return matches!(
                self.goos.as_str(),
                "aix" | "android"
                    | "darwin"
                    | "dragonfly"
                    | "freebsd"
                    | "illumos"
                    | "ios"
                    | "linux"
                    | "netbsd"
                    | "openbsd"
                    | "solaris"
            );
        }
        false
    }

    /// True when the filename's `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix
    /// allows this target.
    #[must_use]
    pub fn matches_filename(&self, name: &str) -> bool {
        let Some(stem) = name.strip_suffix(".go") else {
            return false;
        };
        let parts: Vec<&str> = stem.split('_').collect();
        let n = parts.len();
        if n >= 3
            && KNOWN_OS.contains(&parts[n - 2])
            && KNOWN_ARCH.contains(&parts[n - 1])
        {
            return parts[n - 2] == self.goos && parts[n - 1] == self.goarch;
        }
        if n >= 2 {
            let last = parts[n - 1];
            if KNOWN_OS.contains(&last) {
                return last == self.goos;
            }
            if KNOWN_ARCH.contains(&last) {
                return last == self.goarch;
            }
        }
        true
    }
}

/// True when the file participates in a build for `ctx`.
///
/// Filename suffix rules apply first, then the file's build constraint.
#[must_use]
pub fn matches_context(ctx: &BuildContext, filename: &str, src: &str) -> bool {
    if !ctx.matches_filename(filename) {
        return false;
    }
    match constraint(src) {
        Some(expr) => eval(&expr, &|tag| ctx.has_tag(tag)),
        None => true,
    }
}

/// True when the file carries the given build tag anywhere in its
/// constraint. Used to find `ignore`-tagged documentation files.
#[must_use]
pub fn has_build_tag(src: &str, tag: &str) -> bool {
    constraint(src).is_some_and(|expr| expr_mentions(&expr, tag))
}

/// Constraint expression, normalized from `//go:build` or `// +build`.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Extract the constraint from the lines above the package clause.
///
/// A `//go:build` line wins; otherwise all `// +build` lines are combined
/// (lines AND together, spaces OR, commas AND).
fn constraint(src: &str) -> Option<Expr> {
    let mut plus_lines = Vec::new();
    for line in src.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("package ") {
            break;
        }
        if let Some(rest) = trimmed.strip_prefix("//go:build ") {
            return parse_expr(rest);
        }
        if let Some(rest) = trimmed.strip_prefix("// +build ") {
            plus_lines.push(rest.to_owned());
        }
    }

    let mut expr: Option<Expr> = None;
    for line in plus_lines {
        let line_expr = parse_plus_line(&line)?;
        expr = Some(match expr {
            Some(prev) => Expr::And(Box::new(prev), Box::new(line_expr)),
            None => line_expr,
        });
    }
    expr
}

/// Parse one legacy `+build` line: space is OR, comma is AND, `!` negates.
fn parse_plus_line(line: &str) -> Option<Expr> {
    let mut or: Option<Expr> = None;
    for group in line.split_whitespace() {
        let mut and: Option<Expr> = None;
        for tag in group.split(',') {
            let e = if let Some(t) = tag.strip_prefix('!') {
                Expr::Not(Box::new(Expr::Tag(t.to_owned())))
            } else {
                Expr::Tag(tag.to_owned())
            };
            and = Some(match and {
                Some(prev) => Expr::And(Box::new(prev), Box::new(e)),
                None => e,
            });
        }
        let and = and?;
        or = Some(match or {
            Some(prev) => Expr::Or(Box::new(prev), Box::new(and)),
            None => and,
        });
    }
    or
}

/// Recursive-descent parser for `//go:build` expressions.
fn parse_expr(input: &str) -> Option<Expr> {
    let tokens = lex_expr(input);
    let mut pos = 0;
    let expr = parse_or(&tokens, &mut pos)?;
    if pos == tokens.len() { Some(expr) } else { None }
}

fn lex_expr(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut word = String::new();
    for c in input.chars() {
        match c {
            '(' | ')' | '!' => {
                if !word.is_empty() {
                    out.push(std::mem::take(&mut word));
                }
                out.push(c.to_string());
            }
            '&' | '|' => {
                if !word.is_empty() {
                    out.push(std::mem::take(&mut word));
                }
                match out.last().map(String::as_str) {
                    Some("&") if c == '&' => {
                        out.pop();
                        out.push("&&".to_owned());
                    }
                    Some("|") if c == '|' => {
                        out.pop();
                        out.push("||".to_owned());
                    }
                    _ => out.push(c.to_string()),
                }
            }
            c if c.is_whitespace() => {
                if !word.is_empty() {
                    out.push(std::mem::take(&mut word));
                }
            }
            _ => word.push(c),
        }
    }
    if !word.is_empty() {
        out.push(word);
    }
    out
}

fn parse_or(tokens: &[String], pos: &mut usize) -> Option<Expr> {
    let mut left = parse_and(tokens, pos)?;
    while tokens.get(*pos).map(String::as_str) == Some("||") {
        *pos += 1;
        let right = parse_and(tokens, pos)?;
        left = Expr::Or(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_and(tokens: &[String], pos: &mut usize) -> Option<Expr> {
    let mut left = parse_unary(tokens, pos)?;
    while tokens.get(*pos).map(String::as_str) == Some("&&") {
        *pos += 1;
        let right = parse_unary(tokens, pos)?;
        left = Expr::And(Box::new(left), Box::new(right));
    }
    Some(left)
}

fn parse_unary(tokens: &[String], pos: &mut usize) -> Option<Expr> {
    match tokens.get(*pos).map(String::as_str) {
        Some("!") => {
            *pos += 1;
            Some(Expr::Not(Box::new(parse_unary(tokens, pos)?)))
        }
        Some("(") => {
            *pos += 1;
            let inner = parse_or(tokens, pos)?;
            if tokens.get(*pos).map(String::as_str) == Some(")") {
                *pos += 1;
                Some(inner)
            } else {
                None
            }
        }
        Some(tag) if tag != ")" && tag != "&&" && tag != "||" => {
            *pos += 1;
            Some(Expr::Tag(tag.to_owned()))
        }
        _ => None,
    }
}

fn eval(expr: &Expr, has_tag: &dyn Fn(&str) -> bool) -> bool {
    match expr {
        Expr::Tag(t) => has_tag(t),
        Expr::Not(e) => !eval(e, has_tag),
        Expr::And(a, b) => eval(a, has_tag) && eval(b, has_tag),
        Expr::Or(a, b) => eval(a, has_tag) || eval(b, has_tag),
    }
}

fn expr_mentions(expr: &Expr, tag: &str) -> bool {
    match expr {
        Expr::Tag(t) => t == tag,
        Expr::Not(e) => expr_mentions(e, tag),
        Expr::And(a, b) | Expr::Or(a, b) => expr_mentions(a, tag) || expr_mentions(b, tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_amd64() -> BuildContext {
        BuildContext::new("linux", "amd64")
    }

    #[test]
    fn test_filename_suffixes() {
        let ctx = linux_amd64();
        assert!(ctx.matches_filename("file.go"));
        assert!(ctx.matches_filename("file_linux.go"));
        assert!(!ctx.matches_filename("file_windows.go"));
        assert!(ctx.matches_filename("file_amd64.go"));
        assert!(!ctx.matches_filename("file_arm64.go"));
        assert!(ctx.matches_filename("file_linux_amd64.go"));
        assert!(!ctx.matches_filename("file_linux_arm64.go"));
        assert!(!ctx.matches_filename("file_windows_amd64.go"));
    }

    #[test]
    fn test_suffix_requires_known_token() {
        let ctx = linux_amd64();
        // `_helper` is not an OS or arch, so the file is unconstrained.
        assert!(ctx.matches_filename("scan_helper.go"));
    }

    #[test]
    fn test_go_build_line() {
        let ctx = linux_amd64();
        assert!(matches_context(&ctx, "f.go", "//go:build linux\npackage p\n"));
        assert!(!matches_context(&ctx, "f.go", "//go:build windows\npackage p\n"));
        assert!(matches_context(
            &ctx,
            "f.go",
            "//go:build linux && amd64\npackage p\n"
        ));
        assert!(!matches_context(
            &ctx,
            "f.go",
            "//go:build !linux\npackage p\n"
        ));
        assert!(matches_context(
            &ctx,
            "f.go",
            "//go:build (windows || linux) && !arm64\npackage p\n"
        ));
    }

    #[test]
    fn test_plus_build_line() {
        let ctx = linux_amd64();
        assert!(matches_context(
            &ctx,
            "f.go",
            "// +build linux darwin\n\npackage p\n"
        ));
        assert!(!matches_context(
            &ctx,
            "f.go",
            "// +build darwin,amd64\n\npackage p\n"
        ));
    }

    #[test]
    fn test_unix_tag() {
        let ctx = linux_amd64();
        assert!(matches_context(&ctx, "f.go", "//go:build unix\npackage p\n"));
        let win = BuildContext::new("windows", "amd64");
        assert!(!matches_context(&win, "f.go", "//go:build unix\npackage p\n"));
    }

    #[test]
    fn test_ignore_tag_excludes_and_is_detectable() {
        let ctx = linux_amd64();
        let src = "//go:build ignore\n\npackage main\n";
        assert!(!matches_context(&ctx, "f.go", src));
        assert!(has_build_tag(src, "ignore"));
        assert!(!has_build_tag("package p\n", "ignore"));
    }

    #[test]
    fn test_js_wasm_target() {
        let js = BuildContext::new("js", "wasm");
        assert!(matches_context(&js, "js.go", "//go:build js && wasm\npackage js\n"));
        assert!(!matches_context(&linux_amd64(), "js.go", "//go:build js && wasm\npackage js\n"));
    }
}
