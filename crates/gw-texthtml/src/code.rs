//! Snippet extraction for the `code` and `play` template functions.
//!
//! A snippet is selected from a file by line number, inclusive line range,
//! or `/regex/` patterns, then cleaned: `OMIT` lines are dropped, common
//! leading indentation is stripped, and a whole-file selection loses a
//! trivial `func … { … }` wrapper.

use regex::Regex;

/// One selector argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// 1-based line number.
    Line(usize),
    /// `/regex/` pattern selecting the first matching line.
    Regex(String),
}

impl Pattern {
    /// Parse a selector: an integer, or a `/…/`-delimited regex.
    #[must_use]
    pub fn parse(arg: &str) -> Option<Self> {
        if let Ok(n) = arg.parse::<usize>() {
            return Some(Self::Line(n));
        }
        let inner = arg.strip_prefix('/')?.strip_suffix('/')?;
        Some(Self::Regex(inner.to_owned()))
    }
}

/// Extraction failure.
#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    #[error("line {0} out of range (file has {1} lines)")]
    LineOutOfRange(usize, usize),
    #[error("pattern /{0}/ does not match")]
    NoMatch(String),
    #[error("invalid pattern /{0}/")]
    BadPattern(String),
    #[error("empty selection")]
    EmptySelection,
}

/// An extracted snippet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    /// Cleaned snippet text.
    pub text: String,
    /// 1-based line number of the first selected line in the source file.
    pub first_line: usize,
}

/// Extract a snippet from `text`.
///
/// With no selector the whole file is used (minus a trivial func wrapper);
/// one selector picks a single line; two pick an inclusive range, where the
/// second regex is matched from its last occurrence.
///
/// # Errors
///
/// Returns [`CodeError`] for out-of-range lines and non-matching patterns.
pub fn extract(
    text: &str,
    first: Option<&Pattern>,
    last: Option<&Pattern>,
) -> Result<Snippet, CodeError> {
    let lines: Vec<&str> = text.lines().collect();

    let (lo, hi) = match (first, last) {
        (None, _) => {
            let snippet = clean(&lines, 0, lines.len(), true);
            return Ok(Snippet {
                text: snippet,
                first_line: 1,
            });
        }
        (Some(sel), None) => {
            let n = resolve(sel, &lines, 0, false)?;
            (n, n)
        }
        (Some(a), Some(b)) => {
            let lo = resolve(a, &lines, 0, false)?;
            let hi = resolve(b, &lines, lo, true)?;
            (lo, hi)
        }
    };

    if lo > hi {
        return Err(CodeError::EmptySelection);
    }
    Ok(Snippet {
        text: clean(&lines, lo, hi + 1, false),
        first_line: lo + 1,
    })
}

/// Resolve a pattern to a 0-based line index.
///
/// Regexes search from `from`; `last_match` picks the final matching line
/// rather than the first.
fn resolve(
    pattern: &Pattern,
    lines: &[&str],
    from: usize,
    last_match: bool,
) -> Result<usize, CodeError> {
    match pattern {
        Pattern::Line(n) => {
            if *n == 0 || *n > lines.len() {
                return Err(CodeError::LineOutOfRange(*n, lines.len()));
            }
            Ok(n - 1)
        }
        Pattern::Regex(p) => {
            let re = Regex::new(p).map_err(|_| CodeError::BadPattern(p.clone()))?;
            let mut found = None;
            for (i, line) in lines.iter().enumerate().skip(from) {
                if re.is_match(line) {
                    found = Some(i);
                    if !last_match {
                        break;
                    }
                }
            }
            found.ok_or_else(|| CodeError::NoMatch(p.clone()))
        }
    }
}

/// Clean a selected line range: drop `OMIT` lines, strip the shared
/// indentation, and (for whole-file selections) a trivial func wrapper.
fn clean(lines: &[&str], lo: usize, hi: usize, whole_file: bool) -> String {
    let mut kept: Vec<&str> = lines[lo..hi]
        .iter()
        .filter(|l| !l.trim_end().ends_with("OMIT"))
        .copied()
        .collect();

    // Leading/trailing blank lines never help a snippet.
    while kept.first().is_some_and(|l| l.trim().is_empty()) {
        kept.remove(0);
    }
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }

    if whole_file && kept.len() >= 2 {
        let opens = kept[0].trim_start().starts_with("func") && kept[0].trim_end().ends_with('{');
        let closes = kept[kept.len() - 1].trim() == "}";
        if opens && closes {
            kept.remove(0);
            kept.pop();
        }
    }

    strip_indent(&kept)
}

/// Remove the indentation shared by every non-blank line.
fn strip_indent(lines: &[&str]) -> String {
    let prefix = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.len() >= prefix {
            out.push_str(&line[prefix..]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const FILE: &str = "package main\n\nfunc main() {\n\tfmt.Println(\"one\")\n\tfmt.Println(\"two\") // setup OMIT\n\tfmt.Println(\"three\")\n}\n";

    #[test]
    fn test_parse_pattern() {
        assert_eq!(Pattern::parse("7"), Some(Pattern::Line(7)));
        assert_eq!(Pattern::parse("/^func/"), Some(Pattern::Regex("^func".to_owned())));
        assert_eq!(Pattern::parse("nope"), None);
    }

    #[test]
    fn test_single_line() {
        let s = extract(FILE, Some(&Pattern::Line(1)), None).unwrap();
        assert_eq!(s.text, "package main");
        assert_eq!(s.first_line, 1);
    }

    #[test]
    fn test_line_range_strips_indent() {
        let s = extract(FILE, Some(&Pattern::Line(4)), Some(&Pattern::Line(6))).unwrap();
        assert_eq!(s.text, "fmt.Println(\"one\")\nfmt.Println(\"three\")");
        assert_eq!(s.first_line, 4);
    }

    #[test]
    fn test_regex_selector() {
        let s = extract(FILE, Some(&Pattern::Regex("one".to_owned())), None).unwrap();
        assert_eq!(s.text, "fmt.Println(\"one\")");
        assert_eq!(s.first_line, 4);
    }

    #[test]
    fn test_regex_range() {
        let s = extract(
            FILE,
            Some(&Pattern::Regex("^func".to_owned())),
            Some(&Pattern::Regex("^}".to_owned())),
        )
        .unwrap();
        assert!(s.text.starts_with("func main() {"), "{}", s.text);
        assert!(s.text.ends_with('}'), "{}", s.text);
    }

    #[test]
    fn test_omit_lines_dropped() {
        let s = extract(FILE, Some(&Pattern::Line(3)), Some(&Pattern::Line(7))).unwrap();
        assert!(!s.text.contains("two"), "{}", s.text);
        assert!(s.text.contains("one"), "{}", s.text);
    }

    #[test]
    fn test_whole_file_drops_wrapper() {
        let body = "func demo() {\n\tx := 1\n\ty := 2\n}\n";
        let s = extract(body, None, None).unwrap();
        assert_eq!(s.text, "x := 1\ny := 2");
    }

    #[test]
    fn test_whole_file_without_wrapper_kept() {
        let s = extract(FILE, None, None).unwrap();
        assert!(s.text.starts_with("package main"), "{}", s.text);
        assert!(!s.text.contains("OMIT"), "{}", s.text);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            extract(FILE, Some(&Pattern::Line(99)), None),
            Err(CodeError::LineOutOfRange(99, _))
        ));
    }

    #[test]
    fn test_no_match() {
        assert!(matches!(
            extract(FILE, Some(&Pattern::Regex("zzz".to_owned())), None),
            Err(CodeError::NoMatch(_))
        ));
    }
}
