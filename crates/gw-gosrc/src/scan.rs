//! Go token scanner.
//!
//! Produces a flat token list with byte offsets. The scanner is lossless in
//! position: every byte of the input is covered by at most one token, and
//! whitespace is simply skipped.

/// Byte range within a source buffer (half-open).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Construct a span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the span covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Token classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `// …` or `/* … */`, marker included.
    Comment,
    /// Identifier (not a keyword).
    Ident,
    /// One of Go's reserved words.
    Keyword,
    /// Interpreted or raw string literal.
    String,
    /// Rune literal.
    Rune,
    /// Numeric literal.
    Number,
    /// Any other single operator/punctuation byte.
    Punct,
}

/// A scanned token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

/// True when `word` is a Go keyword.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Scan `src` into tokens.
///
/// Unterminated strings and comments extend to the end of input rather than
/// failing; the formatter must render whatever text it is given.
#[must_use]
pub fn tokenize(src: &str) -> Vec<Token> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        // Whitespace.
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        // Comments.
        if c == '/' && bytes.get(start + 1) == Some(&b'/') {
            let end = src[start..]
                .find('\n')
                .map_or(src.len(), |i| start + i);
            push_and_skip(&mut tokens, &mut chars, TokenKind::Comment, start, end);
            continue;
        }
        if c == '/' && bytes.get(start + 1) == Some(&b'*') {
            let end = src[start + 2..]
                .find("*/")
                .map_or(src.len(), |i| start + 2 + i + 2);
            push_and_skip(&mut tokens, &mut chars, TokenKind::Comment, start, end);
            continue;
        }

        // Raw strings.
        if c == '`' {
            let end = src[start + 1..]
                .find('`')
                .map_or(src.len(), |i| start + 1 + i + 1);
            push_and_skip(&mut tokens, &mut chars, TokenKind::String, start, end);
            continue;
        }

        // Interpreted strings and runes.
        if c == '"' || c == '\'' {
            let end = scan_quoted(src, start, c);
            let kind = if c == '"' {
                TokenKind::String
            } else {
                TokenKind::Rune
            };
            push_and_skip(&mut tokens, &mut chars, kind, start, end);
            continue;
        }

        // Identifiers and keywords.
        if is_ident_start(c) {
            let mut end = start + c.len_utf8();
            chars.next();
            while let Some(&(i, c2)) = chars.peek() {
                if is_ident_continue(c2) {
                    end = i + c2.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let kind = if is_keyword(&src[start..end]) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            };
            tokens.push(Token {
                kind,
                span: Span::new(start, end),
            });
            continue;
        }

        // Numbers (a coarse scan; the formatter never interprets the value).
        if c.is_ascii_digit() {
            let end = scan_number(src, start);
            push_and_skip(&mut tokens, &mut chars, TokenKind::Number, start, end);
            continue;
        }

        // Everything else is a single punctuation byte.
        chars.next();
        tokens.push(Token {
            kind: TokenKind::Punct,
            span: Span::new(start, start + c.len_utf8()),
        });
    }
    tokens
}

/// Push a token and advance the char iterator past `end`.
fn push_and_skip(
    tokens: &mut Vec<Token>,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    kind: TokenKind,
    start: usize,
    end: usize,
) {
    tokens.push(Token {
        kind,
        span: Span::new(start, end),
    });
    while let Some(&(i, _)) = chars.peek() {
        if i < end {
            chars.next();
        } else {
            break;
        }
    }
}

/// Scan a quoted literal with backslash escapes.
fn scan_quoted(src: &str, start: usize, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in src[start + 1..].char_indices() {
        let pos = start + 1 + i;
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\n' => return pos, // unterminated; stop at the line end
            c if c == quote => return pos + c.len_utf8(),
            _ => {}
        }
    }
    src.len()
}

/// Scan a numeric literal, accepting Go's digit/letter mix and exponent signs.
fn scan_number(src: &str, start: usize) -> usize {
    let bytes = src.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        let ok = b.is_ascii_alphanumeric()
            || b == b'.'
            || b == b'_'
            || ((b == b'+' || b == b'-')
                && matches!(bytes.get(i.wrapping_sub(1)), Some(b'e' | b'E' | b'p' | b'P')));
        if ok {
            i += 1;
        } else {
            break;
        }
    }
    i
}

/// Spans of all comments in `src`, in source order.
#[must_use]
pub fn comment_spans(src: &str) -> Vec<Span> {
    tokenize(src)
        .into_iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .map(|t| t.span)
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        tokenize(src)
            .into_iter()
            .map(|t| (t.kind, src[t.span.start..t.span.end].to_owned()))
            .collect()
    }

    #[test]
    fn test_idents_and_keywords() {
        assert_eq!(
            kinds("func main"),
            vec![
                (TokenKind::Keyword, "func".to_owned()),
                (TokenKind::Ident, "main".to_owned()),
            ]
        );
    }

    #[test]
    fn test_line_comment() {
        let toks = kinds("x // trailing\ny");
        assert_eq!(toks[1], (TokenKind::Comment, "// trailing".to_owned()));
        assert_eq!(toks[2], (TokenKind::Ident, "y".to_owned()));
    }

    #[test]
    fn test_block_comment() {
        let toks = kinds("a /* mid */ b");
        assert_eq!(toks[1], (TokenKind::Comment, "/* mid */".to_owned()));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let toks = kinds("a /* open");
        assert_eq!(toks[1], (TokenKind::Comment, "/* open".to_owned()));
    }

    #[test]
    fn test_strings_are_opaque() {
        let toks = kinds(r#"s := "no // comment here""#);
        assert_eq!(
            toks.last().unwrap(),
            &(TokenKind::String, r#""no // comment here""#.to_owned())
        );
    }

    #[test]
    fn test_raw_string_spans_lines() {
        let toks = kinds("`raw\nstring` x");
        assert_eq!(toks[0], (TokenKind::String, "`raw\nstring`".to_owned()));
    }

    #[test]
    fn test_string_escape() {
        let toks = kinds(r#""a\"b" c"#);
        assert_eq!(toks[0], (TokenKind::String, r#""a\"b""#.to_owned()));
    }

    #[test]
    fn test_rune() {
        let toks = kinds(r"'\n' x");
        assert_eq!(toks[0], (TokenKind::Rune, r"'\n'".to_owned()));
    }

    #[test]
    fn test_number_with_exponent() {
        let toks = kinds("1.5e+10 x");
        assert_eq!(toks[0], (TokenKind::Number, "1.5e+10".to_owned()));
    }

    #[test]
    fn test_unicode_ident() {
        let toks = kinds("日本語 := 1");
        assert_eq!(toks[0], (TokenKind::Ident, "日本語".to_owned()));
    }

    #[test]
    fn test_comment_spans() {
        let src = "// one\nx\n/* two */";
        let spans = comment_spans(src);
        assert_eq!(spans.len(), 2);
        assert_eq!(&src[spans[0].start..spans[0].end], "// one");
        assert_eq!(&src[spans[1].start..spans[1].end], "/* two */");
    }
}
