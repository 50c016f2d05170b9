//! Top-level declaration parsing.
//!
//! Parses a single Go file into the shape the doc renderer consumes: package
//! clause with doc, imports, and top-level declarations with doc comments,
//! receivers, declared names and struct fields. Function bodies and type
//! expressions are skipped as balanced-bracket blobs; nothing below the
//! declaration level is modeled.

use crate::scan::{Span, Token, TokenKind, tokenize};

/// A single import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Import {
    /// Alias, `_`, or `.` when written; `None` for plain imports.
    pub alias: Option<String>,
    /// Import path without quotes.
    pub path: String,
}

impl Import {
    /// Name the import binds in file scope (alias or path base name).
    ///
    /// Blank and dot imports bind no usable name and return `None`.
    #[must_use]
    pub fn local_name(&self) -> Option<&str> {
        match self.alias.as_deref() {
            Some("_" | ".") => None,
            Some(alias) => Some(alias),
            None => Some(self.path.rsplit('/').next().unwrap_or(&self.path)),
        }
    }
}

/// Declaration class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Func,
    Type,
    Const,
    Var,
}

/// A named struct field (embedded fields are recorded with no names).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructField {
    /// Field names; empty for embedded fields.
    pub names: Vec<String>,
    /// Span of the field spec itself.
    pub span: Span,
    /// Span of the doc comment group on the preceding lines, if any.
    pub doc_span: Option<Span>,
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decl {
    pub kind: DeclKind,
    /// Primary name: the func/type name, or the first declared value name.
    pub name: String,
    /// All declared names (value declarations may carry several).
    pub names: Vec<String>,
    /// Receiver base type for methods.
    pub recv: Option<String>,
    /// Doc comment text (comment markers stripped).
    pub doc: String,
    /// Doc comment group span, if any.
    pub doc_span: Option<Span>,
    /// Keyword through last token of the declaration.
    pub span: Span,
    /// Struct fields when the declaration is a single struct type.
    pub fields: Vec<StructField>,
    /// Offsets of declared-name tokens (value declarations), for anchors.
    pub name_offsets: Vec<(String, usize)>,
}

/// A parsed Go file.
#[derive(Clone, Debug, Default)]
pub struct GoFile {
    pub package: String,
    /// Package doc comment text.
    pub package_doc: String,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

/// Parse failure.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing package clause")]
    NoPackageClause,
    #[error("unexpected end of file at offset {0}")]
    UnexpectedEof(usize),
}

/// Line-offset index for a source buffer.
#[derive(Clone, Debug)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index.
    #[must_use]
    pub fn new(src: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    /// 0-based line containing byte `offset`.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    toks: Vec<Token>,
    lines: LineIndex,
    pos: usize,
}

/// Parse one file.
///
/// # Errors
///
/// Returns [`ParseError::NoPackageClause`] when the file has no `package`
/// clause; lower-level oddities are tolerated (the parser skips what it
/// cannot shape).
pub fn parse_file(src: &str) -> Result<GoFile, ParseError> {
    let mut p = Parser {
        src,
        toks: tokenize(src),
        lines: LineIndex::new(src),
        pos: 0,
    };
    p.file()
}

impl<'a> Parser<'a> {
    fn text(&self, span: Span) -> &'a str {
        &self.src[span.start..span.end]
    }

    /// Current token, comments included.
    fn cur(&self) -> Option<Token> {
        self.toks.get(self.pos).copied()
    }

    /// Advance one token.
    fn bump(&mut self) -> Option<Token> {
        let t = self.cur();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Skip comments; return the next significant token without consuming.
    fn peek(&mut self) -> Option<Token> {
        while let Some(t) = self.cur() {
            if t.kind == TokenKind::Comment {
                self.pos += 1;
            } else {
                return Some(t);
            }
        }
        None
    }

    /// Doc comment group ending on the line right above `tok`.
    ///
    /// Walks back over contiguous whole-line comments with no blank line
    /// between them and the declaration.
    fn doc_group_before(&self, tok: Token) -> Option<Span> {
        let mut want_line = self.lines.line_of(tok.span.start);
        let mut idx = self.toks.iter().position(|t| t.span.start == tok.span.start)?;
        let mut first: Option<Span> = None;

        while idx > 0 {
            idx -= 1;
            let prev = self.toks[idx];
            if prev.kind != TokenKind::Comment {
                break;
            }
            let end_line = self.lines.line_of(prev.span.end.saturating_sub(1));
            if end_line + 1 != want_line {
                break;
            }
            // A comment trailing other code on its line documents that
            // line, not the following declaration.
            let start_line = self.lines.line_of(prev.span.start);
            if idx > 0 {
                let before = self.toks[idx - 1];
                if self.lines.line_of(before.span.end.saturating_sub(1)) == start_line {
                    break;
                }
            }
            want_line = start_line;
            first = Some(prev.span);
        }

        let first = first?;
        // The group runs from the first comment to the declaration.
        let mut end = first.end;
        for t in &self.toks {
            if t.span.start >= tok.span.start {
                break;
            }
            if t.kind == TokenKind::Comment && t.span.start >= first.start {
                end = t.span.end;
            }
        }
        Some(Span::new(first.start, end))
    }

    fn file(&mut self) -> Result<GoFile, ParseError> {
        let mut out = GoFile::default();

        // Package clause.
        loop {
            let Some(tok) = self.peek() else {
                return Err(ParseError::NoPackageClause);
            };
            if tok.kind == TokenKind::Keyword && self.text(tok.span) == "package" {
                if let Some(doc) = self.doc_group_before(tok) {
                    out.package_doc = comment_text(self.text(doc));
                }
                self.bump();
                if let Some(name) = self.peek() {
                    if name.kind == TokenKind::Ident {
                        out.package = self.text(name.span).to_owned();
                        self.bump();
                    }
                }
                break;
            }
            // Stray tokens before the clause (should not happen in real
            // files); skip them rather than giving up.
            self.bump();
        }

        // Declarations.
        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Keyword {
                self.bump();
                continue;
            }
            match self.text(tok.span) {
                "import" => {
                    self.bump();
                    self.imports(&mut out.imports);
                }
                "func" => {
                    let decl = self.func_decl(tok);
                    out.decls.push(decl);
                }
                "type" => {
                    let decls = self.type_decl(tok);
                    out.decls.extend(decls);
                }
                kw @ ("const" | "var") => {
                    let kind = if kw == "const" {
                        DeclKind::Const
                    } else {
                        DeclKind::Var
                    };
                    let decl = self.value_decl(tok, kind);
                    out.decls.push(decl);
                }
                _ => {
                    self.bump();
                }
            }
        }

        Ok(out)
    }

    fn imports(&mut self, out: &mut Vec<Import>) {
        let Some(tok) = self.peek() else { return };
        if self.text(tok.span) == "(" {
            self.bump();
            while let Some(t) = self.peek() {
                if self.text(t.span) == ")" {
                    self.bump();
                    return;
                }
                if let Some(import) = self.import_spec() {
                    out.push(import);
                } else {
                    self.bump();
                }
            }
        } else if let Some(import) = self.import_spec() {
            out.push(import);
        }
    }

    fn import_spec(&mut self) -> Option<Import> {
        let tok = self.peek()?;
        let mut alias = None;
        let mut tok = tok;
        match tok.kind {
            TokenKind::Ident => {
                alias = Some(self.text(tok.span).to_owned());
                self.bump();
                tok = self.peek()?;
            }
            TokenKind::Punct if self.text(tok.span) == "." => {
                alias = Some(".".to_owned());
                self.bump();
                tok = self.peek()?;
            }
            _ => {}
        }
        if tok.kind != TokenKind::String {
            return None;
        }
        self.bump();
        let raw = self.text(tok.span);
        let path = raw.trim_matches(['"', '`']).to_owned();
        Some(Import { alias, path })
    }

    /// Skip a balanced bracket group starting at the current open token.
    fn skip_balanced(&mut self) -> usize {
        let mut depth = 0usize;
        let mut end = self.peek().map_or(0, |t| t.span.end);
        while let Some(t) = self.peek() {
            match self.text(t.span) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
            end = t.span.end;
            self.bump();
            if depth == 0 {
                break;
            }
        }
        end
    }

    fn func_decl(&mut self, kw: Token) -> Decl {
        let doc_span = self.doc_group_before(kw);
        self.bump(); // func

        // Receiver.
        let mut recv = None;
        if let Some(t) = self.peek() {
            if self.text(t.span) == "(" {
                recv = self.receiver_base();
            }
        }

        // Name.
        let mut name = String::new();
        let mut name_offsets = Vec::new();
        if let Some(t) = self.peek() {
            if t.kind == TokenKind::Ident {
                name = self.text(t.span).to_owned();
                name_offsets.push((name.clone(), t.span.start));
                self.bump();
            }
        }

        let end = self.skip_to_decl_end(kw);
        Decl {
            kind: DeclKind::Func,
            names: vec![name.clone()],
            name,
            recv,
            doc: doc_span.map_or_else(String::new, |s| comment_text(self.text(s))),
            doc_span,
            span: Span::new(kw.span.start, end),
            fields: Vec::new(),
            name_offsets,
        }
    }

    /// Consume a receiver group, returning the base type name.
    fn receiver_base(&mut self) -> Option<String> {
        self.bump(); // (
        let mut depth = 1usize;
        let mut bracket = 0usize;
        let mut base = None;
        while let Some(t) = self.peek() {
            match self.text(t.span) {
                "(" => depth += 1,
                ")" => {
                    depth -= 1;
                    if depth == 0 {
                        self.bump();
                        break;
                    }
                }
                "[" => bracket += 1,
                "]" => bracket = bracket.saturating_sub(1),
                _ => {
                    // Last identifier outside type-parameter brackets is the
                    // receiver base type: `(t *T)`, `(t T)`, `(t *T[K])`.
                    if t.kind == TokenKind::Ident && bracket == 0 {
                        base = Some(self.text(t.span).to_owned());
                    }
                }
            }
            self.bump();
        }
        base
    }

    /// Scan forward to the end of the current declaration.
    ///
    /// The body (or type literal) braces are skipped as balanced groups; a
    /// declaration keyword at depth 0 on a fresh line ends a body-less
    /// declaration.
    fn skip_to_decl_end(&mut self, kw: Token) -> usize {
        let kw_line = self.lines.line_of(kw.span.start);
        let mut end = kw.span.end;
        let mut depth = 0usize;
        let mut prev_text: Option<&str> = None;

        while let Some(t) = self.peek() {
            let text = self.text(t.span);
            if depth == 0 && t.kind == TokenKind::Keyword {
                let fresh_line = self.lines.line_of(t.span.start) > kw_line;
                if fresh_line
                    && matches!(text, "func" | "type" | "const" | "var" | "import" | "package")
                    && !matches!(prev_text, Some("struct" | "interface" | "map" | "chan" | "func"))
                {
                    break;
                }
            }
            match text {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                "{" => {
                    if matches!(prev_text, Some("struct" | "interface")) || depth > 0 {
                        depth += 1;
                    } else {
                        // Function body: consume it and stop.
                        end = self.skip_balanced();
                        return end;
                    }
                }
                "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
            end = t.span.end;
            prev_text = Some(self.text(t.span));
            self.bump();
        }
        end
    }

    fn type_decl(&mut self, kw: Token) -> Vec<Decl> {
        let doc_span = self.doc_group_before(kw);
        self.bump(); // type

        let mut decls = Vec::new();
        let Some(t) = self.peek() else {
            return decls;
        };
        if self.text(t.span) == "(" {
            self.bump();
            while let Some(t) = self.peek() {
                if self.text(t.span) == ")" {
                    self.bump();
                    break;
                }
                let spec_doc = self.doc_group_before(t);
                if let Some(decl) = self.type_spec(kw, spec_doc) {
                    decls.push(decl);
                } else {
                    self.bump();
                }
            }
        } else if let Some(decl) = self.type_spec(kw, doc_span) {
            decls.push(decl);
        }
        decls
    }

    fn type_spec(&mut self, kw: Token, doc_span: Option<Span>) -> Option<Decl> {
        let name_tok = self.peek()?;
        if name_tok.kind != TokenKind::Ident {
            return None;
        }
        let name = self.text(name_tok.span).to_owned();
        self.bump();

        // Optional type parameters, optional alias `=`.
        if let Some(t) = self.peek() {
            if self.text(t.span) == "[" {
                self.skip_balanced();
            }
        }
        if let Some(t) = self.peek() {
            if self.text(t.span) == "=" {
                self.bump();
            }
        }

        let mut fields = Vec::new();
        let mut end = name_tok.span.end;

        if let Some(t) = self.peek() {
            if t.kind == TokenKind::Keyword && self.text(t.span) == "struct" {
                self.bump();
                if let Some(open) = self.peek() {
                    if self.text(open.span) == "{" {
                        end = self.struct_body(&mut fields);
                    }
                }
            } else {
                end = self.skip_type_expr(name_tok);
            }
        }

        Some(Decl {
            kind: DeclKind::Type,
            names: vec![name.clone()],
            name_offsets: vec![(name.clone(), name_tok.span.start)],
            name,
            recv: None,
            doc: doc_span.map_or_else(String::new, |s| comment_text(self.text(s))),
            doc_span,
            span: Span::new(kw.span.start, end),
            fields,
        })
    }

    /// Consume a non-struct type expression: tokens until a depth-0 line
    /// break.
    fn skip_type_expr(&mut self, start: Token) -> usize {
        let mut line = self.lines.line_of(start.span.start);
        let mut depth = 0usize;
        let mut end = start.span.end;
        while let Some(t) = self.peek() {
            if depth == 0 && self.lines.line_of(t.span.start) > line {
                break;
            }
            match self.text(t.span) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            // Inside brackets the expression may span lines.
            if depth > 0 {
                line = self.lines.line_of(t.span.start);
            }
            end = t.span.end;
            self.bump();
        }
        end
    }

    /// Parse `{ field* }`, returning the closing-brace end offset.
    fn struct_body(&mut self, fields: &mut Vec<StructField>) -> usize {
        let open = self.peek().expect("caller checked for `{`");
        self.bump();
        let mut end = open.span.end;

        while let Some(t) = self.peek() {
            if self.text(t.span) == "}" {
                end = t.span.end;
                self.bump();
                break;
            }
            let doc_span = self.doc_group_before(t);
            let field = self.field_spec(doc_span);
            fields.push(field);
        }
        end
    }

    /// Parse one field spec (one logical line, bracket-aware).
    fn field_spec(&mut self, doc_span: Option<Span>) -> StructField {
        let first = self.peek().expect("caller checked for a token");
        let line = self.lines.line_of(first.span.start);
        let start = first.span.start;
        let mut end = first.span.end;

        // Leading identifier run `A, B, C`: names if a type follows.
        let mut idents = Vec::new();
        let mut after_run = None;
        let mut spec_toks = Vec::new();
        let mut depth = 0usize;

        while let Some(t) = self.peek() {
            if depth == 0
                && (self.lines.line_of(t.span.start) > line || self.text(t.span) == "}")
            {
                break;
            }
            match self.text(t.span) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
            spec_toks.push(t);
            end = t.span.end;
            self.bump();
        }

        // Classify: named field iff the leading comma-separated ident run is
        // followed by more spec tokens that do not make it a qualified or
        // tagged embedded field.
        let mut i = 0;
        while i < spec_toks.len() {
            let t = spec_toks[i];
            if t.kind == TokenKind::Ident {
                idents.push(self.text(t.span).to_owned());
                i += 1;
                if i < spec_toks.len() && self.text(spec_toks[i].span) == "," {
                    i += 1;
                    continue;
                }
            }
            break;
        }
        if i < spec_toks.len() {
            after_run = Some(spec_toks[i]);
        }

        let named = match after_run {
            None => false, // plain embedded field
            Some(t) => {
                let text = self.text(t.span);
                // `pkg.Name` embed or `T "tag"` embed.
                !(text == "." || t.kind == TokenKind::String)
            }
        };

        StructField {
            names: if named { idents } else { Vec::new() },
            span: Span::new(start, end),
            doc_span,
        }
    }

    fn value_decl(&mut self, kw: Token, kind: DeclKind) -> Decl {
        let doc_span = self.doc_group_before(kw);
        self.bump(); // const | var

        let mut names = Vec::new();
        let mut name_offsets = Vec::new();
        let mut end = kw.span.end;

        if let Some(t) = self.peek() {
            if self.text(t.span) == "(" {
                self.bump();
                while let Some(t) = self.peek() {
                    if self.text(t.span) == ")" {
                        end = t.span.end;
                        self.bump();
                        break;
                    }
                    end = self.value_spec(&mut names, &mut name_offsets);
                }
            } else {
                end = self.value_spec(&mut names, &mut name_offsets);
            }
        }

        Decl {
            kind,
            name: names.first().cloned().unwrap_or_default(),
            names,
            recv: None,
            doc: doc_span.map_or_else(String::new, |s| comment_text(self.text(s))),
            doc_span,
            span: Span::new(kw.span.start, end),
            fields: Vec::new(),
            name_offsets,
        }
    }

    /// Parse one value spec line: `A, B Type = x, y`.
    fn value_spec(&mut self, names: &mut Vec<String>, offsets: &mut Vec<(String, usize)>) -> usize {
        let Some(first) = self.peek() else { return 0 };
        let line = self.lines.line_of(first.span.start);
        let mut end = first.span.end;
        let mut depth = 0usize;
        let mut in_names = true;

        while let Some(t) = self.peek() {
            if depth == 0 && self.lines.line_of(t.span.start) > line {
                break;
            }
            let text = self.text(t.span);
            if depth == 0 && text == ")" {
                break;
            }
            match text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
            if in_names && t.kind == TokenKind::Ident {
                names.push(text.to_owned());
                offsets.push((text.to_owned(), t.span.start));
                end = t.span.end;
                self.bump();
                if let Some(n) = self.peek() {
                    if self.text(n.span) == "," {
                        end = n.span.end;
                        self.bump();
                        continue;
                    }
                }
                in_names = false;
                continue;
            }
            in_names = false;
            end = t.span.end;
            self.bump();
        }
        end
    }
}

/// Strip comment markers and shared indentation from a comment group.
#[must_use]
pub fn comment_text(raw: &str) -> String {
    let mut out = String::new();
    for line in raw.lines() {
        let line = line.trim_start();
        let text = if let Some(rest) = line.strip_prefix("//") {
            rest.strip_prefix(' ').unwrap_or(rest)
        } else {
            let rest = line.strip_prefix("/*").unwrap_or(line);
            let rest = rest.strip_suffix("*/").unwrap_or(rest);
            rest.trim_matches(' ')
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(text);
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"// Package sample does sample things.
package sample

import (
    "fmt"
    myio "io"
    _ "net/http/pprof"
)

// Greeting is the standard greeting.
const Greeting = "hello"

// A Server serves.
type Server struct {
    // Addr is the listen address.
    Addr string
    Port int
    inner myio.Reader
    fmt.Stringer
}

// Serve runs the server.
func (s *Server) Serve() error {
    fmt.Println(Greeting)
    return nil
}

// New returns a Server.
func New(addr string) *Server {
    return &Server{Addr: addr}
}
"#;

    #[test]
    fn test_package_and_doc() {
        let f = parse_file(SAMPLE).unwrap();
        assert_eq!(f.package, "sample");
        assert_eq!(f.package_doc, "Package sample does sample things.");
    }

    #[test]
    fn test_imports() {
        let f = parse_file(SAMPLE).unwrap();
        assert_eq!(f.imports.len(), 3);
        assert_eq!(f.imports[0].path, "fmt");
        assert_eq!(f.imports[0].local_name(), Some("fmt"));
        assert_eq!(f.imports[1].alias.as_deref(), Some("myio"));
        assert_eq!(f.imports[1].local_name(), Some("myio"));
        assert_eq!(f.imports[2].local_name(), None);
    }

    #[test]
    fn test_const_decl() {
        let f = parse_file(SAMPLE).unwrap();
        let c = f.decls.iter().find(|d| d.kind == DeclKind::Const).unwrap();
        assert_eq!(c.name, "Greeting");
        assert_eq!(c.doc, "Greeting is the standard greeting.");
        assert_eq!(c.name_offsets.len(), 1);
    }

    #[test]
    fn test_struct_fields() {
        let f = parse_file(SAMPLE).unwrap();
        let t = f.decls.iter().find(|d| d.kind == DeclKind::Type).unwrap();
        assert_eq!(t.name, "Server");
        assert_eq!(t.doc, "A Server serves.");

        let named: Vec<_> = t
            .fields
            .iter()
            .filter(|f| !f.names.is_empty())
            .flat_map(|f| f.names.clone())
            .collect();
        assert_eq!(named, vec!["Addr", "Port", "inner"]);

        // The embedded fmt.Stringer has no names.
        assert_eq!(t.fields.iter().filter(|f| f.names.is_empty()).count(), 1);

        // Addr has a doc comment, Port does not.
        let addr = t.fields.iter().find(|f| f.names == ["Addr"]).unwrap();
        assert!(addr.doc_span.is_some());
        let port = t.fields.iter().find(|f| f.names == ["Port"]).unwrap();
        assert!(port.doc_span.is_none());
    }

    #[test]
    fn test_trailing_comment_is_not_doc_for_next_field() {
        let src = "package p\n\ntype T struct {\n\tAddr string // listen address\n\tPort int\n}\n";
        let f = parse_file(src).unwrap();
        let port = f.decls[0]
            .fields
            .iter()
            .find(|f| f.names == ["Port"])
            .unwrap();
        assert!(port.doc_span.is_none());
    }

    #[test]
    fn test_method_receiver() {
        let f = parse_file(SAMPLE).unwrap();
        let m = f.decls.iter().find(|d| d.name == "Serve").unwrap();
        assert_eq!(m.kind, DeclKind::Func);
        assert_eq!(m.recv.as_deref(), Some("Server"));
    }

    #[test]
    fn test_plain_func() {
        let f = parse_file(SAMPLE).unwrap();
        let n = f.decls.iter().find(|d| d.name == "New").unwrap();
        assert_eq!(n.recv, None);
        assert_eq!(n.doc, "New returns a Server.");
        // The span covers the body.
        assert!(SAMPLE[n.span.start..n.span.end].ends_with('}'));
    }

    #[test]
    fn test_value_group() {
        let src = "package p\n\nconst (\n\tA = 1\n\tB, C = 2, 3\n)\n";
        let f = parse_file(src).unwrap();
        assert_eq!(f.decls[0].names, vec!["A", "B", "C"]);
        assert_eq!(f.decls[0].name_offsets.len(), 3);
    }

    #[test]
    fn test_type_group() {
        let src = "package p\n\ntype (\n\t// D is documented.\n\tD int\n\tE struct{ X int }\n)\n";
        let f = parse_file(src).unwrap();
        assert_eq!(f.decls.len(), 2);
        assert_eq!(f.decls[0].name, "D");
        assert_eq!(f.decls[0].doc, "D is documented.");
        assert_eq!(f.decls[1].name, "E");
        assert_eq!(f.decls[1].fields.len(), 1);
        assert_eq!(f.decls[1].fields[0].names, vec!["X"]);
    }

    #[test]
    fn test_generic_func() {
        let src = "package p\n\nfunc Map[T any](xs []T) []T {\n\treturn xs\n}\n";
        let f = parse_file(src).unwrap();
        assert_eq!(f.decls[0].name, "Map");
    }

    #[test]
    fn test_func_without_body() {
        let src = "package p\n\nfunc asmStub(x int) int\n\nfunc After() {}\n";
        let f = parse_file(src).unwrap();
        assert_eq!(f.decls.len(), 2);
        assert_eq!(f.decls[0].name, "asmStub");
        assert_eq!(f.decls[1].name, "After");
    }

    #[test]
    fn test_no_package_clause() {
        assert!(parse_file("// just a comment\n").is_err());
    }

    #[test]
    fn test_comment_text_block() {
        assert_eq!(comment_text("/* one line */"), "one line");
        assert_eq!(comment_text("// a\n// b"), "a\nb");
    }

    #[test]
    fn test_line_index() {
        let idx = LineIndex::new("ab\ncd\n");
        assert_eq!(idx.line_of(0), 0);
        assert_eq!(idx.line_of(2), 0);
        assert_eq!(idx.line_of(3), 1);
        assert_eq!(idx.line_of(5), 1);
    }
}
