//! Doc-page model construction.

use std::collections::HashMap;
use std::sync::Arc;

use gw_gosrc::{
    BuildContext, DeclKind, GoFile, PackageScope, bug_notes, comment_spans, comment_text,
    example_name, has_build_tag, matches_context, parse_file,
};
use gw_vfs::{Vfs, path_join};

use crate::apidb::ApiDb;
use crate::error::DocError;
use crate::render::{render_decl, render_example};
use crate::tree::{DirNode, build_tree, subdirs};

/// Display mode flags, parsed from the `m` query parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mode {
    /// Include `internal`/`vendor` directories.
    pub all: bool,
    /// Flat (non-indented) directory listing.
    pub flat: bool,
    /// Show all methods, including unexported receivers.
    pub methods: bool,
    /// Builtin-package presentation: methods lifted to package level.
    pub builtin: bool,
}

impl Mode {
    /// Parse a comma-separated mode list; unknown tokens are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut mode = Self::default();
        for token in query.split(',') {
            match token.trim() {
                "all" => mode.all = true,
                "flat" => mode.flat = true,
                "methods" => mode.methods = true,
                _ => {}
            }
        }
        mode
    }

    /// The forced mode for the synthetic `builtin` package.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            all: true,
            builtin: true,
            ..Self::default()
        }
    }
}

/// A rendered example.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    /// Full example function name.
    pub name: String,
    /// Suffix label (`ExampleFoo_bar` -> `bar`).
    pub label: String,
    /// Doc comment text.
    pub doc: String,
    /// Formatted example source.
    pub code_html: String,
}

/// A documented declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocItem {
    pub name: String,
    /// All declared names (value declarations).
    pub names: Vec<String>,
    /// Doc comment text.
    pub doc: String,
    /// Formatted declaration HTML.
    pub decl_html: String,
    /// Methods, for types (empty in builtin mode).
    pub methods: Vec<DocItem>,
    /// Examples attached to this item.
    pub examples: Vec<Example>,
}

/// One row of the sub-directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubDir {
    pub name: String,
    pub path: String,
    pub synopsis: String,
    pub has_pkg: bool,
}

/// The doc view of one package directory.
#[derive(Clone, Debug, Default)]
pub struct DocPage {
    pub import_path: String,
    pub package_name: String,
    pub is_command: bool,
    /// Package doc comment text.
    pub doc: String,
    pub bugs: Vec<String>,
    pub consts: Vec<DocItem>,
    pub vars: Vec<DocItem>,
    pub funcs: Vec<DocItem>,
    pub types: Vec<DocItem>,
    /// Package-level examples.
    pub examples: Vec<Example>,
    pub subdirs: Vec<SubDir>,
    pub mode: Mode,
    pub goos: String,
    pub goarch: String,
}

/// Builds [`DocPage`]s for import paths under a source root.
pub struct DocRenderer {
    vfs: Arc<dyn Vfs>,
    src_root: String,
    apidb: Arc<ApiDb>,
}

impl DocRenderer {
    /// Create a renderer reading sources under `src_root`.
    #[must_use]
    pub fn new(vfs: Arc<dyn Vfs>, src_root: impl Into<String>, apidb: Arc<ApiDb>) -> Self {
        Self {
            vfs,
            src_root: src_root.into(),
            apidb,
        }
    }

    /// The filtered directory tree for the package index.
    ///
    /// # Errors
    ///
    /// Propagates listing errors for the source root.
    pub fn tree(&self, mode: Mode) -> Result<DirNode, DocError> {
        Ok(build_tree(self.vfs.as_ref(), &self.src_root, mode.all)?)
    }

    /// Build the doc page for `import_path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::UnknownPackage`] when the path names no
    /// directory; a directory without Go files still yields a page with
    /// only the sub-directory listing.
    pub fn doc_page(
        &self,
        import_path: &str,
        mode: Mode,
        goos: Option<&str>,
        goarch: Option<&str>,
    ) -> Result<DocPage, DocError> {
        let dir = if import_path.is_empty() {
            self.src_root.clone()
        } else {
            path_join(&self.src_root, import_path)
        };

        let info = self
            .vfs
            .stat(&dir)
            .map_err(|_| DocError::UnknownPackage(import_path.to_owned()))?;
        if !info.is_dir {
            return Err(DocError::UnknownPackage(import_path.to_owned()));
        }

        // The only package whose docs are invisible on the default target.
        let (default_goos, default_goarch) = if import_path == "syscall/js" {
            ("js", "wasm")
        } else {
            ("linux", "amd64")
        };
        let goos = goos.filter(|s| !s.is_empty()).unwrap_or(default_goos);
        let goarch = goarch.filter(|s| !s.is_empty()).unwrap_or(default_goarch);
        let ctx = BuildContext::new(goos, goarch);

        let entries = self.vfs.read_dir(&dir)?;
        let go_names: Vec<&str> = entries
            .iter()
            .filter(|e| !e.is_dir && e.name.ends_with(".go") && !e.name.ends_with("_test.go"))
            .map(|e| e.name.as_str())
            .collect();

        // Read everything once; selection filters on content.
        let mut sources: Vec<(String, String)> = Vec::new();
        for name in &go_names {
            let path = path_join(&dir, name);
            match self.vfs.read_to_string(&path) {
                Ok(src) => sources.push(((*name).to_owned(), src)),
                Err(e) => tracing::warn!(path = %path, error = %e, "unreadable source file"),
            }
        }

        let mut selected: Vec<&(String, String)> = sources
            .iter()
            .filter(|(name, src)| matches_context(&ctx, name, src))
            .collect();

        // Commands documented by an `ignore`-tagged file: when nothing
        // builds for the target, fall back to those files.
        if selected.is_empty() {
            selected = sources
                .iter()
                .filter(|(_, src)| has_build_tag(src, "ignore"))
                .collect();
        }

        let mut files: Vec<(&str, GoFile)> = Vec::new();
        for (name, src) in &selected {
            match parse_file(src) {
                Ok(f) => files.push((src.as_str(), f)),
                Err(e) => tracing::warn!(file = %name, error = %e, "unparsable source file"),
            }
        }

        let mut page = DocPage {
            import_path: import_path.to_owned(),
            mode,
            goos: goos.to_owned(),
            goarch: goarch.to_owned(),
            ..DocPage::default()
        };

        page.subdirs = subdirs(self.vfs.as_ref(), &dir, mode.all)?
            .into_iter()
            .map(|node| SubDir {
                path: if import_path.is_empty() {
                    node.path.clone()
                } else {
                    format!("{import_path}/{}", node.path)
                },
                name: node.name,
                synopsis: node.synopsis,
                has_pkg: node.has_pkg,
            })
            .collect();

        if files.is_empty() {
            return Ok(page);
        }

        page.package_name = files
            .iter()
            .map(|(_, f)| f.package.clone())
            .find(|p| !p.is_empty())
            .unwrap_or_default();
        page.is_command = page.package_name == "main";
        page.doc = files
            .iter()
            .map(|(_, f)| f.package_doc.clone())
            .find(|d| !d.is_empty())
            .unwrap_or_default();

        let scope = package_scope(&files);
        self.collect_decls(&mut page, &files, &scope);
        self.collect_examples(&mut page, &dir, &entries, &ctx);
        collect_bugs(&mut page, &files);

        Ok(page)
    }

    /// Group declarations into the page model.
    fn collect_decls(&self, page: &mut DocPage, files: &[(&str, GoFile)], scope: &PackageScope) {
        let mut methods: Vec<(String, DocItem)> = Vec::new();

        for (src, file) in files {
            for decl in &file.decls {
                let html = render_decl(src, file, scope, decl, &page.import_path, &self.apidb);
                let item = DocItem {
                    name: decl.name.clone(),
                    names: decl.names.clone(),
                    doc: decl.doc.clone(),
                    decl_html: html,
                    methods: Vec::new(),
                    examples: Vec::new(),
                };
                match decl.kind {
                    DeclKind::Const => page.consts.push(item),
                    DeclKind::Var => page.vars.push(item),
                    DeclKind::Type => page.types.push(item),
                    DeclKind::Func => match &decl.recv {
                        Some(recv) if !page.mode.builtin => {
                            methods.push((recv.clone(), item));
                        }
                        _ => page.funcs.push(item),
                    },
                }
            }
        }

        // Attach methods to their receiver type; orphans degrade to funcs.
        let mut by_type: HashMap<String, usize> = HashMap::new();
        for (i, t) in page.types.iter().enumerate() {
            by_type.insert(t.name.clone(), i);
        }
        for (recv, item) in methods {
            match by_type.get(&recv) {
                Some(&i) => page.types[i].methods.push(item),
                None => page.funcs.push(item),
            }
        }

        page.funcs.sort_by(|a, b| a.name.cmp(&b.name));
        page.types.sort_by(|a, b| a.name.cmp(&b.name));
        for t in &mut page.types {
            t.methods.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }

    /// Collect examples from the directory's `_test.go` files.
    fn collect_examples(
        &self,
        page: &mut DocPage,
        dir: &str,
        entries: &[gw_vfs::DirEntry],
        ctx: &BuildContext,
    ) {
        for entry in entries {
            if entry.is_dir || !entry.name.ends_with("_test.go") {
                continue;
            }
            let path = path_join(dir, &entry.name);
            let Ok(src) = self.vfs.read_to_string(&path) else {
                continue;
            };
            if !matches_context(ctx, &entry.name.replace("_test.go", ".go"), &src) {
                continue;
            }
            let Ok(file) = parse_file(&src) else {
                continue;
            };
            for decl in &file.decls {
                if decl.kind != DeclKind::Func || decl.recv.is_some() {
                    continue;
                }
                let Some(name) = example_name(&decl.name) else {
                    continue;
                };
                let example = Example {
                    name: decl.name.clone(),
                    label: name.label.clone(),
                    doc: decl.doc.clone(),
                    code_html: render_example(&src, decl),
                };
                if name.attach_to.is_empty() {
                    page.examples.push(example);
                } else if let Some(t) =
                    page.types.iter_mut().find(|t| t.name == name.attach_to)
                {
                    t.examples.push(example);
                } else if let Some(f) =
                    page.funcs.iter_mut().find(|f| f.name == name.attach_to)
                {
                    f.examples.push(example);
                } else {
                    page.examples.push(example);
                }
            }
        }
    }
}

/// Package-level scope across all files.
fn package_scope(files: &[(&str, GoFile)]) -> PackageScope {
    let mut scope = PackageScope::new();
    for (_, file) in files {
        for decl in &file.decls {
            for name in &decl.names {
                scope.insert(name.clone());
            }
        }
    }
    scope
}

/// Collect `BUG(x):` notes from all comments of the package files.
fn collect_bugs(page: &mut DocPage, files: &[(&str, GoFile)]) {
    let mut comments = Vec::new();
    for (src, _) in files {
        for span in comment_spans(src) {
            comments.push(comment_text(&src[span.start..span.end]));
        }
    }
    page.bugs = bug_notes(comments.iter().map(String::as_str));
}

#[cfg(test)]
mod tests {
    use gw_vfs::MemFs;
    use pretty_assertions::assert_eq;

    use super::*;

    fn renderer(fs: MemFs) -> DocRenderer {
        DocRenderer::new(Arc::new(fs), "src", Arc::new(ApiDb::empty()))
    }

    fn fixture() -> MemFs {
        MemFs::new()
            .with_file(
                "src/web/server.go",
                concat!(
                    "// Package web serves pages. Extra detail.\n",
                    "package web\n",
                    "\n",
                    "// DefaultPort is used when none is set.\n",
                    "const DefaultPort = 8080\n",
                    "\n",
                    "// A Server serves.\n",
                    "type Server struct {\n",
                    "\tAddr string\n",
                    "}\n",
                    "\n",
                    "// Serve runs the server.\n",
                    "func (s *Server) Serve() error { return nil }\n",
                    "\n",
                    "// New returns a Server.\n",
                    "func New() *Server { return nil }\n",
                    "\n",
                    "// BUG(web): shutdown is abrupt.\n",
                ),
            )
            .with_file(
                "src/web/server_test.go",
                concat!(
                    "package web\n",
                    "\n",
                    "func ExampleNew() {\n",
                    "\t_ = New()\n",
                    "}\n",
                    "\n",
                    "func ExampleServer_basic() {\n",
                    "\t_ = New()\n",
                    "}\n",
                ),
            )
            .with_file("src/web/inner/util.go", "// Package inner helps.\npackage inner\n")
    }

    #[test]
    fn test_doc_page_model() {
        let page = renderer(fixture())
            .doc_page("web", Mode::default(), None, None)
            .unwrap();

        assert_eq!(page.package_name, "web");
        assert!(!page.is_command);
        assert_eq!(page.doc, "Package web serves pages. Extra detail.");
        assert_eq!(page.consts.len(), 1);
        assert_eq!(page.consts[0].name, "DefaultPort");
        assert_eq!(page.types.len(), 1);
        assert_eq!(page.funcs.len(), 1);
        assert_eq!(page.funcs[0].name, "New");
    }

    #[test]
    fn test_methods_attach_to_type() {
        let page = renderer(fixture())
            .doc_page("web", Mode::default(), None, None)
            .unwrap();
        let server = &page.types[0];
        assert_eq!(server.name, "Server");
        assert_eq!(server.methods.len(), 1);
        assert_eq!(server.methods[0].name, "Serve");
    }

    #[test]
    fn test_builtin_mode_lifts_methods() {
        let mode = Mode {
            builtin: true,
            ..Mode::default()
        };
        let page = renderer(fixture()).doc_page("web", mode, None, None).unwrap();
        assert!(page.types[0].methods.is_empty());
        let names: Vec<_> = page.funcs.iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["New", "Serve"]);
    }

    #[test]
    fn test_examples_attach() {
        let page = renderer(fixture())
            .doc_page("web", Mode::default(), None, None)
            .unwrap();

        let new = &page.funcs[0];
        assert_eq!(new.examples.len(), 1);
        assert_eq!(new.examples[0].name, "ExampleNew");

        let server = &page.types[0];
        assert_eq!(server.examples.len(), 1);
        assert_eq!(server.examples[0].label, "basic");
    }

    #[test]
    fn test_bug_notes_collected() {
        let page = renderer(fixture())
            .doc_page("web", Mode::default(), None, None)
            .unwrap();
        assert_eq!(page.bugs, vec!["BUG(web): shutdown is abrupt."]);
    }

    #[test]
    fn test_subdir_listing() {
        let page = renderer(fixture())
            .doc_page("web", Mode::default(), None, None)
            .unwrap();
        assert_eq!(page.subdirs.len(), 1);
        assert_eq!(page.subdirs[0].path, "web/inner");
        assert_eq!(page.subdirs[0].synopsis, "Package inner helps.");
    }

    #[test]
    fn test_unknown_package_404() {
        let err = renderer(fixture())
            .doc_page("nope", Mode::default(), None, None)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_non_go_directory_lists_only() {
        let fs = fixture().with_file("src/docsonly/readme.txt", "hi");
        let page = renderer(fs)
            .doc_page("docsonly", Mode::default(), None, None)
            .unwrap();
        assert!(page.package_name.is_empty());
        assert!(page.types.is_empty());
    }

    #[test]
    fn test_goos_filtering() {
        let fs = MemFs::new()
            .with_file("src/osdep/both.go", "package osdep\n\nfunc Both() {}\n")
            .with_file(
                "src/osdep/windows_only.go",
                "//go:build windows\n\npackage osdep\n\nfunc WindowsOnly() {}\n",
            );
        let r = renderer(fs);

        let page = r.doc_page("osdep", Mode::default(), None, None).unwrap();
        assert_eq!(page.funcs.len(), 1);

        let page = r
            .doc_page("osdep", Mode::default(), Some("windows"), Some("amd64"))
            .unwrap();
        assert_eq!(page.funcs.len(), 2);
    }

    #[test]
    fn test_ignore_fallback_for_commands() {
        let fs = MemFs::new().with_file(
            "src/cmd/tool/doc.go",
            "//go:build ignore\n\n// Tool does tool things.\npackage main\n",
        );
        let page = renderer(fs)
            .doc_page("cmd/tool", Mode::default(), None, None)
            .unwrap();
        assert!(page.is_command);
        assert_eq!(page.doc, "Tool does tool things.");
    }

    #[test]
    fn test_syscall_js_default_target() {
        let fs = MemFs::new().with_file(
            "src/syscall/js/js.go",
            "//go:build js && wasm\n\n// Package js gives access to the WebAssembly host.\npackage js\n",
        );
        let page = renderer(fs)
            .doc_page("syscall/js", Mode::default(), None, None)
            .unwrap();
        assert_eq!(page.goos, "js");
        assert_eq!(page.package_name, "js");
    }

    #[test]
    fn test_mode_from_query() {
        let m = Mode::from_query("all,flat");
        assert!(m.all && m.flat && !m.methods);
        let m = Mode::from_query("bogus,methods");
        assert!(m.methods && !m.all);
        assert_eq!(Mode::from_query(""), Mode::default());
    }
}
