//! The filtered directory tree.
//!
//! Navigation and synopsis information come from a recursive walk of the
//! source root. Only directories that contain at least one non-test Go file
//! count as package directories; `testdata`, hidden and underscore-prefixed
//! entries are skipped everywhere, and `internal`/`vendor` elements only
//! appear when the *all* mode is set.

use gw_gosrc::{parse_file, synopsis};
use gw_vfs::{Vfs, VfsError, path_join};

/// One directory in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirNode {
    /// Path relative to the source root (import path).
    pub path: String,
    /// Base name.
    pub name: String,
    /// One-line synopsis from the chosen package comment.
    pub synopsis: String,
    /// True when the directory holds a package (≥1 non-test Go file).
    pub has_pkg: bool,
    /// Child directories, sorted by path.
    pub children: Vec<DirNode>,
}

/// True when a directory entry never appears in the tree.
fn always_skipped(name: &str) -> bool {
    name == "testdata" || name.starts_with('_') || name.starts_with('.')
}

/// True when a directory entry is hidden unless *all* mode is set.
fn internal_only(name: &str) -> bool {
    name == "internal" || name == "vendor"
}

/// True for non-test Go files.
fn is_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.ends_with("_test.go")
}

/// Build the tree rooted at `root` (a VFS path; the node paths are relative
/// to it).
///
/// # Errors
///
/// Returns the listing error for the root; unreadable subdirectories are
/// skipped with a warning.
pub fn build_tree(vfs: &dyn Vfs, root: &str, show_internal: bool) -> Result<DirNode, VfsError> {
    walk(vfs, root, "", "", show_internal)
}

fn walk(
    vfs: &dyn Vfs,
    fs_dir: &str,
    rel_path: &str,
    name: &str,
    show_internal: bool,
) -> Result<DirNode, VfsError> {
    let entries = vfs.read_dir(fs_dir)?;

    let mut go_files = Vec::new();
    let mut children = Vec::new();

    for entry in &entries {
        if entry.is_dir {
            if always_skipped(&entry.name) || (!show_internal && internal_only(&entry.name)) {
                continue;
            }
            let child_fs = path_join(fs_dir, &entry.name);
            let child_rel = if rel_path.is_empty() {
                entry.name.clone()
            } else {
                format!("{rel_path}/{}", entry.name)
            };
            match walk(vfs, &child_fs, &child_rel, &entry.name, show_internal) {
                Ok(node) => {
                    // Keep only subtrees that lead to at least one package.
                    if node.has_pkg || !node.children.is_empty() {
                        children.push(node);
                    }
                }
                Err(e) => {
                    tracing::warn!(dir = %child_fs, error = %e, "skipping unreadable directory");
                }
            }
        } else if is_go_source(&entry.name) {
            go_files.push(entry.name.clone());
        }
    }

    children.sort_by(|a, b| a.path.cmp(&b.path));

    let synopsis = if go_files.is_empty() {
        String::new()
    } else {
        dir_synopsis(vfs, fs_dir, name, &go_files)
    };

    Ok(DirNode {
        path: rel_path.to_owned(),
        name: name.to_owned(),
        synopsis,
        has_pkg: !go_files.is_empty(),
        children,
    })
}

/// Pick the directory synopsis.
///
/// Candidate files are tried in priority order (package named like the
/// directory, then `main`, then anything else) and the first non-empty
/// package comment wins.
fn dir_synopsis(vfs: &dyn Vfs, fs_dir: &str, dir_name: &str, go_files: &[String]) -> String {
    // Rank every file once its package name is known, then take the first
    // non-empty package comment in priority order.
    let mut parsed = Vec::new();
    for file in go_files {
        let path = path_join(fs_dir, file);
        let Ok(src) = vfs.read_to_string(&path) else {
            continue;
        };
        let Ok(parsed_file) = parse_file(&src) else {
            continue;
        };
        let rank = if parsed_file.package == dir_name {
            0
        } else if parsed_file.package == "main" {
            1
        } else {
            2
        };
        parsed.push((rank, parsed_file.package_doc.clone()));
    }
    parsed.sort_by_key(|(rank, _)| *rank);

    parsed
        .into_iter()
        .find(|(_, doc)| !doc.is_empty())
        .map(|(_, doc)| synopsis(&doc))
        .unwrap_or_default()
}

/// Immediate subdirectory listing for a doc page, filtered like the tree.
///
/// # Errors
///
/// Propagates the directory listing error.
pub fn subdirs(vfs: &dyn Vfs, fs_dir: &str, show_internal: bool) -> Result<Vec<DirNode>, VfsError> {
    let mut out = Vec::new();
    for entry in vfs.read_dir(fs_dir)? {
        if !entry.is_dir
            || always_skipped(&entry.name)
            || (!show_internal && internal_only(&entry.name))
        {
            continue;
        }
        let child_fs = path_join(fs_dir, &entry.name);
        let Ok(entries) = vfs.read_dir(&child_fs) else {
            continue;
        };
        let go_files: Vec<String> = entries
            .iter()
            .filter(|e| !e.is_dir && is_go_source(&e.name))
            .map(|e| e.name.clone())
            .collect();
        let synopsis = if go_files.is_empty() {
            String::new()
        } else {
            dir_synopsis(vfs, &child_fs, &entry.name, &go_files)
        };
        out.push(DirNode {
            path: entry.name.clone(),
            name: entry.name.clone(),
            synopsis,
            has_pkg: !go_files.is_empty(),
            children: Vec::new(),
        });
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use gw_vfs::MemFs;
    use pretty_assertions::assert_eq;

    use super::*;

    fn fixture() -> MemFs {
        MemFs::new()
            .with_file(
                "src/fmt/print.go",
                "// Package fmt implements formatted I/O. More detail.\npackage fmt\n",
            )
            .with_file("src/fmt/print_test.go", "package fmt\n")
            .with_file("src/internal/poll/fd.go", "// Package poll hides fds.\npackage poll\n")
            .with_file("src/cmd/gofmt/main.go", "// Gofmt formats Go programs.\npackage main\n")
            .with_file("src/testdata/x.go", "package x\n")
            .with_file("src/_obsolete/y.go", "package y\n")
            .with_file("src/docs/README.md", "not go\n")
    }

    #[test]
    fn test_tree_filters_and_sorts() {
        let fs = fixture();
        let tree = build_tree(&fs, "src", false).unwrap();
        let names: Vec<_> = tree.children.iter().map(|c| c.path.clone()).collect();
        assert_eq!(names, vec!["cmd", "fmt"]);
    }

    #[test]
    fn test_tree_shows_internal_in_all_mode() {
        let fs = fixture();
        let tree = build_tree(&fs, "src", true).unwrap();
        let names: Vec<_> = tree.children.iter().map(|c| c.path.clone()).collect();
        assert_eq!(names, vec!["cmd", "fmt", "internal"]);
    }

    #[test]
    fn test_synopsis_first_sentence() {
        let fs = fixture();
        let tree = build_tree(&fs, "src", false).unwrap();
        let fmt = tree.children.iter().find(|c| c.path == "fmt").unwrap();
        assert_eq!(fmt.synopsis, "Package fmt implements formatted I/O.");
        assert!(fmt.has_pkg);
    }

    #[test]
    fn test_non_package_dir_pruned() {
        let fs = fixture();
        let tree = build_tree(&fs, "src", false).unwrap();
        assert!(!tree.children.iter().any(|c| c.path == "docs"));
    }

    #[test]
    fn test_command_synopsis_from_main_package() {
        let fs = fixture();
        let tree = build_tree(&fs, "src", false).unwrap();
        let cmd = tree.children.iter().find(|c| c.path == "cmd").unwrap();
        let gofmt = cmd.children.iter().find(|c| c.name == "gofmt").unwrap();
        assert_eq!(gofmt.path, "cmd/gofmt");
        assert_eq!(gofmt.synopsis, "Gofmt formats Go programs.");
    }

    #[test]
    fn test_subdirs_listing() {
        let fs = fixture();
        let subs = subdirs(&fs, "src", false).unwrap();
        let names: Vec<_> = subs.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["cmd", "docs", "fmt"]);
        // `docs` holds no Go files but still lists as a plain directory.
        assert!(!subs.iter().find(|s| s.name == "docs").unwrap().has_pkg);
    }
}
