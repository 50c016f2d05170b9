//! Layout template resolution.

use gw_vfs::{Vfs, path_dir};

/// Resolve a layout name for a page in `page_dir` to a template path.
///
/// - absolute (`/x/y`): that exact file relative to the root
/// - with a slash: relative to the page's directory
/// - bare name: the page's directory, then each parent up to the root
/// - `none`: no layout (returns `None`)
/// - empty: the `default` walk; `None` when no default exists
///
/// The `.tmpl` extension is appended when missing.
#[must_use]
pub fn find_layout(vfs: &dyn Vfs, page_dir: &str, name: &str) -> Option<String> {
    match name {
        "none" => None,
        "" => walk_up(vfs, page_dir, "default"),
        _ => {
            let file = with_ext(name.trim_start_matches('/'));
            if name.starts_with('/') {
                exists(vfs, &file)
            } else if name.contains('/') {
                exists(vfs, &join(page_dir, &file))
            } else {
                walk_up(vfs, page_dir, name)
            }
        }
    }
}

/// Search `dir` and each parent for `<name>.tmpl`.
fn walk_up(vfs: &dyn Vfs, dir: &str, name: &str) -> Option<String> {
    let file = with_ext(name);
    let mut dir = dir.to_owned();
    loop {
        if let Some(found) = exists(vfs, &join(&dir, &file)) {
            return Some(found);
        }
        if dir == "." {
            return None;
        }
        dir = path_dir(&dir).to_owned();
    }
}

fn with_ext(name: &str) -> String {
    if name.ends_with(".tmpl") {
        name.to_owned()
    } else {
        format!("{name}.tmpl")
    }
}

fn join(dir: &str, file: &str) -> String {
    if dir == "." || dir.is_empty() {
        file.to_owned()
    } else {
        format!("{dir}/{file}")
    }
}

fn exists(vfs: &dyn Vfs, path: &str) -> Option<String> {
    vfs.stat(path)
        .ok()
        .filter(|info| !info.is_dir)
        .map(|_| path.to_owned())
}

#[cfg(test)]
mod tests {
    use gw_vfs::MemFs;
    use pretty_assertions::assert_eq;

    use super::*;

    fn fs() -> MemFs {
        MemFs::new()
            .with_file("site.tmpl", "root frame")
            .with_file("default.tmpl", "root default")
            .with_file("doc/article.tmpl", "doc article")
            .with_file("doc/sub/page.md", "x")
    }

    #[test]
    fn test_bare_name_walks_up() {
        let fs = fs();
        assert_eq!(
            find_layout(&fs, "doc/sub", "article"),
            Some("doc/article.tmpl".to_owned())
        );
        assert_eq!(
            find_layout(&fs, "doc/sub", "site"),
            Some("site.tmpl".to_owned())
        );
    }

    #[test]
    fn test_nearest_wins() {
        let fs = fs().with_file("doc/sub/article.tmpl", "closer");
        assert_eq!(
            find_layout(&fs, "doc/sub", "article"),
            Some("doc/sub/article.tmpl".to_owned())
        );
    }

    #[test]
    fn test_absolute_path() {
        let fs = fs();
        assert_eq!(
            find_layout(&fs, "doc/sub", "/doc/article"),
            Some("doc/article.tmpl".to_owned())
        );
        assert_eq!(find_layout(&fs, "doc/sub", "/missing"), None);
    }

    #[test]
    fn test_relative_with_slash() {
        let fs = fs().with_file("doc/sub/frames/special.tmpl", "x");
        assert_eq!(
            find_layout(&fs, "doc/sub", "frames/special"),
            Some("doc/sub/frames/special.tmpl".to_owned())
        );
    }

    #[test]
    fn test_none_is_no_layout() {
        assert_eq!(find_layout(&fs(), "doc/sub", "none"), None);
    }

    #[test]
    fn test_empty_finds_default() {
        assert_eq!(
            find_layout(&fs(), "doc/sub", ""),
            Some("default.tmpl".to_owned())
        );
    }

    #[test]
    fn test_empty_without_default() {
        let fs = MemFs::new().with_file("doc/page.md", "x");
        assert_eq!(find_layout(&fs, "doc", ""), None);
    }
}
