//! The page map.

use serde_json::{Map, Value};

/// A loaded page: front-matter keys plus the automatic keys the engine
/// sets (`url`, `file`, `file_data`, and `content` during rendering).
///
/// Pages are immutable once built; the cache hands out shared snapshots.
#[derive(Clone, Debug, Default)]
pub struct Page {
    data: Map<String, Value>,
}

impl Page {
    /// Build a page from parsed front-matter and the automatic keys.
    #[must_use]
    pub fn new(mut meta: Map<String, Value>, url: String, file: String, file_data: String) -> Self {
        meta.insert("url".to_owned(), Value::from(url));
        meta.insert("file".to_owned(), Value::from(file));
        meta.insert("file_data".to_owned(), Value::from(file_data));
        Self { data: meta }
    }

    /// The full key/value map (template context).
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Look up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Canonical URL path as computed from the backing file.
    #[must_use]
    pub fn url(&self) -> &str {
        self.get_str("url").unwrap_or("/")
    }

    /// Backing file path.
    #[must_use]
    pub fn file(&self) -> &str {
        self.get_str("file").unwrap_or_default()
    }

    /// Raw body after front-matter extraction.
    #[must_use]
    pub fn file_data(&self) -> &str {
        self.get_str("file_data").unwrap_or_default()
    }

    /// Page title, when set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    /// `redirect` front-matter value, when set and non-empty.
    #[must_use]
    pub fn redirect(&self) -> Option<&str> {
        self.get_str("redirect").filter(|s| !s.is_empty())
    }

    /// `layout` front-matter value ("" when unset).
    #[must_use]
    pub fn layout(&self) -> &str {
        self.get_str("layout").unwrap_or_default()
    }

    /// True when the body should be evaluated as a template first.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.get("template").and_then(Value::as_bool).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn page_with(key: &str, value: Value) -> Page {
        let mut meta = Map::new();
        meta.insert(key.to_owned(), value);
        Page::new(
            meta,
            "/doc/x".to_owned(),
            "doc/x.md".to_owned(),
            "body".to_owned(),
        )
    }

    #[test]
    fn test_automatic_keys() {
        let p = page_with("title", Value::from("X"));
        assert_eq!(p.url(), "/doc/x");
        assert_eq!(p.file(), "doc/x.md");
        assert_eq!(p.file_data(), "body");
        assert_eq!(p.title(), Some("X"));
    }

    #[test]
    fn test_redirect_empty_is_none() {
        let p = page_with("redirect", Value::from(""));
        assert_eq!(p.redirect(), None);
        let p = page_with("redirect", Value::from("/other"));
        assert_eq!(p.redirect(), Some("/other"));
    }

    #[test]
    fn test_template_flag() {
        assert!(!page_with("title", Value::from("x")).is_template());
        assert!(page_with("template", Value::from(true)).is_template());
    }

    #[test]
    fn test_engine_keys_win_over_frontmatter() {
        let mut meta = Map::new();
        meta.insert("url".to_owned(), Value::from("/spoofed"));
        let p = Page::new(meta, "/real".to_owned(), "f.md".to_owned(), String::new());
        assert_eq!(p.url(), "/real");
    }
}
