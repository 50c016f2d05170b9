//! API version database.
//!
//! Parses the plain-text API manifests (`go1.txt`, `go1.7.txt`, …) into a
//! `(package, kind, receiver, name) -> version` table. Manifests are
//! processed in descending version order so that each identifier retains the
//! lowest version it appears in; rows of the base manifest (`go1`) delete
//! the entry entirely: identifiers present in the baseline carry no
//! since-version annotation.
//!
//! The base-manifest rule is only correct when the baseline is complete; an
//! incomplete `go1.txt` would mis-attribute versions to baseline
//! identifiers.

use std::collections::HashMap;

use gw_vfs::Vfs;

use crate::error::DocError;

type Key = (String, String, String, String);

/// Version lookup table for API identifiers.
#[derive(Debug, Default)]
pub struct ApiDb {
    versions: HashMap<Key, String>,
}

impl ApiDb {
    /// An empty database (no annotations anywhere).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `goX.Y.txt` manifest in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be listed or a manifest
    /// cannot be read; malformed rows inside a manifest are skipped.
    pub fn load(vfs: &dyn Vfs, dir: &str) -> Result<Self, DocError> {
        let mut manifests = Vec::new();
        for entry in vfs.read_dir(dir)? {
            if let Some(version) = manifest_version(&entry.name) {
                manifests.push((version, entry.name));
            }
        }
        // Descending order: lowest version processed last wins.
        manifests.sort_by(|a, b| b.0.cmp(&a.0));

        let mut db = Self::default();
        for ((major, minor), name) in manifests {
            let path = gw_vfs::path_join(dir, &name);
            let text = vfs.read_to_string(&path)?;
            let is_base = (major, minor) == (1, 0);
            let version = format!("{major}.{minor}");
            db.add_manifest(&text, &version, is_base);
        }
        Ok(db)
    }

    /// Merge one manifest.
    pub(crate) fn add_manifest(&mut self, text: &str, version: &str, is_base: bool) {
        for line in text.lines() {
            let Some(key) = parse_row(line) else {
                continue;
            };
            if is_base {
                self.versions.remove(&key);
            } else {
                self.versions.insert(key, version.to_owned());
            }
        }
    }

    /// Version in which `(pkg, kind, recv, name)` first appeared, or `None`
    /// for baseline identifiers and unknown rows.
    #[must_use]
    pub fn since(&self, pkg: &str, kind: &str, recv: &str, name: &str) -> Option<&str> {
        let key = (
            pkg.to_owned(),
            kind.to_owned(),
            recv.to_owned(),
            name.to_owned(),
        );
        self.versions.get(&key).map(String::as_str)
    }
}

/// Version from a manifest filename: `go1.txt` -> (1, 0), `go1.12.txt` ->
/// (1, 12). Anything else is not a manifest.
fn manifest_version(name: &str) -> Option<(u32, u32)> {
    let stem = name.strip_prefix("go")?.strip_suffix(".txt")?;
    match stem.split_once('.') {
        Some((major, minor)) => Some((major.parse().ok()?, minor.parse().ok()?)),
        None => Some((stem.parse().ok()?, 0)),
    }
}

/// Parse one manifest row into a lookup key; `None` skips the row.
///
/// Recognized forms:
/// - `pkg net/http, func Get(string) (*Response, error)`
/// - `pkg net/http, type Server struct`
/// - `pkg net/http, type Server struct, Addr string`
/// - `pkg net/http, method (*Client) Do(*Request) (*Response, error)`
fn parse_row(line: &str) -> Option<Key> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let rest = line.strip_prefix("pkg ")?;
    let (pkg, decl) = rest.split_once(", ")?;

    if let Some(rest) = decl.strip_prefix("func ") {
        let name = ident_prefix(rest)?;
        return Some((pkg.to_owned(), "func".to_owned(), String::new(), name));
    }
    if let Some(rest) = decl.strip_prefix("method ") {
        let rest = rest.strip_prefix('(')?;
        let (recv, rest) = rest.split_once(") ")?;
        let recv = recv.trim_start_matches('*').to_owned();
        let name = ident_prefix(rest)?;
        return Some((pkg.to_owned(), "method".to_owned(), recv, name));
    }
    if let Some(rest) = decl.strip_prefix("type ") {
        let name = ident_prefix(rest)?;
        if let Some((_, field_part)) = rest.split_once("struct, ") {
            let field = ident_prefix(field_part)?;
            return Some((pkg.to_owned(), "field".to_owned(), name, field));
        }
        return Some((pkg.to_owned(), "type".to_owned(), String::new(), name));
    }
    None
}

/// Leading identifier of a declaration fragment.
fn ident_prefix(s: &str) -> Option<String> {
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some(s[..end].to_owned())
}
