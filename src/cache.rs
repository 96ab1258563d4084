//! Session-scoped content index: memoized raw content per document path.
//!
//! Owned by the loader and constructed once per session — never a
//! module-level singleton, so every test gets a fresh one. No TTL and no
//! eviction: content is assumed immutable for the session's duration, and
//! the index is rebuilt on the next session.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Error;

/// Path-keyed raw content store, optionally seeded from a prebuilt JSON
/// index file. At most one entry per normalized path; a later `put` for
/// the same path wins, though overwrites should not occur under the
/// session-immutability assumption.
#[derive(Debug, Default)]
pub struct ContentIndex {
    /// Raw content keyed by normalized document path.
    entries: HashMap<String, String>,
}

impl ContentIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Seed an index from a prebuilt JSON file mapping extensionless
    /// paths to raw content. A missing file yields an empty index — the
    /// direct-fetch fallback covers that case. A present-but-unparsable
    /// file is an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::IndexCorrupt` if the JSON is malformed.
    pub fn from_index_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|e| Error::IndexCorrupt {
                reason: e.to_string(),
            })?;

        let mut index = Self::new();
        for (key, value) in raw {
            index.put(&key, value);
        }
        Ok(index)
    }

    /// Look up raw content for a document path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(&normalize_key(path)).map(String::as_str)
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Store raw content under a normalized path key.
    pub fn put(&mut self, path: &str, content: String) {
        self.entries.insert(normalize_key(path), content);
    }
}

/// Normalize a document path into its cache key: no fragment, no query
/// string, no `.html`/`.md` extension, no leading or trailing slashes.
pub fn normalize_key(path: &str) -> String {
    let without_fragment = path.split('#').next().unwrap_or(path);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let trimmed = without_query.trim_matches('/');
    let without_html = trimmed.strip_suffix(".html").unwrap_or(trimmed);
    let without_md = without_html.strip_suffix(".md").unwrap_or(without_html);
    without_md.to_string()
}

#[cfg(test)]
mod tests {
    use super::{ContentIndex, normalize_key};

    #[test]
    fn keys_are_normalized() {
        assert_eq!(normalize_key("/life/GTD时间管理.md"), "life/GTD时间管理");
        assert_eq!(normalize_key("/a/b/c.html#sec-1"), "a/b/c");
        assert_eq!(normalize_key("a/b?x=1"), "a/b");
        assert_eq!(normalize_key("a/b/"), "a/b");
    }

    #[test]
    fn get_and_put_share_normalization() {
        let mut index = ContentIndex::new();
        index.put("/tech/docker.md", "# Docker\n".to_string());
        assert_eq!(index.get("tech/docker"), Some("# Docker\n"));
        assert_eq!(index.get("/tech/docker.html"), Some("# Docker\n"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn last_put_wins_per_key() {
        let mut index = ContentIndex::new();
        index.put("a", "one".to_string());
        index.put("a/", "two".to_string());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a"), Some("two"));
    }

    #[test]
    fn missing_index_file_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = ContentIndex::from_index_file(&dir.path().join("nope.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn corrupt_index_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markdown-index.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ContentIndex::from_index_file(&path).is_err());
    }

    #[test]
    fn index_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markdown-index.json");
        std::fs::write(&path, r##"{"tech/docker": "# Docker\n"}"##).unwrap();
        let index = ContentIndex::from_index_file(&path).unwrap();
        assert_eq!(index.get("/tech/docker"), Some("# Docker\n"));
    }
}
