//! Content index building: scan the authored source tree into the
//! prebuilt index file the loader seeds its cache from.

use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::config::Config;
use crate::document;
use crate::error::Error;

/// Scan the source tree and collect every markdown document's
/// front-matter-stripped body, keyed by its extensionless path relative
/// to the source root with forward slashes. A `BTreeMap` keeps the
/// serialized index deterministic across runs.
///
/// # Errors
///
/// Returns `Error::Io` if a file cannot be read.
pub fn build(root: &Path, config: &Config) -> Result<BTreeMap<String, String>, Error> {
    let source_root = root.join(&config.source_dir);
    let mut entries = BTreeMap::new();

    for entry in WalkDir::new(&source_root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let Ok(relative) = path.strip_prefix(&source_root) else {
            continue;
        };
        let key = relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let raw = std::fs::read_to_string(path)?;
        let body = document::strip_front_matter(&raw).to_string();
        entries.insert(key, body);
    }

    Ok(entries)
}

/// Build the index and write it as JSON to the configured index file.
/// Returns the number of documents indexed.
///
/// # Errors
///
/// Returns `Error::Io` on read/write failure or `Error::Json` if
/// serialization fails.
pub fn write_index_file(root: &Path, config: &Config) -> Result<usize, Error> {
    let entries = build(root, config)?;
    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(root.join(&config.index_file), json)?;
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::{build, write_index_file};
    use crate::cache::ContentIndex;
    use crate::config::Config;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/life")).unwrap();
        std::fs::write(
            dir.path().join("src/life/GTD时间管理.md"),
            "---\ntitle: GTD\n---\n# GTD\n\nbody\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("src/about.md"), "# About\n").unwrap();
        std::fs::write(dir.path().join("src/notes.txt"), "not markdown\n").unwrap();
        dir
    }

    #[test]
    fn index_keys_are_relative_and_extensionless() {
        let dir = project();
        let entries = build(dir.path(), &Config::default()).unwrap();
        let keys: Vec<_> = entries.keys().cloned().collect();
        assert_eq!(keys, vec!["about", "life/GTD时间管理"]);
    }

    #[test]
    fn index_bodies_have_front_matter_stripped() {
        let dir = project();
        let entries = build(dir.path(), &Config::default()).unwrap();
        assert_eq!(entries["life/GTD时间管理"], "# GTD\n\nbody\n");
    }

    #[test]
    fn written_index_seeds_the_cache() {
        let dir = project();
        let config = Config::default();
        let count = write_index_file(dir.path(), &config).unwrap();
        assert_eq!(count, 2);

        let cache = ContentIndex::from_index_file(&dir.path().join(&config.index_file)).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("/life/GTD时间管理"), Some("# GTD\n\nbody\n"));
    }

    #[test]
    fn missing_source_tree_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let entries = build(dir.path(), &Config::default()).unwrap();
        assert!(entries.is_empty());
    }
}
