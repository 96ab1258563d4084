use std::path::{Path, PathBuf};

use crate::error::Error;

/// How the document loader obtains another document's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderStrategy {
    /// Fetch raw markup directly (index file, then source tree, then
    /// public tree). Results are cached for the session.
    Direct,
    /// Scrape a rendered snapshot through a pluggable renderer. Used when
    /// the target's final rendering depends on client-side mounting.
    /// Snapshots are page-specific and never cached.
    Rendered,
}

/// Project configuration loaded from `.peekref.toml`.
/// Every field has a default; the file is optional.
#[derive(Debug, Clone)]
pub struct Config {
    /// Container tags whose links are never treated as content references
    /// (navigation chrome, article cards, the preview surface itself).
    pub exclude_containers: Vec<String>,
    /// Prebuilt content index file, relative to the project root.
    pub index_file: PathBuf,
    /// Hard wall-clock bound for a rendered-scrape load, in milliseconds.
    pub load_timeout_ms: u64,
    /// Maximum number of poll cycles before accepting whatever rendered.
    pub max_poll_attempts: u32,
    /// Preview window cap: element count.
    pub max_preview_elements: usize,
    /// Preview window cap: heading count.
    pub max_preview_headings: usize,
    /// Poll cycles that must elapse before rendered content counts as
    /// stable, guarding against partial hydration.
    pub min_poll_cycles: u32,
    /// Interval between rendered-scrape polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Published document tree, the direct-fetch fallback location.
    pub public_dir: PathBuf,
    /// Authored document tree, the direct-fetch primary location.
    pub source_dir: PathBuf,
    /// Loader strategy for cross-document references.
    pub strategy: LoaderStrategy,
}

/// Raw TOML structure for `.peekref.toml`.
#[derive(serde::Deserialize)]
struct PeekrefTomlConfig {
    #[serde(default)]
    exclude_containers: Option<Vec<String>>,
    #[serde(default)]
    index_file: Option<PathBuf>,
    #[serde(default)]
    load_timeout_ms: Option<u64>,
    #[serde(default)]
    max_poll_attempts: Option<u32>,
    #[serde(default)]
    max_preview_elements: Option<usize>,
    #[serde(default)]
    max_preview_headings: Option<usize>,
    #[serde(default)]
    min_poll_cycles: Option<u32>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    public_dir: Option<PathBuf>,
    #[serde(default)]
    source_dir: Option<PathBuf>,
    #[serde(default)]
    strategy: Option<LoaderStrategy>,
}

/// Containers excluded from content-reference classification by default:
/// article cards, their title/read-more links, and navigation surfaces.
fn default_exclude_containers() -> Vec<String> {
    [
        "article-card",
        "article-card-title",
        "article-read-more",
        "local-nav",
        "nav",
        "preview-card",
        "sidebar",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude_containers: default_exclude_containers(),
            index_file: PathBuf::from("markdown-index.json"),
            load_timeout_ms: 8000,
            max_poll_attempts: 15,
            max_preview_elements: 25,
            max_preview_headings: 3,
            min_poll_cycles: 2,
            poll_interval_ms: 200,
            public_dir: PathBuf::from("public"),
            source_dir: PathBuf::from("src"),
            strategy: LoaderStrategy::Direct,
        }
    }
}

impl Config {
    /// Load config from `.peekref.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. Returns an error if
    /// the file exists but is malformed — never silently falls back to
    /// defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".peekref.toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: PeekrefTomlConfig = toml::from_str(&content)?;
        let defaults = Self::default();
        Ok(Self {
            exclude_containers: raw.exclude_containers.unwrap_or(defaults.exclude_containers),
            index_file: raw.index_file.unwrap_or(defaults.index_file),
            load_timeout_ms: raw.load_timeout_ms.unwrap_or(defaults.load_timeout_ms),
            max_poll_attempts: raw.max_poll_attempts.unwrap_or(defaults.max_poll_attempts),
            max_preview_elements: raw
                .max_preview_elements
                .unwrap_or(defaults.max_preview_elements),
            max_preview_headings: raw
                .max_preview_headings
                .unwrap_or(defaults.max_preview_headings),
            min_poll_cycles: raw.min_poll_cycles.unwrap_or(defaults.min_poll_cycles),
            poll_interval_ms: raw.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
            public_dir: raw.public_dir.unwrap_or(defaults.public_dir),
            source_dir: raw.source_dir.unwrap_or(defaults.source_dir),
            strategy: raw.strategy.unwrap_or(defaults.strategy),
        })
    }
}
