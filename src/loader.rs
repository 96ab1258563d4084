//! Document loading: direct raw-markup fetch and rendered-DOM scraping.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::cache::{self, ContentIndex};
use crate::config::Config;
use crate::document::{self, RenderedDocument};
use crate::error::Error;
use crate::extractor;
use crate::observer::CancelToken;
use crate::types::ContentFragment;

/// Provider of raw document markup — the static-site build's content
/// store, abstracted so the loader never touches the filesystem directly.
pub trait DocumentSource {
    /// Fetch raw markup for a normalized document path.
    ///
    /// # Errors
    ///
    /// Returns `Error::DocumentNotFound` if no location has the document.
    fn fetch(&self, path: &str) -> Result<String, Error>;
}

/// Renderer of a document into an isolated, disposable context. Only one
/// concrete implementation exists per host (a hidden iframe in a browser,
/// a headless render service elsewhere); the loader only depends on this
/// narrow contract.
pub trait DocumentRenderer {
    /// Begin rendering `path` in a fresh isolated context.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be created.
    fn open(&mut self, path: &str) -> Result<(), Error>;

    /// Snapshot the context's current rendered state, or `None` if
    /// nothing has rendered yet.
    fn poll(&mut self) -> Option<RenderedDocument>;

    /// Tear down the isolated context. Must be safe to call repeatedly.
    fn dispose(&mut self);
}

/// Filesystem-backed document source: tries the authored source tree
/// first, then the published output tree.
pub struct FsSource {
    /// Published output tree (fallback location).
    public_dir: PathBuf,
    /// Authored source tree (primary location).
    source_dir: PathBuf,
}

impl FsSource {
    /// Build a source rooted at the project directory.
    pub fn new(root: &Path, config: &Config) -> Self {
        Self {
            public_dir: root.join(&config.public_dir),
            source_dir: root.join(&config.source_dir),
        }
    }
}

impl DocumentSource for FsSource {
    fn fetch(&self, path: &str) -> Result<String, Error> {
        let key = cache::normalize_key(path);
        let candidates = [
            self.source_dir.join(format!("{key}.md")),
            self.public_dir.join(format!("{key}.md")),
        ];

        for candidate in &candidates {
            if let Ok(content) = std::fs::read_to_string(candidate) {
                return Ok(content);
            }
        }

        Err(Error::DocumentNotFound {
            path: path.to_string(),
            tried: candidates.to_vec(),
        })
    }
}

/// The document loader. Owns the session's content index; direct-fetch
/// results are memoized there, rendered-scrape snapshots never are.
///
/// Concurrent duplicate loads cannot be expressed against this type:
/// `load` takes `&mut self`, so the at-most-one-in-flight-load-per-key
/// discipline holds structurally.
pub struct Loader {
    /// Session-scoped raw content cache.
    cache: ContentIndex,
    /// Timing and window configuration.
    config: Config,
    /// Raw markup provider for the direct strategy.
    source: Box<dyn DocumentSource>,
}

impl Loader {
    /// Construct a loader for a project root, seeding the cache from the
    /// prebuilt content index file when one exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexCorrupt` or `Error::Io` from index seeding.
    pub fn new(root: &Path, config: &Config) -> Result<Self, Error> {
        let cache = ContentIndex::from_index_file(&root.join(&config.index_file))?;
        Ok(Self {
            cache,
            config: config.clone(),
            source: Box::new(FsSource::new(root, config)),
        })
    }

    /// Construct a loader over an arbitrary source and pre-seeded cache.
    pub fn with_source(config: &Config, cache: ContentIndex, source: Box<dyn DocumentSource>) -> Self {
        Self { cache, config: config.clone(), source }
    }

    /// The session cache, for inspection.
    pub fn cache(&self) -> &ContentIndex {
        &self.cache
    }

    /// Direct-fetch strategy: return front-matter-stripped raw markup for
    /// a document path, from cache if previously loaded this session.
    ///
    /// # Errors
    ///
    /// Returns `Error::DocumentNotFound` if no location has the document.
    pub fn fetch_raw(&mut self, path: &str) -> Result<String, Error> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(cached.to_string());
        }

        let raw = self.source.fetch(path)?;
        let body = document::strip_front_matter(&raw).to_string();
        self.cache.put(path, body.clone());
        Ok(body)
    }

    /// Rendered-scrape strategy: load `path` in an isolated rendering
    /// context, poll until primary content has mounted (a heading or
    /// paragraph exists and at least `min_poll_cycles` polls elapsed),
    /// then capture a bounded preview window.
    ///
    /// # Errors
    ///
    /// Returns `Error::LoadTimeout` if the wall-clock bound elapses with
    /// nothing captured; partial content is preferred over the error.
    pub fn scrape(
        &self,
        renderer: &mut dyn DocumentRenderer,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<Option<ContentFragment>, Error> {
        let Some(snapshot) = self.scrape_document(renderer, path, cancel)? else {
            return Ok(None);
        };
        Ok(extractor::extract_preview_window(
            &snapshot,
            self.config.max_preview_elements,
            self.config.max_preview_headings,
        ))
    }

    /// Poll an isolated rendering context until its content stabilizes
    /// and return the last snapshot.
    ///
    /// The context is torn down on every exit path — success, timeout,
    /// error, and cancellation. A cancelled call returns `Ok(None)` with
    /// no side effects. Snapshots are page-specific and never cached.
    ///
    /// # Errors
    ///
    /// Returns `Error::LoadTimeout` if the wall-clock bound elapses with
    /// nothing captured.
    pub fn scrape_document(
        &self,
        renderer: &mut dyn DocumentRenderer,
        path: &str,
        cancel: &CancelToken,
    ) -> Result<Option<RenderedDocument>, Error> {
        let guard = RenderGuard { renderer };
        guard.renderer.open(path)?;

        let start = Instant::now();
        let deadline = start
            .checked_add(Duration::from_millis(self.config.load_timeout_ms))
            .unwrap_or(start);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        let mut cycles = 0_u32;
        let mut last: Option<RenderedDocument> = None;

        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            cycles = cycles.saturating_add(1);
            if let Some(snapshot) = guard.renderer.poll() {
                let mounted = has_primary_content(&snapshot);
                last = Some(snapshot);
                if mounted && cycles > self.config.min_poll_cycles {
                    break;
                }
            }
            if cycles >= self.config.max_poll_attempts {
                break;
            }

            let remaining = deadline.saturating_duration_since(now);
            std::thread::sleep(interval.min(remaining));
        }

        let Some(snapshot) = last else {
            let waited_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            return Err(Error::LoadTimeout { path: path.to_string(), waited_ms });
        };

        Ok(Some(snapshot))
    }
}

/// Checkpoint for render stability: primary content has mounted once the
/// snapshot contains a heading or a paragraph.
fn has_primary_content(doc: &RenderedDocument) -> bool {
    doc.blocks.iter().any(|b| b.level.is_some() || b.tag == "p")
}

/// Scoped teardown for an isolated rendering context: disposal runs on
/// every exit path, including early returns and panics in the poll loop.
struct RenderGuard<'a> {
    /// The context being guarded.
    renderer: &'a mut dyn DocumentRenderer,
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.renderer.dispose();
    }
}
