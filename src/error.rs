/// Crate-level error types for peekref diagnostics.
use std::path::PathBuf;

/// All errors in peekref carry enough context to produce a useful
/// diagnostic without a debugger. Each variant names the path, anchor,
/// or reason for failure. Pipeline errors never reach the preview
/// surface raw — the orchestrator converts them into fallback fragments.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No heading matched the anchor id by any addressing style.
    #[error("anchor not found: `{anchor}` in {path}")]
    AnchorNotFound {
        /// The decoded anchor id that was searched for.
        anchor: String,
        /// The document that was searched.
        path: String,
    },

    /// A referenced document exists in neither fetch location.
    #[error("document not found: {path} (tried {})", tried.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    DocumentNotFound {
        /// The normalized document path from the reference.
        path: String,
        /// Filesystem locations that were tried, in order.
        tried: Vec<PathBuf>,
    },

    /// The prebuilt content index exists but cannot be parsed.
    #[error("content index corrupt: {reason}")]
    IndexCorrupt {
        /// Description of the corruption.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of the content index failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A rendered-scrape load exceeded its wall-clock bound with nothing
    /// captured. Partial content is preferred over this error whenever
    /// any exists.
    #[error("load timed out after {waited_ms}ms: {path}")]
    LoadTimeout {
        /// The document that was being rendered.
        path: String,
        /// How long the loader waited before giving up.
        waited_ms: u64,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The filesystem watcher could not be created or attached.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the watcher failure.
        reason: String,
    },
}
