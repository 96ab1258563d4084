/// Core domain types for references, section boundaries, and fragments.

/// The result of extraction: a self-contained (title, body) unit suitable
/// for display outside its original document context. Freshly constructed
/// on every resolution; the presenter owns its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment {
    /// Serialized section body: the boundary heading plus everything up to
    /// (excluding) the next heading of equal-or-higher priority.
    pub body_markup: String,
    /// Title of the extracted section or document.
    pub title: String,
}

/// Whether a link's default navigation should be suppressed by the host.
///
/// Enrichment records the decision; suppressing the actual navigation is
/// the host environment's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDisposition {
    /// The link resolves to previewable content; navigation is suppressed.
    Intercept,
    /// The link is left alone.
    Passthrough,
}

/// A classified link intent, derived once per link and immutable after
/// creation. Anchor-carrying variants hold a non-empty, URL-decoded
/// anchor id by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Anchor into another document, such as `/tech/docker#setup`.
    CrossDocAnchor {
        /// Decoded fragment identifier, never empty.
        anchor_id: String,
        /// Normalized document path (no query string, no `.html` suffix).
        target_path: String,
    },
    /// Plain internal link to another document, no fragment.
    CrossDocPlain {
        /// Normalized document path.
        target_path: String,
    },
    /// External scheme or a non-functional placeholder (`#`, `#!`).
    /// The pipeline takes no action for these.
    External,
    /// Anchor within the current document, such as `#setup`.
    SameDocAnchor {
        /// Decoded fragment identifier, never empty.
        anchor_id: String,
    },
}

impl Reference {
    /// The anchor id carried by this reference, if any.
    pub fn anchor_id(&self) -> Option<&str> {
        match self {
            Reference::CrossDocAnchor { anchor_id, .. }
            | Reference::SameDocAnchor { anchor_id } => Some(anchor_id),
            Reference::CrossDocPlain { .. } | Reference::External => None,
        }
    }

    /// The normalized target path carried by this reference, if any.
    pub fn target_path(&self) -> Option<&str> {
        match self {
            Reference::CrossDocAnchor { target_path, .. }
            | Reference::CrossDocPlain { target_path } => Some(target_path),
            Reference::External | Reference::SameDocAnchor { .. } => None,
        }
    }
}

/// One heading in a document, delimiting where a logical section begins.
/// Level-1 headings are never boundaries; they denote whole-document
/// titles. A boundary at level L closes any open section at level >= L.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBoundary {
    /// Stable identifier for the heading (its id, or a generated slug).
    pub identifier: String,
    /// Heading level, always in 2..=6.
    pub level: u8,
    /// Raw heading text.
    pub title: String,
}
