//! The preview resolver: orchestrates classification, loading, location,
//! and extraction into a presenter-ready fragment.
//!
//! This is the pipeline's catch-all boundary. Every failure inside it is
//! converted into a displayable fallback fragment; nothing below this
//! layer surfaces an error to the preview itself.

use std::path::Path;

use crate::classifier;
use crate::config::{Config, LoaderStrategy};
use crate::error::Error;
use crate::extractor::{self, MalformedConstruct};
use crate::loader::{DocumentRenderer, Loader};
use crate::locator;
use crate::observer::CancelToken;
use crate::types::{ContentFragment, Reference};

/// Body shown when no anchor or document satisfied the reference.
const FALLBACK_NOT_FOUND: &str = "Content not found";

/// Body shown when a rendered load exceeded its wall-clock bound.
const FALLBACK_LOAD_FAILED: &str = "Failed to load";

/// A finished resolution: the fragment to present, plus anything the
/// pipeline wants logged on the way. Fallback fragments carry the error
/// that produced them so the host can log it; the fragment itself is
/// always presentable.
#[derive(Debug)]
pub struct Resolved {
    /// The pipeline error behind a fallback fragment, if any.
    pub error: Option<Error>,
    /// The fragment to hand to the presenter.
    pub fragment: ContentFragment,
    /// Malformed constructs masked during extraction. Never shown in the
    /// preview; logged for content authors to fix.
    pub warnings: Vec<MalformedConstruct>,
}

/// Consumer of resolved fragments. The resolver delivers and has no
/// opinion on layout, styling, or dismissal; those belong to the host.
pub trait Presenter {
    /// Display a resolved fragment.
    fn present(&mut self, resolved: &Resolved);
}

/// Orchestrator over one session's loader and optional renderer.
pub struct PreviewResolver {
    /// Timing, window, and strategy configuration.
    config: Config,
    /// Session document loader with its content cache.
    loader: Loader,
    /// Isolated-context renderer for the rendered strategy. When absent,
    /// plain references degrade to the direct strategy.
    renderer: Option<Box<dyn DocumentRenderer>>,
}

impl PreviewResolver {
    /// Construct a resolver for a project root using the direct strategy
    /// machinery (filesystem source, index-seeded cache).
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexCorrupt` or `Error::Io` from index seeding.
    pub fn new(root: &Path, config: &Config) -> Result<Self, Error> {
        let loader = Loader::new(root, config)?;
        Ok(Self { config: config.clone(), loader, renderer: None })
    }

    /// Construct a resolver from pre-built parts.
    pub fn with_parts(
        config: &Config,
        loader: Loader,
        renderer: Option<Box<dyn DocumentRenderer>>,
    ) -> Self {
        Self { config: config.clone(), loader, renderer }
    }

    /// Resolve a link target into a presentable fragment.
    ///
    /// `current_source` is the raw markup of the document containing the
    /// link, consulted for same-document anchors. Returns `None` when the
    /// reference calls for no action at all: external targets, bare
    /// placeholders, and cancelled rendered loads. Every other path
    /// produces a fragment; failures become fallback fragments carrying
    /// their error.
    pub fn resolve(
        &mut self,
        href: &str,
        current_source: Option<&str>,
        cancel: &CancelToken,
    ) -> Option<Resolved> {
        let outcome = match classifier::classify(href) {
            Reference::External => return None,
            Reference::SameDocAnchor { anchor_id } => {
                resolve_in_source(current_source.unwrap_or(""), &anchor_id, "current document")
            },
            Reference::CrossDocAnchor { anchor_id, target_path } => {
                match self.resolve_cross_doc_anchor(&target_path, &anchor_id, cancel) {
                    Ok(Some(resolved)) => Ok(resolved),
                    Ok(None) => return None,
                    Err(error) => Err(error),
                }
            },
            Reference::CrossDocPlain { target_path } => {
                match self.resolve_cross_doc_plain(&target_path, cancel) {
                    Ok(Some(resolved)) => Ok(resolved),
                    Ok(None) => return None,
                    Err(error) => Err(error),
                }
            },
        };

        Some(match outcome {
            Ok(resolved) => resolved,
            Err(error) => fallback(error),
        })
    }

    /// Resolve and deliver in one step. External references reach no
    /// presenter call at all.
    pub fn resolve_and_present(
        &mut self,
        href: &str,
        current_source: Option<&str>,
        cancel: &CancelToken,
        presenter: &mut dyn Presenter,
    ) -> Option<Resolved> {
        let resolved = self.resolve(href, current_source, cancel)?;
        presenter.present(&resolved);
        Some(resolved)
    }

    /// Anchor into another document. Direct strategy: fetch raw markup,
    /// then locate and extract exactly as for a same-document anchor.
    /// Rendered strategy: scrape a snapshot, locate the heading in the
    /// rendered model, and extract its block range. The inner `Option`
    /// is `None` only for a cancelled rendered load.
    fn resolve_cross_doc_anchor(
        &mut self,
        target_path: &str,
        anchor_id: &str,
        cancel: &CancelToken,
    ) -> Result<Option<Resolved>, Error> {
        if self.config.strategy == LoaderStrategy::Rendered {
            if let Some(renderer) = self.renderer.as_mut() {
                let Some(doc) =
                    self.loader.scrape_document(renderer.as_mut(), target_path, cancel)?
                else {
                    return Ok(None);
                };
                let fragment = locator::locate_in_rendered(&doc, anchor_id)
                    .and_then(|start| extractor::extract_from_rendered(&doc, start))
                    .ok_or_else(|| Error::AnchorNotFound {
                        anchor: anchor_id.to_string(),
                        path: target_path.to_string(),
                    })?;
                return Ok(Some(Resolved { error: None, fragment, warnings: Vec::new() }));
            }
            // No renderer available; fall through to the direct strategy.
        }

        let source = self.loader.fetch_raw(target_path)?;
        resolve_in_source(&source, anchor_id, target_path).map(Some)
    }

    /// Plain reference to another document: a bounded preview window of
    /// its top, via the configured strategy. The inner `Option` is `None`
    /// only for a cancelled rendered load.
    fn resolve_cross_doc_plain(
        &mut self,
        target_path: &str,
        cancel: &CancelToken,
    ) -> Result<Option<Resolved>, Error> {
        if self.config.strategy == LoaderStrategy::Rendered {
            if let Some(renderer) = self.renderer.as_mut() {
                let Some(fragment) = self.loader.scrape(renderer.as_mut(), target_path, cancel)?
                else {
                    return Ok(None);
                };
                return Ok(Some(Resolved { error: None, fragment, warnings: Vec::new() }));
            }
            // No renderer available; fall through to the direct strategy.
        }

        let source = self.loader.fetch_raw(target_path)?;
        let doc = crate::document::RenderedDocument::from_markdown(&source);
        let fragment = extractor::extract_preview_window(
            &doc,
            self.config.max_preview_elements,
            self.config.max_preview_headings,
        )
        .ok_or_else(|| Error::DocumentNotFound {
            path: target_path.to_string(),
            tried: Vec::new(),
        })?;
        Ok(Some(Resolved { error: None, fragment, warnings: Vec::new() }))
    }
}

/// Locate an anchor in raw markup and extract its section.
fn resolve_in_source(source: &str, anchor_id: &str, path: &str) -> Result<Resolved, Error> {
    let located = locator::locate_in_source(source, anchor_id).ok_or_else(|| {
        Error::AnchorNotFound { anchor: anchor_id.to_string(), path: path.to_string() }
    })?;
    let extraction = extractor::extract_from_source(source, &located);
    Ok(Resolved {
        error: None,
        fragment: extraction.fragment,
        warnings: extraction.warnings,
    })
}

/// Convert a pipeline error into its displayable fallback fragment.
fn fallback(error: Error) -> Resolved {
    let body = match error {
        Error::LoadTimeout { .. } => FALLBACK_LOAD_FAILED,
        _ => FALLBACK_NOT_FOUND,
    };
    Resolved {
        error: Some(error),
        fragment: ContentFragment {
            body_markup: body.to_string(),
            title: "Preview".to_string(),
        },
        warnings: Vec::new(),
    }
}
