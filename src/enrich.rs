//! Link enrichment: tag reference-carrying links in a rendered document
//! with resolvable metadata and record which ones the host should
//! intercept instead of navigating.
//!
//! The pass mutates link attributes only. It never rewrites `href`; the
//! host suppresses navigation for links whose disposition is
//! [`LinkDisposition::Intercept`], and the original target stays readable
//! in `data-original-href`.

use crate::classifier;
use crate::config::Config;
use crate::document::{RenderedDocument, RenderedLink};
use crate::observer::CancelToken;
use crate::types::{LinkDisposition, Reference};

/// Container tags that count as genuine body content. A plain content
/// reference outside these is navigational chrome and stays untouched.
const CONTENT_AREA_TAGS: [&str; 6] = ["blockquote", "dd", "li", "p", "td", "th"];

/// Counters describing what one enrichment pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichOutcome {
    /// Links tagged with heading metadata and marked intercepted.
    pub anchors_tagged: usize,
    /// Whether the pass stopped early at a cancellation checkpoint.
    pub cancelled: bool,
    /// Plain content references marked intercepted.
    pub references_tagged: usize,
    /// Links skipped because an earlier pass already marked them.
    pub skipped_already_tagged: usize,
}

/// Run the enrichment pass over a rendered document.
///
/// Idempotent: a link carrying `data-original-href` is left exactly as a
/// previous pass wrote it, so running twice equals running once.
pub fn enrich(doc: &mut RenderedDocument, config: &Config) -> EnrichOutcome {
    enrich_cancellable(doc, config, &CancelToken::new())
}

/// The enrichment pass with a cooperative cancellation checkpoint before
/// every link mutation. A newer pass cancels an older in-flight one so
/// the most recent run stays authoritative; a cancelled pass leaves the
/// remaining links unmodified.
pub fn enrich_cancellable(
    doc: &mut RenderedDocument,
    config: &Config,
    cancel: &CancelToken,
) -> EnrichOutcome {
    // (block index, heading) pairs are cheap to clone up front and free
    // the block list from borrowing across the link mutation loop.
    let headings: Vec<(String, u8, String)> = doc
        .anchor_headings()
        .filter_map(|(_, block)| {
            let id = block.id.clone()?;
            let level = block.level?;
            Some((id, level, block.text.clone()))
        })
        .collect();

    let mut outcome = EnrichOutcome::default();

    for link in &mut doc.links {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        if link.is_intercepted() {
            outcome.skipped_already_tagged = outcome.skipped_already_tagged.saturating_add(1);
            continue;
        }
        if in_excluded_container(link, &config.exclude_containers) {
            continue;
        }

        let reference = classifier::classify(&link.href);
        let Some(anchor_id) = reference.anchor_id() else {
            if is_body_content_reference(link, &reference) {
                mark_intercepted(link);
                link.attrs
                    .insert("data-article-reference".to_string(), "true".to_string());
                outcome.references_tagged = outcome.references_tagged.saturating_add(1);
            }
            continue;
        };

        // First heading in document order wins; later collisions are a
        // known ambiguity of the match ladder and are not re-resolved.
        let matched = headings
            .iter()
            .find(|(id, _, _)| anchor_matches_heading(anchor_id, id));
        if let Some((id, level, text)) = matched {
            mark_intercepted(link);
            link.attrs.insert("data-heading-id".to_string(), id.clone());
            link.attrs
                .insert("data-heading-level".to_string(), level.to_string());
            link.attrs.insert("data-heading-text".to_string(), text.clone());
            outcome.anchors_tagged = outcome.anchors_tagged.saturating_add(1);
        } else if is_body_content_reference(link, &reference) {
            mark_intercepted(link);
            link.attrs
                .insert("data-article-reference".to_string(), "true".to_string());
            outcome.references_tagged = outcome.references_tagged.saturating_add(1);
        }
    }

    outcome
}

/// Strip every attribute an enrichment pass attached, restoring the
/// document's links to their pre-enrichment state.
pub fn unenrich(doc: &mut RenderedDocument) {
    for link in &mut doc.links {
        link.attrs.remove("data-article-reference");
        link.attrs.remove("data-heading-id");
        link.attrs.remove("data-heading-level");
        link.attrs.remove("data-heading-text");
        link.attrs.remove("data-original-href");
    }
}

/// The navigation decision enrichment recorded for a link.
pub fn disposition(link: &RenderedLink) -> LinkDisposition {
    if link.is_intercepted() {
        LinkDisposition::Intercept
    } else {
        LinkDisposition::Passthrough
    }
}

/// Whether an anchor id plausibly resolves to a heading id: an exact
/// match, or the heading id followed by a generated disambiguation
/// suffix (`example` also satisfies `example-1`).
fn anchor_matches_heading(anchor_id: &str, heading_id: &str) -> bool {
    anchor_id == heading_id
        || anchor_id
            .strip_prefix(heading_id)
            .is_some_and(|rest| rest.starts_with('-'))
}

/// Whether the link sits inside a container on the exclusion list.
/// Patterns match a container name exactly or as a substring, so `nav`
/// also excludes `local-nav`.
fn in_excluded_container(link: &RenderedLink, excluded: &[String]) -> bool {
    link.ancestors
        .iter()
        .any(|ancestor| excluded.iter().any(|pattern| ancestor.contains(pattern.as_str())))
}

/// A plain content reference qualifies only when it targets another
/// document and sits inside genuine body content.
fn is_body_content_reference(link: &RenderedLink, reference: &Reference) -> bool {
    reference.target_path().is_some()
        && link
            .ancestors
            .iter()
            .any(|ancestor| CONTENT_AREA_TAGS.contains(&ancestor.as_str()))
}

fn mark_intercepted(link: &mut RenderedLink) {
    link.attrs
        .insert("data-original-href".to_string(), link.href.clone());
}

#[cfg(test)]
mod tests {
    use super::{disposition, enrich, enrich_cancellable, unenrich};
    use crate::config::Config;
    use crate::document::RenderedDocument;
    use crate::observer::CancelToken;
    use crate::types::LinkDisposition;

    fn doc() -> RenderedDocument {
        RenderedDocument::from_markdown(
            "# Title\n\n## Setup\n\nSee [the setup notes](#setup) and \
             [docker](/tech/docker#install).\n\n\
             Also [the article](/life/notes) and [outside](https://example.com).\n",
        )
    }

    #[test]
    fn anchor_links_get_heading_metadata() {
        let mut document = doc();
        let outcome = enrich(&mut document, &Config::default());
        assert_eq!(outcome.anchors_tagged, 1);

        let link = document
            .links
            .iter()
            .find(|l| l.href == "#setup")
            .unwrap();
        assert_eq!(link.attrs.get("data-heading-id").map(String::as_str), Some("setup"));
        assert_eq!(link.attrs.get("data-heading-level").map(String::as_str), Some("2"));
        assert_eq!(link.attrs.get("data-heading-text").map(String::as_str), Some("Setup"));
        assert_eq!(link.attrs.get("data-original-href").map(String::as_str), Some("#setup"));
        assert_eq!(disposition(link), LinkDisposition::Intercept);
    }

    #[test]
    fn cross_document_references_are_marked() {
        let mut document = doc();
        let outcome = enrich(&mut document, &Config::default());
        // The anchor-carrying cross-doc link matches no local heading, so
        // it falls through to the plain content-reference rule.
        assert_eq!(outcome.references_tagged, 2);

        let article = document
            .links
            .iter()
            .find(|l| l.href == "/life/notes")
            .unwrap();
        assert_eq!(
            article.attrs.get("data-article-reference").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn external_links_are_untouched() {
        let mut document = doc();
        enrich(&mut document, &Config::default());
        let external = document
            .links
            .iter()
            .find(|l| l.href == "https://example.com")
            .unwrap();
        assert!(external.attrs.is_empty());
        assert_eq!(disposition(external), LinkDisposition::Passthrough);
    }

    #[test]
    fn enrichment_is_idempotent() {
        let mut document = doc();
        let first = enrich(&mut document, &Config::default());
        let snapshot: Vec<_> = document.links.iter().map(|l| l.attrs.clone()).collect();

        let second = enrich(&mut document, &Config::default());
        let after: Vec<_> = document.links.iter().map(|l| l.attrs.clone()).collect();

        assert_eq!(snapshot, after);
        assert_eq!(second.anchors_tagged, 0);
        assert_eq!(second.references_tagged, 0);
        assert_eq!(
            second.skipped_already_tagged,
            first.anchors_tagged.saturating_add(first.references_tagged)
        );
    }

    #[test]
    fn disambiguation_suffix_matches_base_heading() {
        let mut document = RenderedDocument::from_markdown(
            "## Example\n\nJump to [the second example](#example-1).\n\n## Example\n",
        );
        enrich(&mut document, &Config::default());
        let link = &document.links[0];
        // Document-order precedence: the bare `example` heading satisfies
        // the suffix rule before `example-1` is considered.
        assert_eq!(link.attrs.get("data-heading-id").map(String::as_str), Some("example"));
    }

    #[test]
    fn excluded_containers_suppress_tagging() {
        let mut document = doc();
        for link in &mut document.links {
            link.ancestors = vec!["article-card".to_string()];
        }
        let outcome = enrich(&mut document, &Config::default());
        assert_eq!(outcome.anchors_tagged, 0);
        assert_eq!(outcome.references_tagged, 0);
    }

    #[test]
    fn cancelled_pass_leaves_links_unmodified() {
        let mut document = doc();
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = enrich_cancellable(&mut document, &Config::default(), &cancel);
        assert!(outcome.cancelled);
        assert!(document.links.iter().all(|l| l.attrs.is_empty()));
    }

    #[test]
    fn unenrich_restores_pristine_links() {
        let mut document = doc();
        enrich(&mut document, &Config::default());
        unenrich(&mut document);
        assert!(document.links.iter().all(|l| l.attrs.is_empty()));
    }
}
