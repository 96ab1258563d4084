//! Anchor location: finding the heading a fragment identifier refers to.

use regex::Regex;

use crate::document::RenderedDocument;
use crate::types::SectionBoundary;

/// A located section boundary together with its position in the document.
#[derive(Debug, Clone)]
pub struct LocatedSection {
    /// The heading that opens the section.
    pub boundary: SectionBoundary,
    /// Zero-based line index of the heading in the source.
    pub line: usize,
}

/// ATX heading pattern for anchor targets: levels 2..=6 only. Level-1
/// headings denote whole-document titles and are never anchor targets.
fn heading_pattern() -> Regex {
    #[allow(clippy::expect_used, reason = "hardcoded pattern is valid")]
    Regex::new(r"^(#{2,6})\s+(.+?)\s*$").expect("valid regex")
}

/// Locate the heading an anchor id refers to in raw markdown.
///
/// Three addressing styles are tolerated, tried in precedence order over
/// the whole document: exact heading-text match, generated-slug match,
/// then substring match in either direction. Within one style the first
/// heading in document order wins. Short or repeated heading text can
/// make the substring style ambiguous; the first-in-document-order rule
/// is the only tie-break.
pub fn locate_in_source(source: &str, anchor_id: &str) -> Option<LocatedSection> {
    let pattern = heading_pattern();
    let mut headings: Vec<(usize, u8, String)> = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        if let Some(cap) = pattern.captures(line) {
            let level = u8::try_from(cap[1].len()).unwrap_or(6);
            headings.push((idx, level, cap[2].to_string()));
        }
    }

    let matched = headings
        .iter()
        .find(|(_, _, text)| matches_exact(text, anchor_id))
        .or_else(|| headings.iter().find(|(_, _, text)| matches_slug(text, anchor_id)))
        .or_else(|| headings.iter().find(|(_, _, text)| matches_partial(text, anchor_id)))?;

    let (line, level, text) = matched;
    Some(LocatedSection {
        boundary: SectionBoundary {
            identifier: slugify(text),
            level: *level,
            title: text.clone(),
        },
        line: *line,
    })
}

/// Locate an anchor in a rendered document, returning the block index of
/// the matched heading.
///
/// Direct id lookup is preferred; the heading-text ladder from
/// `locate_in_source` is the fallback.
pub fn locate_in_rendered(doc: &RenderedDocument, anchor_id: &str) -> Option<usize> {
    let by_id = doc
        .anchor_headings()
        .find(|(_, b)| b.id.as_deref() == Some(anchor_id));
    if let Some((idx, _)) = by_id {
        return Some(idx);
    }

    let found = doc
        .anchor_headings()
        .find(|(_, b)| matches_exact(&b.text, anchor_id))
        .or_else(|| doc.anchor_headings().find(|(_, b)| matches_slug(&b.text, anchor_id)))
        .or_else(|| doc.anchor_headings().find(|(_, b)| matches_partial(&b.text, anchor_id)))?;
    Some(found.0)
}

fn matches_exact(heading_text: &str, anchor_id: &str) -> bool {
    heading_text == anchor_id
}

fn matches_partial(heading_text: &str, anchor_id: &str) -> bool {
    heading_text.contains(anchor_id) || anchor_id.contains(heading_text)
}

fn matches_slug(heading_text: &str, anchor_id: &str) -> bool {
    let slug = slugify(heading_text);
    slug == anchor_id || slug == slugify(anchor_id)
}

/// Derive a URL-safe identifier from heading text.
///
/// Lowercase; alphabetic script characters (CJK included) and digits are
/// kept, whitespace runs collapse to single hyphens, all other characters
/// are stripped, and edge hyphens are trimmed.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut result = String::with_capacity(lowered.len());
    let mut prev_hyphen = true; // Start true to trim leading hyphens.

    for c in lowered.chars() {
        if c.is_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
            continue;
        }
        if (c.is_whitespace() || c == '-') && !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{locate_in_rendered, locate_in_source, slugify};
    use crate::document::RenderedDocument;

    #[test]
    fn simple_heading() {
        assert_eq!(slugify("Architecture"), "architecture");
    }

    #[test]
    fn multi_word() {
        assert_eq!(slugify("Getting Started"), "getting-started");
    }

    #[test]
    fn punctuation_is_stripped() {
        assert_eq!(slugify("What's New?"), "whats-new");
    }

    #[test]
    fn cjk_is_preserved() {
        assert_eq!(slugify("一、输出层实现"), "一输出层实现");
    }

    #[test]
    fn consecutive_spaces() {
        assert_eq!(slugify("  Hello   World  "), "hello-world");
    }

    #[test]
    fn exact_match_wins_before_slug_generation() {
        let src = "## 输出层\n\n## 输出层实现\n";
        let located = locate_in_source(src, "输出层实现").unwrap();
        assert_eq!(located.boundary.title, "输出层实现");
        assert_eq!(located.line, 2);
    }

    #[test]
    fn slug_match_finds_heading() {
        let src = "## Getting Started\n\ntext\n";
        let located = locate_in_source(src, "getting-started").unwrap();
        assert_eq!(located.boundary.title, "Getting Started");
        assert_eq!(located.boundary.level, 2);
        assert_eq!(located.boundary.identifier, "getting-started");
    }

    #[test]
    fn substring_match_is_last_resort() {
        let src = "## Installation Guide\n";
        let located = locate_in_source(src, "Installation").unwrap();
        assert_eq!(located.boundary.title, "Installation Guide");
    }

    #[test]
    fn first_in_document_order_breaks_ties() {
        let src = "## Setup\n\n### Setup\n";
        let located = locate_in_source(src, "Setup").unwrap();
        assert_eq!(located.line, 0);
        assert_eq!(located.boundary.level, 2);
    }

    #[test]
    fn level_one_headings_are_never_targets() {
        let src = "# Overview\n\nbody\n";
        assert!(locate_in_source(src, "Overview").is_none());
    }

    #[test]
    fn rendered_lookup_prefers_direct_id() {
        let doc = RenderedDocument::from_markdown("## Example\n\n## Example\n");
        // "example-1" is the disambiguated id of the second heading; text
        // matching alone would have picked the first.
        assert_eq!(locate_in_rendered(&doc, "example-1"), Some(1));
        assert_eq!(locate_in_rendered(&doc, "example"), Some(0));
    }

    #[test]
    fn missing_anchor_is_none() {
        assert!(locate_in_source("## Real\n", "imaginary-section").is_none());
    }
}
