//! Section extraction: capturing a heading's subtree as a fragment.

use regex::Regex;

use crate::document::RenderedDocument;
use crate::locator::LocatedSection;
use crate::types::ContentFragment;

/// A multi-line construct whose boundaries suspend heading detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructKind {
    /// Custom admonition container delimited by `:::` markers.
    Admonition,
    /// Collapsible block delimited by `<details>` / `</details>`.
    Details,
    /// Fenced code block. Diagram fences (mermaid) are flagged separately
    /// since they render as figures, not code.
    FencedCode {
        /// Whether the fence language marks a rendered diagram.
        diagram: bool,
    },
}

impl ConstructKind {
    /// Human-readable name for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            ConstructKind::Admonition => "admonition container (:::)",
            ConstructKind::Details => "details block",
            ConstructKind::FencedCode { diagram: true } => "diagram fence",
            ConstructKind::FencedCode { diagram: false } => "fenced code block",
        }
    }
}

/// An unterminated construct detected during extraction. The synthesized
/// closing marker keeps the fragment well-formed; the warning exists so
/// content authors hear about the malformed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedConstruct {
    /// The construct that was left open.
    pub kind: ConstructKind,
    /// Zero-based line index where the construct was opened.
    pub opened_at: usize,
}

/// The result of extracting a section from raw markup.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The extracted fragment, always structurally well-formed.
    pub fragment: ContentFragment,
    /// Constructs that had to be synthetically closed.
    pub warnings: Vec<MalformedConstruct>,
}

/// Extract the section opened by a located boundary from raw markdown.
///
/// Starting at the boundary heading, lines accumulate until the first
/// heading of level <= the boundary's level that is encountered while no
/// fenced code block, admonition container, or details block is open, or
/// until end of input. A heading-looking line inside an open construct
/// never terminates the section. If the walk ends while a construct is
/// still open, the matching closing marker is synthesized so the fragment
/// stays well-formed, and a warning is recorded per construct.
pub fn extract_from_source(source: &str, located: &LocatedSection) -> Extraction {
    #[allow(clippy::expect_used, reason = "hardcoded patterns are valid")]
    let fence = Regex::new(r"^```(\w*)\s*$").expect("valid regex");
    #[allow(clippy::expect_used, reason = "hardcoded patterns are valid")]
    let heading = Regex::new(r"^(#{2,6})\s+").expect("valid regex");

    let lines: Vec<&str> = source.lines().collect();
    let level = usize::from(located.boundary.level);

    let mut in_code = false;
    let mut fence_lang = String::new();
    let mut fence_opened = 0;
    let mut in_container = false;
    let mut container_opened = 0;
    let mut in_details = false;
    let mut details_opened = 0;

    let mut end = lines.len();
    let mut i = located.line.saturating_add(1);
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if let Some(cap) = fence.captures(trimmed) {
            if in_code {
                in_code = false;
                fence_lang.clear();
            } else {
                in_code = true;
                fence_lang = cap[1].to_string();
                fence_opened = i;
            }
            // The marker line itself belongs to the fragment.
        }

        if trimmed.starts_with(":::") {
            if in_container {
                in_container = false;
            } else {
                in_container = true;
                container_opened = i;
            }
        }

        if trimmed.starts_with("<details") {
            in_details = true;
            details_opened = i;
        }
        if trimmed.starts_with("</details") {
            in_details = false;
        }

        if !in_code && !in_container && !in_details {
            if let Some(cap) = heading.captures(line) {
                if cap[1].len() <= level {
                    end = i;
                    break;
                }
            }
        }

        i = i.saturating_add(1);
    }

    let mut body = lines
        .get(located.line..end)
        .unwrap_or_default()
        .join("\n");
    let mut warnings = Vec::new();

    if in_code {
        body.push_str("\n```");
        warnings.push(MalformedConstruct {
            kind: ConstructKind::FencedCode { diagram: fence_lang == "mermaid" },
            opened_at: fence_opened,
        });
    }
    if in_container {
        body.push_str("\n:::");
        warnings.push(MalformedConstruct {
            kind: ConstructKind::Admonition,
            opened_at: container_opened,
        });
    }
    if in_details {
        body.push_str("\n</details>");
        warnings.push(MalformedConstruct {
            kind: ConstructKind::Details,
            opened_at: details_opened,
        });
    }

    Extraction {
        fragment: ContentFragment {
            body_markup: body,
            title: located.boundary.title.clone(),
        },
        warnings,
    }
}

/// Extract the section opened by the heading at `start` from a rendered
/// document. Multi-line constructs are already grouped into single blocks
/// by the model, so only the heading-level stop condition applies.
pub fn extract_from_rendered(doc: &RenderedDocument, start: usize) -> Option<ContentFragment> {
    let boundary = doc.blocks.get(start)?;
    let level = boundary.level?;
    if !(2..=6).contains(&level) {
        return None;
    }

    let mut parts = vec![boundary.markup.clone()];
    for block in doc.blocks.iter().skip(start.saturating_add(1)) {
        if let Some(block_level) = block.level {
            if block_level <= level {
                break;
            }
        }
        parts.push(block.markup.clone());
    }

    Some(ContentFragment {
        body_markup: parts.join("\n\n"),
        title: boundary.text.clone(),
    })
}

/// Capture a bounded preview window from the top of a rendered document:
/// at most `max_elements` blocks and `max_headings` headings, whichever
/// is reached first. A `...` paragraph marks truncation. Returns `None`
/// when the document has no blocks at all.
pub fn extract_preview_window(
    doc: &RenderedDocument,
    max_elements: usize,
    max_headings: usize,
) -> Option<ContentFragment> {
    if doc.blocks.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    let mut heading_count = 0_usize;

    for block in &doc.blocks {
        if parts.len() >= max_elements {
            break;
        }
        if block.level.is_some() {
            if heading_count >= max_headings {
                break;
            }
            heading_count = heading_count.saturating_add(1);
        }
        parts.push(block.markup.clone());
    }

    if parts.len() < doc.blocks.len() {
        parts.push("...".to_string());
    }

    Some(ContentFragment {
        body_markup: parts.join("\n\n"),
        title: doc.title().unwrap_or("Article preview").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{ConstructKind, extract_from_rendered, extract_from_source, extract_preview_window};
    use crate::document::RenderedDocument;
    use crate::locator::locate_in_source;

    #[test]
    fn section_stops_before_equal_level_heading() {
        let src = "## 一、Intro\n\nopening text\n\n### 1.1 Detail\n\ndetail text\n\n## 二、Next\n\nother\n";
        let located = locate_in_source(src, "一、Intro").unwrap();
        let out = extract_from_source(src, &located);

        assert_eq!(out.fragment.title, "一、Intro");
        assert!(out.fragment.body_markup.starts_with("## 一、Intro"));
        assert!(out.fragment.body_markup.contains("### 1.1 Detail"));
        assert!(out.fragment.body_markup.contains("detail text"));
        assert!(!out.fragment.body_markup.contains("二、Next"));
        assert!(!out.fragment.body_markup.contains("other"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn heading_inside_code_fence_does_not_terminate() {
        let src = "## Usage\n\n```md\n## not a heading\n```\n\nstill usage\n\n## Next\n";
        let located = locate_in_source(src, "Usage").unwrap();
        let out = extract_from_source(src, &located);

        assert!(out.fragment.body_markup.contains("## not a heading"));
        assert!(out.fragment.body_markup.contains("still usage"));
        assert!(!out.fragment.body_markup.contains("## Next"));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn unterminated_fence_is_synthetically_closed() {
        let src = "## Broken\n\n```rust\nlet x = 1;\n## swallowed\n";
        let located = locate_in_source(src, "Broken").unwrap();
        let out = extract_from_source(src, &located);

        // The fragment must re-parse as a closed code block.
        let fences = out.fragment.body_markup.matches("```").count();
        assert_eq!(fences, 2);
        assert!(out.fragment.body_markup.ends_with("```"));
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, ConstructKind::FencedCode { diagram: false });
    }

    #[test]
    fn unterminated_mermaid_fence_is_flagged_as_diagram() {
        let src = "## Flow\n\n```mermaid\ngraph TD\n";
        let located = locate_in_source(src, "Flow").unwrap();
        let out = extract_from_source(src, &located);
        assert_eq!(out.warnings[0].kind, ConstructKind::FencedCode { diagram: true });
    }

    #[test]
    fn heading_inside_admonition_does_not_terminate() {
        let src = "## Tips\n\n::: warning\n## inside\n:::\n\nafter\n\n## Done\n";
        let located = locate_in_source(src, "Tips").unwrap();
        let out = extract_from_source(src, &located);

        assert!(out.fragment.body_markup.contains("## inside"));
        assert!(out.fragment.body_markup.contains("after"));
        assert!(!out.fragment.body_markup.contains("## Done"));
    }

    #[test]
    fn unterminated_details_is_closed() {
        let src = "## FAQ\n\n<details>\n<summary>Q</summary>\nanswer\n";
        let located = locate_in_source(src, "FAQ").unwrap();
        let out = extract_from_source(src, &located);

        assert!(out.fragment.body_markup.ends_with("</details>"));
        assert_eq!(out.warnings[0].kind, ConstructKind::Details);
    }

    #[test]
    fn extraction_runs_to_end_of_document() {
        let src = "## Last\n\nfinal words\n";
        let located = locate_in_source(src, "Last").unwrap();
        let out = extract_from_source(src, &located);
        assert!(out.fragment.body_markup.contains("final words"));
    }

    #[test]
    fn rendered_extraction_respects_levels() {
        let doc = RenderedDocument::from_markdown("## A\n\ntext a\n\n### A1\n\ntext a1\n\n## B\n");
        let frag = extract_from_rendered(&doc, 0).unwrap();
        assert_eq!(frag.title, "A");
        assert!(frag.body_markup.contains("### A1"));
        assert!(!frag.body_markup.contains("## B"));
    }

    #[test]
    fn preview_window_caps_headings() {
        let src = "# T\n\np1\n\n## H2\n\np2\n\n## H3\n\np3\n\n## H4\n\np4\n";
        let doc = RenderedDocument::from_markdown(src);
        let frag = extract_preview_window(&doc, 25, 3).unwrap();

        assert_eq!(frag.title, "T");
        assert!(frag.body_markup.contains("## H3"));
        assert!(!frag.body_markup.contains("## H4"));
        assert!(frag.body_markup.ends_with("..."));
    }

    #[test]
    fn preview_window_caps_elements() {
        let src = "p1\n\np2\n\np3\n\np4\n";
        let doc = RenderedDocument::from_markdown(src);
        let frag = extract_preview_window(&doc, 2, 3).unwrap();
        assert!(frag.body_markup.contains("p2"));
        assert!(!frag.body_markup.contains("p3"));
        assert!(frag.body_markup.ends_with("..."));
    }
}
