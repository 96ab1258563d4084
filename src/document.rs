//! Rendered document model: a flat block list plus the links found in it.
//!
//! This is the "document model as a plain argument" that the locator,
//! extractor, and enrichment pass operate on — no live rendering tree.
//! Hosts with a real renderer build the same model from their DOM; the
//! CLI builds it from markdown with `RenderedDocument::from_markdown`.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;

use crate::locator;

/// One block-level element of a rendered document, in document order.
#[derive(Debug, Clone, Default)]
pub struct RenderedBlock {
    /// Stable identifier, present on headings (id attribute or generated slug).
    pub id: Option<String>,
    /// Heading level 1..=6 for heading blocks, `None` otherwise.
    pub level: Option<u8>,
    /// Serialized markup of the block, used verbatim in fragments.
    pub markup: String,
    /// Element tag: `h2`, `p`, `li`, `pre`, `div`, `details`, `blockquote`, `table`.
    pub tag: String,
    /// Plain text content (heading text for headings).
    pub text: String,
}

/// A link found in the document body, with enough surrounding context to
/// classify it: its target and the container chain it sits in.
#[derive(Debug, Clone, Default)]
pub struct RenderedLink {
    /// Container tags enclosing the link, innermost last (e.g. `["table", "td"]`).
    pub ancestors: Vec<String>,
    /// Attached metadata attributes. Enrichment writes `data-*` keys here.
    pub attrs: BTreeMap<String, String>,
    /// The link target as written.
    pub href: String,
}

impl RenderedLink {
    /// Whether enrichment has already marked this link as intercepted.
    pub fn is_intercepted(&self) -> bool {
        self.attrs.contains_key("data-original-href")
    }
}

/// A document's rendered output: blocks in document order and the links
/// they contain.
#[derive(Debug, Clone, Default)]
pub struct RenderedDocument {
    /// Block-level elements in document order.
    pub blocks: Vec<RenderedBlock>,
    /// Links in document order.
    pub links: Vec<RenderedLink>,
}

impl RenderedDocument {
    /// Build a rendered model from raw markdown.
    ///
    /// Line-oriented: headings get generated slug ids (deduplicated with
    /// `-1`, `-2` suffixes), fenced code, `:::` admonition containers,
    /// `<details>` blocks, blockquotes, and tables group into single
    /// blocks, and everything else folds into paragraphs or list items.
    /// Links inside fenced code are not collected.
    pub fn from_markdown(source: &str) -> Self {
        let body = strip_front_matter(source);
        ModelBuilder::new().build(body)
    }

    /// Headings that can serve as anchor targets: level 2..=6 with an id.
    pub fn anchor_headings(&self) -> impl Iterator<Item = (usize, &RenderedBlock)> {
        self.blocks.iter().enumerate().filter(|(_, b)| {
            matches!(b.level, Some(2..=6)) && b.id.is_some()
        })
    }

    /// The document title: text of the first level-1 heading, if any.
    pub fn title(&self) -> Option<&str> {
        self.blocks
            .iter()
            .find(|b| b.level == Some(1))
            .map(|b| b.text.as_str())
    }
}

/// Strip a leading front-matter block (`---` ... `---`) from markdown.
/// Front matter is never interpreted, only removed.
pub fn strip_front_matter(source: &str) -> &str {
    let Some(rest) = source.strip_prefix("---") else {
        return source;
    };
    let Some(end) = rest.find("\n---") else {
        return source;
    };
    let after = &rest[end.saturating_add(4)..];
    after.strip_prefix('\n').unwrap_or(after)
}

/// Stateful builder grouping markdown lines into rendered blocks.
struct ModelBuilder {
    /// Blocks accumulated so far.
    blocks: Vec<RenderedBlock>,
    /// Compiled ATX heading pattern.
    heading: Regex,
    /// Inline markdown link pattern.
    link: Regex,
    /// Links accumulated so far.
    links: Vec<RenderedLink>,
    /// Lines of the paragraph currently being accumulated.
    paragraph: Vec<String>,
    /// Slug usage counts, for `-1`/`-2` disambiguation suffixes.
    slug_uses: HashMap<String, usize>,
}

impl ModelBuilder {
    fn new() -> Self {
        // Both patterns are fixed literals; compile failure is impossible.
        #[allow(clippy::expect_used, reason = "hardcoded patterns are valid")]
        Self {
            blocks: Vec::new(),
            heading: Regex::new(r"^(#{1,6})\s+(.+?)\s*$").expect("valid regex"),
            link: Regex::new(r"\[[^\]]*\]\(([^)]+)\)").expect("valid regex"),
            links: Vec::new(),
            paragraph: Vec::new(),
            slug_uses: HashMap::new(),
        }
    }

    fn build(mut self, body: &str) -> RenderedDocument {
        let lines: Vec<&str> = body.lines().collect();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim();

            if trimmed.is_empty() {
                self.flush_paragraph();
                i = i.saturating_add(1);
                continue;
            }

            if let Some(cap) = self.heading.captures(line) {
                self.flush_paragraph();
                let level = cap[1].len();
                let text = cap[2].to_string();
                self.push_heading(line, level, &text);
                i = i.saturating_add(1);
                continue;
            }

            if trimmed.starts_with("```") {
                self.flush_paragraph();
                i = self.consume_fenced(&lines, i);
                continue;
            }
            if trimmed.starts_with(":::") {
                self.flush_paragraph();
                i = self.consume_delimited(&lines, i, ":::", "div");
                continue;
            }
            if trimmed.starts_with("<details") {
                self.flush_paragraph();
                i = self.consume_delimited(&lines, i, "</details", "details");
                continue;
            }
            if trimmed.starts_with('>') {
                self.flush_paragraph();
                i = self.consume_while(&lines, i, "blockquote", |t| t.starts_with('>'));
                continue;
            }
            if trimmed.starts_with('|') {
                self.flush_paragraph();
                i = self.consume_while(&lines, i, "table", |t| t.starts_with('|'));
                continue;
            }
            if is_list_item(trimmed) {
                self.flush_paragraph();
                self.push_block("li", line, line);
                self.collect_links(line, &["li".to_string()]);
                i = i.saturating_add(1);
                continue;
            }

            self.paragraph.push(line.to_string());
            i = i.saturating_add(1);
        }

        self.flush_paragraph();
        RenderedDocument { blocks: self.blocks, links: self.links }
    }

    /// Pull link hrefs out of a line and record them with their container chain.
    fn collect_links(&mut self, text: &str, ancestors: &[String]) {
        for cap in self.link.captures_iter(text) {
            let raw = cap[1].trim();
            // A link may carry a quoted title after the target.
            let href = raw.split_whitespace().next().unwrap_or(raw).to_string();
            self.links.push(RenderedLink {
                ancestors: ancestors.to_vec(),
                attrs: BTreeMap::new(),
                href,
            });
        }
    }

    /// Consume a delimited block: the opening line through the first line
    /// whose trimmed form starts with `closer`, or end of input.
    fn consume_delimited(
        &mut self,
        lines: &[&str],
        start: usize,
        closer: &str,
        tag: &str,
    ) -> usize {
        let mut end = start.saturating_add(1);
        while end < lines.len() && !lines[end].trim().starts_with(closer) {
            end = end.saturating_add(1);
        }
        let last = if end < lines.len() { end.saturating_add(1) } else { end };
        let markup = lines[start..last].join("\n");
        self.push_block(tag, &markup, &markup);
        self.collect_links(&markup, &[tag.to_string()]);
        last
    }

    /// Consume a fenced code block including both fence lines. No links
    /// are collected from code.
    fn consume_fenced(&mut self, lines: &[&str], start: usize) -> usize {
        let mut end = start.saturating_add(1);
        while end < lines.len() && !lines[end].trim().starts_with("```") {
            end = end.saturating_add(1);
        }
        let last = if end < lines.len() { end.saturating_add(1) } else { end };
        let markup = lines[start..last].join("\n");
        self.push_block("pre", &markup, &markup);
        last
    }

    /// Consume consecutive lines matching `keep` into a single block.
    fn consume_while(
        &mut self,
        lines: &[&str],
        start: usize,
        tag: &str,
        keep: impl Fn(&str) -> bool,
    ) -> usize {
        let mut end = start;
        while end < lines.len() && keep(lines[end].trim()) {
            end = end.saturating_add(1);
        }
        let markup = lines[start..end].join("\n");
        self.push_block(tag, &markup, &markup);
        let chain = if tag == "table" {
            vec!["table".to_string(), "td".to_string()]
        } else {
            vec![tag.to_string()]
        };
        self.collect_links(&markup, &chain);
        end
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let markup = self.paragraph.join("\n");
        self.paragraph.clear();
        self.push_block("p", &markup, &markup);
        self.collect_links(&markup, &["p".to_string()]);
    }

    fn push_block(&mut self, tag: &str, markup: &str, text: &str) {
        self.blocks.push(RenderedBlock {
            id: None,
            level: None,
            markup: markup.to_string(),
            tag: tag.to_string(),
            text: text.to_string(),
        });
    }

    fn push_heading(&mut self, line: &str, level: usize, text: &str) {
        let slug = locator::slugify(text);
        let id = self.unique_slug(&slug);
        let level_u8 = u8::try_from(level).unwrap_or(6);
        self.blocks.push(RenderedBlock {
            id: Some(id),
            level: Some(level_u8),
            markup: line.to_string(),
            tag: format!("h{level_u8}"),
            text: text.to_string(),
        });
        self.collect_links(line, &[format!("h{level_u8}")]);
    }

    /// Disambiguate repeated slugs the way site generators do: the first
    /// occurrence keeps the bare slug, later ones get `-1`, `-2`, ...
    fn unique_slug(&mut self, slug: &str) -> String {
        let count = self.slug_uses.entry(slug.to_string()).or_insert(0);
        let id = if *count == 0 {
            slug.to_string()
        } else {
            format!("{slug}-{count}")
        };
        *count = count.saturating_add(1);
        id
    }
}

/// Check whether a trimmed line opens a bullet or ordered list item.
fn is_list_item(trimmed: &str) -> bool {
    if let Some(rest) = trimmed.strip_prefix(['-', '*', '+']) {
        return rest.starts_with(' ');
    }
    let digits: &str = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    digits.len() < trimmed.len() && digits.starts_with(". ")
}

#[cfg(test)]
mod tests {
    use super::{RenderedDocument, strip_front_matter};

    #[test]
    fn front_matter_is_stripped() {
        let src = "---\ntitle: Hi\ntags: [a]\n---\n# Hi\n";
        assert_eq!(strip_front_matter(src), "# Hi\n");
    }

    #[test]
    fn missing_front_matter_is_untouched() {
        let src = "# Hi\n---\nnot front matter\n";
        assert_eq!(strip_front_matter(src), src);
    }

    #[test]
    fn headings_get_slug_ids() {
        let doc = RenderedDocument::from_markdown("# Title\n\n## Getting Started\n\ntext\n");
        let heads: Vec<_> = doc.anchor_headings().collect();
        assert_eq!(heads.len(), 1);
        assert_eq!(heads[0].1.id.as_deref(), Some("getting-started"));
        assert_eq!(doc.title(), Some("Title"));
    }

    #[test]
    fn repeated_headings_get_suffixes() {
        let doc = RenderedDocument::from_markdown("## Example\n\n## Example\n\n## Example\n");
        let ids: Vec<_> = doc
            .anchor_headings()
            .map(|(_, b)| b.id.clone().unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["example", "example-1", "example-2"]);
    }

    #[test]
    fn cjk_heading_id_survives() {
        let doc = RenderedDocument::from_markdown("## 输出层实现\n");
        let heads: Vec<_> = doc.anchor_headings().collect();
        assert_eq!(heads[0].1.id.as_deref(), Some("输出层实现"));
    }

    #[test]
    fn links_carry_container_chains() {
        let src = "a paragraph with [a link](/tech/docker#setup).\n\n- item [other](/life/notes)\n";
        let doc = RenderedDocument::from_markdown(src);
        assert_eq!(doc.links.len(), 2);
        assert_eq!(doc.links[0].ancestors, vec!["p"]);
        assert_eq!(doc.links[0].href, "/tech/docker#setup");
        assert_eq!(doc.links[1].ancestors, vec!["li"]);
    }

    #[test]
    fn links_inside_code_fences_are_ignored() {
        let src = "```md\n[not a link](/nope)\n```\n";
        let doc = RenderedDocument::from_markdown(src);
        assert!(doc.links.is_empty());
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].tag, "pre");
    }

    #[test]
    fn admonition_groups_into_one_block() {
        let src = "::: tip\ninside\n:::\n\nafter\n";
        let doc = RenderedDocument::from_markdown(src);
        assert_eq!(doc.blocks[0].tag, "div");
        assert!(doc.blocks[0].markup.ends_with(":::"));
        assert_eq!(doc.blocks[1].tag, "p");
    }
}
