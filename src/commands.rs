//! Core CLI commands for peekref: classify, preview, links, index, watch.

use std::path::{Path, PathBuf};

use crate::classifier;
use crate::config;
use crate::diagnostics;
use crate::document::RenderedDocument;
use crate::enrich;
use crate::error;
use crate::index;
use crate::observer::{self, CancelToken};
use crate::preview::{Presenter, PreviewResolver, Resolved};
use crate::types::{LinkDisposition, Reference};

/// Presenter that prints fragments to stdout as markdown.
struct StdoutPresenter;

impl Presenter for StdoutPresenter {
    fn present(&mut self, resolved: &Resolved) {
        println!("# {}", resolved.fragment.title);
        println!();
        println!("{}", resolved.fragment.body_markup);
        return;
    }
}

/// Print the classification of a single link target.
pub fn classify(href: &str) {
    match classifier::classify(href) {
        Reference::CrossDocAnchor { anchor_id, target_path } => {
            println!("cross-doc anchor  {target_path}#{anchor_id}");
        },
        Reference::CrossDocPlain { target_path } => {
            println!("cross-doc         {target_path}");
        },
        Reference::External => {
            println!("external");
        },
        Reference::SameDocAnchor { anchor_id } => {
            println!("same-doc anchor   #{anchor_id}");
        },
    }
    return;
}

/// Run the full resolution pipeline for one link target and print the
/// resulting fragment. Same-document anchors resolve against `--from`.
///
/// Resolution failures still print a fallback fragment and succeed;
/// only environment errors (bad config, unreadable `--from`) propagate.
///
/// # Errors
///
/// Returns errors from config loading, index seeding, or reading `from`.
pub fn preview(href: &str, from: Option<&Path>) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;
    let mut resolver = PreviewResolver::new(&root, &config)?;

    let current_source = match from {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };

    let mut presenter = StdoutPresenter;
    let resolved = resolver.resolve_and_present(
        href,
        current_source.as_deref(),
        &CancelToken::new(),
        &mut presenter,
    );

    match resolved {
        None => {
            eprintln!("external reference, nothing to preview");
        },
        Some(resolved) => {
            diagnostics::print_warnings(href, &resolved.warnings);
            if let Some(e) = &resolved.error {
                diagnostics::print_error(e);
            }
        },
    }
    return Ok(());
}

/// Build the rendered model for a markdown file, run the enrichment
/// pass, and print each link with its disposition.
///
/// # Errors
///
/// Returns errors from config loading or reading the file.
pub fn links(file: &Path) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;

    let source = std::fs::read_to_string(file)?;
    let mut doc = RenderedDocument::from_markdown(&source);
    let outcome = enrich::enrich(&mut doc, &config);

    print_link_table(&doc);
    eprintln!(
        "{} anchors tagged, {} article references, {} links total",
        outcome.anchors_tagged,
        outcome.references_tagged,
        doc.links.len()
    );
    return Ok(());
}

/// Scan the source tree and write the prebuilt content index file.
///
/// # Errors
///
/// Returns errors from config loading, the tree scan, or writing.
pub fn build_index() -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;

    let count = index::write_index_file(&root, &config)?;
    eprintln!("Indexed {count} documents to {}", config.index_file.display());
    return Ok(());
}

/// Run `links` once, then re-run it on debounced filesystem changes
/// under the watched file's directory and the configured source tree.
///
/// # Errors
///
/// Returns errors from config loading, the initial pass, or watcher setup.
pub fn watch(file: &Path) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;

    run_enrichment_pass(file, &config, &CancelToken::new())?;

    let mut dirs: Vec<PathBuf> = vec![root.join(&config.source_dir)];
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        dirs.push(parent.to_path_buf());
    }

    return observer::watch_and_rerun(&dirs, |cancel| {
        if let Err(e) = run_enrichment_pass(file, &config, cancel) {
            diagnostics::print_error(&e);
        }
    });
}

/// One watchable enrichment pass: rebuild the model and re-enrich. A
/// cancelled pass stops before printing anything.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read.
fn run_enrichment_pass(
    file: &Path,
    config: &config::Config,
    cancel: &CancelToken,
) -> Result<(), error::Error> {
    let source = std::fs::read_to_string(file)?;
    let mut doc = RenderedDocument::from_markdown(&source);
    let outcome = enrich::enrich_cancellable(&mut doc, config, cancel);
    if outcome.cancelled {
        return Ok(());
    }

    print_link_table(&doc);
    eprintln!(
        "{} anchors tagged, {} article references",
        outcome.anchors_tagged, outcome.references_tagged
    );
    return Ok(());
}

/// Print one line per link: disposition column, target, attached metadata.
fn print_link_table(doc: &RenderedDocument) {
    for link in &doc.links {
        match enrich::disposition(link) {
            LinkDisposition::Intercept => {
                let meta = match link.attrs.get("data-heading-id") {
                    Some(id) => {
                        let level = link
                            .attrs
                            .get("data-heading-level")
                            .map_or("?", String::as_str);
                        let text = link
                            .attrs
                            .get("data-heading-text")
                            .map_or("", String::as_str);
                        format!("heading={id} level={level} text=\"{text}\"")
                    },
                    None => "article-reference".to_string(),
                };
                println!("INTERCEPT  {}  {meta}", link.href);
            },
            LinkDisposition::Passthrough => {
                println!("PASS       {}", link.href);
            },
        }
    }
    return;
}
