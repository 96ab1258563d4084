use std::fmt::Write as _;

use crate::error::Error;
use crate::extractor::MalformedConstruct;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Print malformed-construct warnings to stderr. The preview itself masks
/// these with synthesized closers; the log exists for content authors.
pub fn print_warnings(path: &str, warnings: &[MalformedConstruct]) {
    for w in warnings {
        eprintln!(
            "warning: unterminated {} opened at {path}:{}",
            w.kind.describe(),
            w.opened_at.saturating_add(1)
        );
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened, why, and how to fix it.
/// Designed to be readable by both humans and LLM agents.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::AnchorNotFound { anchor, path } => render_anchor_not_found(anchor, path),
        Error::DocumentNotFound { path, tried } => render_document_not_found(path, tried),
        Error::IndexCorrupt { reason } => render_index_corrupt(reason),
        Error::LoadTimeout { path, waited_ms } => render_load_timeout(path, *waited_ms),
        _ => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    match e {
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: Invalid JSON

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}
"),
        Error::WatchFailed { reason } => format!("\
# Error: Watch Failed

{reason}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    }
}

fn render_anchor_not_found(anchor: &str, path: &str) -> String {
    format!(
        "\
# Error: Anchor Not Found

No heading in `{path}` matches `#{anchor}` by exact id, generated slug,
or partial text.

## Fix

Check the fragment against the document's headings:

    peekref preview \"{path}\"
"
    )
}

fn render_document_not_found(path: &str, tried: &[std::path::PathBuf]) -> String {
    let mut out = format!("\
# Error: Document Not Found

No document satisfies `{path}`.
");

    if !tried.is_empty() {
        out.push_str("\n## Locations tried\n\n");
        for location in tried {
            let _ = writeln!(out, "- `{}`", location.display());
        }
    }

    out.push_str("\
\n## Fix

Rebuild the content index so prebuilt entries cover this path:

    peekref index
");
    out
}

fn render_index_corrupt(reason: &str) -> String {
    format!(
        "\
# Error: Content Index Corrupt

{reason}

## Fix

Regenerate the index file:

    peekref index
"
    )
}

fn render_load_timeout(path: &str, waited_ms: u64) -> String {
    format!(
        "\
# Error: Load Timed Out

Rendering `{path}` produced no stable content within {waited_ms}ms.

## Fix

Raise `load_timeout_ms` in `.peekref.toml`, or switch the loader
strategy while the page's rendering is broken:

    strategy = \"direct\"
"
    )
}

#[cfg(test)]
mod tests {
    use super::render_error;
    use crate::error::Error;

    #[test]
    fn anchor_not_found_names_anchor_and_path() {
        let md = render_error(&Error::AnchorNotFound {
            anchor: "setup".to_string(),
            path: "/tech/docker".to_string(),
        });
        assert!(md.starts_with("# Error: Anchor Not Found"));
        assert!(md.contains("#setup"));
        assert!(md.contains("/tech/docker"));
    }

    #[test]
    fn document_not_found_lists_tried_locations() {
        let md = render_error(&Error::DocumentNotFound {
            path: "/ghost".to_string(),
            tried: vec!["src/ghost.md".into(), "public/ghost.md".into()],
        });
        assert!(md.contains("## Locations tried"));
        assert!(md.contains("src/ghost.md"));
        assert!(md.contains("peekref index"));
    }

    #[test]
    fn load_timeout_suggests_strategy_switch() {
        let md = render_error(&Error::LoadTimeout {
            path: "/tech/docker".to_string(),
            waited_ms: 8000,
        });
        assert!(md.contains("8000ms"));
        assert!(md.contains("strategy = \"direct\""));
    }
}
