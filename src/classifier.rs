//! Reference classification: deciding what kind of target an href names.

use percent_encoding::percent_decode_str;

use crate::types::Reference;

/// Classify an href into a reference intent.
///
/// External schemes (`http://`, `https://`, `mailto:`) and the placeholder
/// hrefs `#` and `#!` classify as `External` even though the placeholders
/// syntactically contain `#`. Everything else is treated as an internal
/// path, with the fragment (if any) URL-decoded into an anchor id.
pub fn classify(href: &str) -> Reference {
    if href.is_empty() || href == "#" || href == "#!" {
        return Reference::External;
    }
    if is_external_scheme(href) {
        return Reference::External;
    }

    match href.split_once('#') {
        Some(("", fragment)) => {
            let anchor_id = decode_fragment(fragment);
            if anchor_id.is_empty() {
                return Reference::External;
            }
            Reference::SameDocAnchor { anchor_id }
        },
        Some((path, fragment)) => {
            let anchor_id = decode_fragment(fragment);
            let target_path = normalize_target_path(path);
            if anchor_id.is_empty() {
                return Reference::CrossDocPlain { target_path };
            }
            Reference::CrossDocAnchor { anchor_id, target_path }
        },
        None => Reference::CrossDocPlain {
            target_path: normalize_target_path(href),
        },
    }
}

/// URL-decode a fragment identifier. Undecodable bytes fall back to
/// lossy UTF-8 so a mangled anchor still produces a searchable string.
fn decode_fragment(fragment: &str) -> String {
    percent_decode_str(fragment).decode_utf8_lossy().into_owned()
}

/// Check whether an href carries a recognized external scheme.
fn is_external_scheme(href: &str) -> bool {
    href.starts_with("http://") || href.starts_with("https://") || href.starts_with("mailto:")
}

/// Normalize an internal document path: drop the query string, strip a
/// `.html` suffix, trim a trailing slash, and URL-decode the remainder.
fn normalize_target_path(path: &str) -> String {
    let without_query = path.split('?').next().unwrap_or(path);
    let without_html = without_query.strip_suffix(".html").unwrap_or(without_query);
    let trimmed = if without_html.len() > 1 {
        without_html.strip_suffix('/').unwrap_or(without_html)
    } else {
        without_html
    };
    percent_decode_str(trimmed).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::types::Reference;

    #[test]
    fn http_and_mailto_are_external() {
        assert_eq!(classify("http://example.com/a#b"), Reference::External);
        assert_eq!(classify("https://example.com"), Reference::External);
        assert_eq!(classify("mailto:someone@example.com"), Reference::External);
    }

    #[test]
    fn placeholders_are_external() {
        assert_eq!(classify(""), Reference::External);
        assert_eq!(classify("#"), Reference::External);
        assert_eq!(classify("#!"), Reference::External);
    }

    #[test]
    fn bare_fragment_is_same_doc_anchor() {
        assert_eq!(
            classify("#foo"),
            Reference::SameDocAnchor { anchor_id: "foo".to_string() }
        );
    }

    #[test]
    fn encoded_fragment_is_decoded() {
        assert_eq!(
            classify("#%E8%BE%93%E5%87%BA%E5%B1%82%E5%AE%9E%E7%8E%B0"),
            Reference::SameDocAnchor { anchor_id: "输出层实现".to_string() }
        );
    }

    #[test]
    fn cross_doc_anchor_strips_query_and_html_suffix() {
        assert_eq!(
            classify("/a/b/c.html?from=home#sec-1"),
            Reference::CrossDocAnchor {
                anchor_id: "sec-1".to_string(),
                target_path: "/a/b/c".to_string(),
            }
        );
    }

    #[test]
    fn cross_doc_anchor_plain_path() {
        assert_eq!(
            classify("/a/b/c#sec-1"),
            Reference::CrossDocAnchor {
                anchor_id: "sec-1".to_string(),
                target_path: "/a/b/c".to_string(),
            }
        );
    }

    #[test]
    fn internal_path_without_fragment_is_plain() {
        assert_eq!(
            classify("/life/GTD时间管理"),
            Reference::CrossDocPlain { target_path: "/life/GTD时间管理".to_string() }
        );
    }

    #[test]
    fn relative_path_is_plain() {
        assert_eq!(
            classify("tech/docker/"),
            Reference::CrossDocPlain { target_path: "tech/docker".to_string() }
        );
    }

    #[test]
    fn empty_fragment_after_path_degrades_to_plain() {
        assert_eq!(
            classify("/a/b#"),
            Reference::CrossDocPlain { target_path: "/a/b".to_string() }
        );
    }
}
