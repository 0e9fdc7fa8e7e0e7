//! Rewrite links to markdown sources into links to the published pages.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

fn md_href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"href="([^"]+?)\.md([?#][^"]*)?""#).expect("valid regex")
    })
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+:)?//").expect("valid regex"))
}

/// Replace `.md` with `.html` in every `href` that has no URL scheme
///
/// Query strings and fragments are kept verbatim. Scheme-qualified and
/// protocol-relative links (`https://…`, `//host/…`) are left alone.
///
/// # Example
///
/// ```
/// use markstache_core::links::rewrite_links;
///
/// let html = r#"<a href="guide.md#setup">Guide</a> <a href="https://x.com/a.md">X</a>"#;
/// assert_eq!(
///     rewrite_links(html),
///     r#"<a href="guide.html#setup">Guide</a> <a href="https://x.com/a.md">X</a>"#
/// );
/// ```
pub fn rewrite_links(html: &str) -> Cow<'_, str> {
    md_href_regex().replace_all(html, |caps: &Captures| {
        let path = &caps[1];
        if scheme_regex().is_match(path) {
            return caps[0].to_string();
        }
        let suffix = caps.get(2).map_or("", |m| m.as_str());
        format!(r#"href="{}.html{}""#, path, suffix)
    })
}
