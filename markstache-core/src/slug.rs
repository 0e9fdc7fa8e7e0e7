//! Anchor slug generation and de-duplication.

use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Fallback anchor for headings whose text has no alphanumerics
pub const EMPTY_SLUG: &str = "section";

/// Convert heading text to an anchor slug
///
/// Rules:
/// - Lowercase
/// - Runs of non-alphanumeric characters become a single hyphen
/// - Leading/trailing hyphens are trimmed
///
/// # Examples
///
/// ```
/// use markstache_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("Subheading 1"), "subheading-1");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for grapheme in input.graphemes(true) {
        let is_word = grapheme
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric());

        if is_word {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push_str(&grapheme.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Hands out unique anchors within one document
///
/// The first use of a slug is returned as is; later uses get `-1`, `-2`, ...
/// appended, skipping any candidate already taken.
#[derive(Debug, Default)]
pub struct Slugger {
    taken: HashSet<String>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an anchor as used without generating it (e.g. an existing `id`)
    pub fn reserve(&mut self, anchor: &str) {
        self.taken.insert(anchor.to_string());
    }

    /// Produce the next unique anchor for the given heading text
    pub fn next_anchor(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = EMPTY_SLUG.to_string();
        }

        let mut candidate = base.clone();
        let mut suffix = 0usize;
        while self.taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}-{}", base, suffix);
        }

        self.taken.insert(candidate.clone());
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Page title"), "page-title");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(slugify("Rust & Safety"), "rust-safety");
        assert_eq!(slugify("C++ Programming"), "c-programming");
        assert_eq!(slugify("What's new?"), "what-s-new");
        assert_eq!(slugify("TL;DR"), "tl-dr");
    }

    #[test]
    fn test_unicode() {
        assert_eq!(slugify("Café"), "café");
        assert_eq!(slugify("naïve Ünïcode"), "naïve-ünïcode");
    }

    #[test]
    fn test_leading_trailing_separators() {
        assert_eq!(slugify("  Hello World  "), "hello-world");
        assert_eq!(slugify("-Leading Hyphen"), "leading-hyphen");
        assert_eq!(slugify("Trailing Hyphen-"), "trailing-hyphen");
    }

    #[test]
    fn test_empty_and_special_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_slugger_suffixes_duplicates() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.next_anchor("Intro"), "intro");
        assert_eq!(slugger.next_anchor("Intro"), "intro-1");
        assert_eq!(slugger.next_anchor("Intro"), "intro-2");
    }

    #[test]
    fn test_slugger_skips_reserved() {
        let mut slugger = Slugger::new();
        slugger.reserve("intro");
        slugger.reserve("intro-1");
        assert_eq!(slugger.next_anchor("Intro"), "intro-2");
    }

    #[test]
    fn test_slugger_empty_text() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.next_anchor("???"), "section");
        assert_eq!(slugger.next_anchor(""), "section-1");
    }
}
