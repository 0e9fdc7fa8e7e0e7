//! Pluggable rendering hooks for code blocks and headings.

use super::highlight::highlight;

/// Rendering capability injected into the markdown renderer
///
/// Both operations have default implementations, so an override only needs to
/// implement the one it changes.
pub trait RenderHooks: Send + Sync {
    /// Highlight a fenced code block. The result is used verbatim when a
    /// language is given; without one the raw code is escaped instead.
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        default_highlight(code, lang)
    }

    /// Render a heading from its inner HTML. No `id` is added here, anchors
    /// belong to the TOC pass.
    fn render_heading(&self, text: &str, level: u8) -> String {
        format!("<h{level}>{text}</h{level}>\n")
    }
}

/// syntect highlighting and plain `<hN>` headings
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl RenderHooks for DefaultHooks {}

/// Highlight with syntect, falling back to escaped code
pub fn default_highlight(code: &str, lang: Option<&str>) -> String {
    lang.and_then(|lang| highlight(code, lang))
        .unwrap_or_else(|| html_escape::encode_text(code).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoudHeadings;

    impl RenderHooks for LoudHeadings {
        fn render_heading(&self, text: &str, level: u8) -> String {
            format!("<h{level} class=\"loud\">{}</h{level}>\n", text.to_uppercase())
        }
    }

    #[test]
    fn test_default_heading_has_no_id() {
        assert_eq!(DefaultHooks.render_heading("Title", 2), "<h2>Title</h2>\n");
    }

    #[test]
    fn test_default_highlight_without_language_escapes() {
        assert_eq!(DefaultHooks.highlight_code("a < b", None), "a &lt; b");
    }

    #[test]
    fn test_partial_override_keeps_other_default() {
        let hooks = LoudHeadings;
        assert_eq!(
            hooks.render_heading("hi", 1),
            "<h1 class=\"loud\">HI</h1>\n"
        );
        assert_eq!(hooks.highlight_code("x", None), "x");
    }
}
