//! Markdown to HTML rendering with pluggable code and heading hooks.

pub mod highlight;
pub mod hooks;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::fmt;
use std::sync::Arc;

pub use hooks::{default_highlight, DefaultHooks, RenderHooks};

/// Default CSS class prefix for highlighted code blocks
pub const DEFAULT_LANG_PREFIX: &str = "hljs ";

/// Options for the markdown renderer
#[derive(Clone)]
pub struct MarkdownOptions {
    /// Prefix joined with the language name on `<code class="...">`
    pub lang_prefix: String,

    /// Tables, strikethrough, task lists and footnotes
    pub gfm: bool,

    /// Typographic quotes and dashes
    pub smart_punctuation: bool,

    /// Code highlighting and heading rendering
    pub hooks: Arc<dyn RenderHooks>,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            lang_prefix: DEFAULT_LANG_PREFIX.to_string(),
            gfm: true,
            smart_punctuation: false,
            hooks: Arc::new(DefaultHooks),
        }
    }
}

impl fmt::Debug for MarkdownOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownOptions")
            .field("lang_prefix", &self.lang_prefix)
            .field("gfm", &self.gfm)
            .field("smart_punctuation", &self.smart_punctuation)
            .finish_non_exhaustive()
    }
}

impl MarkdownOptions {
    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_FOOTNOTES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }
}

/// Render markdown to HTML
///
/// Headings go through [`RenderHooks::render_heading`] and fenced code
/// blocks through [`RenderHooks::highlight_code`].
///
/// # Example
///
/// ```
/// use markstache_core::markdown::{render_markdown, MarkdownOptions};
///
/// let html = render_markdown("# Hello\n\nSome *text*.", &MarkdownOptions::default());
/// assert!(html.starts_with("<h1>Hello</h1>\n"));
/// assert!(html.contains("<em>text</em>"));
/// ```
pub fn render_markdown(markdown: &str, options: &MarkdownOptions) -> String {
    let parser = Parser::new_ext(markdown, options.parser_options());
    let hooks = options.hooks.as_ref();

    let mut events: Vec<Event> = Vec::new();
    let mut heading: Option<(HeadingLevel, Vec<Event>)> = None;
    let mut code: Option<(Option<String>, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading = Some((level, Vec::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, inner)) = heading.take() {
                    let mut text = String::new();
                    html::push_html(&mut text, inner.into_iter());
                    let rendered = hooks.render_heading(&text, level as u8);
                    events.push(Event::Html(CowStr::from(rendered)));
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                code = Some((lang, String::new()));
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, buffer)) = code.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, buffer)) = code.take() {
                    let rendered = render_code_block(&buffer, lang.as_deref(), options);
                    events.push(Event::Html(CowStr::from(rendered)));
                }
            }
            other => match heading.as_mut() {
                Some((_, inner)) => inner.push(other),
                None => events.push(other),
            },
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

fn render_code_block(code: &str, lang: Option<&str>, options: &MarkdownOptions) -> String {
    let highlighted = options.hooks.highlight_code(code, lang);

    match lang {
        Some(lang) => format!(
            "<pre><code class=\"{}{}\">{}</code></pre>\n",
            html_escape::encode_double_quoted_attribute(&options.lang_prefix),
            html_escape::encode_double_quoted_attribute(lang),
            highlighted
        ),
        None => format!(
            "<pre><code>{}</code></pre>\n",
            html_escape::encode_text(code)
        ),
    }
}
