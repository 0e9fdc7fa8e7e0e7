//! Heading anchors and table of contents generation.
//!
//! Works on rendered HTML in three steps:
//!
//! 1. [`scan_headings`] tokenizes `<hN attrs>inner</hN>` elements. Level is
//!    the digit in the tag name, `attrs` everything between the tag name and
//!    `>`, and `inner` the markup up to the first matching close tag
//!    (case-insensitive). Headings without a close tag are left alone.
//! 2. [`anchorize`] gives every eligible heading a unique `id` and returns
//!    the rewritten HTML plus one [`HeadingRecord`] per heading.
//! 3. [`build_tree`] nests the records by level and [`render_toc`] turns the
//!    tree into list markup using the templates in [`TocOptions`].

use crate::slug::Slugger;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

/// Options controlling anchoring and TOC markup
///
/// Templates use `{{name}}` placeholders substituted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocOptions {
    /// Lowest heading level that receives an anchor
    pub anchor_min: u8,
    /// Highest heading level that receives an anchor
    pub anchor_max: u8,
    /// Lowest heading level listed in the TOC
    pub toc_min: u8,
    /// Highest heading level listed in the TOC
    pub toc_max: u8,
    /// Heading texts (exact, case-sensitive) that get neither an anchor nor an entry
    pub exclude: Vec<String>,
    /// Anchored heading: `level`, `attrs`, `anchor`, `header`
    pub header: String,
    /// Opening list item: `anchor`, `text` (HTML-escaped), `level`
    pub open_li: String,
    pub close_li: String,
    pub open_ul: String,
    pub close_ul: String,
    /// Whole TOC: `toc`
    pub wrapper: String,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            anchor_min: 1,
            anchor_max: 6,
            toc_min: 1,
            toc_max: 3,
            exclude: vec!["TL;DR".to_string()],
            header: r#"<h{{level}}{{attrs}} id="{{anchor}}">{{header}}</h{{level}}>"#.to_string(),
            open_li: r##"<li><a href="#{{anchor}}">{{text}}</a>"##.to_string(),
            close_li: "</li>".to_string(),
            open_ul: "<ul>".to_string(),
            close_ul: "</ul>".to_string(),
            wrapper: "{{toc}}".to_string(),
        }
    }
}

/// One anchored heading, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRecord {
    pub level: u8,
    /// Attributes as written in the open tag, including leading whitespace
    pub attrs: String,
    /// Inner HTML of the heading
    pub raw_text: String,
    /// Inner text with tags stripped
    pub text: String,
    pub anchor: String,
}

/// A TOC node and the headings nested under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub anchor: String,
    pub text: String,
    pub children: Vec<TocEntry>,
}

/// Result of running the generator over a document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocOutput {
    /// The body with `id` attributes on its headings
    pub body: String,
    /// Rendered TOC markup, empty when there are no entries
    pub toc: String,
}

/// A heading element found in HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingToken {
    /// Byte range of the whole element
    pub span: Range<usize>,
    pub level: u8,
    pub attrs: String,
    pub inner: String,
    /// Value of an `id` attribute already present on the element
    pub existing_id: Option<String>,
}

fn open_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<h([1-6])((?:\s[^>]*)?)>").expect("valid regex"))
}

fn id_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid regex"))
}

/// Find heading elements in document order
pub fn scan_headings(html: &str) -> Vec<HeadingToken> {
    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = open_tag_regex().captures_at(html, cursor) {
        let (Some(open), Some(digit)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let level = digit.as_str().parse::<u8>().unwrap_or(1);
        let attrs = caps.get(2).map_or("", |m| m.as_str());

        let close_tag = format!("</h{}>", level);
        let Some(close_rel) = lower[open.end()..].find(&close_tag) else {
            tracing::trace!("Unclosed <h{}> at byte {}", level, open.start());
            cursor = open.end();
            continue;
        };
        let inner_end = open.end() + close_rel;
        let end = inner_end + close_tag.len();

        tokens.push(HeadingToken {
            span: open.start()..end,
            level,
            attrs: attrs.to_string(),
            inner: html[open.end()..inner_end].to_string(),
            existing_id: existing_id(attrs),
        });
        cursor = end;
    }

    tokens
}

fn existing_id(attrs: &str) -> Option<String> {
    let caps = id_attr_regex().captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Strip tags and decode entities, giving the heading's plain text
pub fn untag(html: &str) -> String {
    let stripped = tag_regex().replace_all(html, "");
    html_escape::decode_html_entities(&stripped).trim().to_string()
}

/// Substitute `{{name}}` placeholders. Unknown names become empty.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let values: HashMap<&str, &str> = values.iter().copied().collect();
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            values.get(&caps[1]).copied().unwrap_or_default().to_string()
        })
        .into_owned()
}

/// Add anchors to headings, returning the new HTML and the heading records
///
/// Headings that already carry an `id` keep it, which makes repeated runs
/// stable. Fresh anchors never collide with existing ids.
pub fn anchorize(html: &str, options: &TocOptions) -> (String, Vec<HeadingRecord>) {
    let tokens: Vec<HeadingToken> = scan_headings(html)
        .into_iter()
        .filter(|token| {
            (options.anchor_min..=options.anchor_max).contains(&token.level)
                && !options.exclude.iter().any(|text| *text == token.inner)
        })
        .collect();

    let mut slugger = Slugger::new();
    for id in tokens.iter().filter_map(|t| t.existing_id.as_deref()) {
        slugger.reserve(id);
    }

    let mut output = String::with_capacity(html.len() + tokens.len() * 16);
    let mut records = Vec::with_capacity(tokens.len());
    let mut cursor = 0;

    for token in tokens {
        let text = untag(&token.inner);
        output.push_str(&html[cursor..token.span.start]);

        let anchor = match &token.existing_id {
            Some(id) => {
                output.push_str(&html[token.span.clone()]);
                id.clone()
            }
            None => {
                let anchor = slugger.next_anchor(&text);
                let level = token.level.to_string();
                output.push_str(&fill(
                    &options.header,
                    &[
                        ("level", level.as_str()),
                        ("attrs", token.attrs.as_str()),
                        ("anchor", anchor.as_str()),
                        ("header", token.inner.as_str()),
                    ],
                ));
                anchor
            }
        };

        cursor = token.span.end;
        records.push(HeadingRecord {
            level: token.level,
            attrs: token.attrs,
            raw_text: token.inner,
            text,
            anchor,
        });
    }

    output.push_str(&html[cursor..]);
    (output, records)
}

/// Nest heading records by level
///
/// Only levels within `toc_min..=toc_max` are considered. A heading more than
/// one level deeper than its predecessor nests exactly one level down.
pub fn build_tree(records: &[HeadingRecord], options: &TocOptions) -> Vec<TocEntry> {
    // Each frame holds the siblings at one nesting depth and their level
    let mut stack: Vec<(u8, Vec<TocEntry>)> = Vec::new();

    for record in records
        .iter()
        .filter(|r| (options.toc_min..=options.toc_max).contains(&r.level))
    {
        let entry = TocEntry {
            level: record.level,
            anchor: record.anchor.clone(),
            text: record.text.clone(),
            children: Vec::new(),
        };

        while stack.len() > 1 && stack.last().is_some_and(|(level, _)| *level > record.level) {
            close_frame(&mut stack);
        }

        match stack.last_mut() {
            Some((level, siblings)) if *level >= record.level => {
                // Only the outermost frame can hold a shallower heading
                *level = (*level).min(record.level);
                siblings.push(entry);
            }
            _ => stack.push((record.level, vec![entry])),
        }
    }

    while stack.len() > 1 {
        close_frame(&mut stack);
    }

    stack.pop().map(|(_, entries)| entries).unwrap_or_default()
}

fn close_frame(stack: &mut Vec<(u8, Vec<TocEntry>)>) {
    if let Some((_, entries)) = stack.pop() {
        if let Some(parent) = stack.last_mut().and_then(|(_, siblings)| siblings.last_mut()) {
            parent.children.extend(entries);
        }
    }
}

/// Render a TOC tree to markup. An empty tree renders as an empty string.
pub fn render_toc(entries: &[TocEntry], options: &TocOptions) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut list = String::new();
    render_list(entries, options, &mut list);
    fill(&options.wrapper, &[("toc", list.as_str())])
}

fn render_list(entries: &[TocEntry], options: &TocOptions, out: &mut String) {
    out.push_str(&options.open_ul);
    for entry in entries {
        let level = entry.level.to_string();
        let text = html_escape::encode_text(&entry.text);
        out.push_str(&fill(
            &options.open_li,
            &[
                ("anchor", entry.anchor.as_str()),
                ("text", &*text),
                ("level", level.as_str()),
            ],
        ));
        if !entry.children.is_empty() {
            render_list(&entry.children, options, out);
        }
        out.push_str(&options.close_li);
    }
    out.push_str(&options.close_ul);
}

/// Anchor the headings of `html` and render its TOC
///
/// # Example
///
/// ```
/// use markstache_core::toc::{generate, TocOptions};
///
/// let out = generate("<h1>Intro</h1><h2>Usage</h2>", &TocOptions::default());
/// assert_eq!(out.body, r#"<h1 id="intro">Intro</h1><h2 id="usage">Usage</h2>"#);
/// assert_eq!(
///     out.toc,
///     r##"<ul><li><a href="#intro">Intro</a><ul><li><a href="#usage">Usage</a></li></ul></li></ul>"##
/// );
/// ```
pub fn generate(html: &str, options: &TocOptions) -> TocOutput {
    let (body, records) = anchorize(html, options);
    let tree = build_tree(&records, options);
    TocOutput {
        body,
        toc: render_toc(&tree, options),
    }
}
