//! Frontmatter parsing from markdown files.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Frontmatter cannot be represented as JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
}

/// Metadata and remaining markdown of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Arbitrary key/value attributes, possibly nested
    pub attributes: Map<String, Value>,

    /// Markdown text after the frontmatter block
    pub body: String,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?ms)\A\x{FEFF}?---[ \t]*\r?\n(.*?)^(?:---|\.\.\.)[ \t]*(?:\r?\n|\z)")
            .expect("valid regex")
    })
}

/// Parse frontmatter from markdown content
///
/// A block opens with `---` on the first line and closes with `---` or `...`.
/// If no complete block is present, the attributes are empty and the body is
/// the full content.
///
/// # Example
///
/// ```
/// use markstache_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\ntemplate: post\n---\n# Hello World\n";
///
/// let fm = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.attributes["title"], "My Post");
/// assert_eq!(fm.body, "# Hello World\n");
/// ```
pub fn parse_frontmatter(content: &str) -> Result<FrontMatter, FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok(FrontMatter {
            attributes: Map::new(),
            body: content.to_string(),
        });
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let end = captures.get(0).map_or(0, |m| m.end());

    Ok(FrontMatter {
        attributes: parse_attributes(yaml)?,
        body: content[end..].to_string(),
    })
}

fn parse_attributes(yaml: &str) -> Result<Map<String, Value>, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }

    let yaml_value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match serde_json::to_value(yaml_value)? {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}
