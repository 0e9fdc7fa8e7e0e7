//! Per-document transformation pipeline
//!
//! Flow: Frontmatter → Markdown → Link rewrite → TOC → Template lookup → Render
//!                                                         ↓ (missing)
//!                                                      Skipped
//!
//! Every call works on its own state; nothing is cached between documents.

use crate::config::{RenderOptions, DEFAULT_TEMPLATE};
use crate::frontmatter::{parse_frontmatter, FrontmatterError};
use crate::links::rewrite_links;
use crate::markdown::render_markdown;
use crate::models::{Batch, Contents, Diagnostic, Document, Outcome, OutputArtifact};
use crate::toc;
use markstache_render::{Partials, TemplateError};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Streaming not supported: {}", .path.display())]
    StreamingNotSupported { path: PathBuf },

    #[error("{}: contents are not valid UTF-8: {source}", .path.display())]
    InvalidUtf8 {
        path: PathBuf,
        source: std::str::Utf8Error,
    },

    #[error("{}: {source}", .path.display())]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },

    #[error("Failed to read partial '{name}' from {}: {source}", .path.display())]
    Partial {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: template '{template}' failed to render: {source}", .path.display())]
    Template {
        path: PathBuf,
        template: String,
        source: TemplateError,
    },
}

/// Options a document sets for itself through its frontmatter
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalOptions {
    template: String,
    toc: bool,
}

impl LocalOptions {
    fn from_attributes(attributes: &Map<String, Value>) -> Self {
        let template = match attributes.get("template") {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => DEFAULT_TEMPLATE.to_string(),
        };
        // Only an explicit `false` turns the TOC off
        let toc = !matches!(attributes.get("toc"), Some(Value::Bool(false)));

        Self { template, toc }
    }
}

/// Turns markdown documents into rendered pages
#[derive(Debug, Clone)]
pub struct Processor {
    options: RenderOptions,
}

impl Processor {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Process one document
    ///
    /// A missing template is not an error: the document is skipped and the
    /// returned [`Outcome::Skipped`] carries the diagnostic.
    pub fn process(&self, document: &Document) -> Result<Outcome, DocumentError> {
        let bytes = match &document.contents {
            Contents::Buffer(bytes) => bytes,
            Contents::Stream(_) => {
                return Err(DocumentError::StreamingNotSupported {
                    path: document.path.clone(),
                })
            }
        };

        let source = std::str::from_utf8(bytes).map_err(|source| DocumentError::InvalidUtf8 {
            path: document.path.clone(),
            source,
        })?;

        let frontmatter =
            parse_frontmatter(source).map_err(|source| DocumentError::Frontmatter {
                path: document.path.clone(),
                source,
            })?;

        let local = LocalOptions::from_attributes(&frontmatter.attributes);
        let output_path = output_path(document, &frontmatter.attributes);
        let mut view = frontmatter.attributes;

        let mut body = render_markdown(&frontmatter.body, &self.options.markdown);

        if self.options.update_links {
            body = rewrite_links(&body).into_owned();
        }

        if let Some(toc_options) = &self.options.toc {
            if local.toc {
                let generated = toc::generate(&body, toc_options);
                body = generated.body;
                view.insert("toc".to_string(), Value::String(generated.toc));
            } else {
                view.remove("toc");
            }
        }

        view.insert("body".to_string(), Value::String(body));

        let template_file = self.options.template_file(&local.template);
        let template = match fs::read_to_string(&template_file) {
            Ok(template) if !template.is_empty() => template,
            Ok(_) => {
                let diagnostic = Diagnostic::missing_template(
                    document.relative_path(),
                    &local.template,
                    &template_file,
                );
                tracing::warn!("{} (template is empty)", diagnostic.message);
                return Ok(Outcome::Skipped(diagnostic));
            }
            Err(err) => {
                let diagnostic = Diagnostic::missing_template(
                    document.relative_path(),
                    &local.template,
                    &template_file,
                );
                tracing::warn!("{} ({})", diagnostic.message, err);
                return Ok(Outcome::Skipped(diagnostic));
            }
        };

        let partials = self.load_partials()?;

        tracing::debug!(
            "Rendering {} with '{}' template (toc: {}) to {}",
            document.relative_path().display(),
            local.template,
            local.toc && self.options.toc.is_some(),
            output_path.display()
        );

        let contents = markstache_render::render(&template, &Value::Object(view), &partials)
            .map_err(|source| DocumentError::Template {
                path: document.path.clone(),
                template: local.template.clone(),
                source,
            })?;

        Ok(Outcome::Emitted(OutputArtifact {
            path: output_path,
            contents,
        }))
    }

    /// Process documents in order, stopping at the first hard error
    pub fn process_all<I>(&self, documents: I) -> Result<Batch, DocumentError>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut batch = Batch::default();
        for document in documents {
            batch.push(self.process(&document)?);
        }
        Ok(batch)
    }

    fn load_partials(&self) -> Result<Partials, DocumentError> {
        let mut partials = Partials::new();
        for (name, path) in &self.options.partials {
            let source = fs::read_to_string(path).map_err(|source| DocumentError::Partial {
                name: name.clone(),
                path: path.clone(),
                source,
            })?;
            partials.insert(name.clone(), source);
        }
        Ok(partials)
    }
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

/// Where a document's page is written
///
/// An explicit `path` attribute is taken relative to the document base.
/// Otherwise a trailing `.md` extension becomes `.html`.
pub fn output_path(document: &Document, attributes: &Map<String, Value>) -> PathBuf {
    if let Some(explicit) = attributes.get("path").and_then(Value::as_str) {
        return document.base.join(explicit.trim_start_matches('/'));
    }

    replace_markdown_extension(&document.path)
}

fn replace_markdown_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == "md" => path.with_extension("html"),
        _ => path.to_path_buf(),
    }
}
