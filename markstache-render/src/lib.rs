//! # markstache-render
//!
//! Mustache rendering for markstache, backed by the `mustache` crate.
//!
//! The view is a `serde_json::Value` and partials are passed as source text
//! by name. The `mustache` crate resolves `{{> name}}` against a directory at
//! compile time, so each compile stages the partials into a scratch
//! directory first.

use mustache::Data;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path};
use tempfile::TempDir;
use thiserror::Error;

/// Partial templates by name, already loaded as source text.
pub type Partials = HashMap<String, String>;

const PARTIAL_EXTENSION: &str = "mustache";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("{0}")]
    Mustache(#[from] mustache::Error),

    #[error("Invalid partial name: '{0}'")]
    PartialName(String),

    #[error("Failed to stage partials: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Cannot render view: {0}")]
    Unrenderable(String),
}

/// A compiled mustache template with its partials resolved
#[derive(Debug, Clone)]
pub struct Template {
    inner: mustache::Template,
}

impl Template {
    /// Compile template source, resolving partials by name
    ///
    /// A partial the template names but `partials` lacks renders as nothing.
    pub fn compile(source: &str, partials: &Partials) -> Result<Self, TemplateError> {
        let scratch = stage_partials(partials)?;
        let context = mustache::Context::new(scratch.path().to_path_buf());
        let inner = context.compile(source.chars())?;
        Ok(Self { inner })
    }

    /// Render against a view
    pub fn render(&self, view: &Value) -> Result<String, TemplateError> {
        let data = to_data(view);

        // mustache panics when a variable tag meets a list or an object
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            self.inner.render_data_to_string(&data)
        }));

        match rendered {
            Ok(result) => Ok(result?),
            Err(payload) => {
                if let Some(reason) = payload.downcast_ref::<String>() {
                    tracing::debug!("Template render aborted: {}", reason);
                }
                Err(TemplateError::Unrenderable(
                    "a variable tag refers to a list or an object".to_string(),
                ))
            }
        }
    }
}

/// Compile and render in one step
///
/// # Example
///
/// ```
/// use markstache_render::{render, Partials};
/// use serde_json::json;
///
/// let view = json!({"title": "A & B", "body": "<p>hi</p>"});
/// let html = render("<h1>{{title}}</h1>{{{body}}}", &view, &Partials::new()).unwrap();
/// assert_eq!(html, "<h1>A &amp; B</h1><p>hi</p>");
/// ```
pub fn render(source: &str, view: &Value, partials: &Partials) -> Result<String, TemplateError> {
    Template::compile(source, partials)?.render(view)
}

/// Write every partial to `<name>.mustache` in a fresh directory
fn stage_partials(partials: &Partials) -> Result<TempDir, TemplateError> {
    let scratch = TempDir::new()?;

    for (name, source) in partials {
        if !is_plain_name(name) {
            return Err(TemplateError::PartialName(name.clone()));
        }
        let file = scratch.path().join(format!("{}.{}", name, PARTIAL_EXTENSION));
        fs::write(&file, source)?;
        tracing::trace!("Staged partial '{}'", name);
    }

    Ok(scratch)
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

/// Convert a JSON view into mustache data
///
/// Falsy values follow mustache.js: `false`, `null` and `""` become null so
/// both sections and inverted sections treat them as absent. `true` becomes
/// the string `"true"`, which keeps sections open and prints as text.
fn to_data(value: &Value) -> Data {
    match value {
        Value::Null | Value::Bool(false) => Data::Null,
        Value::Bool(true) => Data::String("true".to_string()),
        Value::Number(number) => Data::String(number.to_string()),
        Value::String(text) if text.is_empty() => Data::Null,
        Value::String(text) => Data::String(text.clone()),
        Value::Array(items) => Data::Vec(items.iter().map(to_data).collect()),
        Value::Object(map) => Data::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), to_data(value)))
                .collect(),
        ),
    }
}
