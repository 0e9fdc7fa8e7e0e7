//! Documents going in, artifacts and diagnostics coming out.

use serde::Serialize;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Raw document content as handed over by the file collaborator
pub enum Contents {
    /// Fully buffered bytes
    Buffer(Vec<u8>),
    /// A reader that has not been drained; rejected by the processor
    Stream(Box<dyn Read + Send>),
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contents::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Contents::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// One input document
#[derive(Debug)]
pub struct Document {
    pub contents: Contents,
    /// Virtual path of the source file
    pub path: PathBuf,
    /// Base directory the path is relative to
    pub base: PathBuf,
}

impl Document {
    /// A buffered document
    pub fn new(
        contents: impl Into<Vec<u8>>,
        path: impl Into<PathBuf>,
        base: impl Into<PathBuf>,
    ) -> Self {
        Self {
            contents: Contents::Buffer(contents.into()),
            path: path.into(),
            base: base.into(),
        }
    }

    /// Path relative to the base, or the full path when outside it
    pub fn relative_path(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }
}

/// A rendered page ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub contents: String,
}

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
}

/// A non-fatal problem found while processing a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub source_path: PathBuf,
    pub context: Option<String>,
}

impl Diagnostic {
    pub fn missing_template(document: &Path, template: &str, template_file: &Path) -> Self {
        Self {
            code: "template.missing".to_string(),
            message: format!(
                "unable to locate '{}' template for '{}' at {}, skipping",
                template,
                document.display(),
                template_file.display()
            ),
            severity: DiagnosticSeverity::Warning,
            source_path: document.to_path_buf(),
            context: Some(template.to_string()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// What happened to a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Emitted(OutputArtifact),
    Skipped(Diagnostic),
}

/// Results of processing a sequence of documents, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub artifacts: Vec<OutputArtifact>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Batch {
    pub fn push(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Emitted(artifact) => self.artifacts.push(artifact),
            Outcome::Skipped(diagnostic) => self.diagnostics.push(diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        let doc = Document::new("x", "/site/src/posts/a.md", "/site/src");
        assert_eq!(doc.relative_path(), Path::new("posts/a.md"));

        let outside = Document::new("x", "/elsewhere/a.md", "/site/src");
        assert_eq!(outside.relative_path(), Path::new("/elsewhere/a.md"));
    }

    #[test]
    fn test_missing_template_diagnostic() {
        let diag = Diagnostic::missing_template(
            Path::new("posts/a.md"),
            "custom",
            Path::new("templates/custom.mustache"),
        );
        assert_eq!(diag.code, "template.missing");
        assert_eq!(diag.context.as_deref(), Some("custom"));
        assert!(diag.message.contains("posts/a.md"));
        assert!(diag.to_string().starts_with("[template.missing]"));
    }

    #[test]
    fn test_batch_sorts_outcomes() {
        let mut batch = Batch::default();
        batch.push(Outcome::Emitted(OutputArtifact {
            path: PathBuf::from("a.html"),
            contents: "a".into(),
        }));
        batch.push(Outcome::Skipped(Diagnostic::missing_template(
            Path::new("b.md"),
            "x",
            Path::new("x.mustache"),
        )));
        assert_eq!(batch.artifacts.len(), 1);
        assert_eq!(batch.diagnostics.len(), 1);
    }
}
