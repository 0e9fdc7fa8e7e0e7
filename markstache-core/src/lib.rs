//! # markstache-core
//!
//! Turns markdown documents with YAML frontmatter into pages rendered
//! through mustache templates.
//!
//! This crate provides frontmatter parsing, markdown rendering, link
//! rewriting, TOC generation, and the per-document pipeline tying them
//! together.

pub mod config;
pub mod frontmatter;
pub mod links;
pub mod markdown;
pub mod models;
pub mod pipeline;
pub mod slug;
pub mod toc;

pub use config::{RenderOptions, RenderOverrides, TocSetting};
pub use frontmatter::{parse_frontmatter, FrontMatter};
pub use markdown::{render_markdown, MarkdownOptions, RenderHooks};
pub use models::{
    Batch, Contents, Diagnostic, DiagnosticSeverity, Document, Outcome, OutputArtifact,
};
pub use pipeline::{DocumentError, Processor};
pub use slug::slugify;
pub use toc::TocOptions;
