//! Render options, their defaults, and merging of user overrides.

use crate::markdown::{MarkdownOptions, RenderHooks};
use crate::toc::TocOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Default directory holding `<name>.mustache` templates
pub const DEFAULT_TEMPLATE_PATH: &str = "./templates/";

/// Template used when a document does not name one
pub const DEFAULT_TEMPLATE: &str = "default";

/// File extension of template files
pub const TEMPLATE_EXTENSION: &str = "mustache";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Fully resolved options for processing documents
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory searched for `<template>.mustache`
    pub template_path: PathBuf,

    /// Partial templates, by name, and the files holding them
    pub partials: BTreeMap<String, PathBuf>,

    /// TOC generation, `None` when disabled
    pub toc: Option<TocOptions>,

    /// Rewrite `.md` links to `.html`
    pub update_links: bool,

    pub markdown: MarkdownOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            partials: BTreeMap::new(),
            toc: Some(TocOptions::default()),
            update_links: true,
            markdown: MarkdownOptions::default(),
        }
    }
}

static DEFAULTS: OnceLock<RenderOptions> = OnceLock::new();

/// Built-in defaults, constructed once and never mutated
pub fn defaults() -> &'static RenderOptions {
    DEFAULTS.get_or_init(RenderOptions::default)
}

impl RenderOptions {
    /// Apply overrides on top of a base set of options
    ///
    /// Overrides win. `toc` and `markdown` merge field by field, every other
    /// field is replaced as a whole.
    pub fn merge(base: &RenderOptions, overrides: RenderOverrides) -> RenderOptions {
        let toc = match overrides.toc {
            None => base.toc.clone(),
            Some(TocSetting::Enabled(false)) => None,
            Some(TocSetting::Enabled(true)) => Some(base.toc.clone().unwrap_or_default()),
            Some(TocSetting::Options(toc)) => Some(toc.apply(base.toc.clone().unwrap_or_default())),
        };

        RenderOptions {
            template_path: overrides
                .template_path
                .unwrap_or_else(|| base.template_path.clone()),
            partials: overrides.partials.unwrap_or_else(|| base.partials.clone()),
            toc,
            update_links: overrides.update_links.unwrap_or(base.update_links),
            markdown: overrides
                .markdown
                .unwrap_or_default()
                .apply(base.markdown.clone()),
        }
    }

    /// Merge overrides into the built-in defaults
    pub fn from_overrides(overrides: RenderOverrides) -> RenderOptions {
        Self::merge(defaults(), overrides)
    }

    /// Location of a named template
    pub fn template_file(&self, name: &str) -> PathBuf {
        self.template_path
            .join(format!("{}.{}", name, TEMPLATE_EXTENSION))
    }
}

/// User-supplied options; every field is optional
///
/// Deserializes from YAML with the keys `templatePath`, `partials`, `toc`,
/// `updateLinks` and `markdown`.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderOverrides {
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    #[serde(default)]
    pub partials: Option<BTreeMap<String, PathBuf>>,

    #[serde(default)]
    pub toc: Option<TocSetting>,

    #[serde(default)]
    pub update_links: Option<bool>,

    #[serde(default)]
    pub markdown: Option<MarkdownOverrides>,
}

impl RenderOverrides {
    /// Load overrides from a YAML file
    ///
    /// Relative `templatePath` and partial paths are resolved against the
    /// directory containing the file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut overrides: RenderOverrides = serde_yaml::from_str(&contents)?;

        if let Some(parent) = path.parent() {
            overrides.resolve_relative_to(parent);
        }

        Ok(overrides)
    }

    fn resolve_relative_to(&mut self, dir: &Path) {
        if let Some(template_path) = self.template_path.as_mut() {
            *template_path = resolve_path(dir, template_path.as_path());
        }
        if let Some(partials) = self.partials.as_mut() {
            for path in partials.values_mut() {
                *path = resolve_path(dir, path.as_path());
            }
        }
    }
}

fn resolve_path(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

impl fmt::Debug for RenderOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOverrides")
            .field("template_path", &self.template_path)
            .field("partials", &self.partials)
            .field("toc", &self.toc)
            .field("update_links", &self.update_links)
            .field("markdown", &self.markdown)
            .finish()
    }
}

/// `toc: false`, `toc: true`, or a mapping of TOC options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TocSetting {
    Enabled(bool),
    Options(TocOverrides),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TocOverrides {
    #[serde(default)]
    pub anchor_min: Option<u8>,
    #[serde(default)]
    pub anchor_max: Option<u8>,
    #[serde(default)]
    pub toc_min: Option<u8>,
    #[serde(default)]
    pub toc_max: Option<u8>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default, rename = "openLI")]
    pub open_li: Option<String>,
    #[serde(default, rename = "closeLI")]
    pub close_li: Option<String>,
    #[serde(default, rename = "openUL")]
    pub open_ul: Option<String>,
    #[serde(default, rename = "closeUL")]
    pub close_ul: Option<String>,
    #[serde(default, rename = "TOC")]
    pub wrapper: Option<String>,
}

impl TocOverrides {
    fn apply(self, base: TocOptions) -> TocOptions {
        TocOptions {
            anchor_min: self.anchor_min.unwrap_or(base.anchor_min),
            anchor_max: self.anchor_max.unwrap_or(base.anchor_max),
            toc_min: self.toc_min.unwrap_or(base.toc_min),
            toc_max: self.toc_max.unwrap_or(base.toc_max),
            exclude: self.exclude.unwrap_or(base.exclude),
            header: self.header.unwrap_or(base.header),
            open_li: self.open_li.unwrap_or(base.open_li),
            close_li: self.close_li.unwrap_or(base.close_li),
            open_ul: self.open_ul.unwrap_or(base.open_ul),
            close_ul: self.close_ul.unwrap_or(base.close_ul),
            wrapper: self.wrapper.unwrap_or(base.wrapper),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MarkdownOverrides {
    #[serde(default)]
    pub lang_prefix: Option<String>,

    #[serde(default)]
    pub gfm: Option<bool>,

    #[serde(default)]
    pub smart_punctuation: Option<bool>,

    /// Replacement rendering hooks; code only
    #[serde(skip)]
    pub hooks: Option<Arc<dyn RenderHooks>>,
}

impl MarkdownOverrides {
    fn apply(self, base: MarkdownOptions) -> MarkdownOptions {
        MarkdownOptions {
            lang_prefix: self.lang_prefix.unwrap_or(base.lang_prefix),
            gfm: self.gfm.unwrap_or(base.gfm),
            smart_punctuation: self.smart_punctuation.unwrap_or(base.smart_punctuation),
            hooks: self.hooks.unwrap_or(base.hooks),
        }
    }
}

impl fmt::Debug for MarkdownOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownOverrides")
            .field("lang_prefix", &self.lang_prefix)
            .field("gfm", &self.gfm)
            .field("smart_punctuation", &self.smart_punctuation)
            .field("hooks", &self.hooks.as_ref().map(|_| "custom"))
            .finish()
    }
}
