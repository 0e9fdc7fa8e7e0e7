//! Build command implementation.

use anyhow::{anyhow, bail, Context, Result};
use markstache_core::{
    Document, Outcome, OutputArtifact, Processor, RenderOptions, RenderOverrides, TocSetting,
};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Arguments of the build command
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub inputs: Vec<PathBuf>,
    pub base: Option<PathBuf>,
    pub out: PathBuf,
    pub templates: Option<PathBuf>,
    pub no_toc: bool,
    pub no_links: bool,
}

impl BuildOptions {
    /// Overrides given on the command line, applied after the config file
    fn overrides(&self) -> RenderOverrides {
        RenderOverrides {
            template_path: self.templates.clone(),
            toc: self.no_toc.then_some(TocSetting::Enabled(false)),
            update_links: self.no_links.then_some(false),
            ..RenderOverrides::default()
        }
    }

    fn base_dir(&self) -> PathBuf {
        if let Some(base) = &self.base {
            return base.clone();
        }
        match self.inputs.first() {
            Some(first) if first.is_dir() => first.clone(),
            Some(first) => first
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            None => PathBuf::new(),
        }
    }
}

/// Render every markdown input and write the pages under the output directory
///
/// Documents are processed independently. A failing document is reported and
/// the build carries on, but the command fails at the end.
pub fn build_pages(config_path: &Path, options: &BuildOptions) -> Result<()> {
    let render_options = load_options(config_path, options)?;
    tracing::debug!("Render options: {:?}", render_options);

    let processor = Processor::new(render_options);
    let base = options.base_dir();
    let sources = collect_sources(&options.inputs)?;

    tracing::info!("Rendering {} documents", sources.len());

    let mut written = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for source in sources {
        match build_page(&processor, &source, &base, &options.out) {
            Ok(true) => written += 1,
            Ok(false) => skipped += 1,
            Err(err) => {
                tracing::error!("{}", err);
                failed += 1;
            }
        }
    }

    tracing::info!("✓ Wrote {} pages ({} skipped)", written, skipped);
    tracing::info!("✓ Output written to {:?}", options.out);

    if failed > 0 {
        bail!("{} document(s) failed to render", failed);
    }

    Ok(())
}

/// Render one source file and write its page, returning whether a page was
/// written
fn build_page(processor: &Processor, source: &Path, base: &Path, out: &Path) -> Result<bool> {
    let contents = fs::read(source)
        .map_err(|err| anyhow!("Failed to read {}: {}", source.display(), err))?;
    let document = Document::new(contents, source, base);

    match processor.process(&document)? {
        Outcome::Emitted(artifact) => {
            write_artifact(out, base, &artifact)?;
            Ok(true)
        }
        Outcome::Skipped(_) => Ok(false),
    }
}

fn load_options(config_path: &Path, options: &BuildOptions) -> Result<RenderOptions> {
    let from_file = if config_path.exists() {
        tracing::info!("Loading config from {:?}", config_path);
        RenderOverrides::from_file(config_path).context("Failed to load configuration")?
    } else {
        tracing::debug!("No config at {:?}, using defaults", config_path);
        RenderOverrides::default()
    };

    let merged = RenderOptions::from_overrides(from_file);
    Ok(RenderOptions::merge(&merged, options.overrides()))
}

/// Markdown files named directly or found under input directories, sorted
/// per directory
fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for input in inputs {
        if input.is_file() {
            sources.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            bail!("Input not found: {}", input.display());
        }

        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("Failed to walk {}", input.display()))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "md") {
                sources.push(path.to_path_buf());
            }
        }
    }

    Ok(sources)
}

fn write_artifact(out: &Path, base: &Path, artifact: &OutputArtifact) -> Result<()> {
    let target = out.join(destination(base, &artifact.path)?);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| anyhow!("Failed to create directory {}: {}", parent.display(), err))?;
    }
    fs::write(&target, &artifact.contents)
        .map_err(|err| anyhow!("Failed to write {}: {}", target.display(), err))?;

    tracing::debug!("Wrote {}", target.display());
    Ok(())
}

/// Location of an artifact inside the output directory
///
/// Paths that climb out with `..` are rejected.
fn destination(base: &Path, path: &Path) -> Result<PathBuf> {
    let relative = if let Ok(relative) = path.strip_prefix(base) {
        relative.to_path_buf()
    } else if path.is_relative() {
        path.to_path_buf()
    } else {
        path.file_name().map(PathBuf::from).unwrap_or_default()
    };

    if relative
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        bail!("Refusing to write outside the output directory: {}", path.display());
    }

    Ok(relative)
}
