//! # markstache CLI
//!
//! Command-line interface for rendering markdown documents into pages.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "markstache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (ignored when absent)
    #[arg(long, default_value = "markstache.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown files to pages
    Build {
        /// Markdown files or directories to render
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Base directory output paths are relative to
        /// (defaults to the first input directory)
        #[arg(long)]
        base: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,

        /// Template directory, overriding the config file
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Disable table of contents generation
        #[arg(long)]
        no_toc: bool,

        /// Keep links to .md files as they are
        #[arg(long)]
        no_links: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build {
            inputs,
            base,
            out,
            templates,
            no_toc,
            no_links,
        } => commands::build_pages(
            &cli.config,
            &commands::BuildOptions {
                inputs,
                base,
                out,
                templates,
                no_toc,
                no_links,
            },
        ),
    }
}
