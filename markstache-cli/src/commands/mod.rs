//! CLI command implementations.

pub mod build;

pub use build::{build_pages, BuildOptions};
