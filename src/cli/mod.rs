//! Command-line interface for genefam.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **merge**: Merge batch files into the catalog
//! - **validate**: Check the catalog's structural invariants
//! - **export**: Write the flat `DB`/`ENTRY` index
//! - **list**: Show the families in the catalog
//!
//! ## Usage
//!
//! ```text
//! # Merge every batch in data/batches
//! genefam merge
//!
//! # Merge one batch file without touching the catalog
//! genefam merge new_families.json --dry-run
//!
//! # Validate, reporting duplicates and bad URLs as warnings only
//! genefam validate --warn-only
//!
//! # Export the index
//! genefam export --output index.bs
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::Config;

pub mod export;
pub mod list;
pub mod merge;
pub mod validate;

#[derive(Parser)]
#[command(name = "genefam")]
#[command(version)]
#[command(about = "Merge, validate and export a gene-family catalog")]
#[command(
    long_about = "genefam maintains a gene-family catalog stored as JSON.\n\nBatch files describing families and their member genes are merged into the catalog without duplicating families or genes. Family ids are assigned once and never change. The catalog can be validated and exported to a flat DB/ENTRY index for search tools."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (defaults to ./genefam.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog file, overriding the configured path
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
}

impl Cli {
    /// Resolve configuration, with command-line flags taking precedence
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref()).context("Failed to load config")?;
        if let Some(catalog) = &self.catalog {
            config.paths.catalog.clone_from(catalog);
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge batch files into the catalog
    Merge(merge::MergeArgs),

    /// Check the catalog for structural problems
    Validate(validate::ValidateArgs),

    /// Write the flat DB/ENTRY index
    Export(export::ExportArgs),

    /// List the families in the catalog
    List(list::ListArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
