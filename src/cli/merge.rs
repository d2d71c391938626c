use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::catalog::merge::Merger;
use crate::catalog::store::FamilyCatalog;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::core::types;
use crate::parsing::batch::BatchSource;

#[derive(Args)]
pub struct MergeArgs {
    /// Batch files or directories, applied in the order given.
    /// Defaults to the configured batch directory (data/batches)
    pub batches: Vec<PathBuf>,

    /// Do not keep a backup copy of the previous catalog
    #[arg(long)]
    pub no_backup: bool,

    /// Merge and report without writing the catalog
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: MergeArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let scheme = config.url_scheme()?;
    let catalog_path = &config.paths.catalog;

    let base = FamilyCatalog::load_or_empty(catalog_path)?;
    tracing::info!(
        "Loaded {} with {} families",
        catalog_path.display(),
        base.len()
    );

    let sources: Vec<BatchSource> = if args.batches.is_empty() {
        vec![BatchSource::Directory(config.paths.batch_dir.clone())]
    } else {
        args.batches
            .iter()
            .map(|p| BatchSource::from_path(p.clone()))
            .collect()
    };

    let mut batches = Vec::new();
    for source in &sources {
        batches.extend(source.load()?);
    }
    if batches.is_empty() {
        tracing::warn!("No batches to merge");
    }

    let now = types::now();
    let (merged, report) = Merger::new(&scheme, now)
        .with_default_db(config.db.clone())
        .merge(base, &batches)
        .with_context(|| {
            format!(
                "Merge aborted; {} left unchanged",
                catalog_path.display()
            )
        })?;

    let backup = if args.dry_run {
        None
    } else {
        merged.save(catalog_path, config.backup && !args.no_backup, now)?
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "catalog": catalog_path.display().to_string(),
                "written": !args.dry_run,
                "backup": backup.as_ref().map(|p| p.display().to_string()),
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            println!("{report}");
            if args.dry_run {
                println!("Dry run: {} not written", catalog_path.display());
            } else {
                let backup_name = backup
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map_or_else(|| "(none)".to_string(), |n| n.to_string_lossy().into_owned());
                println!(
                    "{} updated. Backup: {}",
                    catalog_path.display(),
                    backup_name
                );
            }
        }
    }

    Ok(())
}
