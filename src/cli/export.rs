use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::catalog::store::FamilyCatalog;
use crate::catalog::validate::Validator;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::export::{export_catalog, render_lines};

#[derive(Args)]
pub struct ExportArgs {
    /// Output file path (defaults to the configured index path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: ExportArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let scheme = config.url_scheme()?;
    let catalog = FamilyCatalog::load_from_file(&config.paths.catalog)?;

    let check = Validator::new(&scheme).validate(&catalog);
    if !check.is_ok() {
        tracing::warn!(
            "{} has {} validation error(s); exporting anyway",
            config.paths.catalog.display(),
            check.error_count()
        );
    }

    let lines = export_catalog(&catalog, &config.db, &scheme);
    let body = render_lines(&lines)?;

    let output = args.output.unwrap_or_else(|| config.paths.index.clone());
    std::fs::write(&output, body)
        .with_context(|| format!("Failed to write index {}", output.display()))?;

    match format {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "output": output.display().to_string(),
                "lines": lines.len(),
                "families": catalog.len(),
                "members": catalog.member_count(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            println!("OK: wrote {} ({} lines)", output.display(), lines.len());
        }
    }

    Ok(())
}
