use clap::Args;

use crate::catalog::store::FamilyCatalog;
use crate::catalog::validate::Validator;
use crate::cli::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ValidateArgs {
    /// Report duplicate genes and malformed URLs as warnings instead of failing
    #[arg(long)]
    pub warn_only: bool,

    /// How many malformed member URLs to list individually
    #[arg(long)]
    pub report_limit: Option<usize>,
}

pub fn run(args: ValidateArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let scheme = config.url_scheme()?;
    let catalog = FamilyCatalog::load_from_file(&config.paths.catalog)?;

    let report = Validator::new(&scheme)
        .strict(config.validation.strict && !args.warn_only)
        .report_limit(args.report_limit.unwrap_or(config.validation.report_limit))
        .validate(&catalog);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text | OutputFormat::Tsv => {
            if report.is_ok() {
                println!("VALIDATION: OK");
            } else {
                println!("VALIDATION: FAIL");
                for problem in report.errors() {
                    println!(" - {problem}");
                }
            }
            let mut warnings = report.warnings().peekable();
            if warnings.peek().is_some() {
                println!("Warnings:");
                for problem in warnings {
                    println!(" - {problem}");
                }
            }
            println!("families: {}", report.families);
            println!("members:  {}", report.members);
        }
    }

    if !report.is_ok() {
        anyhow::bail!(
            "Validation failed: {} error(s) in {}",
            report.error_count(),
            config.paths.catalog.display()
        );
    }

    Ok(())
}
