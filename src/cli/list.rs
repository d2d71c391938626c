use clap::Args;

use crate::catalog::store::FamilyCatalog;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::core::types::format_timestamp;
use crate::core::Family;

#[derive(Args)]
pub struct ListArgs {
    /// Only show families whose symbol or title contains this text (case-insensitive)
    #[arg(long)]
    pub filter: Option<String>,
}

pub fn run(
    args: ListArgs,
    config: &Config,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = FamilyCatalog::load_from_file(&config.paths.catalog)?;
    tracing::debug!("Loaded catalog with {} families", catalog.len());

    let needle = args.filter.as_deref().map(str::to_lowercase);
    let filtered: Vec<&Family> = catalog
        .families
        .iter()
        .filter(|f| match &needle {
            Some(n) => {
                f.family_symbol.to_lowercase().contains(n)
                    || f.family_title.to_lowercase().contains(n)
            }
            None => true,
        })
        .collect();

    match format {
        OutputFormat::Text => {
            let id_width = filtered
                .iter()
                .map(|f| f.family_id.to_string().len())
                .max()
                .unwrap_or(2)
                .max(2);
            let symbol_width = filtered
                .iter()
                .map(|f| f.family_symbol.chars().count())
                .max()
                .unwrap_or(6)
                .max(6);
            let title_width = filtered
                .iter()
                .map(|f| f.family_title.chars().count().min(40))
                .max()
                .unwrap_or(5)
                .max(5);

            let total_width = id_width + symbol_width + title_width + 8 + 16 + 4;

            println!("Gene Family Catalog ({} families)\n", filtered.len());
            println!(
                "{:>id_w$} {:<sym_w$} {:<title_w$} {:>8} {:<16}",
                "ID",
                "Symbol",
                "Title",
                "Members",
                "Updated",
                id_w = id_width,
                sym_w = symbol_width,
                title_w = title_width
            );
            println!("{}", "-".repeat(total_width));

            for f in &filtered {
                println!(
                    "{:>id_w$} {:<sym_w$} {:<title_w$} {:>8} {:<16}",
                    f.family_id,
                    f.family_symbol,
                    truncate(&f.family_title, title_width),
                    f.members.len(),
                    f.updated_at.map(format_timestamp).unwrap_or_default(),
                    id_w = id_width,
                    sym_w = symbol_width,
                    title_w = title_width
                );
                if verbose {
                    let genes: Vec<&str> =
                        f.members.iter().map(|m| m.gene_symbol.as_str()).collect();
                    println!("  └─ {}", genes.join(", "));
                }
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = filtered
                .iter()
                .map(|f| {
                    let mut json = serde_json::json!({
                        "familyId": f.family_id,
                        "familySymbol": f.family_symbol,
                        "familyTitle": f.family_title,
                        "memberCount": f.members.len(),
                        "updatedAt": f.updated_at,
                    });
                    if verbose {
                        json["members"] = serde_json::json!(f
                            .members
                            .iter()
                            .map(|m| &m.gene_symbol)
                            .collect::<Vec<_>>());
                    }
                    json
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("familyId\tfamilySymbol\tfamilyTitle\tmemberCount\tupdatedAt");
            for f in &filtered {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    f.family_id,
                    f.family_symbol,
                    f.family_title,
                    f.members.len(),
                    f.updated_at.map(|t| t.to_string()).unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Kruppel like factors", 40), "Kruppel like factors");
        assert_eq!(truncate("Kruppel like factors", 10), "Kruppel...");
        assert_eq!(truncate("Krüppel-like", 8), "Krüpp...");
    }
}
