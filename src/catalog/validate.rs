//! Structural checks over a catalog.
//!
//! Missing symbols or titles, duplicate family symbols and missing or duplicate
//! family ids are always errors. Duplicate genes within a family, family URLs
//! that are not absolute and malformed member URLs are errors in strict mode
//! and warnings otherwise. A blank family URL is not reported; it is derived
//! from the symbol on merge and export.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use url::Url;

use crate::catalog::store::FamilyCatalog;
use crate::utils::validation::UrlScheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// A member whose URL does not match the pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadUrl {
    pub family: String,
    pub gene: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// Family at this position has an empty symbol
    MissingFamilySymbol { position: usize },
    MissingFamilyTitle { family: String },
    DuplicateFamilySymbol { family: String, occurrences: usize },
    MissingFamilyId { family: String },
    DuplicateFamilyId { family_id: u64, families: Vec<String> },
    /// `extra` counts entries beyond the first for each repeated gene
    DuplicateGenes {
        family: String,
        extra: usize,
        genes: Vec<String>,
    },
    InvalidFamilyUrl { family: String, url: String },
    /// `examples` holds at most the configured report limit
    MalformedUrls { total: usize, examples: Vec<BadUrl> },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFamilySymbol { position } => {
                write!(f, "Family #{position} has no familySymbol")
            }
            Self::MissingFamilyTitle { family } => write!(f, "Family {family} has no familyTitle"),
            Self::DuplicateFamilySymbol {
                family,
                occurrences,
            } => write!(
                f,
                "Duplicate familySymbol found: {family} ({occurrences} occurrences)"
            ),
            Self::MissingFamilyId { family } => write!(f, "Family {family} has no familyId"),
            Self::DuplicateFamilyId {
                family_id,
                families,
            } => write!(
                f,
                "familyId {family_id} shared by {}",
                families.join(", ")
            ),
            Self::DuplicateGenes {
                family,
                extra,
                genes,
            } => write!(
                f,
                "Within-family duplicate gene entries in {family}: {extra} ({})",
                genes.join(", ")
            ),
            Self::InvalidFamilyUrl { family, url } => {
                write!(f, "Family {family} has an invalid familyUrl: {url:?}")
            }
            Self::MalformedUrls { total, examples } => {
                write!(f, "Malformed member URLs: {total}")?;
                for bad in examples {
                    write!(f, "\n     ({}, {}, {:?})", bad.family, bad.gene, bad.url)?;
                }
                if *total > examples.len() {
                    write!(f, "\n     ... and {} more", total - examples.len())?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    #[serde(flatten)]
    pub problem: Problem,
}

/// Result of validating a catalog
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub families: usize,
    pub members: usize,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// True when no finding is an error
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Problem> {
        self.findings
            .iter()
            .filter(move |f| f.severity == severity)
            .map(|f| &f.problem)
    }
}

/// Checks a catalog against its structural invariants
pub struct Validator<'a> {
    scheme: &'a UrlScheme,
    strict: bool,
    report_limit: usize,
}

impl<'a> Validator<'a> {
    pub fn new(scheme: &'a UrlScheme) -> Self {
        Self {
            scheme,
            strict: true,
            report_limit: 10,
        }
    }

    /// Whether duplicate genes and malformed URLs fail validation
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn report_limit(mut self, limit: usize) -> Self {
        self.report_limit = limit;
        self
    }

    #[must_use]
    pub fn validate(&self, catalog: &FamilyCatalog) -> ValidationReport {
        let mut report = ValidationReport {
            families: catalog.len(),
            members: catalog.member_count(),
            findings: Vec::new(),
        };
        let soft = if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        };

        self.check_required_fields(catalog, &mut report);
        self.check_family_keys(catalog, &mut report);

        for family in &catalog.families {
            let (extra, genes) = family.duplicate_genes();
            if extra > 0 {
                report.findings.push(Finding {
                    severity: soft,
                    problem: Problem::DuplicateGenes {
                        family: display_symbol(&family.family_symbol),
                        extra,
                        genes: genes.into_iter().map(ToString::to_string).collect(),
                    },
                });
            }
        }

        for family in &catalog.families {
            let Some(url) = family.family_url.as_deref().map(str::trim) else {
                continue;
            };
            if !url.is_empty() && Url::parse(url).is_err() {
                report.findings.push(Finding {
                    severity: soft,
                    problem: Problem::InvalidFamilyUrl {
                        family: display_symbol(&family.family_symbol),
                        url: url.to_string(),
                    },
                });
            }
        }

        let mut total = 0;
        let mut examples = Vec::new();
        for family in &catalog.families {
            for member in &family.members {
                if !self.scheme.is_member_url(&member.url) {
                    total += 1;
                    if examples.len() < self.report_limit {
                        examples.push(BadUrl {
                            family: display_symbol(&family.family_symbol),
                            gene: member.gene_symbol.clone(),
                            url: member.url.clone(),
                        });
                    }
                }
            }
        }
        if total > 0 {
            report.findings.push(Finding {
                severity: soft,
                problem: Problem::MalformedUrls { total, examples },
            });
        }

        report
    }

    fn check_required_fields(&self, catalog: &FamilyCatalog, report: &mut ValidationReport) {
        for (position, family) in catalog.families.iter().enumerate() {
            if family.family_symbol.trim().is_empty() {
                report.findings.push(error(Problem::MissingFamilySymbol { position }));
            }
            if family.family_title.trim().is_empty() {
                report.findings.push(error(Problem::MissingFamilyTitle {
                    family: display_symbol(&family.family_symbol),
                }));
            }
            if family.family_id == 0 {
                report.findings.push(error(Problem::MissingFamilyId {
                    family: display_symbol(&family.family_symbol),
                }));
            }
        }
    }

    fn check_family_keys(&self, catalog: &FamilyCatalog, report: &mut ValidationReport) {
        let mut symbol_counts: HashMap<&str, usize> = HashMap::new();
        let mut symbol_order = Vec::new();
        let mut by_id: HashMap<u64, Vec<String>> = HashMap::new();
        let mut id_order = Vec::new();

        for family in &catalog.families {
            let symbol = family.family_symbol.as_str();
            if !symbol.trim().is_empty() {
                let count = symbol_counts.entry(symbol).or_default();
                *count += 1;
                if *count == 2 {
                    symbol_order.push(symbol);
                }
            }
            if family.family_id != 0 {
                by_id
                    .entry(family.family_id)
                    .or_default()
                    .push(display_symbol(symbol));
                if by_id[&family.family_id].len() == 2 {
                    id_order.push(family.family_id);
                }
            }
        }

        for symbol in symbol_order {
            report.findings.push(error(Problem::DuplicateFamilySymbol {
                family: symbol.to_string(),
                occurrences: symbol_counts[symbol],
            }));
        }
        for family_id in id_order {
            report.findings.push(error(Problem::DuplicateFamilyId {
                family_id,
                families: by_id.remove(&family_id).unwrap_or_default(),
            }));
        }
    }
}

fn error(problem: Problem) -> Finding {
    Finding {
        severity: Severity::Error,
        problem,
    }
}

fn display_symbol(symbol: &str) -> String {
    if symbol.trim().is_empty() {
        "(no symbol)".to_string()
    } else {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Family, Member};

    fn scheme() -> UrlScheme {
        UrlScheme::new("host").unwrap()
    }

    fn good(mid: &str, gene: &str) -> Member {
        Member::new(
            mid,
            gene,
            format!("https://host/genomedb/public/searchmember?mid={mid}"),
        )
    }

    fn catalog_of(families: Vec<Family>) -> FamilyCatalog {
        let mut catalog = FamilyCatalog::new();
        for f in families {
            catalog.add_family(f);
        }
        catalog
    }

    #[test]
    fn test_clean_catalog_passes() {
        let catalog = catalog_of(vec![
            Family::new(1, "KLF", "KLF factors", 0).with_members(vec![good("710", "KLF1")]),
            Family::new(2, "SOX", "SOX", 0).with_members(vec![good("1", "KLF1")]),
        ]);
        let s = scheme();
        let report = Validator::new(&s).validate(&catalog);
        assert!(report.is_ok());
        assert!(report.findings.is_empty());
        assert_eq!(report.families, 2);
        assert_eq!(report.members, 2);
    }

    #[test]
    fn test_missing_fields() {
        let catalog = catalog_of(vec![Family::new(1, "", "", 0), Family::new(0, "KLF", "t", 0)]);
        let s = scheme();
        let report = Validator::new(&s).validate(&catalog);
        let errors: Vec<_> = report.errors().cloned().collect();
        assert!(errors.contains(&Problem::MissingFamilySymbol { position: 0 }));
        assert!(errors.contains(&Problem::MissingFamilyTitle {
            family: "(no symbol)".to_string()
        }));
        assert!(errors.contains(&Problem::MissingFamilyId {
            family: "KLF".to_string()
        }));
    }

    #[test]
    fn test_every_duplicate_symbol_reported() {
        let catalog = catalog_of(vec![
            Family::new(1, "KLF", "a", 0),
            Family::new(2, "KLF", "b", 0),
            Family::new(3, "SOX", "c", 0),
            Family::new(4, "SOX", "d", 0),
            Family::new(5, "KLF", "e", 0),
        ]);
        let s = scheme();
        let report = Validator::new(&s).validate(&catalog);
        let dupes: Vec<_> = report
            .errors()
            .filter_map(|p| match p {
                Problem::DuplicateFamilySymbol {
                    family,
                    occurrences,
                } => Some((family.as_str(), *occurrences)),
                _ => None,
            })
            .collect();
        assert_eq!(dupes, vec![("KLF", 3), ("SOX", 2)]);
    }

    #[test]
    fn test_duplicate_family_ids() {
        let catalog = catalog_of(vec![Family::new(1, "KLF", "a", 0), Family::new(1, "SOX", "b", 0)]);
        let s = scheme();
        let report = Validator::new(&s).validate(&catalog);
        assert!(report.errors().any(|p| *p
            == Problem::DuplicateFamilyId {
                family_id: 1,
                families: vec!["KLF".to_string(), "SOX".to_string()]
            }));
    }

    #[test]
    fn test_duplicate_genes_strict_and_lenient() {
        let catalog = catalog_of(vec![Family::new(1, "KLF", "t", 0).with_members(vec![
            good("710", "KLF1"),
            good("710", "KLF1"),
        ])]);
        let s = scheme();

        let strict = Validator::new(&s).validate(&catalog);
        assert!(!strict.is_ok());
        assert_eq!(
            strict.errors().next(),
            Some(&Problem::DuplicateGenes {
                family: "KLF".to_string(),
                extra: 1,
                genes: vec!["KLF1".to_string()],
            })
        );

        let lenient = Validator::new(&s).strict(false).validate(&catalog);
        assert!(lenient.is_ok());
        assert_eq!(lenient.warnings().count(), 1);
    }

    #[test]
    fn test_family_urls_checked_but_blank_allowed() {
        let catalog = catalog_of(vec![
            Family::new(1, "KLF", "KLF factors", 0).with_url(""),
            Family::new(2, "SOX", "SOX", 0).with_url("search?fs=SOX"),
            Family::new(3, "HOX", "HOX", 0).with_url("https://host/genomedb/public/search?fs=HOX"),
        ]);
        let s = scheme();
        let report = Validator::new(&s).validate(&catalog);

        let errors: Vec<_> = report.errors().cloned().collect();
        assert_eq!(
            errors,
            vec![Problem::InvalidFamilyUrl {
                family: "SOX".to_string(),
                url: "search?fs=SOX".to_string(),
            }]
        );
        assert!(Validator::new(&s).strict(false).validate(&catalog).is_ok());
    }

    #[test]
    fn test_malformed_urls_counted_and_capped() {
        let members: Vec<_> = (0..5)
            .map(|i| Member::new(i.to_string(), format!("G{i}"), "http://bad"))
            .collect();
        let catalog = catalog_of(vec![Family::new(1, "KLF", "t", 0).with_members(members)]);
        let s = scheme();
        let report = Validator::new(&s).report_limit(2).validate(&catalog);

        let first = report.errors().next().cloned();
        match first {
            Some(Problem::MalformedUrls { total, examples }) => {
                assert_eq!(total, 5);
                assert_eq!(examples.len(), 2);
                assert_eq!(examples[0].gene, "G0");
            }
            other => panic!("unexpected finding: {other:?}"),
        }
    }

    #[test]
    fn test_report_serializes_with_kind_tag() {
        let catalog = catalog_of(vec![Family::new(1, "KLF", "", 0)]);
        let s = scheme();
        let report = Validator::new(&s).validate(&catalog);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["findings"][0]["kind"], "missing_family_title");
        assert_eq!(json["findings"][0]["severity"], "error");
    }

    #[test]
    fn test_display_lists_examples() {
        let problem = Problem::MalformedUrls {
            total: 3,
            examples: vec![BadUrl {
                family: "KLF".to_string(),
                gene: "KLF1".to_string(),
                url: "x".to_string(),
            }],
        };
        let text = problem.to_string();
        assert!(text.starts_with("Malformed member URLs: 3"));
        assert!(text.contains("(KLF, KLF1, \"x\")"));
        assert!(text.contains("and 2 more"));
    }
}
