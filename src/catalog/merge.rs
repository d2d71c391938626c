//! Reconcile batch documents against an existing catalog.
//!
//! Families are matched by symbol. A known symbol is updated in place; an
//! unknown one becomes a new family with the next free id. Members are keyed
//! by gene symbol within their family.
//!
//! Member URLs follow a single policy: a URL that does not match the member
//! pattern (or is absent) is rebuilt from a numeric `memberId`. When there is
//! no numeric `memberId` to rebuild from, the whole merge fails.
//!
//! The merger does no I/O; persisting the result is up to the caller.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::catalog::store::{CatalogData, FamilyCatalog};
use crate::core::{DbMetadata, Family, Member, UnixTime, Upsert};
use crate::parsing::batch::{Batch, FamilyInput, MemberInput};
use crate::utils::validation::UrlScheme;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    #[error("{origin}: family #{position} has no familySymbol")]
    MissingFamilySymbol { origin: String, position: usize },

    #[error("{origin}: member #{position} of family {family} has no geneSymbol")]
    MissingGeneSymbol {
        origin: String,
        family: String,
        position: usize,
    },

    #[error("Bad member URL for {family}:{gene}: {url:?} (no numeric memberId to derive it from)")]
    UnrepairableUrl {
        family: String,
        gene: String,
        url: String,
    },
}

/// Counts describing what a merge did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub batches: usize,
    pub families_added: usize,
    pub families_updated: usize,
    pub genes_added: usize,
    pub genes_replaced: usize,
    pub urls_repaired: usize,
    pub ids_assigned: usize,
    pub duplicates_folded: usize,
    pub total_families: usize,
    pub total_members: usize,
}

impl std::fmt::Display for MergeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Batches merged:           {}", self.batches)?;
        writeln!(f, "New families added:       {}", self.families_added)?;
        writeln!(f, "Existing families updated: {}", self.families_updated)?;
        writeln!(f, "New genes added:          {}", self.genes_added)?;
        writeln!(f, "Genes replaced:           {}", self.genes_replaced)?;
        if self.urls_repaired > 0 {
            writeln!(f, "Member URLs repaired:     {}", self.urls_repaired)?;
        }
        if self.ids_assigned > 0 {
            writeln!(f, "Missing ids assigned:     {}", self.ids_assigned)?;
        }
        if self.duplicates_folded > 0 {
            writeln!(f, "Duplicate families folded: {}", self.duplicates_folded)?;
        }
        write!(
            f,
            "Catalog now holds {} families, {} members",
            self.total_families, self.total_members
        )
    }
}

/// A family description after normalization
#[derive(Debug)]
struct FamilyUpdate {
    symbol: String,
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    members: Vec<Member>,
}

/// Merges batches into a catalog at a fixed point in time
pub struct Merger<'a> {
    scheme: &'a UrlScheme,
    default_db: DbMetadata,
    now: UnixTime,
}

impl<'a> Merger<'a> {
    pub fn new(scheme: &'a UrlScheme, now: UnixTime) -> Self {
        Self {
            scheme,
            default_db: DbMetadata::pahg(),
            now,
        }
    }

    /// Metadata to install when the base catalog has no `db` block
    #[must_use]
    pub fn with_default_db(mut self, db: DbMetadata) -> Self {
        self.default_db = db;
        self
    }

    /// Apply `batches` in order to `base` and return the merged catalog.
    ///
    /// # Errors
    ///
    /// Fails on the first family without a symbol, member without a gene
    /// symbol, or member whose URL cannot be repaired. Nothing of the partial
    /// result is returned in that case.
    pub fn merge(
        &self,
        catalog: FamilyCatalog,
        batches: &[Batch],
    ) -> Result<(FamilyCatalog, MergeReport), MergeError> {
        let mut report = MergeReport {
            batches: batches.len(),
            ..MergeReport::default()
        };

        let mut catalog = fold_duplicate_symbols(catalog, &mut report);
        let mut next_id = catalog.max_family_id() + 1;
        self.assign_missing_ids(&mut catalog, &mut next_id, &mut report);

        let mut touched = report.duplicates_folded > 0;
        for batch in batches {
            for (position, input) in batch.families.iter().enumerate() {
                let update = self.normalize_family(input, &batch.origin, position, &mut report)?;
                touched = true;

                if let Some(family) = catalog.get_mut(&update.symbol) {
                    self.apply_update(family, update, &mut report);
                    report.families_updated += 1;
                } else {
                    let family = self.create_family(update, next_id, &mut report);
                    tracing::debug!(
                        "Created family {} with id {}",
                        family.family_symbol,
                        family.family_id
                    );
                    next_id += 1;
                    report.families_added += 1;
                    catalog.add_family(family);
                }
            }
        }

        if touched {
            let db = catalog.db.get_or_insert_with(|| {
                tracing::warn!("Catalog has no db metadata; using configured defaults");
                self.default_db.clone()
            });
            db.updated_at = Some(self.now);
        }

        catalog.sort();
        report.total_families = catalog.len();
        report.total_members = catalog.member_count();
        Ok((catalog, report))
    }

    /// Families loaded without an id get one now, in symbol order, so that
    /// every family ends up with a distinct id above all existing ones.
    fn assign_missing_ids(
        &self,
        catalog: &mut FamilyCatalog,
        next_id: &mut u64,
        report: &mut MergeReport,
    ) {
        let mut missing: Vec<usize> = catalog
            .families
            .iter()
            .enumerate()
            .filter(|(_, f)| f.family_id == 0)
            .map(|(i, _)| i)
            .collect();
        missing.sort_by(|&a, &b| {
            catalog.families[a]
                .family_symbol
                .cmp(&catalog.families[b].family_symbol)
        });

        for idx in missing {
            let family = &mut catalog.families[idx];
            tracing::warn!(
                "Family {} has no familyId; assigning {}",
                family.family_symbol,
                next_id
            );
            family.family_id = *next_id;
            *next_id += 1;
            report.ids_assigned += 1;
        }
    }

    fn normalize_family(
        &self,
        input: &FamilyInput,
        origin: &str,
        position: usize,
        report: &mut MergeReport,
    ) -> Result<FamilyUpdate, MergeError> {
        let symbol = input
            .family_symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| MergeError::MissingFamilySymbol {
                origin: origin.to_string(),
                position,
            })?
            .to_string();

        let mut members = Vec::with_capacity(input.members.len());
        for (member_pos, member) in input.members.iter().enumerate() {
            members.push(self.normalize_member(member, &symbol, origin, member_pos, report)?);
        }

        Ok(FamilyUpdate {
            title: non_empty(input.family_title.as_deref()),
            url: non_empty(input.family_url.as_deref()),
            description: non_empty(input.family_description.as_deref()),
            symbol,
            members,
        })
    }

    fn normalize_member(
        &self,
        input: &MemberInput,
        family: &str,
        origin: &str,
        position: usize,
        report: &mut MergeReport,
    ) -> Result<Member, MergeError> {
        let gene = non_empty(input.gene_symbol.as_deref()).ok_or_else(|| {
            MergeError::MissingGeneSymbol {
                origin: origin.to_string(),
                family: family.to_string(),
                position,
            }
        })?;
        let url = input.url.as_deref().map(str::trim).unwrap_or_default();
        let member_id = input
            .member_id
            .as_ref()
            .map(ToString::to_string)
            .filter(|id| !id.is_empty());

        if self.scheme.is_member_url(url) {
            let member_id = match member_id {
                Some(id) => id,
                None => self
                    .scheme
                    .member_id_from_url(url)
                    .unwrap_or_default()
                    .to_string(),
            };
            return Ok(Member::new(member_id, gene, url));
        }

        match member_id {
            Some(id) => match self.scheme.member_url(&id) {
                Some(derived) => {
                    if !url.is_empty() {
                        tracing::warn!(
                            "Repaired URL for {}:{}: {:?} -> {}",
                            family,
                            gene,
                            url,
                            derived
                        );
                    }
                    report.urls_repaired += 1;
                    Ok(Member::new(id, gene, derived))
                }
                None => Err(MergeError::UnrepairableUrl {
                    family: family.to_string(),
                    gene,
                    url: url.to_string(),
                }),
            },
            None => Err(MergeError::UnrepairableUrl {
                family: family.to_string(),
                gene,
                url: url.to_string(),
            }),
        }
    }

    fn apply_update(&self, family: &mut Family, update: FamilyUpdate, report: &mut MergeReport) {
        if let Some(title) = update.title {
            family.family_title = title;
        }
        if let Some(url) = update.url {
            family.family_url = Some(url);
        }
        if let Some(description) = update.description {
            family.family_description = Some(description);
        }
        if is_blank(family.family_url.as_deref()) {
            family.family_url = Some(self.scheme.family_url(&family.family_symbol));
        }

        for member in update.members {
            match family.upsert_member(member) {
                Upsert::Inserted => report.genes_added += 1,
                Upsert::Replaced => report.genes_replaced += 1,
                Upsert::Unchanged => {}
            }
        }
        family.normalize_members();

        family.created_at.get_or_insert(self.now);
        family.updated_at = Some(self.now);
    }

    fn create_family(&self, update: FamilyUpdate, id: u64, report: &mut MergeReport) -> Family {
        let title = update.title.unwrap_or_else(|| {
            tracing::warn!(
                "Family {} has no familyTitle; using the symbol",
                update.symbol
            );
            update.symbol.clone()
        });
        let url = update
            .url
            .unwrap_or_else(|| self.scheme.family_url(&update.symbol));

        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(update.members.len());
        for member in update.members {
            if seen.insert(member.gene_symbol.clone()) {
                members.push(member);
            } else {
                tracing::warn!(
                    "Duplicate gene {} in new family {}; keeping the first",
                    member.gene_symbol,
                    update.symbol
                );
            }
        }
        report.genes_added += members.len();

        let mut family = Family::new(id, update.symbol, title, self.now)
            .with_url(url)
            .with_members(members);
        family.family_description = update.description;
        family.normalize_members();
        family
    }
}

/// Collapse families sharing a symbol into the first of them.
///
/// The kept family takes the lowest assigned id, the earliest `createdAt` and
/// the latest `updatedAt`. Members of later duplicates are upserted into it in
/// stored order.
fn fold_duplicate_symbols(catalog: FamilyCatalog, report: &mut MergeReport) -> FamilyCatalog {
    let FamilyCatalog { db, families, .. } = catalog;
    let mut kept: Vec<Family> = Vec::with_capacity(families.len());
    let mut by_symbol: HashMap<String, usize> = HashMap::new();

    for family in families {
        match by_symbol.get(&family.family_symbol) {
            Some(&idx) => {
                fold_into(&mut kept[idx], family);
                report.duplicates_folded += 1;
            }
            None => {
                by_symbol.insert(family.family_symbol.clone(), kept.len());
                kept.push(family);
            }
        }
    }

    FamilyCatalog::from_data(CatalogData { db, families: kept })
}

fn fold_into(kept: &mut Family, duplicate: Family) {
    tracing::warn!(
        "Family {} appears more than once (ids {} and {}); folding into one",
        kept.family_symbol,
        kept.family_id,
        duplicate.family_id
    );
    kept.family_id = match (kept.family_id, duplicate.family_id) {
        (0, id) | (id, 0) => id,
        (a, b) => a.min(b),
    };
    kept.created_at = match (kept.created_at, duplicate.created_at) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    kept.updated_at = kept.updated_at.max(duplicate.updated_at);
    if kept.family_title.trim().is_empty() {
        kept.family_title = duplicate.family_title;
    }
    if is_blank(kept.family_url.as_deref()) {
        kept.family_url = duplicate.family_url;
    }
    if is_blank(kept.family_description.as_deref()) {
        kept.family_description = duplicate.family_description;
    }
    for member in duplicate.members {
        kept.upsert_member(member);
    }
    kept.normalize_members();
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
