use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::core::types::UnixTime;

/// A single gene belonging to a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Member identifier in the source database (numeric in practice)
    #[serde(default)]
    pub member_id: String,

    /// Gene symbol, unique within the owning family
    #[serde(default)]
    pub gene_symbol: String,

    /// Link to the member page
    #[serde(default)]
    pub url: String,
}

impl Member {
    pub fn new(
        member_id: impl Into<String>,
        gene_symbol: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            gene_symbol: gene_symbol.into(),
            url: url.into(),
        }
    }
}

/// Outcome of inserting a member into a family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No member with this gene symbol existed
    Inserted,
    /// An existing member with a different value was replaced
    Replaced,
    /// An identical member was already present
    Unchanged,
}

/// A gene family in the catalog
///
/// Every field except `familySymbol` tolerates being absent on load so that a
/// hand-edited catalog can still be read and reported on by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    /// Stable numeric identifier; 0 means "not yet assigned"
    #[serde(default)]
    pub family_id: u64,

    #[serde(default)]
    pub family_symbol: String,

    #[serde(default)]
    pub family_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<UnixTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<UnixTime>,

    #[serde(default)]
    pub members: Vec<Member>,
}

impl Family {
    /// Create a fresh family stamped with `now` for both timestamps
    pub fn new(
        family_id: u64,
        family_symbol: impl Into<String>,
        family_title: impl Into<String>,
        now: UnixTime,
    ) -> Self {
        Self {
            family_id,
            family_symbol: family_symbol.into(),
            family_title: family_title.into(),
            family_url: None,
            family_description: None,
            created_at: Some(now),
            updated_at: Some(now),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.family_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Look up a member by gene symbol
    #[must_use]
    pub fn member(&self, gene_symbol: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.gene_symbol == gene_symbol)
    }

    /// Insert `member`, replacing any member with the same gene symbol.
    ///
    /// If the family already holds duplicates of that symbol (possible in a
    /// hand-edited catalog) they collapse into the single incoming member.
    pub fn upsert_member(&mut self, member: Member) -> Upsert {
        let mut outcome = Upsert::Inserted;
        let mut kept = false;
        self.members.retain_mut(|existing| {
            if existing.gene_symbol != member.gene_symbol {
                return true;
            }
            if kept {
                return false;
            }
            outcome = if *existing == member {
                Upsert::Unchanged
            } else {
                Upsert::Replaced
            };
            existing.clone_from(&member);
            kept = true;
            true
        });
        if !kept {
            self.members.push(member);
        }
        outcome
    }

    /// Collapse duplicate gene symbols (last occurrence wins) and sort members
    /// by gene symbol.
    pub fn normalize_members(&mut self) {
        let by_symbol: BTreeMap<String, Member> = std::mem::take(&mut self.members)
            .into_iter()
            .map(|m| (m.gene_symbol.clone(), m))
            .collect();
        self.members = by_symbol.into_values().collect();
    }

    /// Gene symbols that occur more than once, with the number of extra copies
    #[must_use]
    pub fn duplicate_genes(&self) -> (usize, Vec<&str>) {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        let mut extra = 0;
        for m in &self.members {
            if !seen.insert(m.gene_symbol.as_str()) {
                extra += 1;
                if !dupes.contains(&m.gene_symbol.as_str()) {
                    dupes.push(m.gene_symbol.as_str());
                }
            }
        }
        dupes.sort_unstable();
        (extra, dupes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn klf1() -> Member {
        Member::new(
            "710",
            "KLF1",
            "https://www.pahgncb.com/genomedb/public/searchmember?mid=710",
        )
    }

    #[test]
    fn test_upsert_inserts_and_replaces() {
        let mut fam = Family::new(1, "KLF", "KLF factors", 100);
        assert_eq!(fam.upsert_member(klf1()), Upsert::Inserted);
        assert_eq!(fam.upsert_member(klf1()), Upsert::Unchanged);

        let mut changed = klf1();
        changed.member_id = "9".to_string();
        assert_eq!(fam.upsert_member(changed), Upsert::Replaced);
        assert_eq!(fam.members.len(), 1);
        assert_eq!(fam.member("KLF1").unwrap().member_id, "9");
    }

    #[test]
    fn test_upsert_collapses_existing_duplicates() {
        let mut fam = Family::new(1, "KLF", "KLF factors", 100)
            .with_members(vec![klf1(), klf1(), Member::new("711", "KLF2", "")]);
        fam.upsert_member(klf1());
        assert_eq!(fam.members.len(), 2);
        assert_eq!(fam.duplicate_genes().0, 0);
    }

    #[test]
    fn test_normalize_members_sorts_and_dedupes() {
        let mut fam = Family::new(1, "KLF", "KLF factors", 100).with_members(vec![
            Member::new("712", "KLF3", "a"),
            Member::new("710", "KLF1", "b"),
            Member::new("999", "KLF3", "c"),
        ]);
        fam.normalize_members();
        let genes: Vec<_> = fam.members.iter().map(|m| m.gene_symbol.as_str()).collect();
        assert_eq!(genes, vec!["KLF1", "KLF3"]);
        assert_eq!(fam.member("KLF3").unwrap().url, "c");
    }

    #[test]
    fn test_duplicate_genes() {
        let fam = Family::new(1, "KLF", "KLF factors", 100).with_members(vec![
            klf1(),
            klf1(),
            klf1(),
            Member::new("711", "KLF2", ""),
        ]);
        let (extra, genes) = fam.duplicate_genes();
        assert_eq!(extra, 2);
        assert_eq!(genes, vec!["KLF1"]);
    }

    #[test]
    fn test_family_json_shape() {
        let fam = Family::new(3, "KLF", "KLF factors", 100).with_members(vec![klf1()]);
        let json = serde_json::to_value(&fam).unwrap();
        assert_eq!(json["familyId"], 3);
        assert_eq!(json["familySymbol"], "KLF");
        assert_eq!(json["createdAt"], 100);
        assert_eq!(json["members"][0]["geneSymbol"], "KLF1");
        assert!(json.get("familyUrl").is_none());
    }
}
