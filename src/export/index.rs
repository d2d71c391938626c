use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::store::FamilyCatalog;
use crate::core::{DbMetadata, Family, Member, UnixTime};
use crate::utils::validation::UrlScheme;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to encode index record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Family,
    Gene,
}

/// Type-specific attributes of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntryAttrs {
    Family {
        #[serde(rename = "familyId")]
        family_id: u64,
        symbol: String,
    },
    Gene {
        #[serde(rename = "memberId")]
        member_id: String,
        family: String,
    },
}

/// One `ENTRY` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub title: String,
    pub url: String,
    pub db_id: String,
    pub updated_at: Option<UnixTime>,
    pub description: String,
    pub basic_info: String,
    pub species: Vec<String>,
    pub attrs: EntryAttrs,
}

/// A line of the index file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLine {
    Db(DbMetadata),
    Entry(IndexEntry),
}

impl IndexLine {
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Db(_) => "DB",
            Self::Entry(_) => "ENTRY",
        }
    }

    /// `TAG\t{json}` without a trailing newline
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized.
    pub fn render(&self) -> Result<String, ExportError> {
        let json = match self {
            Self::Db(db) => serde_json::to_string(db)?,
            Self::Entry(entry) => serde_json::to_string(entry)?,
        };
        Ok(format!("{}\t{}", self.tag(), json))
    }
}

/// Characters left as-is in a URL path: ASCII alphanumerics and `/ % . _ - ~`
const PATH_KEEP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'%')
    .remove(b'.')
    .remove(b'_')
    .remove(b'-')
    .remove(b'~');

/// Percent-encode the path of a URL.
///
/// The URL is split into scheme, authority, path, query and fragment. Only
/// the path is encoded; everything else is copied through unchanged, so host
/// case and query text are preserved. Empty and relative URLs are encoded the
/// same way and never rejected.
#[must_use]
pub fn encode_url(raw: &str) -> String {
    let (scheme, rest) = split_scheme(raw);
    let (authority, rest) = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after
                .find(|c| matches!(c, '/' | '?' | '#'))
                .unwrap_or(after.len());
            (Some(&after[..end]), &after[end..])
        }
        None => (None, rest),
    };
    let (rest, fragment) = match rest.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (rest, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let mut out = String::with_capacity(raw.len());
    if let Some(scheme) = scheme {
        out.push_str(&scheme.to_ascii_lowercase());
        out.push(':');
    }
    if let Some(authority) = authority {
        out.push_str("//");
        out.push_str(authority);
    }
    out.extend(utf8_percent_encode(path, PATH_KEEP));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn split_scheme(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((scheme, rest)) if is_scheme(scheme) => (Some(scheme), rest),
        _ => (None, raw),
    }
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

struct Exporter<'a> {
    db: DbMetadata,
    scheme: &'a UrlScheme,
}

impl Exporter<'_> {
    fn family_entry(&self, family: &Family) -> IndexEntry {
        let raw_url = family
            .family_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map_or_else(
                || self.scheme.family_url(&family.family_symbol),
                ToString::to_string,
            );
        IndexEntry {
            id: family.family_symbol.clone(),
            kind: EntryKind::Family,
            title: family.family_title.clone(),
            url: encode_url(&raw_url),
            db_id: self.db.id.clone(),
            updated_at: self.db.updated_at,
            description: family.family_description.clone().unwrap_or_default(),
            basic_info: String::new(),
            species: self.db.species.clone(),
            attrs: EntryAttrs::Family {
                family_id: family.family_id,
                symbol: family.family_symbol.clone(),
            },
        }
    }

    fn gene_entry(&self, family: &Family, member: &Member) -> IndexEntry {
        IndexEntry {
            id: member.gene_symbol.clone(),
            kind: EntryKind::Gene,
            title: member.gene_symbol.clone(),
            url: encode_url(&member.url),
            db_id: self.db.id.clone(),
            updated_at: self.db.updated_at,
            description: format!(
                "{} — {} family member.",
                member.gene_symbol, family.family_symbol
            ),
            basic_info: String::new(),
            species: self.db.species.clone(),
            attrs: EntryAttrs::Gene {
                member_id: member.member_id.clone(),
                family: family.family_symbol.clone(),
            },
        }
    }
}

/// Build the index lines for `catalog`.
///
/// `fallback_db` stands in when the catalog has no `db` block; its
/// `updatedAt` is then taken from the most recently updated family so the
/// output still depends only on the catalog.
#[must_use]
pub fn export_catalog(
    catalog: &FamilyCatalog,
    fallback_db: &DbMetadata,
    scheme: &UrlScheme,
) -> Vec<IndexLine> {
    let db = match &catalog.db {
        Some(db) => db.clone(),
        None => {
            tracing::warn!("Catalog has no db metadata; using configured defaults");
            DbMetadata {
                updated_at: catalog.families.iter().filter_map(|f| f.updated_at).max(),
                ..fallback_db.clone()
            }
        }
    };

    let exporter = Exporter { db, scheme };
    let mut lines = Vec::with_capacity(1 + catalog.len() + catalog.member_count());
    lines.push(IndexLine::Db(exporter.db.clone()));
    for family in &catalog.families {
        lines.push(IndexLine::Entry(exporter.family_entry(family)));
        for member in &family.members {
            lines.push(IndexLine::Entry(exporter.gene_entry(family, member)));
        }
    }
    lines
}

/// Join rendered lines into the file body, newline-terminated
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn render_lines(lines: &[IndexLine]) -> Result<String, ExportError> {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.render()?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> UrlScheme {
        UrlScheme::new("host").unwrap()
    }

    fn catalog() -> FamilyCatalog {
        let mut catalog = FamilyCatalog::new();
        catalog.db = Some(DbMetadata {
            species: vec!["Homo sapiens".to_string()],
            updated_at: Some(1_700_000_000),
            ..DbMetadata::pahg()
        });
        catalog.add_family(
            Family::new(1, "KLF", "KLF factors", 1_600_000_000)
                .with_url("https://host/genomedb/public/search?fs=KLF")
                .with_members(vec![
                    Member::new("710", "KLF1", "https://host/genomedb/public/searchmember?mid=710"),
                    Member::new("711", "KLF2", "https://host/genomedb/public/searchmember?mid=711"),
                ]),
        );
        catalog
    }

    #[test]
    fn test_line_order_and_tags() {
        let lines = export_catalog(&catalog(), &DbMetadata::pahg(), &scheme());
        let tags: Vec<_> = lines.iter().map(IndexLine::tag).collect();
        assert_eq!(tags, vec!["DB", "ENTRY", "ENTRY", "ENTRY"]);
        match &lines[1] {
            IndexLine::Entry(e) => assert_eq!(e.kind, EntryKind::Family),
            IndexLine::Db(_) => panic!("expected family entry"),
        }
        match &lines[3] {
            IndexLine::Entry(e) => assert_eq!(e.id, "KLF2"),
            IndexLine::Db(_) => panic!("expected gene entry"),
        }
    }

    #[test]
    fn test_exact_rendering() {
        let lines = export_catalog(&catalog(), &DbMetadata::pahg(), &scheme());
        let body = render_lines(&lines).unwrap();
        let rendered: Vec<_> = body.lines().collect();

        assert_eq!(
            rendered[0],
            "DB\t{\"id\":\"PAHG\",\"name\":\"PAHG\",\"url\":\"https://www.pahgncb.com/\",\"version\":\"1.0\",\"species\":[\"Homo sapiens\"],\"updatedAt\":1700000000}"
        );
        assert_eq!(
            rendered[1],
            "ENTRY\t{\"id\":\"KLF\",\"type\":\"family\",\"title\":\"KLF factors\",\"url\":\"https://host/genomedb/public/search?fs=KLF\",\"dbId\":\"PAHG\",\"updatedAt\":1700000000,\"description\":\"\",\"basicInfo\":\"\",\"species\":[\"Homo sapiens\"],\"attrs\":{\"familyId\":1,\"symbol\":\"KLF\"}}"
        );
        assert_eq!(
            rendered[2],
            "ENTRY\t{\"id\":\"KLF1\",\"type\":\"gene\",\"title\":\"KLF1\",\"url\":\"https://host/genomedb/public/searchmember?mid=710\",\"dbId\":\"PAHG\",\"updatedAt\":1700000000,\"description\":\"KLF1 — KLF family member.\",\"basicInfo\":\"\",\"species\":[\"Homo sapiens\"],\"attrs\":{\"memberId\":\"710\",\"family\":\"KLF\"}}"
        );
        assert!(body.ends_with('\n'));
        assert_eq!(body.matches('\n').count(), 4);
    }

    #[test]
    fn test_export_is_deterministic() {
        let c = catalog();
        let s = scheme();
        let a = render_lines(&export_catalog(&c, &DbMetadata::pahg(), &s)).unwrap();
        let b = render_lines(&export_catalog(&c, &DbMetadata::pahg(), &s)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_url_percent_encoding() {
        assert_eq!(
            encode_url("https://host/some path/x?fs=A B"),
            "https://host/some%20path/x?fs=A B"
        );
        assert_eq!(
            encode_url("https://WWW.pahgncb.com/a+b(c)"),
            "https://WWW.pahgncb.com/a%2Bb%28c%29"
        );
        assert_eq!(
            encode_url("https://host/genomedb/public/searchmember?mid=710"),
            "https://host/genomedb/public/searchmember?mid=710"
        );
        assert_eq!(encode_url("https://host/already%20done/~x"), "https://host/already%20done/~x");
        assert_eq!(encode_url("https://host/Krüppel#top"), "https://host/Kr%C3%BCppel#top");
    }

    #[test]
    fn test_empty_and_relative_urls_are_not_rejected() {
        assert_eq!(encode_url(""), "");
        assert_eq!(encode_url("search page?fs=KLF"), "search%20page?fs=KLF");
    }

    #[test]
    fn test_blank_family_url_is_derived() {
        let c = FamilyCatalog::from_json(
            r#"{"families":[{"familyId":1,"familySymbol":"KLF","familyTitle":"KLF factors",
                "familyUrl":"","members":[]}]}"#,
        )
        .unwrap();
        let lines = export_catalog(&c, &DbMetadata::pahg(), &scheme());
        match &lines[1] {
            IndexLine::Entry(e) => {
                assert_eq!(e.url, "https://host/genomedb/public/search?fs=KLF");
            }
            IndexLine::Db(_) => panic!("expected family entry"),
        }
    }

    #[test]
    fn test_missing_db_uses_fallback_and_catalog_time() {
        let mut c = catalog();
        c.db = None;
        c.add_family(Family::new(2, "SOX", "SOX", 1_650_000_000));
        let lines = export_catalog(&c, &DbMetadata::pahg(), &scheme());
        match &lines[0] {
            IndexLine::Db(db) => {
                assert_eq!(db.id, "PAHG");
                assert_eq!(db.updated_at, Some(1_650_000_000));
            }
            IndexLine::Entry(_) => panic!("expected DB line"),
        }
    }

    #[test]
    fn test_missing_family_url_is_derived() {
        let mut c = FamilyCatalog::new();
        c.add_family(Family::new(1, "HOX", "Homeobox", 0));
        let lines = export_catalog(&c, &DbMetadata::pahg(), &scheme());
        match &lines[1] {
            IndexLine::Entry(e) => {
                assert_eq!(e.url, "https://host/genomedb/public/search?fs=HOX");
            }
            IndexLine::Db(_) => panic!("expected family entry"),
        }
    }

    #[test]
    fn test_no_embedded_newlines() {
        let mut c = catalog();
        c.families[0].family_title = "line one\nline two".to_string();
        let body = render_lines(&export_catalog(&c, &DbMetadata::pahg(), &scheme())).unwrap();
        assert_eq!(body.lines().count(), 4);
        assert!(body.contains("line one\\nline two"));
    }
}
