use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::backup::BackupGuard;
use crate::core::{DbMetadata, Family, UnixTime};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Failed to write catalog {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to back up catalog {path}: {source}")]
    Backup {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Serializable catalog format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<DbMetadata>,

    #[serde(default)]
    pub families: Vec<Family>,
}

/// The gene-family catalog with a symbol index
#[derive(Debug, Clone, Default)]
pub struct FamilyCatalog {
    /// Database metadata, if the catalog carries any
    pub db: Option<DbMetadata>,

    /// All families, in stored order
    pub families: Vec<Family>,

    /// Index: family symbol -> position of its first occurrence in `families`
    symbol_to_index: HashMap<String, usize>,
}

impl FamilyCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog file, treating a missing file as an empty catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_empty(path: &Path) -> Result<Self, CatalogError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No catalog at {}, starting empty", path.display());
            Ok(Self::new())
        }
    }

    /// Load catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse catalog from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a catalog.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: CatalogData = serde_json::from_str(json)?;
        Ok(Self::from_data(data))
    }

    pub fn from_data(data: CatalogData) -> Self {
        let mut catalog = Self {
            db: data.db,
            ..Self::default()
        };
        for family in data.families {
            catalog.add_family(family);
        }
        catalog
    }

    /// Add a family to the catalog.
    ///
    /// The symbol index keeps pointing at the first family with a given
    /// symbol; later duplicates are stored but only reachable by iteration.
    pub fn add_family(&mut self, family: Family) {
        let index = self.families.len();
        self.symbol_to_index
            .entry(family.family_symbol.clone())
            .or_insert(index);
        self.families.push(family);
    }

    /// Get a family by symbol
    pub fn get(&self, symbol: &str) -> Option<&Family> {
        self.symbol_to_index
            .get(symbol)
            .map(|&idx| &self.families[idx])
    }

    /// Get a family by symbol for in-place update
    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut Family> {
        self.symbol_to_index
            .get(symbol)
            .map(|&idx| &mut self.families[idx])
    }

    /// Highest assigned family id, or 0 for an empty catalog
    pub fn max_family_id(&self) -> u64 {
        self.families
            .iter()
            .map(|f| f.family_id)
            .max()
            .unwrap_or(0)
    }

    /// Order families by symbol and members by gene symbol, then rebuild the
    /// index. Family order is a stable sort, so duplicate symbols keep their
    /// relative order.
    pub fn sort(&mut self) {
        let mut families = std::mem::take(&mut self.families);
        families.sort_by(|a, b| a.family_symbol.cmp(&b.family_symbol));
        for family in &mut families {
            family
                .members
                .sort_by(|a, b| a.gene_symbol.cmp(&b.gene_symbol));
        }
        self.symbol_to_index.clear();
        for family in families {
            self.add_family(family);
        }
    }

    /// Total number of members across all families
    pub fn member_count(&self) -> usize {
        self.families.iter().map(|f| f.members.len()).sum()
    }

    /// Number of families in catalog
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Export catalog to pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            db: self.db.clone(),
            families: self.families.clone(),
        };
        let mut json = serde_json::to_string_pretty(&data)?;
        json.push('\n');
        Ok(json)
    }

    /// Write the catalog to `path`.
    ///
    /// The new content goes to a temporary file in the same directory and is
    /// renamed over `path`, so readers never observe a half-written catalog.
    /// With `backup` set, an existing file is first copied aside and the copy's
    /// path is returned; if the write fails the copy is restored.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the backup copy, or the write fails.
    pub fn save(
        &self,
        path: &Path,
        backup: bool,
        now: UnixTime,
    ) -> Result<Option<PathBuf>, CatalogError> {
        let json = self.to_json()?;

        let guard = if backup {
            Some(BackupGuard::acquire(path, now)?)
        } else {
            None
        };

        write_atomic(path, &json).map_err(|source| CatalogError::Write {
            path: path.display().to_string(),
            source,
        })?;

        Ok(guard.and_then(BackupGuard::commit))
    }
}

fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Member;

    fn sample() -> FamilyCatalog {
        let mut catalog = FamilyCatalog::new();
        catalog.add_family(Family::new(2, "SOX", "SOX family", 10).with_members(vec![
            Member::new("2", "SOX9", "u"),
            Member::new("1", "SOX2", "u"),
        ]));
        catalog.add_family(Family::new(1, "KLF", "KLF factors", 10));
        catalog
    }

    #[test]
    fn test_get_by_symbol() {
        let catalog = sample();
        assert_eq!(catalog.get("KLF").unwrap().family_id, 1);
        assert!(catalog.get("NOPE").is_none());
        assert_eq!(catalog.max_family_id(), 2);
        assert_eq!(catalog.member_count(), 2);
    }

    #[test]
    fn test_sort_orders_families_and_members() {
        let mut catalog = sample();
        catalog.sort();
        assert_eq!(catalog.families[0].family_symbol, "KLF");
        assert_eq!(catalog.families[1].members[0].gene_symbol, "SOX2");
        // Index follows the new positions
        assert_eq!(catalog.get("SOX").unwrap().family_id, 2);
    }

    #[test]
    fn test_duplicate_symbols_are_kept() {
        let mut catalog = FamilyCatalog::new();
        catalog.add_family(Family::new(1, "KLF", "first", 10));
        catalog.add_family(Family::new(2, "KLF", "second", 10));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("KLF").unwrap().family_title, "first");
    }

    #[test]
    fn test_empty_max_id() {
        assert_eq!(FamilyCatalog::new().max_family_id(), 0);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FamilyCatalog::load_or_empty(&dir.path().join("catalog.json")).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.db.is_none());
    }

    #[test]
    fn test_parse_error_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{\"families\": [").unwrap();
        let err = FamilyCatalog::load_or_empty(&path).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
        assert!(err.to_string().contains("catalog.json"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let mut catalog = sample();
        catalog.db = Some(DbMetadata::pahg());

        let backup = catalog.save(&path, true, 1_700_000_000).unwrap();
        assert!(backup.is_none(), "nothing to back up on first write");

        let reloaded = FamilyCatalog::load_from_file(&path).unwrap();
        assert_eq!(reloaded.families, catalog.families);
        assert_eq!(reloaded.db, catalog.db);
    }

    #[test]
    fn test_save_backs_up_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{\"families\": []}").unwrap();

        let backup = sample().save(&path, true, 1_700_000_000).unwrap().unwrap();
        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            "catalog.bak.1700000000.json"
        );
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            "{\"families\": []}"
        );
        assert_eq!(FamilyCatalog::load_from_file(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_save_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(sample().save(&path, false, 5).unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
