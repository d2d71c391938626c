use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch
pub type UnixTime = i64;

/// Current wall-clock time as a [`UnixTime`]
#[must_use]
pub fn now() -> UnixTime {
    chrono::Utc::now().timestamp()
}

/// Render a [`UnixTime`] as a UTC date for display
#[must_use]
pub fn format_timestamp(ts: UnixTime) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Database-level metadata for the catalog
///
/// Serialized verbatim as the `DB` line of the flat index, so field order
/// here is the field order in the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DbMetadata {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub species: Vec<String>,

    /// Last time a merge changed the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<UnixTime>,
}

impl DbMetadata {
    /// The stock metadata for the PAHG gene-family database
    #[must_use]
    pub fn pahg() -> Self {
        Self {
            id: "PAHG".to_string(),
            name: "PAHG".to_string(),
            url: "https://www.pahgncb.com/".to_string(),
            version: "1.0".to_string(),
            species: Vec::new(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_metadata_field_order() {
        let mut db = DbMetadata::pahg();
        db.updated_at = Some(1_700_000_000);
        let json = serde_json::to_string(&db).unwrap();
        assert_eq!(
            json,
            r#"{"id":"PAHG","name":"PAHG","url":"https://www.pahgncb.com/","version":"1.0","species":[],"updatedAt":1700000000}"#
        );
    }

    #[test]
    fn test_db_metadata_tolerates_missing_fields() {
        let db: DbMetadata = serde_json::from_str(r#"{"name":"Mini"}"#).unwrap();
        assert_eq!(db.name, "Mini");
        assert!(db.id.is_empty());
        assert!(db.updated_at.is_none());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
    }
}
