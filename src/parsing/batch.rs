use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read batch {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse batch {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Batch {0} must be a JSON array of families or an object with a \"families\" array")]
    Shape(String),
}

/// Member identifier as written in a batch: either `"710"` or `710`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MemberIdInput {
    Text(String),
    Number(u64),
}

impl fmt::Display for MemberIdInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s.trim()),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// A member as described in a batch, before normalization
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    #[serde(default)]
    pub member_id: Option<MemberIdInput>,

    #[serde(default)]
    pub gene_symbol: Option<String>,

    #[serde(default)]
    pub url: Option<String>,
}

impl MemberInput {
    pub fn new(member_id: impl Into<String>, gene_symbol: impl Into<String>) -> Self {
        Self {
            member_id: Some(MemberIdInput::Text(member_id.into())),
            gene_symbol: Some(gene_symbol.into()),
            url: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A family as described in a batch, before normalization
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInput {
    #[serde(default)]
    pub family_symbol: Option<String>,

    #[serde(default)]
    pub family_title: Option<String>,

    #[serde(default)]
    pub family_url: Option<String>,

    #[serde(default)]
    pub family_description: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub members: Vec<MemberInput>,
}

/// `"members": null` reads as no members
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<MemberInput>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<MemberInput>>::deserialize(deserializer)?.unwrap_or_default())
}

impl FamilyInput {
    pub fn new(family_symbol: impl Into<String>) -> Self {
        Self {
            family_symbol: Some(family_symbol.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.family_title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_members(mut self, members: Vec<MemberInput>) -> Self {
        self.members = members;
        self
    }
}

/// One batch document: an ordered list of family descriptions plus a label
/// naming where it came from (used in error messages)
#[derive(Debug, Clone)]
pub struct Batch {
    pub origin: String,
    pub families: Vec<FamilyInput>,
}

impl Batch {
    pub fn new(origin: impl Into<String>, families: Vec<FamilyInput>) -> Self {
        Self {
            origin: origin.into(),
            families,
        }
    }

    /// Parse a batch from JSON text
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Parse` for malformed JSON or fields of the wrong
    /// type, and `BatchError::Shape` for a document of the wrong shape.
    pub fn from_json(json: &str, origin: &str) -> Result<Self, BatchError> {
        let parse_err = |source| BatchError::Parse {
            path: origin.to_string(),
            source,
        };
        let value: serde_json::Value = serde_json::from_str(json).map_err(parse_err)?;

        let list = match value {
            serde_json::Value::Array(items) => serde_json::Value::Array(items),
            serde_json::Value::Object(mut map) => match map.remove("families") {
                Some(families @ serde_json::Value::Array(_)) => families,
                _ => return Err(BatchError::Shape(origin.to_string())),
            },
            _ => return Err(BatchError::Shape(origin.to_string())),
        };

        let families: Vec<FamilyInput> = serde_json::from_value(list).map_err(parse_err)?;
        Ok(Self::new(origin, families))
    }

    /// Read and parse a batch file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, BatchError> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| BatchError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::from_json(&content, &origin)
    }
}

/// Where a merge run takes its batches from
#[derive(Debug, Clone)]
pub enum BatchSource {
    /// A single batch file
    File(PathBuf),
    /// Every `*.json` file in a directory, in filename order
    Directory(PathBuf),
    /// Batches supplied directly by the caller
    Inline(Vec<Batch>),
}

impl BatchSource {
    /// Pick `File` or `Directory` depending on what `path` is
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            Self::Directory(path)
        } else {
            Self::File(path)
        }
    }

    /// Load every batch this source provides, in processing order
    ///
    /// A missing directory yields no batches; a missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns the first read or parse error encountered.
    pub fn load(&self) -> Result<Vec<Batch>, BatchError> {
        match self {
            Self::File(path) => Ok(vec![Batch::load_from_file(path)?]),
            Self::Directory(dir) => {
                if !dir.exists() {
                    tracing::warn!("Batch directory {} does not exist", dir.display());
                    return Ok(Vec::new());
                }
                let entries = std::fs::read_dir(dir).map_err(|source| BatchError::Read {
                    path: dir.display().to_string(),
                    source,
                })?;

                let mut paths = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|source| BatchError::Read {
                        path: dir.display().to_string(),
                        source,
                    })?;
                    let path = entry.path();
                    let is_json = path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                    if is_json && path.is_file() {
                        paths.push(path);
                    }
                }
                paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

                let mut batches = Vec::with_capacity(paths.len());
                for path in &paths {
                    tracing::debug!("Loading batch {}", path.display());
                    batches.push(Batch::load_from_file(path)?);
                }
                Ok(batches)
            }
            Self::Inline(batches) => Ok(batches.clone()),
        }
    }
}
