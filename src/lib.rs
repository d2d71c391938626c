//! # genefam
//!
//! A library for maintaining a gene-family catalog.
//!
//! A catalog is a JSON document listing gene families (a symbol, a title and a
//! stable numeric id) and the member genes of each family. New families and
//! genes arrive as batch files. `genefam` merges batches into the catalog
//! without duplicating families or genes, checks the catalog's structural
//! invariants, and exports a flat line-oriented index for search tools.
//!
//! ## Features
//!
//! - **Idempotent merging**: Re-applying a batch leaves the catalog unchanged
//! - **Stable ids**: Family ids are assigned once, as max existing id + 1
//! - **URL repair**: Member URLs are checked against the canonical pattern and
//!   rebuilt from the member id when they do not match
//! - **Safe writes**: The previous catalog is backed up and writes are atomic
//! - **Deterministic export**: The index depends only on the catalog contents
//!
//! ## Example
//!
//! ```rust,no_run
//! use genefam::{FamilyCatalog, Merger, Validator};
//! use genefam::parsing::Batch;
//! use genefam::utils::validation::UrlScheme;
//!
//! let scheme = UrlScheme::new("www.pahgncb.com").unwrap();
//! let batch = Batch::from_json(
//!     r#"[{"familySymbol":"KLF","familyTitle":"Kruppel like factors",
//!          "members":[{"memberId":"3046","geneSymbol":"KLF1"}]}]"#,
//!     "inline",
//! )
//! .unwrap();
//!
//! let (catalog, report) = Merger::new(&scheme, 1_700_000_000)
//!     .merge(FamilyCatalog::new(), &[batch])
//!     .unwrap();
//! println!("{report}");
//!
//! let check = Validator::new(&scheme).validate(&catalog);
//! assert!(check.is_ok());
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Catalog storage, merging and validation
//! - [`core`]: Core data types for families, members and database metadata
//! - [`parsing`]: Batch file parsing
//! - [`export`]: Flat index export
//! - [`config`]: Runtime configuration
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod export;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::merge::{MergeError, MergeReport, Merger};
pub use catalog::store::{CatalogError, FamilyCatalog};
pub use catalog::validate::{ValidationReport, Validator};
pub use config::Config;
pub use core::family::{Family, Member};
pub use core::types::*;
