//! Gene-family catalog storage, merging and validation.
//!
//! The catalog is a JSON document holding database metadata and a list of
//! families, each with its members. It is read and written as a whole.
//!
//! ## Merging
//!
//! ```rust,no_run
//! use genefam::catalog::{merge::Merger, store::FamilyCatalog};
//! use genefam::parsing::BatchSource;
//! use genefam::utils::validation::UrlScheme;
//! use std::path::Path;
//!
//! let scheme = UrlScheme::new("www.pahgncb.com").unwrap();
//! let base = FamilyCatalog::load_or_empty(Path::new("catalog.json")).unwrap();
//! let batches = BatchSource::from_path("data/batches").load().unwrap();
//!
//! let (merged, report) = Merger::new(&scheme, 1_700_000_000)
//!     .merge(base, &batches)
//!     .unwrap();
//! merged.save(Path::new("catalog.json"), true, 1_700_000_000).unwrap();
//! println!("{report}");
//! ```
//!
//! ## Validation
//!
//! ```rust,no_run
//! use genefam::catalog::{store::FamilyCatalog, validate::Validator};
//! use genefam::utils::validation::UrlScheme;
//! use std::path::Path;
//!
//! let scheme = UrlScheme::new("www.pahgncb.com").unwrap();
//! let catalog = FamilyCatalog::load_from_file(Path::new("catalog.json")).unwrap();
//! let report = Validator::new(&scheme).validate(&catalog);
//! for problem in report.errors() {
//!     println!("{problem}");
//! }
//! ```

pub mod backup;
pub mod merge;
pub mod store;
pub mod validate;
