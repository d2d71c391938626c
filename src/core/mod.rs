//! Core data types for the gene-family catalog.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`Family`]: A named group of genes with a stable numeric identifier
//! - [`Member`]: A gene entry inside a family, keyed by gene symbol
//! - [`DbMetadata`]: Database-level metadata carried into the flat index
//!
//! ## Keys
//!
//! | Record | Key | Scope |
//! |--------|-----|-------|
//! | Family | `familySymbol` | whole catalog |
//! | Member | `geneSymbol` | owning family |
//!
//! The same gene symbol may appear in several families; that is not a conflict.

pub mod family;
pub mod types;

pub use family::{Family, Member, Upsert};
pub use types::{DbMetadata, UnixTime};
