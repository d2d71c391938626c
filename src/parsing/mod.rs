//! Parsers for batch documents.
//!
//! A batch is a partial update to the catalog. On disk it is JSON in one of
//! two shapes:
//!
//! ```json
//! [ { "familySymbol": "KLF", "members": [ ... ] } ]
//! ```
//!
//! or
//!
//! ```json
//! { "families": [ { "familySymbol": "KLF", "members": [ ... ] } ] }
//! ```
//!
//! ## Family fields
//!
//! | Field | Required |
//! |-------|----------|
//! | familySymbol | Yes |
//! | familyTitle | No |
//! | familyUrl | No |
//! | familyDescription | No |
//! | members | No |
//!
//! ## Member fields
//!
//! | Field | Required |
//! |-------|----------|
//! | geneSymbol | Yes |
//! | memberId | No (string or integer) |
//! | url | No |

pub mod batch;

pub use batch::{Batch, BatchError, BatchSource, FamilyInput, MemberIdInput, MemberInput};
