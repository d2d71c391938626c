//! Flat index export.
//!
//! The index is a UTF-8 text file with one record per line. Each line is a tag,
//! a tab, and a compact single-line JSON object:
//!
//! ```text
//! DB	{"id":"PAHG","name":"PAHG",...}
//! ENTRY	{"id":"KLF","type":"family","title":"KLF factors",...}
//! ENTRY	{"id":"KLF1","type":"gene","title":"KLF1",...}
//! ```
//!
//! The `DB` line comes first. Every family is followed by its genes in the
//! family's member order. Nothing in the output depends on the time of export.
//!
//! ## URLs
//!
//! Only the path of each URL is percent-encoded. ASCII letters, digits and
//! `/ % . _ - ~` are kept, so `+`, `(` and `)` become `%2B`, `%28` and `%29`
//! and existing escapes are not doubled. Scheme is lowercased; host, query and
//! fragment are copied verbatim. A blank `familyUrl` is replaced by the URL
//! derived from the family symbol.

pub mod index;

pub use index::{
    encode_url, export_catalog, render_lines, EntryAttrs, EntryKind, ExportError, IndexEntry,
    IndexLine,
};
