//! `ordermatch-evidence` — identifier extraction from uploaded evidence files.
//!
//! Operates purely on `(bytes, filename)` pairs handed across the upload
//! boundary; no network or filesystem access. Errors are always returned as
//! values, never panics.

pub mod error;
pub mod extract;

pub use error::ExtractError;
pub use extract::{extract, is_valid_identifier, read_table, EvidenceKind, Extraction};
