//! `ordermatch-ledger` — Order ledger engine.
//!
//! Pure engine crate: receives raw ledger tables, returns canonical rows and
//! derived breakdowns. No CLI or IO dependencies beyond the source trait.

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod model;
pub mod normalize;
pub mod source;

pub use aggregate::aggregate;
pub use cache::LedgerCache;
pub use error::LedgerError;
pub use model::{CanonicalOrderRow, OrderBreakdown};
pub use normalize::normalize;
pub use source::LedgerSource;
