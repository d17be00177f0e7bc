//! `ordermatch-store` — durable reconciliation state per order.
//!
//! Owns the only writable copies of [`ReconciliationRecord`] and
//! [`ArchivedOrder`]. Records survive the source ledger's churn: an order can
//! vanish from the ledger while its uploaded evidence and notes persist here,
//! or get frozen into an archive.

pub mod error;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use record::{
    ArchivedOrder, FileAttachment, FulfillmentStatus, OrderStatistics, ReconciliationRecord,
    RecordPatch,
};
pub use store::ReconStore;
