use chrono::{DateTime, Utc};
use ordermatch_ledger::CanonicalOrderRow;

use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Live record
// ---------------------------------------------------------------------------

/// An evidence file held on a record. Filename, bytes, and upload time always
/// travel together; "ASN present" means this struct exists, so the pairing
/// invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub uploaded_at: DateTime<Utc>,
}

/// Durable per-order reconciliation state. Created lazily on the first upload
/// or note save; removed by explicit delete or by archiving, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationRecord {
    pub order_key: String,
    pub reconciled: bool,
    pub reconciled_at: Option<DateTime<Utc>>,
    pub asn: Option<FileAttachment>,
    pub identifier_file: Option<FileAttachment>,
    pub identifier_count: Option<u32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReconciliationRecord {
    pub fn asn_present(&self) -> bool {
        self.asn.is_some()
    }

    pub fn identifier_file_present(&self) -> bool {
        self.identifier_file.is_some()
    }

    pub fn status(&self) -> FulfillmentStatus {
        match (self.asn.is_some(), self.identifier_file.is_some()) {
            (true, true) => FulfillmentStatus::Complete,
            (true, false) => FulfillmentStatus::AsnOnly,
            _ => FulfillmentStatus::Pending,
        }
    }
}

/// Fulfillment progress derived from which evidence files are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentStatus {
    Pending,
    AsnOnly,
    Complete,
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::AsnOnly => write!(f, "asn_only"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Partial update for [`ReconStore::upsert`]: a present field replaces the
/// stored value, an absent field preserves it. Clearing a file goes through
/// the explicit `clear_*` operations, not a patch.
///
/// [`ReconStore::upsert`]: crate::store::ReconStore::upsert
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub asn: Option<FileAttachment>,
    pub identifier_file: Option<FileAttachment>,
    pub identifier_count: Option<u32>,
    pub notes: Option<String>,
    pub reconciled: Option<bool>,
}

/// Counts over all live records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStatistics {
    pub total_orders: usize,
    pub with_asn: usize,
    pub with_identifier_file: usize,
    pub pending: usize,
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Frozen snapshot of an order taken at archive time. Immutable afterwards;
/// destroyed only by explicit delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedOrder {
    pub order_key: String,
    /// JSON-serialized canonical rows at archive time, if any existed.
    pub order_data: Option<String>,
    pub total_quantity: Option<u32>,
    pub distinct_model_count: Option<u32>,
    pub asn_filename: Option<String>,
    pub asn_bytes: Option<Vec<u8>>,
    pub identifier_filename: Option<String>,
    pub identifier_bytes: Option<Vec<u8>>,
    pub notes: Option<String>,
    pub archived_at: DateTime<Utc>,
}

impl ArchivedOrder {
    /// Deserialize the canonical rows captured at archive time. Empty when no
    /// ledger rows existed for the order.
    pub fn snapshot_rows(&self) -> Result<Vec<CanonicalOrderRow>, StoreError> {
        match &self.order_data {
            Some(json) => serde_json::from_str(json)
                .map_err(|e| StoreError::Persistence(format!("corrupt archive snapshot: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}
