use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Canonical rows
// ---------------------------------------------------------------------------

/// One normalized line item of an order. Rows sharing an `order_key` form an
/// order. Rebuilt from the source ledger on every refresh, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOrderRow {
    pub order_key: String,
    pub model: String,
    pub capacity: String,
    pub grade: String,
    pub quantity: u32,
    /// Passthrough columns from the source row, keyed by cleaned header name.
    /// Free-form; carried so archive snapshots round-trip without loss.
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// Breakdowns
// ---------------------------------------------------------------------------

/// Quantity summed by (clean model, capacity), labelled "{model} {capacity}".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCapacityRow {
    pub label: String,
    pub quantity: u32,
}

/// Quantity summed by clean model alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRow {
    pub model: String,
    pub quantity: u32,
}

/// Quantity summed by (original model, capacity, grade).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeMixRow {
    pub grade: String,
    pub model: String,
    pub capacity: String,
    pub quantity: u32,
}

/// The three derived views over a selection of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBreakdown {
    pub by_model_capacity: Vec<ModelCapacityRow>,
    pub by_model: Vec<ModelRow>,
    pub by_grade_model_capacity: Vec<GradeMixRow>,
}
