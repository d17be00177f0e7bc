use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::{CanonicalOrderRow, GradeMixRow, ModelCapacityRow, ModelRow, OrderBreakdown};

/// Brand token stripped from the front of model names for reporting.
const BRAND_PREFIX: &str = "IPHONE ";

/// Strip a case-insensitive leading brand token, then trim. `"IPHONE 13 PRO"`
/// becomes `"13 PRO"`; anything without the prefix passes through trimmed.
pub fn clean_model(model: &str) -> String {
    let trimmed = model.trim();
    match trimmed.get(..BRAND_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(BRAND_PREFIX) => {
            trimmed[BRAND_PREFIX.len()..].trim_start().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Derive the three breakdown views for the selected orders.
///
/// Grouping is order-independent; output ordering is fixed: each view sorts
/// ascending by its label or grouping key tuple, plain lexicographic. Returns
/// `None` when no row matches the selection.
pub fn aggregate(rows: &[CanonicalOrderRow], selected_keys: &[String]) -> Option<OrderBreakdown> {
    let selected: HashSet<&str> = selected_keys.iter().map(String::as_str).collect();
    let filtered: Vec<&CanonicalOrderRow> = rows
        .iter()
        .filter(|r| selected.contains(r.order_key.as_str()))
        .collect();

    if filtered.is_empty() {
        return None;
    }

    let mut model_capacity: BTreeMap<(String, String), u32> = BTreeMap::new();
    let mut model_only: BTreeMap<String, u32> = BTreeMap::new();
    // Grade mix keeps the original model name, not the cleaned one.
    let mut grade_mix: BTreeMap<(String, String, String), u32> = BTreeMap::new();

    for row in &filtered {
        let clean = clean_model(&row.model);
        *model_capacity
            .entry((clean.clone(), row.capacity.clone()))
            .or_insert(0) += row.quantity;
        *model_only.entry(clean).or_insert(0) += row.quantity;
        *grade_mix
            .entry((row.model.clone(), row.capacity.clone(), row.grade.clone()))
            .or_insert(0) += row.quantity;
    }

    let mut by_model_capacity: Vec<ModelCapacityRow> = model_capacity
        .into_iter()
        .map(|((model, capacity), quantity)| ModelCapacityRow {
            label: format!("{model} {capacity}"),
            quantity,
        })
        .collect();
    // BTreeMap ordering is by (model, capacity); the output contract sorts by
    // the concatenated label, which can differ when models share a prefix.
    by_model_capacity.sort_by(|a, b| a.label.cmp(&b.label));

    let by_model = model_only
        .into_iter()
        .map(|(model, quantity)| ModelRow { model, quantity })
        .collect();

    let by_grade_model_capacity = grade_mix
        .into_iter()
        .map(|((model, capacity, grade), quantity)| GradeMixRow {
            grade,
            model,
            capacity,
            quantity,
        })
        .collect();

    Some(OrderBreakdown {
        by_model_capacity,
        by_model,
        by_grade_model_capacity,
    })
}

/// Distinct order keys present in the rows, sorted ascending.
pub fn order_keys(rows: &[CanonicalOrderRow]) -> Vec<String> {
    let keys: BTreeSet<&str> = rows.iter().map(|r| r.order_key.as_str()).collect();
    keys.into_iter().map(str::to_string).collect()
}

/// Rows belonging to one order, in ledger order.
pub fn rows_for_order<'a>(rows: &'a [CanonicalOrderRow], order_key: &str) -> Vec<&'a CanonicalOrderRow> {
    rows.iter().filter(|r| r.order_key == order_key).collect()
}

/// Total units across the given rows.
pub fn total_quantity<'a, I: IntoIterator<Item = &'a CanonicalOrderRow>>(rows: I) -> u32 {
    rows.into_iter().map(|r| r.quantity).sum()
}

/// Count of distinct original model names across the given rows.
pub fn distinct_model_count<'a, I: IntoIterator<Item = &'a CanonicalOrderRow>>(rows: I) -> u32 {
    let models: BTreeSet<&str> = rows.into_iter().map(|r| r.model.as_str()).collect();
    models.len() as u32
}
