use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::money::Money;
use super::transaction::Transaction;

/// Top-level categories whose total falls below the active threshold.
///
/// Always rebuilt from scratch by [`group_top_categories`]; there is no way to
/// add or remove a single entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupedTopCategories(BTreeSet<String>);

impl GroupedTopCategories {
    pub fn contains(&self, top_level: &str) -> bool {
        self.0.contains(top_level)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the transaction belongs in the synthetic "Other" bucket.
    pub fn absorbs(&self, tx: &Transaction) -> bool {
        self.contains(tx.top_level())
    }
}

/// Sums transaction values per top-level category.
pub fn top_level_totals(transactions: &[Transaction]) -> BTreeMap<&str, Money> {
    let mut totals: BTreeMap<&str, Money> = BTreeMap::new();
    for tx in transactions {
        *totals.entry(tx.top_level()).or_default() += tx.value();
    }
    totals
}

/// Returns the top-level categories whose total is strictly below `threshold`.
/// A threshold that is zero, negative or not finite disables grouping.
pub fn group_top_categories(transactions: &[Transaction], threshold: f64) -> GroupedTopCategories {
    if !threshold.is_finite() || threshold <= 0.0 {
        return GroupedTopCategories::default();
    }

    let grouped: BTreeSet<String> = match Money::from_f64(threshold) {
        Some(limit) => top_level_totals(transactions)
            .into_iter()
            .filter(|(_, total)| *total < limit)
            .map(|(name, _)| name.to_string())
            .collect(),
        // Larger than any representable total.
        None => top_level_totals(transactions)
            .into_keys()
            .map(str::to_string)
            .collect(),
    };

    tracing::debug!(threshold, grouped = grouped.len(), "grouped top-level categories");
    GroupedTopCategories(grouped)
}
