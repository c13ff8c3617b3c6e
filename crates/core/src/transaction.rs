use serde::{Deserialize, Serialize};

use super::money::Money;

/// Segment used when a record has no usable category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Separator between levels of a category field (`Auto:Gas`).
pub const CATEGORY_SEPARATOR: char = ':';

/// A single flow through the graph: a non-empty category path and a positive
/// magnitude. Direction is implicit, so the sign of the source amount is
/// dropped on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    segments: Vec<String>,
    value: Money,
}

impl Transaction {
    /// Builds a transaction from a raw category field and a signed amount.
    /// Returns `None` for a zero amount.
    pub fn new(category: &str, amount: Money) -> Option<Self> {
        Self::from_segments(parse_category_path(category), amount)
    }

    pub fn from_segments(segments: Vec<String>, amount: Money) -> Option<Self> {
        if amount.is_zero() {
            return None;
        }
        let segments = if segments.is_empty() {
            vec![UNCATEGORIZED.to_string()]
        } else {
            segments
        };
        Some(Transaction {
            segments,
            value: amount.abs(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn value(&self) -> Money {
        self.value
    }

    pub fn top_level(&self) -> &str {
        // Non-empty by construction.
        &self.segments[0]
    }

    /// True when this path begins with exactly `prefix`, segment by segment.
    pub fn starts_with(&self, prefix: &[String]) -> bool {
        self.segments.starts_with(prefix)
    }
}

/// Splits a category field on `:`, trimming each part and dropping empties.
/// Falls back to `["Uncategorized"]` when nothing survives.
pub fn parse_category_path(raw: &str) -> Vec<String> {
    let segments: Vec<String> = raw
        .split(CATEGORY_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        vec![UNCATEGORIZED.to_string()]
    } else {
        segments
    }
}
