use serde::Serialize;

use super::graph::{NodeId, OTHER_SEGMENT};
use super::grouping::GroupedTopCategories;
use super::transaction::Transaction;

/// Store key of the synthetic "Other" group.
pub const OTHER_KEY: &str = "__grouped_other__";

const KEY_SEPARATOR: &str = "::";
const LABEL_SEPARATOR: &str = " -> ";

/// A user-requested exclusion from the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "segments", rename_all = "snake_case")]
pub enum HiddenGroup {
    /// Everything currently collapsed into "Other".
    SyntheticOther,
    /// Every transaction whose path starts with these segments.
    PathPrefix(Vec<String>),
}

impl HiddenGroup {
    /// Derives the group for a node of a built graph. Returns `None` for the
    /// root, which cannot be hidden.
    pub fn from_node(node: &NodeId, grouped: &GroupedTopCategories) -> Option<Self> {
        let path = node.path();
        if path.is_empty() {
            return None;
        }
        if path.len() == 1 && path[0] == OTHER_SEGMENT && !grouped.is_empty() {
            return Some(HiddenGroup::SyntheticOther);
        }
        Some(HiddenGroup::PathPrefix(path.to_vec()))
    }

    pub fn key(&self) -> String {
        match self {
            HiddenGroup::SyntheticOther => OTHER_KEY.to_string(),
            HiddenGroup::PathPrefix(segments) => segments.join(KEY_SEPARATOR),
        }
    }

    pub fn label(&self) -> String {
        match self {
            HiddenGroup::SyntheticOther => OTHER_SEGMENT.to_string(),
            HiddenGroup::PathPrefix(segments) => segments.join(LABEL_SEPARATOR),
        }
    }

    pub fn matches(&self, tx: &Transaction, grouped: &GroupedTopCategories) -> bool {
        match self {
            HiddenGroup::SyntheticOther => grouped.absorbs(tx),
            HiddenGroup::PathPrefix(prefix) => tx.starts_with(prefix),
        }
    }
}

/// Number of transactions a group would hide.
pub fn count_matching(
    group: &HiddenGroup,
    transactions: &[Transaction],
    grouped: &GroupedTopCategories,
) -> usize {
    transactions
        .iter()
        .filter(|tx| group.matches(tx, grouped))
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HideOutcome {
    Hidden { key: String, count: usize },
    AlreadyHidden { key: String },
    /// The group would not remove anything right now.
    NoMatches { key: String },
    /// The root node.
    NotHideable,
    /// The node is not drawn under the current grouping, e.g. a category
    /// folded into "Other".
    NotInGraph { key: String },
}

/// Row of the hidden-groups listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiddenGroupEntry {
    pub key: String,
    pub label: String,
    pub count: usize,
}

/// Active exclusions for the loaded dataset, in the order they were added.
///
/// Survives rebuilds for threshold changes; cleared when a new dataset loads.
#[derive(Debug, Clone, Default)]
pub struct HiddenGroupStore {
    groups: Vec<HiddenGroup>,
}

impl HiddenGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide(
        &mut self,
        node: &NodeId,
        transactions: &[Transaction],
        grouped: &GroupedTopCategories,
    ) -> HideOutcome {
        let Some(group) = HiddenGroup::from_node(node, grouped) else {
            return HideOutcome::NotHideable;
        };
        let key = group.key();
        if let HiddenGroup::PathPrefix(segments) = &group {
            if segments.first().is_some_and(|top| grouped.contains(top)) {
                return HideOutcome::NotInGraph { key };
            }
        }
        if self.contains(&key) {
            return HideOutcome::AlreadyHidden { key };
        }

        let count = count_matching(&group, transactions, grouped);
        if count == 0 {
            tracing::debug!(%key, "hide skipped: group matches no transactions");
            return HideOutcome::NoMatches { key };
        }

        tracing::info!(%key, count, "hiding group");
        self.groups.push(group);
        HideOutcome::Hidden { key, count }
    }

    /// Removes the group stored under `key`. Returns whether anything changed.
    pub fn restore(&mut self, key: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.key() != key);
        let restored = self.groups.len() != before;
        if restored {
            tracing::info!(%key, "restored group");
        }
        restored
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.groups.iter().any(|g| g.key() == key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn is_hidden(&self, tx: &Transaction, grouped: &GroupedTopCategories) -> bool {
        self.groups.iter().any(|g| g.matches(tx, grouped))
    }

    /// Hidden groups with their current entry counts, for display.
    pub fn entries(
        &self,
        transactions: &[Transaction],
        grouped: &GroupedTopCategories,
    ) -> Vec<HiddenGroupEntry> {
        self.groups
            .iter()
            .map(|g| HiddenGroupEntry {
                key: g.key(),
                label: g.label(),
                count: count_matching(g, transactions, grouped),
            })
            .collect()
    }
}
