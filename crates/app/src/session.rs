use std::path::{Path, PathBuf};

use sankeyfin_core::{
    build_graph, group_top_categories, top_level_totals, Graph, GroupedTopCategories,
    HiddenGroup, HiddenGroupEntry, HiddenGroupStore, HideOutcome, Money, NodeId, Transaction,
};
use sankeyfin_import::import::{convert_sheet, import_csv, import_transactions};
use sankeyfin_import::{
    extract_transactions, NormalizeError, ParseError, ParsedTable, Record, SheetValue,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::{sanitize_threshold, SessionConfig};
use crate::workbook::{is_spreadsheet, read_grid, WorkbookError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Per top-level category total, for threshold tuning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    pub grouped: bool,
}

/// Everything the shell needs between rebuilds: the loaded table, the active
/// threshold, and the hidden groups chosen for this dataset.
///
/// State-changing calls never rebuild on their own; call [`Session::rebuild`]
/// afterwards.
#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
    table: Option<ParsedTable>,
    source: Option<PathBuf>,
    hidden: HiddenGroupStore,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Session {
            config,
            ..Session::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── loading ───────────────────────────────────────────────────────────────

    /// Replaces the dataset with parsed text and forgets hidden groups.
    /// On error the previous dataset stays loaded.
    pub fn load_text(&mut self, text: &str) -> Result<&ParsedTable, ParseError> {
        let table = import_csv(text)?;
        Ok(self.install(table, None))
    }

    /// Normalizes a spreadsheet grid into text, then loads it.
    pub fn load_grid(&mut self, grid: &[Vec<SheetValue>]) -> Result<&ParsedTable, LoadError> {
        let table = self.parse_grid(grid)?;
        Ok(self.install(table, None))
    }

    /// Loads a file, reading spreadsheets by extension and anything else as
    /// UTF-8 text.
    pub fn load_path(&mut self, path: &Path) -> Result<&ParsedTable, LoadError> {
        let table = if is_spreadsheet(path) {
            let grid = read_grid(path, self.config.sheet.as_deref())?;
            self.parse_grid(&grid)?
        } else {
            import_csv(&std::fs::read_to_string(path)?)?
        };
        Ok(self.install(table, Some(path.to_path_buf())))
    }

    fn parse_grid(&self, grid: &[Vec<SheetValue>]) -> Result<ParsedTable, LoadError> {
        let text = convert_sheet(grid, &self.config.normalize_options())?;
        Ok(import_csv(&text)?)
    }

    fn install(&mut self, table: ParsedTable, source: Option<PathBuf>) -> &ParsedTable {
        tracing::info!(
            columns = table.header().len(),
            rows = table.len(),
            source = ?source,
            "loaded dataset"
        );
        self.hidden.clear();
        self.source = source;
        self.table.insert(table)
    }

    pub fn table(&self) -> Option<&ParsedTable> {
        self.table.as_ref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    // ── threshold ─────────────────────────────────────────────────────────────

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Sets the grouping threshold, falling back to the default for negative
    /// or non-finite input. Returns the value applied.
    pub fn set_threshold(&mut self, threshold: f64) -> f64 {
        self.config.threshold = sanitize_threshold(threshold);
        self.config.threshold
    }

    // ── derived data ──────────────────────────────────────────────────────────

    /// Transactions of the loaded dataset, extracted afresh.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.table
            .as_ref()
            .map(import_transactions)
            .unwrap_or_default()
    }

    pub fn grouped(&self) -> GroupedTopCategories {
        group_top_categories(&self.transactions(), self.config.threshold)
    }

    pub fn category_totals(&self) -> Vec<CategoryTotal> {
        let transactions = self.transactions();
        let grouped = group_top_categories(&transactions, self.config.threshold);
        top_level_totals(&transactions)
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                grouped: grouped.contains(category),
                category: category.to_string(),
                total,
            })
            .collect()
    }

    /// Recomputes the graph from the loaded records, current threshold and
    /// hidden groups. Empty when nothing is loaded.
    pub fn rebuild(&self) -> Graph {
        let transactions = self.transactions();
        let grouped = group_top_categories(&transactions, self.config.threshold);
        build_graph(&transactions, &grouped, &self.hidden)
    }

    // ── hidden groups ─────────────────────────────────────────────────────────

    /// Hides the group behind a node of the current graph. Nodes the graph
    /// does not draw are left alone.
    pub fn hide(&mut self, node: &NodeId) -> HideOutcome {
        let transactions = self.transactions();
        let grouped = group_top_categories(&transactions, self.config.threshold);
        if let Some(group) = HiddenGroup::from_node(node, &grouped) {
            let key = group.key();
            if !self.hidden.contains(&key)
                && build_graph(&transactions, &grouped, &self.hidden)
                    .node(node)
                    .is_none()
            {
                return HideOutcome::NotInGraph { key };
            }
        }
        self.hidden.hide(node, &transactions, &grouped)
    }

    pub fn restore(&mut self, key: &str) -> bool {
        self.hidden.restore(key)
    }

    pub fn clear_hidden(&mut self) {
        self.hidden.clear();
    }

    pub fn hidden(&self) -> &HiddenGroupStore {
        &self.hidden
    }

    pub fn hidden_entries(&self) -> Vec<HiddenGroupEntry> {
        let transactions = self.transactions();
        let grouped = group_top_categories(&transactions, self.config.threshold);
        self.hidden.entries(&transactions, &grouped)
    }
}

/// One-shot pipeline from records to graph.
pub fn build_flow_graph(records: &[Record], threshold: f64, hidden: &HiddenGroupStore) -> Graph {
    let transactions = extract_transactions(records);
    let grouped = group_top_categories(&transactions, threshold);
    build_graph(&transactions, &grouped, hidden)
}
