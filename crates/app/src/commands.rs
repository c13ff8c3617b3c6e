//! CLI command implementations

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use sankeyfin::{read_grid, Session, SessionConfig};
use sankeyfin_core::{Graph, GroupedTopCategories, HiddenGroupEntry, HideOutcome, NodeId};
use sankeyfin_import::normalize_spreadsheet;
use serde::Serialize;

const EMPTY_GRAPH_MESSAGE: &str = "No valid Category/Amount transactions were found.";

#[derive(Serialize)]
struct GraphReport<'a> {
    threshold: f64,
    grouped: &'a GroupedTopCategories,
    hidden: Vec<HiddenGroupEntry>,
    graph: &'a Graph,
}

pub fn cmd_convert(
    config: &SessionConfig,
    input: &Path,
    output: &Path,
    header_row: Option<usize>,
    sheet: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let mut options = config.normalize_options();
    if let Some(row) = header_row {
        options.header_row_index = row;
    }
    let sheet = sheet.or(config.sheet.as_deref());

    let grid = read_grid(input, sheet)
        .with_context(|| format!("Failed to read spreadsheet: {}", input.display()))?;
    let csv = normalize_spreadsheet(&grid, &options)
        .with_context(|| format!("Failed to convert {}", input.display()))?;
    std::fs::write(output, csv)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(input = %input.display(), output = %output.display(), "converted spreadsheet");
    writeln!(out, "Converted {} -> {}", input.display(), output.display())?;
    Ok(())
}

pub fn cmd_graph(
    session: &mut Session,
    file: &Path,
    threshold: Option<f64>,
    hide: &[String],
    pretty: bool,
    out: &mut impl Write,
) -> Result<()> {
    load(session, file)?;
    if let Some(threshold) = threshold {
        session.set_threshold(threshold);
    }

    for raw in hide {
        let node: NodeId = raw
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("Invalid --hide value: {raw}"))?;
        match session.hide(&node) {
            HideOutcome::Hidden { key, count } => {
                tracing::info!("Hid {count} entries in {key}");
            }
            HideOutcome::AlreadyHidden { key } => {
                tracing::warn!("{key} is already hidden");
            }
            HideOutcome::NoMatches { key } => {
                tracing::warn!("{key} matches no transactions; nothing hidden");
            }
            HideOutcome::NotHideable => {
                tracing::warn!("The root node cannot be hidden");
            }
            HideOutcome::NotInGraph { key } => {
                tracing::warn!("{key} is not drawn in the current graph; nothing hidden");
            }
        }
    }

    let graph = session.rebuild();
    if graph.is_empty() {
        tracing::warn!("{EMPTY_GRAPH_MESSAGE}");
    }

    let grouped = session.grouped();
    let report = GraphReport {
        threshold: session.threshold(),
        grouped: &grouped,
        hidden: session.hidden_entries(),
        graph: &graph,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    writeln!(out, "{json}")?;
    Ok(())
}

pub fn cmd_categories(
    session: &mut Session,
    file: &Path,
    threshold: Option<f64>,
    out: &mut impl Write,
) -> Result<()> {
    load(session, file)?;
    if let Some(threshold) = threshold {
        session.set_threshold(threshold);
    }

    writeln!(out, "Threshold: {}", session.threshold())?;
    for entry in session.category_totals() {
        let marker = if entry.grouped { "  -> Other" } else { "" };
        writeln!(out, "{:<30} {:>14}{marker}", entry.category, entry.total.to_string())?;
    }
    Ok(())
}

pub fn cmd_raw(session: &mut Session, file: &Path, out: &mut impl Write) -> Result<()> {
    load(session, file)?;
    let Some(table) = session.table() else {
        writeln!(out, "No data loaded.")?;
        return Ok(());
    };
    let view = table.raw_view();

    writeln!(out, "Loaded: {}", file.display())?;
    writeln!(
        out,
        "Parsed {} rows across {} columns.",
        view.rows.len(),
        view.headers.len()
    )?;
    writeln!(out, "Headers: {}", view.headers.join(", "))?;
    for (i, row) in view.rows.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, row.join(" | "))?;
    }
    Ok(())
}

fn load(session: &mut Session, file: &Path) -> Result<()> {
    session
        .load_path(file)
        .with_context(|| format!("Failed to parse file: {}", file.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn run_graph(content: &str, threshold: Option<f64>, hide: &[&str]) -> serde_json::Value {
        let file = csv_file(content);
        let mut session = Session::default();
        let hide: Vec<String> = hide.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        cmd_graph(&mut session, file.path(), threshold, &hide, false, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    const SAMPLE: &str = "Category,Amount\nAuto:Gas,100\nAuto:Insurance,50\nTax,5\n";

    #[test]
    fn graph_outputs_nodes_and_links() {
        let json = run_graph(SAMPLE, Some(0.0), &[]);
        let labels: Vec<&str> = json["graph"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Transactions", "Auto", "Gas", "Insurance", "Tax"]);
        assert_eq!(json["graph"]["nodes"][2]["id"], "2:Auto::Gas");
        assert_eq!(json["graph"]["links"].as_array().unwrap().len(), 4);
        assert_eq!(json["graph"]["links"][0]["source"], "root");
        assert_eq!(json["graph"]["links"][0]["target"], "1:Auto");
        assert_eq!(json["graph"]["links"][1]["source"], "1:Auto");
        assert_eq!(json["graph"]["links"][1]["target"], "2:Auto::Gas");
    }

    #[test]
    fn graph_applies_hide_and_reports_it() {
        let json = run_graph(SAMPLE, Some(10.0), &["1:Other"]);
        assert_eq!(json["grouped"], serde_json::json!(["Tax"]));
        assert_eq!(json["hidden"][0]["key"], "__grouped_other__");
        assert_eq!(json["hidden"][0]["count"], 1);
        assert_eq!(json["graph"]["links"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn graph_skips_hide_of_folded_category() {
        let json = run_graph(SAMPLE, Some(10.0), &["1:Tax"]);
        assert_eq!(json["hidden"], serde_json::json!([]));
        let targets: Vec<&str> = json["graph"]["links"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["target"].as_str().unwrap())
            .collect();
        assert!(targets.contains(&"1:Other"));
    }

    #[test]
    fn graph_rejects_malformed_node_id() {
        let file = csv_file(SAMPLE);
        let mut session = Session::default();
        let mut out = Vec::new();
        let result = cmd_graph(
            &mut session,
            file.path(),
            None,
            &["nonsense".to_string()],
            false,
            &mut out,
        );
        assert!(result.is_err());
    }

    #[test]
    fn graph_fails_on_malformed_csv() {
        let file = csv_file("Category\n\"Food\n");
        let mut session = Session::default();
        let mut out = Vec::new();
        let err = cmd_graph(&mut session, file.path(), None, &[], false, &mut out).unwrap_err();
        assert!(format!("{err:#}").contains("unmatched quote"));
    }

    #[test]
    fn categories_marks_grouped() {
        let file = csv_file(SAMPLE);
        let mut session = Session::default();
        let mut out = Vec::new();
        cmd_categories(&mut session, file.path(), Some(10.0), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Threshold: 10"));
        assert!(text.lines().any(|l| l.starts_with("Tax") && l.ends_with("-> Other")));
        assert!(text.lines().any(|l| l.starts_with("Auto") && !l.contains("Other")));
    }

    #[test]
    fn raw_lists_every_row() {
        let file = csv_file(SAMPLE);
        let mut session = Session::default();
        let mut out = Vec::new();
        cmd_raw(&mut session, file.path(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Parsed 3 rows across 2 columns."));
        assert!(text.contains("Headers: Category, Amount"));
        assert!(text.contains("3. Tax | 5"));
    }

    #[test]
    fn convert_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let result = cmd_convert(
            &SessionConfig::default(),
            &dir.path().join("missing.xlsx"),
            &dir.path().join("out.csv"),
            None,
            None,
            &mut out,
        );
        assert!(result.is_err());
        assert!(!dir.path().join("out.csv").exists());
    }
}
