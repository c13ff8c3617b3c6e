//! CLI argument definitions using clap
//!
//! The command implementations live in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// sankeyfin - turn transaction exports into category flow graphs
#[derive(Parser)]
#[command(name = "sankeyfin")]
#[command(about = "Build Sankey flow graphs from transaction CSV and spreadsheet exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Session settings (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a spreadsheet export to CSV
    Convert {
        /// Spreadsheet to convert
        #[arg(long = "xlsx", value_name = "INPUT")]
        input: PathBuf,

        /// Target CSV path
        #[arg(long = "out", value_name = "OUTPUT")]
        output: PathBuf,

        /// Zero-based header row (defaults to 4, the fifth row)
        #[arg(long)]
        header_row: Option<usize>,

        /// Worksheet name (defaults to the first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Print the flow graph of a file as JSON
    Graph {
        /// CSV or spreadsheet file
        file: PathBuf,

        /// Group top-level categories totalling less than this into "Other"
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Hide a node by id (e.g. `1:Other`, `2:Auto::Gas`); repeatable
        #[arg(long = "hide", value_name = "NODE_ID")]
        hide: Vec<String>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show per top-level category totals and which ones would be grouped
    Categories {
        /// CSV or spreadsheet file
        file: PathBuf,

        /// Grouping threshold
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Print the parsed headers and rows
    Raw {
        /// CSV or spreadsheet file
        file: PathBuf,
    },
}
