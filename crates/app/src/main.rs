//! sankeyfin - transaction exports to Sankey flow graphs
//!
//! Usage:
//!   sankeyfin convert --xlsx export.xlsx --out export.csv
//!   sankeyfin graph export.csv --threshold 250 --hide 1:Other
//!   sankeyfin categories export.csv
//!   sankeyfin raw export.csv

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use sankeyfin::{Session, SessionConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Convert {
            input,
            output,
            header_row,
            sheet,
        } => commands::cmd_convert(
            &config,
            &input,
            &output,
            header_row,
            sheet.as_deref(),
            &mut out,
        ),
        Commands::Graph {
            file,
            threshold,
            hide,
            pretty,
        } => {
            let mut session = Session::new(config);
            commands::cmd_graph(&mut session, &file, threshold, &hide, pretty, &mut out)
        }
        Commands::Categories { file, threshold } => {
            let mut session = Session::new(config);
            commands::cmd_categories(&mut session, &file, threshold, &mut out)
        }
        Commands::Raw { file } => {
            let mut session = Session::new(config);
            commands::cmd_raw(&mut session, &file, &mut out)
        }
    }
}
