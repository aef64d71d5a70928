use std::path::{Path, PathBuf};

use crate::prelude::{eprintln, *};
use clap::Parser;
use log::info;
use pdftables_core::{extract_document, ExtractionResult, ExtractorConfig};

mod config;
mod error;
mod export;
mod list;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Find tables in PDF documents and export them as CSV, ZIP or XLSX"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct Global {
    /// TOML file with extraction settings
    #[clap(long, env = "PDFTABLES_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Maximum vertical distance (points) between tokens on the same line
    #[clap(long, env = "PDFTABLES_LINE_TOLERANCE", global = true)]
    line_tolerance: Option<f32>,

    /// Maximum horizontal distance (points) between starts in the same column
    #[clap(long, env = "PDFTABLES_COLUMN_TOLERANCE", global = true)]
    column_tolerance: Option<f32>,

    /// Minimum number of aligned lines for a borderless table
    #[clap(long, env = "PDFTABLES_MIN_ROWS", global = true)]
    min_rows: Option<usize>,

    /// Whether to display additional information.
    #[clap(long, env = "PDFTABLES_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Summarize the tables found in a PDF and preview their first rows
    List(crate::list::ListOptions),

    /// Print or save a single table as CSV
    Csv(crate::export::CsvOptions),

    /// Save every table as a CSV file inside a ZIP archive
    Zip(crate::export::ArchiveOptions),

    /// Save every table as a worksheet of an XLSX workbook
    Xlsx(crate::export::ArchiveOptions),
}

/// Open a PDF and run every enabled extraction strategy over it.
pub fn extract(path: &Path, config: &ExtractorConfig, global: &Global) -> Result<ExtractionResult> {
    if global.verbose {
        eprintln!("Reading {}", path.display());
    }

    let document = pdf::PdfDocument::open(path)
        .with_context(|| f!("Failed to open {}", path.display()))?;
    let result = extract_document(&document, config);

    info!(
        "{}: {} table(s) on {} page(s), {} failed page(s)",
        path.display(),
        result.tables.len(),
        result.page_count,
        result.failures.len()
    );
    if global.verbose {
        for failure in &result.failures {
            eprintln!("Page {} skipped: {}", failure.page, failure.reason);
        }
    }

    Ok(result)
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::List(options) => crate::list::run(options, app.global),
        SubCommands::Csv(options) => crate::export::run_csv(options, app.global),
        SubCommands::Zip(options) => crate::export::run_zip(options, app.global),
        SubCommands::Xlsx(options) => crate::export::run_xlsx(options, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
