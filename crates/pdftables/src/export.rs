use std::path::{Path, PathBuf};

use crate::prelude::{eprintln, print, *};
use colored::Colorize;
use pdftables_core::{to_csv, to_xlsx, to_zip, ExtractionResult};

#[derive(Debug, clap::Args, Clone)]
pub struct CsvOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Table ID as shown by `list` (e.g., "page-1-bordered-1")
    pub table_id: String,

    /// Output file path (if omitted, prints the CSV to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ArchiveOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Output file path
    #[arg(short, long)]
    pub output: PathBuf,
}

pub fn run_csv(options: CsvOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let result = crate::extract(&options.path, &config, &global)?;
    let csv = table_csv(&result, &options.table_id, &options.path)?;

    match options.output {
        Some(output) => write_output(&output, csv.as_bytes()),
        None => {
            print!("{csv}");
            Ok(())
        }
    }
}

pub fn run_zip(options: ArchiveOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let result = crate::extract(&options.path, &config, &global)?;
    warn_if_empty(&result, &options.path);

    let bytes = to_zip(&result).map_err(|e| eyre!(e))?;
    write_output(&options.output, &bytes)
}

pub fn run_xlsx(options: ArchiveOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(&global)?;
    let result = crate::extract(&options.path, &config, &global)?;
    warn_if_empty(&result, &options.path);

    let bytes = to_xlsx(&result).map_err(|e| eyre!(e))?;
    write_output(&options.output, &bytes)
}

/// Render the table with the given ID as CSV text.
fn table_csv(result: &ExtractionResult, table_id: &str, path: &Path) -> Result<String> {
    if result.is_empty() {
        return Err(Error::NoTables(path.display().to_string()).into());
    }

    let table = result
        .table(table_id)
        .ok_or_else(|| Error::UnknownTable(table_id.to_string()))?;

    to_csv(table).map_err(|e| eyre!(e))
}

fn warn_if_empty(result: &ExtractionResult, path: &Path) {
    if result.is_empty() {
        eprintln!(
            "{}",
            f!("No tables found in {}, writing an empty file", path.display()).yellow()
        );
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| f!("Failed to write {}", path.display()))?;
    eprintln!(
        "{} {} ({} bytes)",
        "Wrote".green().bold(),
        path.display(),
        bytes.len()
    );
    Ok(())
}
