use std::path::PathBuf;

use crate::prelude::{print, println, *};
use colored::Colorize;
use pdftables_core::{
    previews, summary, ExtractionResult, ExtractionSummary, PageFailure, TablePreview,
};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct ListOptions {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Number of rows shown for each table
    #[arg(long, env = "PDFTABLES_PREVIEW_ROWS")]
    pub preview_rows: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ListOutput {
    pub file: String,
    pub summary: ExtractionSummary,
    pub failures: Vec<PageFailure>,
    pub tables: Vec<TablePreview>,
}

pub fn run(options: ListOptions, global: crate::Global) -> Result<()> {
    let mut config = crate::config::load(&global)?;
    if let Some(rows) = options.preview_rows {
        config.preview_rows = rows;
    }

    let result = crate::extract(&options.path, &config, &global)?;
    let output = list_data(&options.path.display().to_string(), &result, config.preview_rows);

    if options.json {
        println!("{}", format_list_json(&output)?);
    } else {
        print!("{}", format_list_text(&output));
    }

    Ok(())
}

/// Collect the summary and the previews shown by `list`.
pub fn list_data(file: &str, result: &ExtractionResult, preview_rows: usize) -> ListOutput {
    ListOutput {
        file: file.to_string(),
        summary: summary(result),
        failures: result.failures.clone(),
        tables: previews(result, preview_rows),
    }
}

fn format_list_json(output: &ListOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

fn format_list_text(output: &ListOutput) -> String {
    let mut result = String::new();
    let summary = &output.summary;

    // Header
    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!(
        "{}\n",
        f!("TABLES IN {}", output.file).bright_cyan().bold()
    ));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));

    result.push_str(&f!(
        "\nPages: {}   Tables: {}\n",
        summary.pages.to_string().bright_cyan().bold(),
        summary.tables.to_string().bright_cyan().bold(),
    ));
    for entry in &summary.by_method {
        result.push_str(&f!("  {}: {}\n", entry.label, entry.count));
    }

    if !output.failures.is_empty() {
        result.push_str(&f!("\n{}\n", "Skipped pages:".yellow().bold()));
        for failure in &output.failures {
            result.push_str(&f!("  page {}: {}\n", failure.page, failure.reason));
        }
    }

    if output.tables.is_empty() {
        result.push_str(&f!("\n{}\n", "No tables found.".yellow()));
        return result;
    }

    for (idx, preview) in output.tables.iter().enumerate() {
        result.push_str(&f!(
            "\n{} {}\n",
            f!("[{}]", idx + 1).yellow().bold(),
            preview.id.bold()
        ));
        result.push_str(&f!(
            "    {} on page {}, {} rows x {} columns",
            preview.label,
            preview.page,
            preview.rows,
            preview.columns
        ));
        if preview.padded_rows > 0 {
            result.push_str(&f!(", {} padded", preview.padded_rows));
        }
        result.push('\n');

        result.push_str(&preview_table(preview).to_string());
        if preview.rows > preview.sample.len() {
            result.push_str(&f!(
                "{}\n",
                f!("    ... {} more row(s)", preview.rows - preview.sample.len()).dimmed()
            ));
        }
    }

    // Footer
    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_yellow()));
    result.push_str(&f!("{}\n", "EXPORT".bright_yellow().bold()));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_yellow()));
    result.push_str(&f!(
        "\n{}:\n  {}\n",
        "Single table".bright_white().bold(),
        f!("pdftables csv {} <ID> -o table.csv", output.file).cyan()
    ));
    result.push_str(&f!(
        "\n{}:\n  {}\n  {}\n",
        "All tables".bright_white().bold(),
        f!("pdftables zip {} -o tables.zip", output.file).cyan(),
        f!("pdftables xlsx {} -o tables.xlsx", output.file).cyan()
    ));

    result
}

fn preview_table(preview: &TablePreview) -> prettytable::Table {
    let mut table = new_table();
    for cells in &preview.sample {
        table.add_row(prettytable::Row::new(
            cells.iter().map(|c| prettytable::Cell::new(c)).collect(),
        ));
    }
    table
}
