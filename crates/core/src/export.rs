//! Render extraction results as CSV, ZIP and XLSX bytes, plus the preview and
//! summary projections the shell prints.

use std::io::{Cursor, Write};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::types::{ExtractionMethod, ExtractionResult, Table};

/// Excel refuses worksheet names longer than this.
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Table {table} is too large for a worksheet")]
    TooLarge { table: String },
}

/// Render a table as comma-separated text with `\n` line endings.
///
/// Fields holding a comma, quote or line break are quoted and inner quotes
/// are doubled.
pub fn to_csv(table: &Table) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in &table.rows {
        writer.write_record(&row.cells)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Pack every table into a deflated ZIP archive, one `<id>.csv` entry each.
pub fn to_zip(result: &ExtractionResult) -> Result<Vec<u8>, ExportError> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for table in &result.tables {
        archive.start_file(format!("{}.csv", table.id), options)?;
        archive.write_all(to_csv(table)?.as_bytes())?;
    }

    Ok(archive.finish()?.into_inner())
}

/// Build a workbook with one worksheet per table. The first row of every
/// sheet is written in bold.
///
/// A result without tables yields a workbook with a single empty sheet,
/// since a workbook must hold at least one.
pub fn to_xlsx(result: &ExtractionResult) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    if result.tables.is_empty() {
        workbook.add_worksheet();
    }

    for table in &result.tables {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(table))?;

        for (r, row) in table.rows.iter().enumerate() {
            let r = u32::try_from(r).map_err(|_| too_large(table))?;
            for (c, cell) in row.cells.iter().enumerate() {
                let c = u16::try_from(c).map_err(|_| too_large(table))?;
                if r == 0 {
                    worksheet.write_string_with_format(r, c, cell, &header)?;
                } else {
                    worksheet.write_string(r, c, cell)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn sheet_name(table: &Table) -> String {
    table.id.as_str().chars().take(MAX_SHEET_NAME).collect()
}

fn too_large(table: &Table) -> ExportError {
    ExportError::TooLarge {
        table: table.id.to_string(),
    }
}

/// What the user sees for a table before downloading it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePreview {
    pub id: String,
    pub method: ExtractionMethod,
    pub label: &'static str,
    pub page: usize,
    pub rows: usize,
    pub columns: usize,
    pub padded_rows: usize,
    pub sample: Vec<Vec<String>>,
}

/// Previews of every table, holding at most `n` rows each.
pub fn previews(result: &ExtractionResult, n: usize) -> Vec<TablePreview> {
    result
        .tables
        .iter()
        .map(|table| TablePreview {
            id: table.id.to_string(),
            method: table.method,
            label: table.method.label(),
            page: table.page,
            rows: table.row_count(),
            columns: table.column_count(),
            padded_rows: table.padded_rows,
            sample: table
                .rows
                .iter()
                .take(n)
                .map(|row| row.cells.clone())
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodCount {
    pub method: ExtractionMethod,
    pub label: &'static str,
    pub count: usize,
}

/// Document-level counts shown after extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub pages: usize,
    pub tables: usize,
    pub failed_pages: Vec<usize>,
    /// One entry per method that found at least one table, in extraction
    /// order.
    pub by_method: Vec<MethodCount>,
}

pub fn summary(result: &ExtractionResult) -> ExtractionSummary {
    let by_method = ExtractionMethod::ALL
        .iter()
        .map(|method| MethodCount {
            method: *method,
            label: method.label(),
            count: result.tables.iter().filter(|t| t.method == *method).count(),
        })
        .filter(|entry| entry.count > 0)
        .collect();

    ExtractionSummary {
        pages: result.page_count,
        tables: result.tables.len(),
        failed_pages: result.failures.iter().map(|f| f.page).collect(),
        by_method,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::types::{DetectedTable, PageFailure, Row, TableId};

    fn table(page: usize, method: ExtractionMethod, index: usize, cells: &[&[&str]]) -> Table {
        let rows = cells
            .iter()
            .enumerate()
            .map(|(i, row)| {
                Row::new(
                    row.iter().map(|c| c.to_string()).collect(),
                    page,
                    700.0 - i as f32 * 20.0,
                )
            })
            .collect();
        Table::from_detected(
            TableId::new(page, method, index),
            DetectedTable::new(method, page, rows),
        )
    }

    fn sample_result() -> ExtractionResult {
        ExtractionResult {
            page_count: 3,
            tables: vec![
                table(
                    1,
                    ExtractionMethod::TabDelimited,
                    1,
                    &[&["Name", "Age"], &["Alice", "30"], &["Bob", "25"]],
                ),
                table(2, ExtractionMethod::ColonDelimited, 1, &[&["Key", "v"], &["Other", "w"]]),
            ],
            failures: vec![PageFailure {
                page: 3,
                reason: "broken".to_string(),
            }],
        }
    }

    #[test]
    fn test_csv_plain() {
        let result = sample_result();
        assert_eq!(to_csv(&result.tables[0]).unwrap(), "Name,Age\nAlice,30\nBob,25\n");
    }

    #[test]
    fn test_csv_quoting_round_trip() {
        let awkward = table(
            1,
            ExtractionMethod::Bordered,
            1,
            &[&["a,b", "say \"hi\""], &["line\nbreak", ""]],
        );
        let text = to_csv(&awkward).unwrap();
        assert!(text.starts_with("\"a,b\",\"say \"\"hi\"\"\"\n"));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        let parsed: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        let expected: Vec<Vec<String>> = awkward.rows.iter().map(|r| r.cells.clone()).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_zip_entries() {
        let result = sample_result();
        let bytes = to_zip(&result).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("page-2-colon-delimited-1.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "Key,v\nOther,w\n");
        assert!(archive.by_name("page-1-tab-delimited-1.csv").is_ok());
    }

    #[test]
    fn test_zip_empty_result() {
        let bytes = to_zip(&ExtractionResult::default()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_xlsx_is_a_zip_container() {
        let bytes = to_xlsx(&sample_result()).unwrap();
        assert!(bytes.starts_with(b"PK"));
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"xl/worksheets/sheet1.xml"));
        assert!(names.contains(&"xl/worksheets/sheet2.xml"));
    }

    #[test]
    fn test_xlsx_without_tables() {
        assert!(to_xlsx(&ExtractionResult::default()).is_ok());
    }

    #[test]
    fn test_sheet_name_truncated() {
        let long = table(123456, ExtractionMethod::OtherDelimited, 1000, &[&["a"]]);
        assert_eq!(sheet_name(&long).chars().count(), MAX_SHEET_NAME);
    }

    #[test]
    fn test_previews_limit_rows() {
        let previews = previews(&sample_result(), 2);
        assert_eq!(previews.len(), 2);
        assert_eq!(previews[0].id, "page-1-tab-delimited-1");
        assert_eq!(previews[0].label, "Tab-Separated");
        assert_eq!(previews[0].rows, 3);
        assert_eq!(previews[0].sample.len(), 2);
        assert_eq!(previews[1].sample.len(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let summary = summary(&sample_result());
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.tables, 2);
        assert_eq!(summary.failed_pages, vec![3]);
        let counts: Vec<(ExtractionMethod, usize)> =
            summary.by_method.iter().map(|m| (m.method, m.count)).collect();
        assert_eq!(
            counts,
            vec![
                (ExtractionMethod::TabDelimited, 1),
                (ExtractionMethod::ColonDelimited, 1)
            ]
        );
    }

    #[test]
    fn test_preview_serializes_method_tag() {
        let json = serde_json::to_value(&previews(&sample_result(), 1)[0]).unwrap();
        assert_eq!(json["method"], "tab-delimited");
        assert_eq!(json["sample"][0][0], "Name");
    }
}
