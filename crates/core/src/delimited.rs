//! Tables written as delimiter-separated text.
//!
//! Every strategy here works on reconstructed [`TextLine`]s and emits a table
//! for each run of consecutive qualifying lines. A line that does not qualify
//! ends the current run; it is never skipped in the middle of a table.

use crate::lines::TextLine;
use crate::types::{DetectedTable, ExtractionMethod, Row};

/// Rows split on tab characters.
///
/// A run only becomes a table when it has at least `min_rows` lines that all
/// split into the same number (≥2) of columns.
pub fn extract_tab_delimited(
    lines: &[TextLine],
    page: usize,
    min_rows: usize,
) -> Vec<DetectedTable> {
    let split = |text: &str| -> Option<Vec<String>> {
        if !text.contains('\t') {
            return None;
        }
        Some(text.split('\t').map(normalize_cell).collect())
    };
    collect_runs(lines, min_rows, true, split)
        .into_iter()
        .map(|rows| {
            DetectedTable::new(ExtractionMethod::TabDelimited, page, into_rows(rows, page))
        })
        .collect()
}

/// `key: value` rows split on the first colon.
///
/// Lines holding a tab are left to the tab strategy.
pub fn extract_colon_delimited(
    lines: &[TextLine],
    page: usize,
    min_rows: usize,
) -> Vec<DetectedTable> {
    collect_runs(lines, min_rows, false, split_key_value)
        .into_iter()
        .map(|rows| {
            DetectedTable::new(ExtractionMethod::ColonDelimited, page, into_rows(rows, page))
        })
        .collect()
}

/// Rows split on any of `delimiters` (pipes, semicolons, ...).
///
/// A line qualifies for a delimiter when it contains it at least twice, which
/// keeps ordinary prose punctuation out. Each delimiter is scanned
/// independently, in the given order.
pub fn extract_other_delimited(
    lines: &[TextLine],
    page: usize,
    delimiters: &[char],
    min_rows: usize,
) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    for &delimiter in delimiters {
        let runs = collect_runs(lines, min_rows, true, |text| split_framed(text, delimiter));
        tables.extend(runs.into_iter().map(|rows| {
            DetectedTable::new(ExtractionMethod::OtherDelimited, page, into_rows(rows, page))
        }));
    }
    tables
}

/// Split `key: value` on the first colon. The key must not be empty.
fn split_key_value(text: &str) -> Option<Vec<String>> {
    if text.contains('\t') {
        return None;
    }
    let (key, value) = text.split_once(':')?;
    let key = normalize_cell(key);
    if key.is_empty() {
        return None;
    }
    Some(vec![key, normalize_cell(value)])
}

/// Split on `delimiter`, dropping the empty cells produced by a leading or
/// trailing frame delimiter such as `| a | b |`.
fn split_framed(text: &str, delimiter: char) -> Option<Vec<String>> {
    if text.matches(delimiter).count() < 2 {
        return None;
    }
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix(delimiter).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(delimiter).unwrap_or(trimmed);
    let cells: Vec<String> = trimmed.split(delimiter).map(normalize_cell).collect();
    if cells.len() < 2 {
        return None;
    }
    Some(cells)
}

/// Trim a cell and collapse inner whitespace runs to a single space.
fn normalize_cell(cell: &str) -> String {
    cell.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Walk `lines` and gather maximal runs of lines accepted by `split`.
///
/// With `same_width`, a change in column count ends the run and the line
/// that caused it starts the next one.
fn collect_runs<F>(
    lines: &[TextLine],
    min_rows: usize,
    same_width: bool,
    split: F,
) -> Vec<Vec<(Vec<String>, f32)>>
where
    F: Fn(&str) -> Option<Vec<String>>,
{
    let mut runs = Vec::new();
    let mut current: Vec<(Vec<String>, f32)> = Vec::new();

    for line in lines {
        match split(&line.text()) {
            Some(cells) => {
                let width_changed = same_width
                    && current
                        .first()
                        .is_some_and(|(first, _)| first.len() != cells.len());
                if width_changed {
                    flush_run(&mut current, &mut runs, min_rows);
                }
                current.push((cells, line.y));
            }
            None => flush_run(&mut current, &mut runs, min_rows),
        }
    }
    flush_run(&mut current, &mut runs, min_rows);

    runs
}

fn flush_run(
    current: &mut Vec<(Vec<String>, f32)>,
    runs: &mut Vec<Vec<(Vec<String>, f32)>>,
    min_rows: usize,
) {
    let run = std::mem::take(current);
    if run.len() >= min_rows {
        runs.push(run);
    }
}

fn into_rows(run: Vec<(Vec<String>, f32)>, page: usize) -> Vec<Row> {
    run.into_iter()
        .map(|(cells, y)| Row::new(cells, page, y))
        .collect()
}
