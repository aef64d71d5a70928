use std::fmt;

use serde::{Deserialize, Serialize};

/// A positioned run of text on a page.
///
/// Coordinates are PDF user-space points: `x0`/`x1` bound the run
/// horizontally and `y` is its vertical center (y grows upward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub y: f32,
    /// 1-based page number.
    pub page: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, x0: f32, x1: f32, y: f32, page: usize) -> Self {
        Token {
            text: text.into(),
            x0,
            x1,
            y,
            page,
        }
    }

    /// Horizontal midpoint of the run.
    pub fn mid_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }
}

/// Which strategy produced a table.
///
/// The declaration order is the order in which the aggregator runs the
/// strategies on every page.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    Bordered,
    Borderless,
    TabDelimited,
    ColonDelimited,
    OtherDelimited,
}

impl ExtractionMethod {
    pub const ALL: [ExtractionMethod; 5] = [
        ExtractionMethod::Bordered,
        ExtractionMethod::Borderless,
        ExtractionMethod::TabDelimited,
        ExtractionMethod::ColonDelimited,
        ExtractionMethod::OtherDelimited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Bordered => "bordered",
            ExtractionMethod::Borderless => "borderless",
            ExtractionMethod::TabDelimited => "tab-delimited",
            ExtractionMethod::ColonDelimited => "colon-delimited",
            ExtractionMethod::OtherDelimited => "other-delimited",
        }
    }

    /// Human readable label used in previews and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionMethod::Bordered => "Bordered",
            ExtractionMethod::Borderless => "Borderless",
            ExtractionMethod::TabDelimited => "Tab-Separated",
            ExtractionMethod::ColonDelimited => "Colon-Separated",
            ExtractionMethod::OtherDelimited => "Other Delimited",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of string cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<String>,
    /// 1-based page number.
    pub page: usize,
    /// Vertical position used for ordering (larger is higher on the page).
    pub y: f32,
}

impl Row {
    pub fn new(cells: Vec<String>, page: usize, y: f32) -> Self {
        Row { cells, page, y }
    }
}

/// Vertical span covered by a table, in user-space points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalExtent {
    pub top: f32,
    pub bottom: f32,
}

impl VerticalExtent {
    pub fn overlaps(&self, other: &VerticalExtent) -> bool {
        self.bottom <= other.top && other.bottom <= self.top
    }
}

/// Table produced by an extractor, before the aggregator assigns it an id.
///
/// Construction enforces the rectangular shape: every row is padded to the
/// width of the widest row. Rows are never truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub method: ExtractionMethod,
    pub page: usize,
    pub rows: Vec<Row>,
    pub columns: usize,
    /// Number of rows that were shorter than the table and got padded.
    pub padded_rows: usize,
    pub extent: VerticalExtent,
}

impl DetectedTable {
    /// Build a table whose extent is derived from its rows' positions.
    pub fn new(method: ExtractionMethod, page: usize, rows: Vec<Row>) -> Self {
        let top = rows.iter().map(|r| r.y).fold(f32::NEG_INFINITY, f32::max);
        let bottom = rows.iter().map(|r| r.y).fold(f32::INFINITY, f32::min);
        Self::with_extent(method, page, rows, VerticalExtent { top, bottom })
    }

    pub fn with_extent(
        method: ExtractionMethod,
        page: usize,
        mut rows: Vec<Row>,
        extent: VerticalExtent,
    ) -> Self {
        let columns = rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        let mut padded_rows = 0;
        for row in &mut rows {
            if row.cells.len() < columns {
                row.cells.resize(columns, String::new());
                padded_rows += 1;
            }
        }
        DetectedTable {
            method,
            page,
            rows,
            columns,
            padded_rows,
            extent,
        }
    }
}

/// Stable identifier of a table within a document: `page-<n>-<method>-<index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(String);

impl TableId {
    pub fn new(page: usize, method: ExtractionMethod, index: usize) -> Self {
        TableId(format!("page-{}-{}-{}", page, method.as_str(), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A detected table that has been placed in the document's result list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub method: ExtractionMethod,
    pub page: usize,
    pub columns: usize,
    pub padded_rows: usize,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn from_detected(id: TableId, detected: DetectedTable) -> Self {
        Table {
            id,
            method: detected.method,
            page: detected.page,
            columns: detected.columns,
            padded_rows: detected.padded_rows,
            rows: detected.rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .map(String::as_str)
    }
}

/// A page the geometry provider could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: usize,
    pub reason: String,
}

/// Every table found in a document plus the pages that failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub page_count: usize,
    pub tables: Vec<Table>,
    pub failures: Vec<PageFailure>,
}

impl ExtractionResult {
    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id.as_str() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Ruled-line grid reported by the geometry provider.
///
/// `rows` holds the y of every horizontal rule from top to bottom and
/// `columns` the x of every vertical rule from left to right, so a region
/// with `n` row boundaries describes `n - 1` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuledRegion {
    pub rows: Vec<f32>,
    pub columns: Vec<f32>,
}

impl RuledRegion {
    pub fn new(rows: Vec<f32>, columns: Vec<f32>) -> Self {
        RuledRegion { rows, columns }
    }

    /// `(top, bottom)` pairs for every row band.
    pub fn row_bands(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.rows.windows(2).map(|w| (w[0], w[1]))
    }

    /// `(left, right)` pairs for every column band.
    pub fn column_bands(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.columns.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn extent(&self) -> VerticalExtent {
        VerticalExtent {
            top: self.rows.first().copied().unwrap_or(0.0),
            bottom: self.rows.last().copied().unwrap_or(0.0),
        }
    }
}
