//! Run every strategy over every page and assemble the document result.

use std::collections::HashMap;

use log::{debug, warn};

use crate::bordered::extract_bordered;
use crate::borderless::{extract_borderless, AlignmentParams};
use crate::config::ExtractorConfig;
use crate::delimited::{extract_colon_delimited, extract_other_delimited, extract_tab_delimited};
use crate::lines::group_into_lines;
use crate::provider::{PageGeometry, PageGeometryProvider, ProviderError};
use crate::types::{
    DetectedTable, ExtractionMethod, ExtractionResult, PageFailure, Table, TableId,
};

/// Per-document bookkeeping: identifier counters and page failures.
///
/// A fresh context is created for every document so that identifiers never
/// depend on anything processed before.
#[derive(Debug, Default)]
pub struct DocumentContext {
    counters: HashMap<(usize, ExtractionMethod), usize>,
    tables: Vec<Table>,
    failures: Vec<PageFailure>,
}

impl DocumentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next 1-based identifier for `method` on `page`.
    pub fn next_id(&mut self, page: usize, method: ExtractionMethod) -> TableId {
        let counter = self.counters.entry((page, method)).or_insert(0);
        *counter += 1;
        TableId::new(page, method, *counter)
    }

    pub fn push(&mut self, table: DetectedTable) {
        let id = self.next_id(table.page, table.method);
        self.tables.push(Table::from_detected(id, table));
    }

    pub fn record_failure(&mut self, page: usize, error: &ProviderError) {
        warn!("Skipping page {page}: {error}");
        self.failures.push(PageFailure {
            page,
            reason: error.to_string(),
        });
    }

    pub fn finish(self, page_count: usize) -> ExtractionResult {
        ExtractionResult {
            page_count,
            tables: self.tables,
            failures: self.failures,
        }
    }
}

/// Extract every table from a single page.
///
/// Strategies run in canonical order. When the page has at least one
/// bordered table, tables from other strategies that overlap a bordered
/// table vertically are dropped.
pub fn extract_page(
    geometry: &PageGeometry,
    page: usize,
    config: &ExtractorConfig,
) -> Vec<DetectedTable> {
    let lines = group_into_lines(&geometry.tokens, config.line_tolerance);
    let mut tables = Vec::new();

    for method in config.ordered_strategies() {
        let found = match method {
            ExtractionMethod::Bordered => {
                extract_bordered(&geometry.regions, &geometry.tokens, page)
            }
            ExtractionMethod::Borderless => extract_borderless(
                &lines,
                page,
                AlignmentParams {
                    column_tolerance: config.column_tolerance,
                    min_rows: config.min_aligned_rows,
                },
            ),
            ExtractionMethod::TabDelimited => {
                extract_tab_delimited(&lines, page, config.min_delimited_rows)
            }
            ExtractionMethod::ColonDelimited => {
                extract_colon_delimited(&lines, page, config.min_delimited_rows)
            }
            ExtractionMethod::OtherDelimited => extract_other_delimited(
                &lines,
                page,
                &config.other_delimiters,
                config.min_delimited_rows,
            ),
        };
        debug!("Page {page}: {} {method} table(s)", found.len());
        tables.extend(found);
    }

    drop_overlapping(tables)
}

fn drop_overlapping(tables: Vec<DetectedTable>) -> Vec<DetectedTable> {
    let bordered: Vec<_> = tables
        .iter()
        .filter(|t| t.method == ExtractionMethod::Bordered)
        .map(|t| t.extent)
        .collect();
    if bordered.is_empty() {
        return tables;
    }

    tables
        .into_iter()
        .filter(|t| {
            let keep = t.method == ExtractionMethod::Bordered
                || !bordered.iter().any(|extent| extent.overlaps(&t.extent));
            if !keep {
                debug!("Page {}: dropping {} table inside a ruled grid", t.page, t.method);
            }
            keep
        })
        .collect()
}

/// Extract every table from every page of a document.
///
/// A page the provider cannot read is recorded as a failure and skipped.
pub fn extract_document<P: PageGeometryProvider + ?Sized>(
    provider: &P,
    config: &ExtractorConfig,
) -> ExtractionResult {
    let page_count = provider.page_count();
    let mut context = DocumentContext::new();

    for page in 1..=page_count {
        match PageGeometry::load(provider, page) {
            Ok(geometry) => {
                for table in extract_page(&geometry, page, config) {
                    context.push(table);
                }
            }
            Err(error) => context.record_failure(page, &error),
        }
    }

    let result = context.finish(page_count);
    debug!(
        "Extracted {} table(s) from {page_count} page(s), {} failure(s)",
        result.tables.len(),
        result.failures.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;
    use crate::types::{RuledRegion, Token};

    fn line_tokens(texts: &[&str], top: f32) -> Vec<Token> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Token::new(*text, 50.0, 250.0, top - i as f32 * 20.0, 1))
            .collect()
    }

    fn page(tokens: Vec<Token>) -> PageGeometry {
        PageGeometry {
            tokens,
            regions: Vec::new(),
        }
    }

    fn grid_page() -> PageGeometry {
        let tokens = vec![
            Token::new("Name", 110.0, 140.0, 690.0, 1),
            Token::new("Age", 210.0, 230.0, 690.0, 1),
            Token::new("Alice", 110.0, 140.0, 670.0, 1),
            Token::new("30", 210.0, 220.0, 670.0, 1),
        ];
        PageGeometry {
            tokens,
            regions: vec![RuledRegion::new(
                vec![700.0, 680.0, 660.0],
                vec![100.0, 200.0, 300.0],
            )],
        }
    }

    #[test]
    fn test_zero_tokens() {
        let provider = MemoryProvider::new().with_page(PageGeometry::default());
        let result = extract_document(&provider, &ExtractorConfig::default());
        assert_eq!(result.page_count, 1);
        assert!(result.tables.is_empty());
        assert!(result.failures.is_empty());
    }

    #[test]
    fn test_tab_scenario_ids() {
        let provider = MemoryProvider::new().with_page(page(line_tokens(
            &["Name\tAge\tCity", "Alice\t30\tNYC", "Bob\t25\tLA"],
            700.0,
        )));
        let result = extract_document(&provider, &ExtractorConfig::default());
        assert_eq!(result.tables.len(), 1);
        let table = &result.tables[0];
        assert_eq!(table.id.as_str(), "page-1-tab-delimited-1");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(0, 0), Some("Name"));
        assert_eq!(table.cell(2, 1), Some("25"));
    }

    #[test]
    fn test_colon_scenario() {
        let provider = MemoryProvider::new()
            .with_page(page(line_tokens(&["Name: Alice", "Age: 30"], 700.0)));
        let result = extract_document(&provider, &ExtractorConfig::default());
        assert_eq!(result.tables.len(), 1);
        let table = &result.tables[0];
        assert_eq!(table.method, ExtractionMethod::ColonDelimited);
        let pairs: Vec<(&str, &str)> = table
            .rows
            .iter()
            .map(|r| (r.cells[0].as_str(), r.cells[1].as_str()))
            .collect();
        assert_eq!(pairs, vec![("Name", "Alice"), ("Age", "30")]);
    }

    #[test]
    fn test_comma_lines_with_defaults() {
        let provider = MemoryProvider::new().with_page(page(line_tokens(
            &["Name, Age, City", "Alice, 30, NYC", "Bob, 25, LA"],
            700.0,
        )));
        let result = extract_document(&provider, &ExtractorConfig::default());
        assert_eq!(result.tables.len(), 1);
        let table = &result.tables[0];
        assert_eq!(table.id.as_str(), "page-1-other-delimited-1");
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(1, 2), Some("NYC"));
    }

    #[test]
    fn test_ruled_grid_wins_over_overlapping_tables() {
        let mut geometry = grid_page();
        // Colon lines inside the grid would otherwise form a second table.
        geometry.tokens.push(Token::new("Key: one", 120.0, 150.0, 699.0, 1));
        geometry.tokens.push(Token::new("Key: two", 120.0, 150.0, 697.0, 1));

        let tables = extract_page(&geometry, 1, &ExtractorConfig::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].method, ExtractionMethod::Bordered);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].columns, 2);
    }

    #[test]
    fn test_tables_outside_grid_survive() {
        let mut geometry = grid_page();
        geometry.tokens.extend(line_tokens(&["Name: Alice", "Age: 30"], 400.0));
        let tables = extract_page(&geometry, 1, &ExtractorConfig::default());
        let methods: Vec<_> = tables.iter().map(|t| t.method).collect();
        assert_eq!(
            methods,
            vec![ExtractionMethod::Bordered, ExtractionMethod::ColonDelimited]
        );
    }

    #[test]
    fn test_failure_continues_with_next_page() {
        let provider = MemoryProvider::new()
            .with_failing_page(ProviderError::Decode {
                page: 1,
                reason: "corrupt stream".to_string(),
            })
            .with_page(page(line_tokens(&["a\tb", "c\td"], 700.0)));
        let result = extract_document(&provider, &ExtractorConfig::default());
        assert_eq!(result.page_count, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].page, 1);
        assert!(result.failures[0].reason.contains("corrupt stream"));
        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].id.as_str(), "page-2-tab-delimited-1");
    }

    #[test]
    fn test_ids_count_per_page_and_method() {
        let mut tokens = line_tokens(&["a\tb", "c\td", "prose", "e\tf", "g\th"], 700.0);
        tokens.extend(line_tokens(&["Name: Alice", "Age: 30"], 400.0));
        let provider = MemoryProvider::new()
            .with_page(page(tokens.clone()))
            .with_page(page(tokens));
        let result = extract_document(&provider, &ExtractorConfig::default());
        let ids: Vec<&str> = result.tables.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "page-1-tab-delimited-1",
                "page-1-tab-delimited-2",
                "page-1-colon-delimited-1",
                "page-2-tab-delimited-1",
                "page-2-tab-delimited-2",
                "page-2-colon-delimited-1",
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let mut tokens = line_tokens(&["Name\tAge", "Alice\t30"], 700.0);
        tokens.extend(grid_page().tokens);
        let provider = MemoryProvider::new()
            .with_page(PageGeometry {
                tokens,
                regions: grid_page().regions,
            })
            .with_page(page(line_tokens(&["a|b|c", "d|e|f"], 500.0)));
        let config = ExtractorConfig::default();
        assert_eq!(
            extract_document(&provider, &config),
            extract_document(&provider, &config)
        );
    }

    #[test]
    fn test_every_table_is_rectangular() {
        let provider = MemoryProvider::new().with_page(page(line_tokens(
            &["| a | b |", "| c | d | e |", "x;y;z", "1;2;3"],
            700.0,
        )));
        let result = extract_document(&provider, &ExtractorConfig::default());
        assert!(!result.tables.is_empty());
        for table in &result.tables {
            assert!(table.rows.iter().all(|r| r.cells.len() == table.columns));
        }
    }

    #[test]
    fn test_disabled_strategy_is_skipped() {
        let provider = MemoryProvider::new()
            .with_page(page(line_tokens(&["Name: Alice", "Age: 30"], 700.0)));
        let config = ExtractorConfig {
            strategies: vec![ExtractionMethod::TabDelimited],
            ..Default::default()
        };
        assert!(extract_document(&provider, &config).tables.is_empty());
    }

    #[test]
    fn test_context_counters() {
        let mut context = DocumentContext::new();
        assert_eq!(
            context.next_id(1, ExtractionMethod::Bordered).as_str(),
            "page-1-bordered-1"
        );
        assert_eq!(
            context.next_id(1, ExtractionMethod::Bordered).as_str(),
            "page-1-bordered-2"
        );
        assert_eq!(
            context.next_id(2, ExtractionMethod::Bordered).as_str(),
            "page-2-bordered-1"
        );
    }
}
