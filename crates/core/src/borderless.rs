//! Tables without ruled lines, detected from text alignment alone.
//!
//! The algorithm works as follows:
//! 1. Group tokens into lines by vertical center.
//! 2. Cluster the x start positions of every token on the page. A cluster
//!    that recurs on at least `min_rows` distinct lines becomes a column
//!    anchor.
//! 3. A line whose tokens hit at least two distinct anchors qualifies. A
//!    contiguous run of at least `min_rows` qualifying lines is a region.
//! 4. Inside a region, the anchors hit by at least `min_rows` of its lines
//!    become the columns. Every token goes to the column it aligns with, or
//!    is appended to the nearest column on its left when it aligns with none.

use std::cmp::Ordering;

use crate::lines::TextLine;
use crate::types::{DetectedTable, ExtractionMethod, Row, Token};

/// Tuning knobs for the alignment heuristic.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentParams {
    /// Maximum distance between an x start position and its anchor.
    pub column_tolerance: f32,
    /// Minimum number of lines for both anchors and regions.
    pub min_rows: usize,
}

/// Detect aligned text blocks on a page.
pub fn extract_borderless(
    lines: &[TextLine],
    page: usize,
    params: AlignmentParams,
) -> Vec<DetectedTable> {
    let anchors = find_anchors(lines, params);
    if anchors.len() < 2 {
        return Vec::new();
    }

    find_regions(lines, &anchors, params)
        .into_iter()
        .filter_map(|region| build_table(&lines[region], &anchors, page, params))
        .collect()
}

/// Cluster token start positions into column anchors.
///
/// Positions are swept left to right; a position joins the open cluster while
/// it stays within `column_tolerance` of the cluster's running mean. Each
/// line votes at most once per cluster.
pub fn find_anchors(lines: &[TextLine], params: AlignmentParams) -> Vec<f32> {
    let mut starts: Vec<(f32, usize)> = lines
        .iter()
        .enumerate()
        .flat_map(|(line_idx, line)| line.tokens.iter().map(move |t| (t.x0, line_idx)))
        .collect();
    starts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut anchors = Vec::new();
    let mut cluster: Vec<(f32, usize)> = Vec::new();

    for start in starts {
        if let Some(mean) = cluster_mean(&cluster) {
            if start.0 - mean > params.column_tolerance {
                push_anchor(&mut anchors, &cluster, params.min_rows);
                cluster.clear();
            }
        }
        cluster.push(start);
    }
    push_anchor(&mut anchors, &cluster, params.min_rows);

    anchors
}

fn cluster_mean(cluster: &[(f32, usize)]) -> Option<f32> {
    if cluster.is_empty() {
        return None;
    }
    Some(cluster.iter().map(|(x, _)| x).sum::<f32>() / cluster.len() as f32)
}

fn push_anchor(anchors: &mut Vec<f32>, cluster: &[(f32, usize)], min_rows: usize) {
    let mut line_ids: Vec<usize> = cluster.iter().map(|(_, line)| *line).collect();
    line_ids.sort_unstable();
    line_ids.dedup();
    if line_ids.len() >= min_rows {
        if let Some(mean) = cluster_mean(cluster) {
            anchors.push(mean);
        }
    }
}

/// Index of the anchor `x` aligns with, if any.
fn match_anchor(x: f32, anchors: &[f32], tolerance: f32) -> Option<usize> {
    anchors
        .iter()
        .enumerate()
        .map(|(i, a)| (i, (x - a).abs()))
        .filter(|(_, distance)| *distance <= tolerance)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
}

/// Anchors hit by the tokens of a line, deduplicated and sorted.
fn line_hits(line: &TextLine, anchors: &[f32], tolerance: f32) -> Vec<usize> {
    let mut hits: Vec<usize> = line
        .tokens
        .iter()
        .filter_map(|t| match_anchor(t.x0, anchors, tolerance))
        .collect();
    hits.sort_unstable();
    hits.dedup();
    hits
}

/// Maximal runs of qualifying lines, as index ranges into `lines`.
fn find_regions(
    lines: &[TextLine],
    anchors: &[f32],
    params: AlignmentParams,
) -> Vec<std::ops::Range<usize>> {
    let mut regions = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        let qualifies = line_hits(line, anchors, params.column_tolerance).len() >= 2;
        match (qualifies, start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                if idx - s >= params.min_rows {
                    regions.push(s..idx);
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if lines.len() - s >= params.min_rows {
            regions.push(s..lines.len());
        }
    }

    regions
}

fn build_table(
    lines: &[TextLine],
    anchors: &[f32],
    page: usize,
    params: AlignmentParams,
) -> Option<DetectedTable> {
    let mut counts = vec![0usize; anchors.len()];
    for line in lines {
        for hit in line_hits(line, anchors, params.column_tolerance) {
            counts[hit] += 1;
        }
    }
    let columns: Vec<f32> = anchors
        .iter()
        .zip(&counts)
        .filter(|(_, count)| **count >= params.min_rows)
        .map(|(a, _)| *a)
        .collect();

    if columns.len() < 2 {
        return None;
    }

    let rows = lines
        .iter()
        .map(|line| {
            let cells = assign_tokens(&line.tokens, &columns, params.column_tolerance);
            Row::new(cells, page, line.y)
        })
        .collect();

    Some(DetectedTable::new(ExtractionMethod::Borderless, page, rows))
}

/// Distribute a line's tokens over the region's columns.
fn assign_tokens(tokens: &[Token], columns: &[f32], tolerance: f32) -> Vec<String> {
    let mut cells = vec![String::new(); columns.len()];
    for token in tokens {
        let idx = match_anchor(token.x0, columns, tolerance)
            .unwrap_or_else(|| preceding_column(token.x0, columns));
        let text = token.text.trim();
        if text.is_empty() {
            continue;
        }
        if !cells[idx].is_empty() {
            cells[idx].push(' ');
        }
        cells[idx].push_str(text);
    }
    cells
}

/// The rightmost column starting left of `x`, or the first column.
fn preceding_column(x: f32, columns: &[f32]) -> usize {
    columns.iter().rposition(|c| *c <= x).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::group_into_lines;

    const PARAMS: AlignmentParams = AlignmentParams {
        column_tolerance: 3.0,
        min_rows: 3,
    };

    fn token(text: &str, x0: f32, y: f32) -> Token {
        Token::new(text, x0, x0 + text.len() as f32 * 5.0, y, 1)
    }

    fn aligned_page() -> Vec<Token> {
        vec![
            token("Item", 50.0, 700.0),
            token("Qty", 200.0, 700.0),
            token("Price", 300.0, 700.0),
            token("Apple", 50.5, 685.0),
            token("3", 201.0, 685.0),
            token("1.20", 299.0, 685.0),
            token("Banana", 49.0, 670.0),
            token("12", 200.0, 670.0),
            token("0.50", 301.0, 670.0),
            token("Cherry", 50.0, 655.0),
            token("100", 199.5, 655.0),
            token("9.99", 300.0, 655.0),
        ]
    }

    #[test]
    fn test_aligned_block_is_a_table() {
        let lines = group_into_lines(&aligned_page(), 2.0);
        let tables = extract_borderless(&lines, 1, PARAMS);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.method, ExtractionMethod::Borderless);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.columns, 3);
        assert_eq!(table.rows[0].cells, vec!["Item", "Qty", "Price"]);
        assert_eq!(table.rows[2].cells, vec!["Banana", "12", "0.50"]);
    }

    #[test]
    fn test_no_anchor_meets_min_rows() {
        let tokens = vec![
            token("a", 50.0, 700.0),
            token("b", 200.0, 700.0),
            token("c", 50.0, 685.0),
            token("d", 200.0, 685.0),
        ];
        let lines = group_into_lines(&tokens, 2.0);
        assert!(extract_borderless(&lines, 1, PARAMS).is_empty());
    }

    #[test]
    fn test_prose_lines_are_not_tables() {
        let tokens = vec![
            token("The quick brown fox", 50.0, 700.0),
            token("jumps over the lazy dog", 50.0, 685.0),
            token("and keeps running", 50.0, 670.0),
        ];
        let lines = group_into_lines(&tokens, 2.0);
        assert!(extract_borderless(&lines, 1, PARAMS).is_empty());
    }

    #[test]
    fn test_unaligned_token_goes_to_preceding_column() {
        let mut tokens = aligned_page();
        // A footnote marker between the first and second columns.
        tokens.push(token("*", 120.0, 685.0));
        let lines = group_into_lines(&tokens, 2.0);
        let tables = extract_borderless(&lines, 1, PARAMS);
        assert_eq!(tables[0].rows[1].cells, vec!["Apple *", "3", "1.20"]);
    }

    #[test]
    fn test_missing_cell_is_empty() {
        let mut tokens = aligned_page();
        tokens.retain(|t| t.text != "12");
        let lines = group_into_lines(&tokens, 2.0);
        let tables = extract_borderless(&lines, 1, PARAMS);
        assert_eq!(tables[0].rows[2].cells, vec!["Banana", "", "0.50"]);
    }

    #[test]
    fn test_prose_between_blocks_splits_regions() {
        let mut tokens = aligned_page();
        tokens.push(token("A paragraph separating two tables", 50.0, 640.0));
        for (i, name) in ["Kiwi", "Lemon", "Mango"].iter().enumerate() {
            let y = 625.0 - i as f32 * 15.0;
            tokens.push(token(name, 50.0, y));
            tokens.push(token("1", 200.0, y));
            tokens.push(token("2.00", 300.0, y));
        }
        let lines = group_into_lines(&tokens, 2.0);
        let tables = extract_borderless(&lines, 1, PARAMS);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 4);
        assert_eq!(tables[1].rows.len(), 3);
        assert_eq!(tables[1].rows[0].cells, vec!["Kiwi", "1", "2.00"]);
    }

    #[test]
    fn test_tolerance_boundary() {
        let tokens = vec![
            token("a", 50.0, 700.0),
            token("b", 200.0, 700.0),
            token("c", 50.0, 685.0),
            token("d", 203.0, 685.0),
            token("e", 50.0, 670.0),
            token("f", 200.0, 670.0),
        ];
        let lines = group_into_lines(&tokens, 2.0);

        let loose = AlignmentParams {
            column_tolerance: 3.0,
            min_rows: 3,
        };
        assert_eq!(extract_borderless(&lines, 1, loose).len(), 1);

        let strict = AlignmentParams {
            column_tolerance: 0.5,
            min_rows: 3,
        };
        assert!(extract_borderless(&lines, 1, strict).is_empty());
    }

    #[test]
    fn test_find_anchors_counts_lines_not_tokens() {
        // Three tokens at the same x on a single line must not form an anchor.
        let tokens = vec![
            token("a", 50.0, 700.0),
            token("b", 50.0, 700.0),
            token("c", 50.0, 700.0),
        ];
        let lines = group_into_lines(&tokens, 2.0);
        assert!(find_anchors(&lines, PARAMS).is_empty());
    }

    #[test]
    fn test_empty_page() {
        assert!(extract_borderless(&[], 1, PARAMS).is_empty());
    }
}
