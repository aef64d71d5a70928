//! Tables drawn with ruled lines.
//!
//! The geometry provider finds the grids; this module only drops tokens into
//! the cells the grid describes.

use std::cmp::Ordering;

use crate::types::{DetectedTable, ExtractionMethod, Row, RuledRegion, Token};

/// Build one table per ruled region.
///
/// A token belongs to the cell that contains its horizontal midpoint and
/// vertical center. Tokens sharing a cell are joined with a space, top to
/// bottom then left to right. Regions without at least one row band and one
/// column band are skipped.
pub fn extract_bordered(
    regions: &[RuledRegion],
    tokens: &[Token],
    page: usize,
) -> Vec<DetectedTable> {
    regions
        .iter()
        .filter(|region| region.rows.len() >= 2 && region.columns.len() >= 2)
        .map(|region| region_to_table(region, tokens, page))
        .collect()
}

fn region_to_table(region: &RuledRegion, tokens: &[Token], page: usize) -> DetectedTable {
    let row_bands: Vec<(f32, f32)> = region.row_bands().collect();
    let column_bands: Vec<(f32, f32)> = region.column_bands().collect();

    let mut grid: Vec<Vec<Vec<&Token>>> =
        vec![vec![Vec::new(); column_bands.len()]; row_bands.len()];

    for token in tokens {
        let Some(r) = find_band(&row_bands, token.y, true) else {
            continue;
        };
        let Some(c) = find_band(&column_bands, token.mid_x(), false) else {
            continue;
        };
        grid[r][c].push(token);
    }

    let rows = grid
        .into_iter()
        .zip(&row_bands)
        .map(|(cells, &(top, bottom))| {
            let cells = cells.into_iter().map(join_cell).collect();
            Row::new(cells, page, (top + bottom) / 2.0)
        })
        .collect();

    DetectedTable::with_extent(ExtractionMethod::Bordered, page, rows, region.extent())
}

/// Index of the band containing `value`.
///
/// Bands are half-open on the side shared with the next band so that a value
/// sitting exactly on an inner rule lands in exactly one band. `descending`
/// is true for row bands, which run from top (larger y) to bottom.
fn find_band(bands: &[(f32, f32)], value: f32, descending: bool) -> Option<usize> {
    let last = bands.len().checked_sub(1)?;
    bands.iter().enumerate().position(|(i, &(start, end))| {
        let (low, high) = if descending { (end, start) } else { (start, end) };
        let inside_low = if descending && i != last { value > low } else { value >= low };
        let inside_high = if !descending && i != last { value < high } else { value <= high };
        inside_low && inside_high
    })
}

fn join_cell(mut tokens: Vec<&Token>) -> String {
    tokens.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.x0.partial_cmp(&b.x0).unwrap_or(Ordering::Equal))
    });
    tokens
        .iter()
        .map(|t| t.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
