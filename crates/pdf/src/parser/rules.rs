//! Turn painted line segments into ruled table grids.
//!
//! The algorithm works as follows:
//! 1. Keep only axis-aligned segments long enough to be rules.
//! 2. Link every horizontal rule with every vertical rule it touches.
//! 3. Each connected set of rules with at least two distinct horizontal
//!    and two distinct vertical positions is a grid. Positions closer than
//!    the join tolerance are merged, so double strokes and thin filled
//!    rectangles count once.

use std::cmp::Ordering;

use pdftables_core::RuledRegion;

use super::content::Segment;

/// Maximum drift across a segment for it to still count as horizontal or
/// vertical.
const AXIS_TOLERANCE: f32 = 1.0;

/// Segments shorter than this are ignored (tick marks, rectangle edges of
/// hairline rules).
const MIN_RULE_LENGTH: f32 = 3.0;

/// Rules that end within this distance of each other are considered
/// connected, and boundary positions within it are merged.
const JOIN_TOLERANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct HRule {
    y: f32,
    x0: f32,
    x1: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VRule {
    x: f32,
    y0: f32,
    y1: f32,
}

fn classify(segments: &[Segment]) -> (Vec<HRule>, Vec<VRule>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for s in segments {
        let dx = (s.x1 - s.x0).abs();
        let dy = (s.y1 - s.y0).abs();
        if dy <= AXIS_TOLERANCE && dx >= MIN_RULE_LENGTH {
            horizontal.push(HRule {
                y: (s.y0 + s.y1) / 2.0,
                x0: s.x0.min(s.x1),
                x1: s.x0.max(s.x1),
            });
        } else if dx <= AXIS_TOLERANCE && dy >= MIN_RULE_LENGTH {
            vertical.push(VRule {
                x: (s.x0 + s.x1) / 2.0,
                y0: s.y0.min(s.y1),
                y1: s.y0.max(s.y1),
            });
        }
    }

    (horizontal, vertical)
}

fn touches(h: &HRule, v: &VRule) -> bool {
    v.x >= h.x0 - JOIN_TOLERANCE
        && v.x <= h.x1 + JOIN_TOLERANCE
        && h.y >= v.y0 - JOIN_TOLERANCE
        && h.y <= v.y1 + JOIN_TOLERANCE
}

/// Minimal union-find over rule indices.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

/// Merge positions closer than [`JOIN_TOLERANCE`], returning the cluster
/// means in ascending order.
fn merge_positions(mut values: Vec<f32>) -> Vec<f32> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut merged: Vec<f32> = Vec::new();
    let mut cluster: Vec<f32> = Vec::new();
    for v in values {
        if let Some(&last) = cluster.last() {
            if v - last > JOIN_TOLERANCE {
                merged.push(cluster.iter().sum::<f32>() / cluster.len() as f32);
                cluster.clear();
            }
        }
        cluster.push(v);
    }
    if !cluster.is_empty() {
        merged.push(cluster.iter().sum::<f32>() / cluster.len() as f32);
    }
    merged
}

/// Find ruled grids among a page's painted segments, top of the page first.
pub fn find_ruled_regions(segments: &[Segment]) -> Vec<RuledRegion> {
    let (horizontal, vertical) = classify(segments);
    if horizontal.len() < 2 || vertical.len() < 2 {
        return Vec::new();
    }

    let offset = horizontal.len();
    let mut sets = DisjointSet::new(offset + vertical.len());
    for (hi, h) in horizontal.iter().enumerate() {
        for (vi, v) in vertical.iter().enumerate() {
            if touches(h, v) {
                sets.union(hi, offset + vi);
            }
        }
    }

    let mut groups: Vec<(usize, Vec<f32>, Vec<f32>)> = Vec::new();
    for (hi, h) in horizontal.iter().enumerate() {
        let root = sets.find(hi);
        group_for(&mut groups, root).1.push(h.y);
    }
    for (vi, v) in vertical.iter().enumerate() {
        let root = sets.find(offset + vi);
        group_for(&mut groups, root).2.push(v.x);
    }

    let mut regions: Vec<RuledRegion> = groups
        .into_iter()
        .filter_map(|(_, ys, xs)| {
            let mut rows = merge_positions(ys);
            let columns = merge_positions(xs);
            if rows.len() < 2 || columns.len() < 2 {
                return None;
            }
            rows.reverse();
            Some(RuledRegion::new(rows, columns))
        })
        .collect();

    regions.sort_by(|a, b| {
        b.rows[0]
            .partial_cmp(&a.rows[0])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.columns[0].partial_cmp(&b.columns[0]).unwrap_or(Ordering::Equal))
    });
    regions
}

fn group_for(
    groups: &mut Vec<(usize, Vec<f32>, Vec<f32>)>,
    root: usize,
) -> &mut (usize, Vec<f32>, Vec<f32>) {
    let idx = match groups.iter().position(|g| g.0 == root) {
        Some(idx) => idx,
        None => {
            groups.push((root, Vec::new(), Vec::new()));
            groups.len() - 1
        }
    };
    &mut groups[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: f32, y0: f32, x1: f32, y1: f32) -> Segment {
        Segment { x0, y0, x1, y1 }
    }

    /// Grid with horizontal rules at `ys` and vertical rules at `xs`.
    fn grid(ys: &[f32], xs: &[f32]) -> Vec<Segment> {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (top, bottom) = (ys[0], ys[ys.len() - 1]);
        let mut segments: Vec<Segment> = ys.iter().map(|&y| seg(left, y, right, y)).collect();
        segments.extend(xs.iter().map(|&x| seg(x, bottom, x, top)));
        segments
    }

    #[test]
    fn test_grid_2x2() {
        let regions = find_ruled_regions(&grid(&[700.0, 680.0, 660.0], &[100.0, 200.0, 300.0]));
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rows, vec![700.0, 680.0, 660.0]);
        assert_eq!(regions[0].columns, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_no_segments() {
        assert!(find_ruled_regions(&[]).is_empty());
    }

    #[test]
    fn test_underlines_are_not_a_grid() {
        let segments = vec![
            seg(50.0, 700.0, 200.0, 700.0),
            seg(50.0, 650.0, 200.0, 650.0),
            seg(50.0, 600.0, 200.0, 600.0),
        ];
        assert!(find_ruled_regions(&segments).is_empty());
    }

    #[test]
    fn test_two_separate_grids_top_first() {
        let mut segments = grid(&[300.0, 280.0, 260.0], &[100.0, 200.0]);
        segments.extend(grid(&[700.0, 680.0], &[100.0, 150.0, 200.0]));
        let regions = find_ruled_regions(&segments);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].rows, vec![700.0, 680.0]);
        assert_eq!(regions[1].rows, vec![300.0, 280.0, 260.0]);
    }

    #[test]
    fn test_hairline_rectangles_merge() {
        // Rules drawn as thin filled rectangles: each yields two long edges
        // half a point apart and two short edges that are dropped.
        let mut segments = Vec::new();
        for y in [700.0, 680.0, 660.0] {
            segments.push(seg(100.0, y, 300.0, y));
            segments.push(seg(100.0, y + 0.5, 300.0, y + 0.5));
            segments.push(seg(100.0, y, 100.0, y + 0.5));
        }
        for x in [100.0, 300.0] {
            segments.push(seg(x, 660.0, x, 700.5));
            segments.push(seg(x + 0.5, 660.0, x + 0.5, 700.5));
        }
        let regions = find_ruled_regions(&segments);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rows.len(), 3);
        assert_eq!(regions[0].columns.len(), 2);
        assert!((regions[0].rows[0] - 700.25).abs() < 0.01);
    }

    #[test]
    fn test_diagonals_ignored() {
        let mut segments = grid(&[700.0, 680.0], &[100.0, 200.0]);
        segments.push(seg(100.0, 680.0, 200.0, 700.0));
        let regions = find_ruled_regions(&segments);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].columns, vec![100.0, 200.0]);
    }

    #[test]
    fn test_merge_positions() {
        assert_eq!(merge_positions(vec![10.0, 11.0, 50.0]), vec![10.5, 50.0]);
        assert!(merge_positions(vec![]).is_empty());
    }
}
