//! Reconstruct visual lines from positioned tokens.

use std::cmp::Ordering;

use crate::types::Token;

/// Tokens that share (approximately) the same vertical center, ordered
/// left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub tokens: Vec<Token>,
    /// Mean vertical center of the tokens.
    pub y: f32,
}

impl TextLine {
    /// Concatenate all token texts with a single space separator.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group tokens into lines, top of the page first.
///
/// A token joins the current line when its center is less than `tolerance`
/// points away from the center of the line's first token. Tokens with
/// identical centers always share a line, even with a zero tolerance.
pub fn group_into_lines(tokens: &[Token], tolerance: f32) -> Vec<TextLine> {
    let mut sorted: Vec<&Token> = tokens.iter().collect();
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.x0.partial_cmp(&b.x0).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut current_y = 0.0;

    for token in sorted {
        let diff = (token.y - current_y).abs();
        if !current.is_empty() && (diff == 0.0 || diff < tolerance) {
            current.push(token.clone());
            continue;
        }
        if !current.is_empty() {
            lines.push(assemble_line(std::mem::take(&mut current)));
        }
        current_y = token.y;
        current.push(token.clone());
    }

    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

fn assemble_line(mut tokens: Vec<Token>) -> TextLine {
    tokens.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(Ordering::Equal));
    let y = tokens.iter().map(|t| t.y).sum::<f32>() / tokens.len() as f32;
    TextLine { tokens, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, x0: f32, y: f32) -> Token {
        Token::new(text, x0, x0 + text.len() as f32 * 5.0, y, 1)
    }

    #[test]
    fn test_group_empty() {
        assert!(group_into_lines(&[], 2.0).is_empty());
    }

    #[test]
    fn test_group_same_y() {
        let tokens = vec![token("B", 60.0, 100.0), token("A", 10.0, 100.0)];
        let lines = group_into_lines(&tokens, 2.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "A B");
    }

    #[test]
    fn test_group_within_tolerance() {
        let tokens = vec![token("A", 10.0, 100.0), token("B", 60.0, 101.5)];
        let lines = group_into_lines(&tokens, 2.0);
        assert_eq!(lines.len(), 1);
        assert!((lines[0].y - 100.75).abs() < 1e-4);
    }

    #[test]
    fn test_group_at_tolerance_splits() {
        let tokens = vec![token("A", 10.0, 100.0), token("B", 60.0, 102.0)];
        let lines = group_into_lines(&tokens, 2.0);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_group_zero_tolerance_keeps_identical_centers() {
        let tokens = vec![token("A", 10.0, 100.0), token("B", 60.0, 100.0)];
        let lines = group_into_lines(&tokens, 0.0);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_group_top_to_bottom() {
        let tokens = vec![
            token("low", 10.0, 100.0),
            token("high", 10.0, 700.0),
            token("mid", 10.0, 400.0),
        ];
        let lines = group_into_lines(&tokens, 2.0);
        let texts: Vec<String> = lines.iter().map(TextLine::text).collect();
        assert_eq!(texts, vec!["high", "mid", "low"]);
    }
}
