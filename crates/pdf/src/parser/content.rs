//! Walk a page's content stream and collect positioned text and stroked or
//! filled line segments.
//!
//! # Pipeline
//!
//! ```text
//! content ops  ->  graphics/text state machine  ->  PageScan { tokens, segments }
//! ```
//!
//! Positions are mapped through the text matrix and the current
//! transformation matrix, so everything leaves this module in user space.

use log::trace;
use pdftables_core::Token;

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};
use super::text::clean_token_text;
use crate::PdfError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Glyph widths are not read from the font; every character is assumed to
/// be this fraction of the font size wide.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Distance from the baseline to the visual center of a line of text, as a
/// fraction of the font size.
const CENTER_RATIO: f32 = 0.3;

/// A kerning gap inside a `TJ` array wider than this many character widths
/// starts a new token. Smaller gaps wider than [`WORD_GAP_RATIO`] become a
/// space.
const TOKEN_GAP_CHARS: f32 = 2.0;
const WORD_GAP_RATIO: f32 = 0.3;

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// `[a, b, c, d, e, f]` affine matrix as used throughout PDF.
pub type Matrix = [f32; 6];

/// A straight segment in user space, produced by a painted path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Everything the geometry provider needs from one page.
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub tokens: Vec<Token>,
    pub segments: Vec<Segment>,
    /// Image XObjects and inline images painted on the page.
    pub images: usize,
}

impl PageScan {
    /// Images but no text: a scanned page this reader cannot extract from.
    pub fn is_image_only(&self) -> bool {
        self.tokens.is_empty() && self.images > 0
    }
}

// ---------------------------------------------------------------------------
// Internal: matrices
// ---------------------------------------------------------------------------

/// `m1 x m2` in PDF's row-vector convention.
fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn apply(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

// ---------------------------------------------------------------------------
// Internal: state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_size: f32,
    text_matrix: Matrix,
    line_matrix: Matrix,
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn char_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Td: translate the line matrix and reset the text matrix to it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let (x, y) = apply(&self.line_matrix, tx, ty);
        self.line_matrix[4] = x;
        self.line_matrix[5] = y;
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    /// Horizontal displacement of showing `text`, in text-space units.
    fn advance_for(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| {
                let w = self.char_width() + self.char_spacing;
                if ch == ' ' {
                    w + self.word_spacing
                } else {
                    w
                }
            })
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PathOp {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    Close,
}

/// Walks one page, accumulating output.
struct Walker<'a> {
    backend: &'a dyn PdfBackend,
    page_id: PageId,
    page: usize,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text: TextState,
    path: Vec<PathOp>,
    scan: PageScan,
}

impl<'a> Walker<'a> {
    fn new(backend: &'a dyn PdfBackend, page_id: PageId, page: usize) -> Self {
        Self {
            backend,
            page_id,
            page,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text: TextState::default(),
            path: Vec::new(),
            scan: PageScan::default(),
        }
    }

    fn run(mut self, ops: &[ContentOp]) -> PageScan {
        for op in ops {
            self.step(op);
        }
        self.scan
    }

    fn step(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            // -- Graphics state -----------------------------------------
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => match self.ctm_stack.pop() {
                Some(ctm) => self.ctm = ctm,
                None => trace!("Unbalanced Q on page {}", self.page),
            },
            "cm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }

            // -- Text object ------------------------------------------------
            "BT" => {
                self.text.text_matrix = IDENTITY;
                self.text.line_matrix = IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let (Some(PdfValue::Name(key)), Some(size)) = (
                    op.operands.first(),
                    op.operands.get(1).and_then(PdfValue::as_number),
                ) {
                    self.text.font_key = key.clone();
                    self.text.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.text.text_matrix = m;
                    self.text.line_matrix = m;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.text.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.text.leading = -ty;
                    self.text.translate_line(tx, ty);
                }
            }
            "T*" => self.text.next_line(),
            "TL" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.text.leading = v;
                }
            }
            "Tc" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.text.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.text.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.text.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.text.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(operand) = op.operands.first() {
                    self.show_string(operand);
                }
            }
            "'" => {
                self.text.next_line();
                if let Some(operand) = op.operands.first() {
                    self.show_string(operand);
                }
            }
            "\"" => {
                if let (Some([aw, ac]), Some(operand)) = (op.numbers::<2>(), op.operands.get(2)) {
                    self.text.word_spacing = aw;
                    self.text.char_spacing = ac;
                    self.text.next_line();
                    self.show_string(operand);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    self.show_array(items);
                }
            }

            // -- Path construction ------------------------------------------
            "m" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    self.path.push(PathOp::MoveTo(x, y));
                }
            }
            "l" => {
                if let Some([x, y]) = op.numbers::<2>() {
                    self.path.push(PathOp::LineTo(x, y));
                }
            }
            // Curves never form table rules; keep the current point moving.
            "c" => {
                if let Some([_, _, _, _, x, y]) = op.numbers::<6>() {
                    self.path.push(PathOp::MoveTo(x, y));
                }
            }
            "v" | "y" => {
                if let Some([_, _, x, y]) = op.numbers::<4>() {
                    self.path.push(PathOp::MoveTo(x, y));
                }
            }
            "h" => self.path.push(PathOp::Close),
            "re" => {
                if let Some([x, y, w, h]) = op.numbers::<4>() {
                    self.path.extend([
                        PathOp::MoveTo(x, y),
                        PathOp::LineTo(x + w, y),
                        PathOp::LineTo(x + w, y + h),
                        PathOp::LineTo(x, y + h),
                        PathOp::Close,
                    ]);
                }
            }

            // -- Path painting ----------------------------------------------
            "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => self.paint(),
            "n" => self.path.clear(),

            // -- Images -------------------------------------------------------
            "Do" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    if self.backend.is_image_xobject(self.page_id, name) {
                        self.scan.images += 1;
                    }
                }
            }
            "BI" => self.scan.images += 1,

            _ => {}
        }
    }

    // -- text ------------------------------------------------------------

    fn decode(&self, bytes: &[u8]) -> String {
        self.backend
            .decode_text(self.page_id, &self.text.font_key, bytes)
    }

    fn show_string(&mut self, operand: &PdfValue) {
        let PdfValue::Str(bytes) = operand else {
            return;
        };
        let text = self.decode(bytes);
        let start = self.text.text_matrix;
        let advance = self.text.advance_for(&text);
        self.emit(&text, &start, advance);
        self.text.advance_x(advance);
    }

    /// `TJ`: strings interleaved with kerning adjustments in thousandths of
    /// a text-space unit. Wide gaps split the run into separate tokens.
    fn show_array(&mut self, items: &[PdfValue]) {
        let mut buf = String::new();
        let mut start = self.text.text_matrix;
        let mut advance = 0.0;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let fragment = self.decode(bytes);
                    if buf.is_empty() {
                        start = self.text.text_matrix;
                        advance = 0.0;
                    }
                    let dx = self.text.advance_for(&fragment);
                    buf.push_str(&fragment);
                    advance += dx;
                    self.text.advance_x(dx);
                }
                other => {
                    let Some(adjust) = other.as_number() else {
                        continue;
                    };
                    let dx = -adjust / 1000.0 * self.text.font_size * self.text.horiz_scale;
                    let char_width = self.text.char_width();
                    if dx > char_width * TOKEN_GAP_CHARS {
                        self.emit(&buf, &start, advance);
                        buf.clear();
                    } else if dx > char_width * WORD_GAP_RATIO && !buf.is_empty() {
                        buf.push(' ');
                        advance += dx;
                    } else if !buf.is_empty() {
                        advance += dx;
                    }
                    self.text.advance_x(dx);
                }
            }
        }

        self.emit(&buf, &start, advance);
    }

    /// Record a token for `text` shown with text matrix `start` and
    /// horizontal displacement `advance`.
    fn emit(&mut self, text: &str, start: &Matrix, advance: f32) {
        let text = clean_token_text(text);
        if text.trim().is_empty() {
            return;
        }
        let trm = multiply(start, &self.ctm);
        let rise = self.text.text_rise;
        let (x0, baseline) = apply(&trm, 0.0, rise);
        let (x1, _) = apply(&trm, advance, rise);
        let size = self.text.font_size * (trm[2].powi(2) + trm[3].powi(2)).sqrt();
        let y = baseline + size * CENTER_RATIO;
        self.scan
            .tokens
            .push(Token::new(text, x0.min(x1), x0.max(x1), y, self.page));
    }

    // -- paths -----------------------------------------------------------

    fn paint(&mut self) {
        let mut start: Option<(f32, f32)> = None;
        let mut current: Option<(f32, f32)> = None;

        for op in std::mem::take(&mut self.path) {
            match op {
                PathOp::MoveTo(x, y) => {
                    let p = apply(&self.ctm, x, y);
                    start = Some(p);
                    current = Some(p);
                }
                PathOp::LineTo(x, y) => {
                    let p = apply(&self.ctm, x, y);
                    if let Some(from) = current {
                        self.push_segment(from, p);
                    }
                    if start.is_none() {
                        start = Some(p);
                    }
                    current = Some(p);
                }
                PathOp::Close => {
                    if let (Some(from), Some(to)) = (current, start) {
                        self.push_segment(from, to);
                    }
                    current = start;
                }
            }
        }
    }

    fn push_segment(&mut self, from: (f32, f32), to: (f32, f32)) {
        if from == to {
            return;
        }
        self.scan.segments.push(Segment {
            x0: from.0,
            y0: from.1,
            x1: to.0,
            y1: to.1,
        });
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk a page's content stream.
///
/// Handles the text operators (`BT`, `Tf`, `Tm`, `Td`, `TD`, `T*`, `TL`,
/// `Tc`, `Tw`, `Tz`, `Ts`, `Tj`, `TJ`, `'`, `"`), the matrix stack (`q`, `Q`,
/// `cm`) and straight path construction and painting (`m`, `l`, `re`, `h`,
/// `S`, `f` and friends, `n`). Everything else is ignored.
pub fn scan_page(
    backend: &dyn PdfBackend,
    page_id: PageId,
    page: usize,
) -> Result<PageScan, PdfError> {
    let raw = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw)?;
    Ok(Walker::new(backend, page_id, page).run(&ops))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
