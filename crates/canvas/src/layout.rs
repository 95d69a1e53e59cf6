//! Side-by-side pane composition.
//!
//! Each panel renders independently into a [`Block`]: a list of [`Line`]s
//! where every line knows its visible width. [`compose`] interleaves the
//! blocks row by row into a [`Canvas`], padding each line to its pane width so
//! that panes stay aligned no matter how many color changes a line carries.

use crate::{Canvas, Color};

/// A run of text drawn in a single color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub color: Color,
}

/// One row of a rendered panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    spans: Vec<Span>,
    width: usize,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a span, returning `self` for chaining.
    pub fn push(&mut self, color: Color, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        self.width += text.chars().count();
        self.spans.push(Span { text, color });
        self
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of terminal columns the line occupies.
    pub fn visible_len(&self) -> usize {
        self.width
    }

    /// Draw the line at `(row, col)`, clipped at column `limit`. Returns the
    /// next free column.
    fn draw(&self, canvas: &mut Canvas, row: usize, col: usize, limit: usize) -> usize {
        let mut next = col;
        for span in &self.spans {
            let end = canvas.write_str_bounded(row, next, limit, &span.text);
            canvas.set_color(row, next, end - next, span.color);
            next = end;
            if next >= limit {
                break;
            }
        }
        next
    }
}

/// The rendered rows of one pane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub lines: Vec<Line>,
}

impl Block {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            lines: Vec::with_capacity(rows),
        }
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Split `width` columns between `panes` panes. Every pane gets
/// `width / panes` columns and the last one absorbs the remainder.
pub fn pane_widths(width: usize, panes: usize) -> Vec<usize> {
    if panes == 0 {
        return Vec::new();
    }
    let share = width / panes;
    let mut widths = vec![share; panes];
    widths[panes - 1] = width - share * (panes - 1);
    widths
}

/// Write `blocks` side by side into rows `top..top + height` of `canvas`.
///
/// Rows a block has no line for, and the tail of every short line, are
/// blank-filled up to the pane width.
pub fn compose(canvas: &mut Canvas, top: usize, height: usize, blocks: &[Block]) {
    let widths = pane_widths(canvas.cols(), blocks.len());
    for row in 0..height {
        let mut col = 0;
        for (block, width) in blocks.iter().zip(&widths) {
            let limit = col + width;
            let end = match block.lines.get(row) {
                Some(line) => line.draw(canvas, top + row, col, limit),
                None => col,
            };
            canvas.fill_region_blank(top + row, end, limit - end, 1);
            col = limit;
        }
    }
}
