//! Double-plane character/color frame buffer.
//!
//! # Invariants
//!
//! 1. `glyphs.len() == colors.len() == rows * cols`
//! 2. Dimensions never change after creation
//! 3. Writes past a row's column bound are clipped, never wrapped
//! 4. A row index outside the canvas is a rendering defect and panics

use std::io::{self, Write};

use crate::Color;

const BLANK: char = ' ';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    rows: usize,
    cols: usize,
    glyphs: Vec<char>,
    colors: Vec<Color>,
}

impl Canvas {
    /// Create a blank canvas. This is the only allocating operation.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            glyphs: vec![BLANK; rows * cols],
            colors: vec![Color::Reset; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn glyph(&self, row: usize, col: usize) -> char {
        self.glyphs[self.index(row, col)]
    }

    pub fn color(&self, row: usize, col: usize) -> Color {
        self.colors[self.index(row, col)]
    }

    /// The glyphs of one row as a string.
    pub fn row_text(&self, row: usize) -> String {
        self.row_range(row).map(|i| self.glyphs[i]).collect()
    }

    /// Set every glyph to `ch`, leaving the color plane untouched.
    pub fn fill(&mut self, ch: char) {
        fill_doubling(&mut self.glyphs, ch);
    }

    /// Reset both planes to blank cells in reset color.
    pub fn fill_blank(&mut self) {
        fill_doubling(&mut self.glyphs, BLANK);
        fill_doubling(&mut self.colors, Color::Reset);
    }

    /// Set the glyphs of a rectangular region to `ch`. Columns are clipped.
    pub fn fill_region(&mut self, row: usize, col: usize, width: usize, height: usize, ch: char) {
        for r in row..row + height {
            let span = self.clipped(r, col, width);
            fill_doubling(&mut self.glyphs[span], ch);
        }
    }

    /// Reset a rectangular region of both planes. Columns are clipped.
    pub fn fill_region_blank(&mut self, row: usize, col: usize, width: usize, height: usize) {
        for r in row..row + height {
            let span = self.clipped(r, col, width);
            fill_doubling(&mut self.glyphs[span.clone()], BLANK);
            fill_doubling(&mut self.colors[span], Color::Reset);
        }
    }

    pub fn write_at(&mut self, row: usize, col: usize, ch: char) {
        self.check_row(row);
        if col < self.cols {
            let i = row * self.cols + col;
            self.glyphs[i] = ch;
        }
    }

    /// Write `s` starting at `(row, col)` and return the next free column.
    ///
    /// The text is clipped at the end of the row.
    pub fn write_str(&mut self, row: usize, col: usize, s: &str) -> usize {
        self.write_str_bounded(row, col, self.cols, s)
    }

    /// Like [`Canvas::write_str`] but clipped at `limit` instead of the row end.
    pub fn write_str_bounded(&mut self, row: usize, col: usize, limit: usize, s: &str) -> usize {
        self.check_row(row);
        let limit = limit.min(self.cols);
        if col >= limit {
            return col;
        }
        let start = row * self.cols;
        let mut next = col;
        for ch in s.chars().take(limit - col) {
            self.glyphs[start + next] = ch;
            next += 1;
        }
        next
    }

    /// Tag `width` cells starting at `(row, col)` with `color`. Columns are clipped.
    pub fn set_color(&mut self, row: usize, col: usize, width: usize, color: Color) {
        let span = self.clipped(row, col, width);
        self.colors[span].fill(color);
    }

    /// Copy both planes of `src` into this canvas with its top-left corner at
    /// `(row, col)`. Columns that do not fit are dropped.
    pub fn copy_from(&mut self, row: usize, col: usize, src: &Canvas) {
        if src.rows == 0 {
            return;
        }
        self.check_row(row + src.rows - 1);
        if col >= self.cols {
            return;
        }
        let width = src.cols.min(self.cols - col);
        for r in 0..src.rows {
            let from = r * src.cols;
            let to = (row + r) * self.cols + col;
            self.glyphs[to..to + width].copy_from_slice(&src.glyphs[from..from + width]);
            self.colors[to..to + width].copy_from_slice(&src.colors[from..from + width]);
        }
    }

    /// Write the glyph plane as plain text, one line per row.
    pub fn print(&self, out: &mut impl Write) -> io::Result<()> {
        let mut utf8 = [0u8; 4];
        for row in 0..self.rows {
            for i in self.row_range(row) {
                out.write_all(self.glyphs[i].encode_utf8(&mut utf8).as_bytes())?;
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Write both planes in a single pass, emitting a color escape only where
    /// the tag differs from the previous cell.
    ///
    /// Rows are not separated: the output is meant to be written at the home
    /// position of a terminal exactly `cols` wide. The first cell always
    /// emits its escape, so two canvases with equal contents produce
    /// byte-identical output.
    pub fn print_colored(&self, out: &mut impl Write) -> io::Result<()> {
        let mut utf8 = [0u8; 4];
        let mut last: Option<Color> = None;
        for (glyph, color) in self.glyphs.iter().zip(&self.colors) {
            if last != Some(*color) {
                out.write_all(color.escape())?;
                last = Some(*color);
            }
            out.write_all(glyph.encode_utf8(&mut utf8).as_bytes())?;
        }
        if last.is_some_and(|c| c != Color::Reset) {
            out.write_all(Color::Reset.escape())?;
        }
        Ok(())
    }

    fn index(&self, row: usize, col: usize) -> usize {
        self.check_row(row);
        assert!(
            col < self.cols,
            "column {col} out of bounds for canvas with {} columns",
            self.cols
        );
        row * self.cols + col
    }

    fn row_range(&self, row: usize) -> std::ops::Range<usize> {
        self.check_row(row);
        row * self.cols..(row + 1) * self.cols
    }

    fn clipped(&self, row: usize, col: usize, width: usize) -> std::ops::Range<usize> {
        self.check_row(row);
        let start = col.min(self.cols);
        let end = col.saturating_add(width).min(self.cols);
        row * self.cols + start..row * self.cols + end
    }

    fn check_row(&self, row: usize) {
        assert!(
            row < self.rows,
            "row {row} out of bounds for canvas with {} rows",
            self.rows
        );
    }
}

/// Fill `buf` with `value` by repeatedly doubling the initialised prefix.
fn fill_doubling<T: Copy>(buf: &mut [T], value: T) {
    let Some(first) = buf.first_mut() else {
        return;
    };
    *first = value;
    let mut filled = 1;
    while filled < buf.len() {
        let n = filled.min(buf.len() - filled);
        buf.copy_within(0..n, filled);
        filled += n;
    }
}
