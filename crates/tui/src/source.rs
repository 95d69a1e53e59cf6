//! The source pane: a line buffer of the active file with program counter,
//! cursor and breakpoint markers, scrolled through a fixed-height window.

use std::io;
use std::path::{Path, PathBuf};

use canvas::{Block, Color, Line};
use debugger::Breakpoint;

/// Rows kept between the cursor and the window edge while scrolling.
const MARGIN: usize = 2;

const TAB: &str = "    ";

#[derive(Debug, Default)]
pub struct SourceView {
    file: Option<PathBuf>,
    lines: Vec<String>,
    /// 0-based line the cursor is on.
    cursor: usize,
    /// 0-based line the program is stopped at, when it is in this file.
    pc: Option<usize>,
    /// First line in the window.
    offset: usize,
    height: usize,
    /// 0-based lines with a breakpoint in this file.
    breakpoints: Vec<usize>,
}

impl SourceView {
    pub fn new(height: usize) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[cfg(test)]
    pub fn pc(&self) -> Option<usize> {
        self.pc
    }

    pub fn resize(&mut self, height: usize) {
        self.height = height;
        self.align_cursor();
    }

    /// Replace the buffer with `lines`, as if `file` had been read.
    pub fn set_lines(&mut self, file: impl Into<PathBuf>, lines: Vec<String>) {
        self.file = Some(file.into());
        self.lines = lines;
        self.cursor = 0;
        self.pc = None;
        self.offset = 0;
    }

    /// Move to the location the program stopped at (`line` is 1-based).
    ///
    /// A different file replaces the buffer and centers the cursor; within
    /// the same file only the markers move and the window follows with
    /// [`SourceView::align_cursor`]. Returns whether the file changed.
    pub fn load_location(&mut self, file: &Path, line: usize) -> io::Result<bool> {
        let changed = self.file.as_deref() != Some(file);
        if changed {
            let lines = read_lines(file)?;
            self.set_lines(file, lines);
        }
        self.cursor = self.clamp_line(line.saturating_sub(1));
        self.pc = Some(self.cursor);
        if changed {
            self.center_cursor();
        } else {
            self.align_cursor();
        }
        Ok(changed)
    }

    /// Drop the program counter marker, e.g. when the backend has no frame.
    pub fn clear_pc(&mut self) {
        self.pc = None;
    }

    /// Show `file` without moving the program counter. The PC marker stays
    /// visible only if the program is stopped in that file (`stopped` is the
    /// 1-based stop line).
    pub fn open_file(&mut self, file: &Path, stopped: Option<(&Path, usize)>) -> io::Result<()> {
        let lines = read_lines(file)?;
        self.set_lines(file, lines);
        self.pc = stopped
            .filter(|(path, _)| *path == file)
            .map(|(_, line)| self.clamp_line(line.saturating_sub(1)));
        self.center_cursor();
        Ok(())
    }

    /// Breakpoints to mark; those in other files are ignored.
    pub fn set_breakpoints(&mut self, breakpoints: &[Breakpoint]) {
        self.breakpoints = match &self.file {
            Some(file) => breakpoints
                .iter()
                .filter(|b| &b.file == file)
                .map(|b| b.line.saturating_sub(1))
                .collect(),
            None => Vec::new(),
        };
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.align_cursor();
    }

    pub fn move_down(&mut self) {
        self.cursor = self.clamp_line(self.cursor + 1);
        self.align_cursor();
    }

    /// Put the cursor in the middle of the window.
    pub fn center_cursor(&mut self) {
        self.offset = self.cursor.saturating_sub(self.height / 2).min(self.max_offset());
    }

    /// Scroll just enough to keep [`MARGIN`] rows between the cursor and the
    /// top and bottom of the window.
    pub fn align_cursor(&mut self) {
        if self.cursor < self.offset + MARGIN {
            self.offset = self.cursor.saturating_sub(MARGIN);
        } else if self.cursor + MARGIN >= self.offset + self.height {
            self.offset = self.cursor + MARGIN + 1 - self.height.min(self.cursor + MARGIN + 1);
        }
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn render(&self, height: usize, focused: bool) -> Block {
        let mut block = Block::with_capacity(height);
        let end = (self.offset + height).min(self.lines.len());
        let digits = digits(self.lines.len());
        for i in self.offset..end {
            let mut line = Line::new();
            if self.pc == Some(i) {
                line.push(Color::Yellow, "=> ");
            } else if i == self.cursor {
                line.push(if focused { Color::Green } else { Color::Black }, "=> ");
            } else {
                line.push(Color::Reset, "   ");
            }
            if self.breakpoints.contains(&i) {
                line.push(Color::Red, "* ");
            } else {
                line.push(Color::Reset, "  ");
            }
            line.push(Color::Blue, format!("{:>digits$}: ", i + 1));
            let text_color = if self.pc == Some(i) { Color::White } else { Color::Reset };
            line.push(text_color, self.lines[i].as_str());
            block.push(line);
        }
        block
    }

    fn clamp_line(&self, line: usize) -> usize {
        line.min(self.lines.len().saturating_sub(1))
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }
}

fn read_lines(file: &Path) -> io::Result<Vec<String>> {
    let text = std::fs::read(file)?;
    Ok(split_lines(&String::from_utf8_lossy(&text)))
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.replace('\t', TAB)).collect()
}

fn digits(n: usize) -> usize {
    n.max(1).ilog10() as usize + 1
}
