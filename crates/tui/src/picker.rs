//! The fuzzy file picker overlay: search box and ranked file list on the
//! left, a preview of the selected file on the right.

use std::fs::File;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use canvas::{Canvas, Color};
use fuzzy::{Candidate, Matcher, Ranked};
use lru::LruCache;

use crate::input::Key;

const EMPTY: &str = "(empty)";
const BINARY: &str = "(binary file)";
const UNREADABLE: &str = "(unreadable)";

/// What the controller should do after the picker handled a key.
#[derive(Debug, PartialEq, Eq)]
pub enum PickerAction {
    None,
    Open(PathBuf),
    Close,
}

pub struct Picker {
    candidates: Vec<Candidate>,
    matcher: Box<dyn Matcher>,
    search: String,
    /// Character index into `search`.
    search_cursor: usize,
    results: Vec<Ranked>,
    selected: usize,
    preview: Vec<String>,
    cache: LruCache<PathBuf, Vec<String>>,
    width: usize,
    height: usize,
}

impl Picker {
    /// A picker over `candidates`, scanned once by the caller.
    pub fn new(candidates: Vec<Candidate>, matcher: Box<dyn Matcher>, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            candidates,
            matcher,
            search: String::new(),
            search_cursor: 0,
            results: Vec::new(),
            selected: 0,
            preview: Vec::new(),
            cache: LruCache::new(capacity),
            width: 0,
            height: 0,
        }
    }

    /// Size the overlay for a `width` x `height` screen.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width * 4 / 5;
        self.height = height * 4 / 5;
        self.filter();
    }

    /// Clear the search and show the full list.
    pub fn open(&mut self) {
        self.search.clear();
        self.search_cursor = 0;
        self.selected = 0;
        self.filter();
        self.load_preview();
    }

    #[cfg(test)]
    pub fn search(&self) -> &str {
        &self.search
    }

    #[cfg(test)]
    pub fn preview(&self) -> &[String] {
        &self.preview
    }

    /// Displayed paths of the current result list, best first.
    pub fn results(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .map(|r| self.candidates[r.index].display.as_str())
    }

    pub fn selected(&self) -> Option<&Path> {
        self.results
            .get(self.selected)
            .map(|r| self.candidates[r.index].absolute_path.as_path())
    }

    pub fn handle_key(&mut self, key: Key) -> PickerAction {
        match key {
            Key::Esc | Key::Ctrl('p') => return PickerAction::Close,
            Key::Enter => {
                return match self.selected() {
                    Some(path) => PickerAction::Open(path.to_path_buf()),
                    None => PickerAction::None,
                };
            }
            Key::Up => self.selected = self.selected.saturating_sub(1),
            Key::Down => {
                if self.selected + 1 < self.results.len() {
                    self.selected += 1;
                }
            }
            Key::Left => self.search_cursor = self.search_cursor.saturating_sub(1),
            Key::Right => {
                self.search_cursor = (self.search_cursor + 1).min(self.search.chars().count());
            }
            Key::Backspace => {
                if self.search_cursor == 0 {
                    return PickerAction::None;
                }
                self.search_cursor -= 1;
                let at = self.byte_index(self.search_cursor);
                self.search.remove(at);
                self.edited();
            }
            Key::Char(c) => {
                let at = self.byte_index(self.search_cursor);
                self.search.insert(at, c);
                self.search_cursor += 1;
                self.edited();
            }
            Key::Tab | Key::Ctrl(_) => return PickerAction::None,
        }
        self.load_preview();
        PickerAction::None
    }

    fn edited(&mut self) {
        self.selected = 0;
        self.filter();
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.search
            .char_indices()
            .nth(chars)
            .map_or(self.search.len(), |(i, _)| i)
    }

    fn filter(&mut self) {
        let limit = self.height.saturating_sub(4);
        self.results = fuzzy::rank(&self.candidates, &self.search, self.matcher.as_mut(), limit);
        self.selected = self.selected.min(self.results.len().saturating_sub(1));
    }

    fn load_preview(&mut self) {
        let Some(path) = self.selected().map(Path::to_path_buf) else {
            self.preview.clear();
            return;
        };
        if let Some(preview) = self.cache.get(&path) {
            self.preview.clone_from(preview);
            return;
        }
        let preview = read_preview(&path, self.width * self.height, self.height.saturating_sub(2));
        self.preview.clone_from(&preview);
        self.cache.put(path, preview);
    }

    fn search_width(&self) -> usize {
        (self.width / 2).saturating_sub(4)
    }

    /// Draw the overlay centered on `frame`.
    pub fn render(&self, frame: &mut Canvas) {
        let (w, h) = (self.width, self.height);
        if w < 8 || h < 5 || h > frame.rows() || w > frame.cols() {
            return;
        }
        let top = (frame.rows() - h) / 2;
        let left = (frame.cols() - w) / 2;
        let split = left + w / 2;
        let right = left + w - 1;
        let bottom = top + h - 1;

        frame.fill_region_blank(top, left, w, h);

        for col in left + 1..right {
            frame.write_at(top, col, '─');
            frame.write_at(bottom, col, '─');
        }
        for row in top + 1..bottom {
            for col in [left, split - 1, split, right] {
                frame.write_at(row, col, '│');
                frame.set_color(row, col, 1, Color::Blue);
            }
        }
        for (col, [upper, lower]) in [
            (left, ['┌', '└']),
            (split - 1, ['┐', '┘']),
            (split, ['┌', '└']),
            (right, ['┐', '┘']),
        ] {
            frame.write_at(top, col, upper);
            frame.write_at(bottom, col, lower);
        }
        frame.set_color(top, left, w, Color::Blue);
        frame.set_color(bottom, left, w, Color::Blue);

        // Search box separator.
        frame.write_at(top + 2, left, '├');
        for col in left + 1..split - 1 {
            frame.write_at(top + 2, col, '─');
        }
        frame.write_at(top + 2, split - 1, '┤');
        frame.set_color(top + 2, left, w / 2, Color::Blue);

        self.render_search(frame, top + 1, left + 2);

        let list_limit = split - 1;
        for (i, display) in self.results().enumerate() {
            let row = top + 3 + i;
            if row >= bottom {
                break;
            }
            if i == self.selected {
                let end = frame.write_str_bounded(row, left + 2, list_limit, "> ");
                let end = frame.write_str_bounded(row, end, list_limit, display);
                frame.set_color(row, left + 2, end - (left + 2), Color::Green);
            } else {
                frame.write_str_bounded(row, left + 4, list_limit, display);
            }
        }

        for (i, line) in self.preview.iter().take(h - 2).enumerate() {
            frame.write_str_bounded(top + 1 + i, split + 2, right, line);
        }
    }

    /// The search text, clipped to the box keeping its tail, with the cursor
    /// cell highlighted.
    fn render_search(&self, frame: &mut Canvas, row: usize, col: usize) {
        let width = self.search_width();
        let len = self.search.chars().count();
        let start = len.saturating_sub(width);
        let visible: String = self.search.chars().skip(start).collect();
        frame.write_str(row, col, &visible);
        if self.search_cursor >= start {
            let cursor_col = col + self.search_cursor - start;
            if self.search_cursor == len {
                frame.write_at(row, cursor_col, '_');
            }
            frame.set_color(row, cursor_col, 1, Color::Yellow);
        }
    }
}

/// Read at most `max_bytes` of `path` as at most `max_lines` lines.
pub fn read_preview(path: &Path, max_bytes: usize, max_lines: usize) -> Vec<String> {
    let mut buf = Vec::with_capacity(max_bytes.min(64 * 1024));
    let read = File::open(path).and_then(|f| f.take(max_bytes as u64).read_to_end(&mut buf));
    if let Err(error) = read {
        tracing::debug!(%error, path = %path.display(), "cannot preview file");
        return vec![UNREADABLE.to_string()];
    }
    if buf.is_empty() {
        return vec![EMPTY.to_string()];
    }
    if buf.contains(&0) {
        return vec![BINARY.to_string()];
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .take(max_lines)
        .map(|line| line.replace('\t', "    "))
        .collect()
}
