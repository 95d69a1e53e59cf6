//! The view controller: owns every pane, routes keys to the focused one and
//! drives the debugger.

use std::fmt;
use std::path::Path;

use canvas::{Canvas, Color, compose};
use debugger::{Backend, BackendError, Breakpoint, Location};
use variables::VariableTree;

use crate::input::Key;
use crate::inspector::Inspector;
use crate::picker::{Picker, PickerAction};
use crate::source::SourceView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Source,
    Variables,
    Picker,
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Focus::Source => "source",
            Focus::Variables => "variables",
            Focus::Picker => "files",
        };
        f.write_str(name)
    }
}

type Command<B> = fn(&mut B) -> Result<(), BackendError>;

pub struct App<B> {
    backend: B,
    source: SourceView,
    tree: VariableTree,
    inspector: Inspector,
    picker: Picker,
    focus: Focus,
    /// Focus to return to when the picker closes.
    last_pane: Focus,
    breakpoints: Vec<Breakpoint>,
    location: Option<Location>,
    status: Option<String>,
    height: usize,
    quit: bool,
}

impl<B: Backend> App<B> {
    pub fn new(backend: B, picker: Picker, width: usize, height: usize) -> Self {
        let mut app = Self {
            backend,
            source: SourceView::new(height),
            tree: VariableTree::new(),
            inspector: Inspector::default(),
            picker,
            focus: Focus::Source,
            last_pane: Focus::Source,
            breakpoints: Vec::new(),
            location: None,
            status: None,
            height,
            quit: false,
        };
        app.resize(width, height);
        app
    }

    /// Load the initial snapshot.
    pub fn start(&mut self) {
        self.refresh_breakpoints();
        self.refresh();
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    #[cfg(test)]
    pub fn source(&self) -> &SourceView {
        &self.source
    }

    #[cfg(test)]
    pub fn tree(&self) -> &VariableTree {
        &self.tree
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Rows available to the panes; the last row holds the status line.
    fn body_height(&self) -> usize {
        self.height.saturating_sub(1)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        tracing::debug!(width, height, "resizing");
        self.height = height;
        let body = self.body_height();
        self.source.resize(body);
        self.inspector.follow(&self.tree, body);
        self.picker.resize(width, height);
    }

    pub fn handle_key(&mut self, key: Key) {
        self.status = None;
        // Raw mode delivers Ctrl-C as a key rather than SIGINT.
        if key == Key::Ctrl('c') {
            self.quit = true;
            return;
        }
        if self.focus == Focus::Picker {
            self.handle_picker_key(key);
            return;
        }
        match key {
            Key::Tab => {
                self.focus = match self.focus {
                    Focus::Source => Focus::Variables,
                    _ => Focus::Source,
                };
            }
            Key::Ctrl('p') => {
                self.last_pane = self.focus;
                self.focus = Focus::Picker;
                self.picker.open();
            }
            Key::Char('q') => self.quit = true,
            Key::Char('k') | Key::Up => self.move_up(),
            Key::Char('j') | Key::Down => self.move_down(),
            Key::Char('l') => {
                self.tree.expand();
            }
            Key::Char('h') => {
                self.tree.collapse();
                self.inspector.follow(&self.tree, self.body_height());
            }
            Key::Char('s') => self.run_command("step", B::step),
            Key::Char('i') => self.run_command("step in", B::step_into),
            Key::Char('o') => self.run_command("step out", B::step_out),
            Key::Char('c') => self.run_command("continue", B::r#continue),
            Key::Char('b') => self.toggle_breakpoint(),
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, key: Key) {
        match self.picker.handle_key(key) {
            PickerAction::None => {}
            PickerAction::Close => self.focus = self.last_pane,
            PickerAction::Open(path) => {
                self.focus = Focus::Source;
                let stopped = self
                    .location
                    .as_ref()
                    .map(|l| (l.file.as_path(), l.line));
                match self.source.open_file(&path, stopped) {
                    Ok(()) => self.source.set_breakpoints(&self.breakpoints),
                    Err(error) => self.report(format!("opening {}: {error}", path.display())),
                }
            }
        }
    }

    fn move_up(&mut self) {
        match self.focus {
            Focus::Source => self.source.move_up(),
            Focus::Variables => {
                self.tree.move_up();
                self.inspector.follow(&self.tree, self.body_height());
            }
            Focus::Picker => {}
        }
    }

    fn move_down(&mut self) {
        match self.focus {
            Focus::Source => self.source.move_down(),
            Focus::Variables => {
                self.tree.move_down();
                self.inspector.follow(&self.tree, self.body_height());
            }
            Focus::Picker => {}
        }
    }

    #[tracing::instrument(skip(self, command))]
    fn run_command(&mut self, name: &str, command: Command<B>) {
        match command(&mut self.backend) {
            Ok(()) => {}
            Err(BackendError::Exited) => {}
            Err(error) => {
                tracing::warn!(%error, "debugger command failed");
                self.report(format!("{name}: {error}"));
                return;
            }
        }
        if self.backend.exited() {
            tracing::debug!("program exited");
            self.location = None;
            self.quit = true;
            return;
        }
        self.refresh();
    }

    /// Re-read location and variables. On failure the previous snapshot stays.
    fn refresh(&mut self) {
        let snapshot = self.backend.location().and_then(|location| {
            let raw = self.backend.variables()?;
            Ok((location, raw))
        });
        let (location, raw) = match snapshot {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(%error, "fetching program state");
                self.report(format!("reading program state: {error}"));
                return;
            }
        };

        let mut file_changed = false;
        match &location {
            None => self.source.clear_pc(),
            Some(location) => match self.source.load_location(&location.file, location.line) {
                Ok(changed) => {
                    file_changed = changed;
                    if changed {
                        self.source.set_breakpoints(&self.breakpoints);
                    }
                }
                Err(error) => {
                    self.report(format!("reading {}: {error}", location.file.display()));
                }
            },
        }
        self.location = location;

        self.tree.load(&raw, file_changed);
        if file_changed {
            self.inspector.reset();
        }
        self.inspector.follow(&self.tree, self.body_height());
    }

    fn toggle_breakpoint(&mut self) {
        let Some(file) = self.source.file().map(Path::to_path_buf) else {
            return;
        };
        let line = self.source.cursor() + 1;
        let existing = self
            .breakpoints
            .iter()
            .find(|b| b.file == file && b.line == line)
            .map(|b| b.id);
        let result = match existing {
            Some(id) => self.backend.clear_breakpoint(id),
            None => self.backend.create_breakpoint(&file, line),
        };
        if let Err(error) = result {
            tracing::warn!(%error, file = %file.display(), line, "toggling breakpoint");
            self.report(format!("breakpoint: {error}"));
        }
        self.refresh_breakpoints();
    }

    fn refresh_breakpoints(&mut self) {
        match self.backend.breakpoints() {
            Ok(breakpoints) => {
                self.breakpoints = breakpoints;
                self.source.set_breakpoints(&self.breakpoints);
            }
            Err(error) => {
                tracing::warn!(%error, "listing breakpoints");
                self.report(format!("breakpoints: {error}"));
            }
        }
    }

    /// Show `message` on the status line until the next key press. The
    /// first failure of a key press wins.
    fn report(&mut self, message: String) {
        if self.status.is_none() {
            self.status = Some(message);
        }
    }

    /// Draw everything into `frame`, which must be `height` x `width`.
    pub fn render(&self, frame: &mut Canvas) {
        frame.fill_blank();
        let body = self.body_height();
        let focus = match self.focus {
            Focus::Picker => self.last_pane,
            other => other,
        };
        let blocks = [
            self.source.render(body, focus == Focus::Source),
            self.inspector.render(&self.tree, body, focus == Focus::Variables),
        ];
        compose(frame, 0, body, &blocks);
        self.render_status(frame, body);
        if self.focus == Focus::Picker {
            self.picker.render(frame);
        }
    }

    /// Focus and any error on the left, program state on the right.
    fn render_status(&self, frame: &mut Canvas, row: usize) {
        let mut col = frame.write_str(row, 0, &format!(" [{}] ", self.focus));
        frame.set_color(row, 0, col, Color::Blue);
        if let Some(status) = &self.status {
            let end = frame.write_str(row, col, status);
            frame.set_color(row, col, end - col, Color::Red);
            col = end + 2;
        }

        let state = match (&self.location, self.backend.exited()) {
            (_, true) => "exited".to_string(),
            (Some(location), false) => {
                format!("{}:{} ", location.file.display(), location.line)
            }
            (None, false) => "no location ".to_string(),
        };
        let len = state.chars().count();
        if col + len <= frame.cols() {
            frame.write_str(row, frame.cols() - len, &state);
        }
    }
}
