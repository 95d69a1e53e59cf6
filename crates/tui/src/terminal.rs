//! Raw mode and alternate screen handling.

use std::io::{self, Write};

use canvas::Canvas;
use crossterm::{cursor, execute, queue, terminal};

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("enabling raw mode")]
    RawMode(#[source] io::Error),

    #[error("entering the alternate screen")]
    AlternateScreen(#[source] io::Error),

    #[error("querying the terminal size")]
    Size(#[source] io::Error),

    #[error("terminal too small ({width}x{height})")]
    TooSmall { width: u16, height: u16 },
}

/// Holds the terminal in raw mode on the alternate screen with the cursor
/// hidden. Dropping the guard restores the terminal.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> Result<Self, TerminalError> {
        terminal::enable_raw_mode().map_err(TerminalError::RawMode)?;
        // From here on the guard exists so a failure below still restores
        // raw mode when it is dropped.
        let guard = Self { _private: () };
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)
            .map_err(TerminalError::AlternateScreen)?;
        tracing::debug!("terminal set up");
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        tracing::debug!("terminal restored");
    }
}

/// Best effort: show the cursor, leave the alternate screen and raw mode.
/// Safe to call more than once.
pub fn restore() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Restore the terminal before any panic report is printed.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

/// Current terminal size as `(width, height)`.
pub fn size() -> Result<(usize, usize), TerminalError> {
    let (width, height) = terminal::size().map_err(TerminalError::Size)?;
    if width < 2 || height < 2 {
        return Err(TerminalError::TooSmall { width, height });
    }
    Ok((width as usize, height as usize))
}

/// Write one frame: cursor home, then every cell.
pub fn paint(out: &mut impl Write, frame: &Canvas) -> io::Result<()> {
    queue!(out, cursor::MoveTo(0, 0))?;
    frame.print_colored(out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas::Color;

    #[test]
    fn paint_starts_at_home() {
        let mut frame = Canvas::new(1, 3);
        frame.write_str(0, 0, "abc");
        frame.set_color(0, 1, 1, Color::Red);

        let mut out = Vec::new();
        paint(&mut out, &frame).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out, "\x1b[1;1H\x1b[0ma\x1b[91mb\x1b[0mc");
    }
}
