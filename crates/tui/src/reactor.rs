//! The event loop.
//!
//! Two helper threads turn terminal input and OS signals into [`Message`]s.
//! The calling thread is the only one touching view state: it applies each
//! message to the [`App`] and repaints. Both channels are rendezvous
//! channels, so a producer blocks until the previous frame has been drawn.

use std::io::{self, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use canvas::Canvas;
use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{self, Event};
use debugger::Backend;
use eyre::{Context, eyre};
use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGWINCH};
use signal_hook::iterator::Signals;

use crate::app::App;
use crate::input::Key;
use crate::terminal::{self, TerminalError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Key(Key),
    Resize,
    Shutdown,
}

/// Drive `app` until it quits or a termination signal arrives.
pub fn run<B: Backend>(app: &mut App<B>) -> eyre::Result<()> {
    let (input_tx, input_rx) = crossbeam_channel::bounded(0);
    let (signal_tx, signal_rx) = crossbeam_channel::bounded(0);
    spawn_input(input_tx).context("spawning input thread")?;
    let _signals = SignalThread::spawn(signal_tx).context("installing signal handlers")?;

    let (width, height) = terminal::size()?;
    let out = BufWriter::with_capacity(width * height * 4, io::stdout());
    // The receivers move into `pump` so they are gone before the signal
    // thread is joined.
    pump(app, input_rx, signal_rx, out, terminal::size)
}

/// The reactor proper: paint, wait for a message, apply it, repeat.
pub fn pump<B, W, S>(
    app: &mut App<B>,
    input: Receiver<Message>,
    signals: Receiver<Message>,
    mut out: W,
    size: S,
) -> eyre::Result<()>
where
    B: Backend,
    W: Write,
    S: Fn() -> Result<(usize, usize), TerminalError>,
{
    let (width, height) = size()?;
    app.resize(width, height);
    let mut frame = Canvas::new(height, width);

    loop {
        app.render(&mut frame);
        terminal::paint(&mut out, &frame).context("painting frame")?;

        let message = crossbeam_channel::select! {
            recv(input) -> msg => msg.map_err(|_| eyre!("input thread stopped"))?,
            recv(signals) -> msg => msg.map_err(|_| eyre!("signal thread stopped"))?,
        };
        tracing::trace!(?message, "handling message");

        match message {
            Message::Key(key) => {
                app.handle_key(key);
                if app.should_quit() {
                    tracing::info!("quitting");
                    return Ok(());
                }
            }
            Message::Resize => match size() {
                Ok((width, height)) => {
                    if (height, width) != (frame.rows(), frame.cols()) {
                        frame = Canvas::new(height, width);
                    }
                    app.resize(width, height);
                }
                Err(TerminalError::TooSmall { width, height }) => {
                    tracing::warn!(width, height, "terminal too small, keeping last frame");
                }
                Err(error) => return Err(error.into()),
            },
            Message::Shutdown => {
                tracing::info!("termination signal received");
                return Ok(());
            }
        }
    }
}

fn spawn_input(tx: Sender<Message>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| read_input(&tx))) {
                terminal::restore();
                panic::resume_unwind(payload);
            }
        })
}

fn read_input(tx: &Sender<Message>) {
    loop {
        let message = match event::read() {
            Ok(event) => match input_message(event) {
                Some(message) => message,
                None => continue,
            },
            Err(error) => {
                tracing::error!(%error, "reading terminal input");
                return;
            }
        };
        if tx.send(message).is_err() {
            return;
        }
    }
}

/// Size changes arrive through SIGWINCH on the signal thread, so only keys
/// are forwarded from the terminal.
fn input_message(event: Event) -> Option<Message> {
    match event {
        Event::Key(key) => Key::from_event(key).map(Message::Key),
        _ => None,
    }
}

/// Forwards window size changes and termination requests. The thread is
/// stopped and joined on drop.
struct SignalThread {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalThread {
    fn spawn(tx: Sender<Message>) -> io::Result<Self> {
        let mut signals = Signals::new([SIGWINCH, SIGINT, SIGTERM])?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("signals".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    let message = match signal {
                        SIGWINCH => Message::Resize,
                        _ => Message::Shutdown,
                    };
                    if tx.send(message).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalThread {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
