use std::io::{BufRead, BufReader, Read};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::BackendError;

/// How long the server gets to announce it is listening.
const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Printed by `dlv dap` once it accepts connections, followed by the
/// address, e.g. `DAP server listening at: 127.0.0.1:40123`.
const READY_LINE: &str = "DAP server listening";

/// A `dlv dap` process serving one debug session. Killed on drop.
pub struct DelveServer {
    child: Child,
    port: u16,
}

impl DelveServer {
    /// Start `dlv dap` on `port`, or on a free port if `port` is 0, running
    /// in `cwd`.
    pub fn on_port(port: u16, cwd: &Path) -> Result<Self, BackendError> {
        let dlv = locate("dlv")?;
        let port = if port == 0 { free_port()? } else { port };
        let mut command = Command::new(dlv);
        command.args(["dap", "--listen", &format!("127.0.0.1:{port}")]);
        Self::spawn(command, port, cwd, SERVER_READY_TIMEOUT)
    }

    /// Run `command` and wait for its ready line. The port the server
    /// announces wins over the one it was asked for.
    fn spawn(
        mut command: Command,
        port: u16,
        cwd: &Path,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let program = command.get_program().to_string_lossy().into_owned();
        tracing::debug!(%program, port, "starting debug server");
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .current_dir(cwd)
            .spawn()
            .map_err(|e| BackendError::Server(format!("spawning {program}: {e}")))?;

        let Some(stdout) = child.stdout.take() else {
            stop(&mut child);
            return Err(BackendError::Server(format!("{program} stdout not captured")));
        };

        let ready = match wait_for_line(stdout, READY_LINE, timeout) {
            Ok(line) => line,
            Err(not_ready) => {
                let status = match child.try_wait() {
                    Ok(Some(status)) => status.to_string(),
                    _ => {
                        stop(&mut child);
                        "killed".to_string()
                    }
                };
                let (reason, output) = match not_ready {
                    NotReady::TimedOut(output) => {
                        (format!("printed no {READY_LINE:?} line within {timeout:?}"), output)
                    }
                    NotReady::Closed(output) => {
                        ("closed its output before it was ready".to_string(), output)
                    }
                };
                return Err(BackendError::Server(format!(
                    "{program} {reason} ({status})\n{}",
                    output.join("\n")
                )));
            }
        };

        let port = match announced_port(&ready) {
            Some(announced) if announced != port => {
                tracing::warn!(requested = port, announced, "server listening on another port");
                announced
            }
            _ => port,
        };
        tracing::debug!(port, "server ready");
        Ok(Self { child, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for DelveServer {
    fn drop(&mut self) {
        tracing::debug!("terminating server");
        stop(&mut self.child);
    }
}

fn stop(child: &mut Child) {
    match child.kill() {
        Ok(()) => {
            let _ = child.wait();
        }
        Err(e) => tracing::warn!(error = %e, "could not terminate server process"),
    }
}

fn locate(program: &str) -> Result<PathBuf, BackendError> {
    which::which(program).map_err(|_| {
        BackendError::Server(format!(
            "{program} not found in PATH. Install delve: https://github.com/go-delve/delve"
        ))
    })
}

/// Ask the OS for a currently unused local TCP port.
fn free_port() -> Result<u16, BackendError> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn announced_port(line: &str) -> Option<u16> {
    line.rsplit(':').next()?.trim().parse().ok()
}

/// Lines read before the ready line never showed up.
#[derive(Debug)]
enum NotReady {
    TimedOut(Vec<String>),
    Closed(Vec<String>),
}

/// Read lines until one contains `needle` and return it.
fn wait_for_line(
    reader: impl Read + Send + 'static,
    needle: &str,
    timeout: Duration,
) -> Result<String, NotReady> {
    let (tx, rx) = mpsc::channel();
    // Keeps draining after the ready line so the server never blocks on a
    // full pipe.
    thread::spawn(move || {
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            tracing::trace!(%line, "debug server output");
            let _ = tx.send(line);
        }
    });

    let deadline = Instant::now() + timeout;
    let mut output = Vec::new();
    loop {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(line) if line.contains(needle) => return Ok(line),
            Ok(line) => output.push(line),
            Err(RecvTimeoutError::Timeout) => return Err(NotReady::TimedOut(output)),
            Err(RecvTimeoutError::Disconnected) => return Err(NotReady::Closed(output)),
        }
    }
}
