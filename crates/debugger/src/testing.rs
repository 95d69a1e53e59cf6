//! In-memory [`Backend`] for exercising front-end code without a debugger.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use variables::RawVariable;

use crate::{Backend, BackendError, Breakpoint, Location};

/// One place the scripted program stops at.
#[derive(Debug, Clone)]
pub struct Stop {
    pub location: Option<Location>,
    pub variables: Vec<RawVariable>,
}

impl Stop {
    pub fn at(file: impl Into<PathBuf>, line: usize, variables: Vec<RawVariable>) -> Self {
        Self {
            location: Some(Location {
                file: file.into(),
                line,
            }),
            variables,
        }
    }
}

/// Walks through a fixed list of stops. Every step or continue advances to
/// the next one; running past the last stop exits the program.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    stops: Vec<Stop>,
    current: usize,
    exited: bool,
    breakpoints: Vec<Breakpoint>,
    next_id: i64,
    failures: VecDeque<String>,
    /// Every command received, in order.
    pub calls: Vec<String>,
}

impl ScriptedBackend {
    pub fn new(stops: Vec<Stop>) -> Self {
        Self {
            exited: stops.is_empty(),
            stops,
            ..Self::default()
        }
    }

    /// Make the next command fail with `message`.
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.failures.push_back(message.into());
    }

    fn command(&mut self, name: &str) -> Result<(), BackendError> {
        self.calls.push(name.to_string());
        match self.failures.pop_front() {
            Some(message) => Err(BackendError::Request {
                command: name.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn advance(&mut self, name: &str) -> Result<(), BackendError> {
        self.command(name)?;
        if self.exited {
            return Err(BackendError::Exited);
        }
        self.current += 1;
        if self.current >= self.stops.len() {
            self.exited = true;
        }
        Ok(())
    }

    fn stop(&self) -> Option<&Stop> {
        if self.exited {
            return None;
        }
        self.stops.get(self.current)
    }
}

impl Backend for ScriptedBackend {
    fn step(&mut self) -> Result<(), BackendError> {
        self.advance("step")
    }

    fn step_into(&mut self) -> Result<(), BackendError> {
        self.advance("step_into")
    }

    fn step_out(&mut self) -> Result<(), BackendError> {
        self.advance("step_out")
    }

    fn r#continue(&mut self) -> Result<(), BackendError> {
        self.advance("continue")
    }

    fn location(&mut self) -> Result<Option<Location>, BackendError> {
        self.command("location")?;
        Ok(self.stop().and_then(|s| s.location.clone()))
    }

    fn exited(&self) -> bool {
        self.exited
    }

    fn variables(&mut self) -> Result<Vec<RawVariable>, BackendError> {
        self.command("variables")?;
        Ok(self.stop().map(|s| s.variables.clone()).unwrap_or_default())
    }

    fn breakpoints(&mut self) -> Result<Vec<Breakpoint>, BackendError> {
        self.command("breakpoints")?;
        Ok(self.breakpoints.clone())
    }

    fn create_breakpoint(&mut self, file: &Path, line: usize) -> Result<(), BackendError> {
        self.command("create_breakpoint")?;
        self.next_id += 1;
        self.breakpoints.push(Breakpoint {
            id: self.next_id,
            file: file.to_path_buf(),
            line,
        });
        Ok(())
    }

    fn clear_breakpoint(&mut self, id: i64) -> Result<(), BackendError> {
        self.command("clear_breakpoint")?;
        let before = self.breakpoints.len();
        self.breakpoints.retain(|b| b.id != id);
        if self.breakpoints.len() == before {
            return Err(BackendError::Protocol(format!("unknown breakpoint {id}")));
        }
        Ok(())
    }
}
