use std::path::{Path, PathBuf};

use variables::RawVariable;

use crate::BackendError;

/// Where the debugged program is currently stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
}

/// A breakpoint as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub id: i64,
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
}

/// Process control and introspection of a debugged program.
///
/// Every command blocks until the backend has finished it. Implementations
/// are the source of truth for breakpoints: callers re-read
/// [`Backend::breakpoints`] after creating or clearing one.
pub trait Backend {
    fn step(&mut self) -> Result<(), BackendError>;
    fn step_into(&mut self) -> Result<(), BackendError>;
    fn step_out(&mut self) -> Result<(), BackendError>;
    fn r#continue(&mut self) -> Result<(), BackendError>;

    /// The current stop location, or `None` when the program is not stopped
    /// in user code.
    fn location(&mut self) -> Result<Option<Location>, BackendError>;

    fn exited(&self) -> bool;

    /// Variables visible in the current frame.
    fn variables(&mut self) -> Result<Vec<RawVariable>, BackendError>;

    fn breakpoints(&mut self) -> Result<Vec<Breakpoint>, BackendError>;
    fn create_breakpoint(&mut self, file: &Path, line: usize) -> Result<(), BackendError>;
    fn clear_breakpoint(&mut self, id: i64) -> Result<(), BackendError>;
}
