//! Error types for the debugger layer.

use std::io;

/// Errors that can occur during DAP message encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The header section contained invalid UTF-8.
    #[error("invalid UTF-8 in header")]
    InvalidUtf8,

    /// The Content-Length header value could not be parsed as an integer.
    #[error("malformed Content-Length header value")]
    MalformedContentLength,

    /// No Content-Length header was found in the message.
    #[error("missing Content-Length header")]
    MissingContentLength,

    /// The message body exceeds the configured maximum size.
    #[error("message size {size} exceeds maximum allowed {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("JSON deserialization failed: {0}")]
    JsonDeserialize(#[source] serde_json::Error),

    #[error("JSON serialization failed: {0}")]
    JsonSerialize(#[source] serde_json::Error),
}

/// Failures of a [`crate::Backend`] command.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The adapter answered a request with `success: false`.
    #[error("{command} failed: {message}")]
    Request { command: String, message: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The adapter sent something we could not make sense of.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The adapter closed the connection.
    #[error("debug adapter disconnected")]
    Disconnected,

    /// A process-control command was issued after the program finished.
    #[error("program has exited")]
    Exited,

    /// The debug server process could not be started.
    #[error("debug server: {0}")]
    Server(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures of the build toolchain.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("{0} not found in PATH")]
    NotFound(&'static str),

    /// The command ran but exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("package {0} is not a main package")]
    NotMain(String),

    #[error("decoding package info: {0}")]
    PackageInfo(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
