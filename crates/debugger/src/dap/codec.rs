//! Blocking DAP framing.
//!
//! DAP uses a simple Content-Length header protocol:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <JSON body>
//! ```

use std::io::{self, BufRead, Write};

use super::message::Message;
use crate::error::CodecError;

/// Default maximum message size (16 MB).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct DapCodec {
    max_message_size: usize,
}

impl DapCodec {
    pub fn new() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Messages larger than this are rejected with [`CodecError::MessageTooLarge`].
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    /// Read one message. Returns `Ok(None)` if the stream ends cleanly
    /// between messages.
    pub fn read_message(&self, input: &mut impl BufRead) -> Result<Option<Message>, CodecError> {
        let mut line = String::new();
        let mut content_length = None;
        let mut first = true;
        loop {
            line.clear();
            let read = read_header_line(input, &mut line)?;
            if read == 0 {
                if first {
                    return Ok(None);
                }
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            first = false;
            let header = line.trim_end_matches(['\r', '\n']);
            if header.is_empty() {
                break;
            }
            if let Some(value) = header.strip_prefix("Content-Length:") {
                content_length = Some(
                    value
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| CodecError::MalformedContentLength)?,
                );
            }
        }

        let content_length = content_length.ok_or(CodecError::MissingContentLength)?;
        if content_length > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                size: content_length,
                max: self.max_message_size,
            });
        }

        let mut body = vec![0; content_length];
        input.read_exact(&mut body)?;
        tracing::trace!(content = %String::from_utf8_lossy(&body), "received raw message");
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(CodecError::JsonDeserialize)
    }

    pub fn write_message(&self, output: &mut impl Write, message: &Message) -> Result<(), CodecError> {
        let json = serde_json::to_vec(message).map_err(CodecError::JsonSerialize)?;
        write!(output, "Content-Length: {}\r\n\r\n", json.len())?;
        output.write_all(&json)?;
        output.flush()?;
        Ok(())
    }
}

impl Default for DapCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn read_header_line(input: &mut impl BufRead, line: &mut String) -> Result<usize, CodecError> {
    let mut raw = Vec::new();
    let read = input.read_until(b'\n', &mut raw)?;
    let text = std::str::from_utf8(&raw).map_err(|_| CodecError::InvalidUtf8)?;
    line.push_str(text);
    Ok(read)
}
