use std::collections::VecDeque;
use std::io::{BufRead, Write};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::codec::DapCodec;
use super::message::{Event, Message, Request, Seq};
use crate::BackendError;

/// Synchronous DAP client.
///
/// Requests are correlated with their responses by sequence number. Events
/// that arrive while a response is outstanding are queued for
/// [`DapClient::wait_for_event`]; reverse requests are logged and ignored.
pub struct DapClient<R, W> {
    input: R,
    output: W,
    codec: DapCodec,
    seq: Seq,
    events: VecDeque<Event>,
}

impl<R, W> DapClient<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            codec: DapCodec::new(),
            seq: 0,
            events: VecDeque::new(),
        }
    }

    /// Send a request without waiting for its response.
    pub fn send(&mut self, command: &str, arguments: Option<Value>) -> Result<Seq, BackendError> {
        self.seq += 1;
        let seq = self.seq;
        tracing::debug!(seq, command, "sending request");
        let message = Message::Request(Request {
            seq,
            command: command.to_string(),
            arguments,
        });
        self.codec.write_message(&mut self.output, &message)?;
        Ok(seq)
    }

    /// Send a request and block until its response arrives, returning the
    /// response body.
    pub fn request(&mut self, command: &str, arguments: Value) -> Result<Option<Value>, BackendError> {
        let seq = self.send(command, Some(arguments))?;
        loop {
            match self.next_message()? {
                Message::Response(response) if response.request_seq == seq => {
                    if !response.success {
                        return Err(BackendError::Request {
                            command: response.command,
                            message: response.message.unwrap_or_default(),
                        });
                    }
                    return Ok(response.body);
                }
                Message::Response(response) => {
                    tracing::warn!(
                        request_seq = response.request_seq,
                        command = %response.command,
                        "dropping uncorrelated response"
                    );
                }
                Message::Event(event) => self.events.push_back(event),
                Message::Request(request) => {
                    tracing::debug!(command = %request.command, "ignoring reverse request");
                }
            }
        }
    }

    /// Like [`DapClient::request`], decoding the body into `T`.
    pub fn request_body<T: DeserializeOwned>(
        &mut self,
        command: &str,
        arguments: Value,
    ) -> Result<T, BackendError> {
        let body = self
            .request(command, arguments)?
            .ok_or_else(|| BackendError::Protocol(format!("{command} response has no body")))?;
        serde_json::from_value(body)
            .map_err(|e| BackendError::Protocol(format!("decoding {command} response: {e}")))
    }

    /// Block until one of `names` is received. Queued events are consulted
    /// first; any other event passed over on the way is discarded.
    pub fn wait_for_event(&mut self, names: &[&str]) -> Result<Event, BackendError> {
        while let Some(event) = self.events.pop_front() {
            if names.contains(&event.event.as_str()) {
                return Ok(event);
            }
            tracing::trace!(event = %event.event, "skipping event");
        }
        loop {
            match self.next_message()? {
                Message::Event(event) if names.contains(&event.event.as_str()) => return Ok(event),
                Message::Event(event) => tracing::trace!(event = %event.event, "skipping event"),
                Message::Response(response) => {
                    tracing::warn!(
                        request_seq = response.request_seq,
                        command = %response.command,
                        "dropping uncorrelated response"
                    );
                }
                Message::Request(request) => {
                    tracing::debug!(command = %request.command, "ignoring reverse request");
                }
            }
        }
    }

    fn next_message(&mut self) -> Result<Message, BackendError> {
        self.codec
            .read_message(&mut self.input)?
            .ok_or(BackendError::Disconnected)
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}
