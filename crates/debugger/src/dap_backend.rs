//! [`Backend`] implementation speaking DAP to `dlv dap`.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use variables::{Kind, RawVariable};

use crate::dap::DapClient;
use crate::dap::message::{
    ScopesBody, SetBreakpointsBody, StackFrame, StackTraceBody, StoppedBody, Variable,
    VariablesBody,
};
use crate::delve::DelveServer;
use crate::{Backend, BackendError, Breakpoint, Location};

/// How much of the variable graph is fetched after every stop.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// Levels of children fetched below each top-level variable.
    pub depth: usize,
    /// Children fetched per node; the rest are dropped.
    pub max_children: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            depth: 3,
            max_children: 64,
        }
    }
}

/// What to run under the debugger.
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    /// A compiled binary.
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Function breakpoints installed before the program starts.
    pub entry_breakpoints: Vec<String>,
}

/// A debug session over a DAP connection.
pub struct DapBackend<R: BufRead, W: Write> {
    client: DapClient<R, W>,
    limits: FetchLimits,
    thread_id: i64,
    exited: bool,
    /// Requested lines per file; `setBreakpoints` always sends a whole file.
    lines: BTreeMap<PathBuf, BTreeSet<usize>>,
    breakpoints: Vec<Breakpoint>,
    next_local_id: i64,
    server: Option<DelveServer>,
}

pub type TcpDapBackend = DapBackend<BufReader<TcpStream>, TcpStream>;

impl TcpDapBackend {
    /// Start `dlv dap` on `port` (0 picks a free one), connect, and launch
    /// `request`. Returns once the program hits its first stop or exits.
    pub fn start(port: u16, request: &LaunchRequest, limits: FetchLimits) -> Result<Self, BackendError> {
        let cwd = request.cwd.clone().unwrap_or_else(|| PathBuf::from("."));
        let server = DelveServer::on_port(port, &cwd)?;
        let stream = TcpStream::connect(("127.0.0.1", server.port()))?;
        let input = BufReader::new(stream.try_clone()?);
        let mut backend = DapBackend::launch(input, stream, request, limits)?;
        backend.server = Some(server);
        Ok(backend)
    }
}

impl<R: BufRead, W: Write> DapBackend<R, W> {
    /// Run the DAP launch handshake over an established connection.
    pub fn launch(
        input: R,
        output: W,
        request: &LaunchRequest,
        limits: FetchLimits,
    ) -> Result<Self, BackendError> {
        let mut backend = Self {
            client: DapClient::new(input, output),
            limits,
            thread_id: 1,
            exited: false,
            lines: BTreeMap::new(),
            breakpoints: Vec::new(),
            next_local_id: 0,
            server: None,
        };

        backend.client.request(
            "initialize",
            json!({
                "clientID": "dap-tui",
                "clientName": "dap-tui",
                "adapterID": "go",
                "pathFormat": "path",
                "linesStartAt1": true,
                "columnsStartAt1": true,
                "supportsVariableType": true,
                "locale": "en-us",
            }),
        )?;

        let mut arguments = json!({
            "request": "launch",
            "mode": "exec",
            "program": request.program.to_string_lossy(),
            "args": request.args,
            "stopOnEntry": false,
        });
        if let Some(cwd) = &request.cwd {
            arguments["cwd"] = json!(cwd.to_string_lossy());
        }
        backend.client.request("launch", arguments)?;
        backend.client.wait_for_event(&["initialized"])?;

        if !request.entry_breakpoints.is_empty() {
            let breakpoints: Vec<Value> = request
                .entry_breakpoints
                .iter()
                .map(|name| json!({ "name": name }))
                .collect();
            backend
                .client
                .request("setFunctionBreakpoints", json!({ "breakpoints": breakpoints }))?;
        }
        backend.client.request("configurationDone", json!({}))?;
        backend.wait_for_stop()?;
        Ok(backend)
    }

    fn wait_for_stop(&mut self) -> Result<(), BackendError> {
        let event = self
            .client
            .wait_for_event(&["stopped", "terminated", "exited"])?;
        if event.event != "stopped" {
            tracing::debug!(event = %event.event, "program finished");
            self.exited = true;
            return Ok(());
        }
        let body: StoppedBody = match event.body {
            Some(body) => serde_json::from_value(body)
                .map_err(|e| BackendError::Protocol(format!("decoding stopped event: {e}")))?,
            None => StoppedBody::default(),
        };
        if let Some(thread_id) = body.thread_id {
            self.thread_id = thread_id;
        }
        tracing::debug!(reason = %body.reason, thread_id = self.thread_id, "program stopped");
        Ok(())
    }

    fn resume(&mut self, command: &str) -> Result<(), BackendError> {
        if self.exited {
            return Err(BackendError::Exited);
        }
        self.client
            .request(command, json!({ "threadId": self.thread_id }))?;
        self.wait_for_stop()
    }

    fn top_frame(&mut self) -> Result<Option<StackFrame>, BackendError> {
        if self.exited {
            return Ok(None);
        }
        let body: StackTraceBody = self.client.request_body(
            "stackTrace",
            json!({ "threadId": self.thread_id, "startFrame": 0, "levels": 1 }),
        )?;
        Ok(body.stack_frames.into_iter().next())
    }

    fn fetch(&mut self, reference: i64, depth: usize) -> Result<Vec<RawVariable>, BackendError> {
        let body: VariablesBody = self
            .client
            .request_body("variables", json!({ "variablesReference": reference }))?;
        let mut out = Vec::with_capacity(body.variables.len().min(self.limits.max_children));
        for variable in body.variables.into_iter().take(self.limits.max_children) {
            let children = if variable.variables_reference > 0 && depth < self.limits.depth {
                self.fetch(variable.variables_reference, depth + 1)?
            } else {
                Vec::new()
            };
            out.push(to_raw(variable, children));
        }
        Ok(out)
    }

    fn sync_breakpoints(&mut self, file: &Path) -> Result<(), BackendError> {
        let lines: Vec<usize> = self
            .lines
            .get(file)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let requested: Vec<Value> = lines.iter().map(|line| json!({ "line": line })).collect();
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let body: SetBreakpointsBody = self.client.request_body(
            "setBreakpoints",
            json!({
                "source": { "name": name, "path": file.to_string_lossy() },
                "breakpoints": requested,
            }),
        )?;

        self.breakpoints.retain(|b| b.file != file);
        let mut confirmed = BTreeSet::new();
        for (info, requested_line) in body.breakpoints.into_iter().zip(lines) {
            if !info.verified {
                tracing::warn!(
                    file = %file.display(),
                    line = requested_line,
                    message = info.message.as_deref().unwrap_or(""),
                    "breakpoint rejected"
                );
                continue;
            }
            let line = info.line.unwrap_or(requested_line);
            let id = match info.id {
                Some(id) => id,
                None => {
                    self.next_local_id -= 1;
                    self.next_local_id
                }
            };
            confirmed.insert(line);
            self.breakpoints.push(Breakpoint {
                id,
                file: file.to_path_buf(),
                line,
            });
        }
        if confirmed.is_empty() {
            self.lines.remove(file);
        } else {
            self.lines.insert(file.to_path_buf(), confirmed);
        }
        Ok(())
    }

    /// Sync one file; on failure forget the unconfirmed edit.
    fn sync_or_restore(&mut self, file: &Path) -> Result<(), BackendError> {
        let result = self.sync_breakpoints(file);
        if result.is_err() {
            let known: BTreeSet<usize> = self
                .breakpoints
                .iter()
                .filter(|b| b.file == file)
                .map(|b| b.line)
                .collect();
            if known.is_empty() {
                self.lines.remove(file);
            } else {
                self.lines.insert(file.to_path_buf(), known);
            }
        }
        result
    }

    #[cfg(test)]
    fn written(&self) -> &W {
        self.client.output()
    }
}

impl<R: BufRead, W: Write> Backend for DapBackend<R, W> {
    #[tracing::instrument(skip(self))]
    fn step(&mut self) -> Result<(), BackendError> {
        self.resume("next")
    }

    #[tracing::instrument(skip(self))]
    fn step_into(&mut self) -> Result<(), BackendError> {
        self.resume("stepIn")
    }

    #[tracing::instrument(skip(self))]
    fn step_out(&mut self) -> Result<(), BackendError> {
        self.resume("stepOut")
    }

    #[tracing::instrument(skip(self))]
    fn r#continue(&mut self) -> Result<(), BackendError> {
        self.resume("continue")
    }

    fn location(&mut self) -> Result<Option<Location>, BackendError> {
        let Some(frame) = self.top_frame()? else {
            return Ok(None);
        };
        let path = frame.source.and_then(|s| s.path).unwrap_or_default();
        if path.is_empty() || path.contains("<autogenerated>") {
            return Ok(None);
        }
        Ok(Some(Location {
            file: PathBuf::from(path),
            line: frame.line,
        }))
    }

    fn exited(&self) -> bool {
        self.exited
    }

    #[tracing::instrument(skip(self))]
    fn variables(&mut self) -> Result<Vec<RawVariable>, BackendError> {
        let Some(frame) = self.top_frame()? else {
            return Ok(Vec::new());
        };
        let body: ScopesBody = self
            .client
            .request_body("scopes", json!({ "frameId": frame.id }))?;
        let mut out = Vec::new();
        for scope in body.scopes {
            if scope.expensive || scope.variables_reference <= 0 {
                continue;
            }
            out.extend(self.fetch(scope.variables_reference, 0)?);
        }
        Ok(out)
    }

    fn breakpoints(&mut self) -> Result<Vec<Breakpoint>, BackendError> {
        Ok(self.breakpoints.clone())
    }

    #[tracing::instrument(skip(self))]
    fn create_breakpoint(&mut self, file: &Path, line: usize) -> Result<(), BackendError> {
        self.lines.entry(file.to_path_buf()).or_default().insert(line);
        self.sync_or_restore(file)
    }

    #[tracing::instrument(skip(self))]
    fn clear_breakpoint(&mut self, id: i64) -> Result<(), BackendError> {
        let Some(breakpoint) = self.breakpoints.iter().find(|b| b.id == id).cloned() else {
            return Err(BackendError::Protocol(format!("unknown breakpoint {id}")));
        };
        if let Some(lines) = self.lines.get_mut(&breakpoint.file) {
            lines.remove(&breakpoint.line);
        }
        self.sync_or_restore(&breakpoint.file)
    }
}

impl<R: BufRead, W: Write> Drop for DapBackend<R, W> {
    fn drop(&mut self) {
        tracing::debug!("disconnecting from debug adapter");
        if let Err(e) = self
            .client
            .send("disconnect", Some(json!({ "terminateDebuggee": true })))
        {
            tracing::debug!(error = %e, "disconnect failed");
        }
    }
}

/// Convert a DAP variable and its already converted children into the
/// runtime layout the variable decoder expects.
fn to_raw(variable: Variable, children: Vec<RawVariable>) -> RawVariable {
    let Variable {
        name,
        value,
        type_name,
        ..
    } = variable;

    if value.starts_with("(unreadable") {
        return RawVariable::new(name, Kind::Unreadable, type_name, value);
    }

    let kind = infer_kind(&type_name, &value, !children.is_empty());
    match kind {
        Kind::String => {
            let value = unquote(&value).to_string();
            RawVariable::new(name, kind, type_name, value)
        }
        Kind::Function if value == "nil" => RawVariable::new(name, kind, type_name, ""),
        Kind::Map => RawVariable::new(name, kind, type_name, "").with_children(interleave_map(children)),
        Kind::Array | Kind::Record | Kind::Channel => {
            RawVariable::new(name, kind, type_name, "").with_children(children)
        }
        Kind::Pointer => {
            let pointee_type = type_name.trim().strip_prefix('*').unwrap_or(type_name.trim());
            // Either the dereferenced value itself, or the fields of a
            // struct pointee listed directly under the pointer.
            let is_pointee = matches!(children.as_slice(), [only] if only.type_name == pointee_type);
            let children = if children.is_empty() || is_pointee {
                children
            } else {
                vec![RawVariable::new("", Kind::Record, pointee_type, "").with_children(children)]
            };
            RawVariable::new(name, kind, type_name, value).with_children(children)
        }
        Kind::Dynamic => dynamic(name, type_name, value, children),
        _ => RawVariable::new(name, kind, type_name, value).with_children(children),
    }
}

fn infer_kind(type_name: &str, value: &str, has_children: bool) -> Kind {
    let t = type_name.trim();
    match t {
        "bool" => Kind::Boolean,
        "string" => Kind::String,
        "float32" | "float64" => Kind::Float,
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "byte" | "rune" => Kind::Integer,
        "error" | "any" => Kind::Dynamic,
        _ if t.starts_with("interface") => Kind::Dynamic,
        _ if t.starts_with("map[") => Kind::Map,
        _ if t.starts_with('[') => Kind::Array,
        _ if t.starts_with('*') => Kind::Pointer,
        _ if t.starts_with("chan") || t.starts_with("<-chan") => Kind::Channel,
        _ if t.starts_with("func") => Kind::Function,
        _ if t.starts_with("struct") => Kind::Record,
        _ if value.starts_with('"') => Kind::String,
        _ if has_children && value.contains("len: ") => Kind::Array,
        _ if has_children => Kind::Record,
        // Anything else is shown exactly as the adapter rendered it.
        _ => Kind::Integer,
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Rebuild the `key, value, key, value` layout from children named by key.
fn interleave_map(children: Vec<RawVariable>) -> Vec<RawVariable> {
    let already_paired = !children.is_empty()
        && children
            .iter()
            .all(|c| c.name.starts_with("[key ") || c.name.starts_with("[val "));
    if already_paired {
        return children;
    }
    let mut out = Vec::with_capacity(children.len() * 2);
    for mut value in children {
        let key_text = std::mem::take(&mut value.name);
        let key = if key_text.starts_with('"') {
            RawVariable::new("", Kind::String, "string", unquote(&key_text))
        } else {
            RawVariable::new("", Kind::Integer, "", key_text)
        };
        out.push(key);
        out.push(value);
    }
    out
}

/// Interface values render as `iface(concrete) value`; the concrete part
/// becomes the single child.
fn dynamic(name: String, type_name: String, value: String, children: Vec<RawVariable>) -> RawVariable {
    let concrete = value
        .strip_prefix(type_name.as_str())
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.split_once(") "));
    let inner = match concrete {
        Some((inner_type, inner_value)) if inner_type != "nil" => to_raw(
            Variable {
                name: "data".to_string(),
                value: inner_value.to_string(),
                type_name: inner_type.to_string(),
                variables_reference: 0,
            },
            children,
        ),
        Some(_) => return RawVariable::new(name, Kind::Dynamic, type_name, ""),
        None if value == "nil" || value.ends_with(" nil") || (value.is_empty() && children.is_empty()) => {
            return RawVariable::new(name, Kind::Dynamic, type_name, "");
        }
        None => {
            let kind = if children.is_empty() { Kind::Integer } else { Kind::Record };
            RawVariable::new("data", kind, type_name.clone(), value).with_children(children)
        }
    };
    RawVariable::new(name, Kind::Dynamic, type_name, "").with_children(vec![inner])
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::dap::message::{Event, Message, Response, Seq};
    use crate::dap::DapCodec;

    /// Pre-recorded adapter output. Requests are numbered from 1 in the
    /// order the backend sends them, so responses can be written up front.
    #[derive(Default)]
    struct Script {
        seq: Seq,
        out: Vec<u8>,
    }

    impl Script {
        fn respond(mut self, command: &str, body: Value) -> Self {
            self.seq += 1;
            let seq = self.seq;
            self.write(Message::Response(Response {
                seq: 1000 + seq,
                request_seq: seq,
                success: true,
                command: command.to_string(),
                message: None,
                body: Some(body),
            }))
        }

        fn fail(mut self, command: &str, message: &str) -> Self {
            self.seq += 1;
            let seq = self.seq;
            self.write(Message::Response(Response {
                seq: 1000 + seq,
                request_seq: seq,
                success: false,
                command: command.to_string(),
                message: Some(message.to_string()),
                body: None,
            }))
        }

        fn event(self, name: &str, body: Value) -> Self {
            self.write(Message::Event(Event {
                seq: 0,
                event: name.to_string(),
                body: Some(body),
            }))
        }

        fn write(mut self, message: Message) -> Self {
            DapCodec::new().write_message(&mut self.out, &message).unwrap();
            self
        }

        fn launched() -> Self {
            Script::default()
                .respond("initialize", json!({}))
                .respond("launch", json!({}))
                .event("initialized", json!({}))
                .respond("setFunctionBreakpoints", json!({ "breakpoints": [] }))
                .respond("configurationDone", json!({}))
                .event("stopped", json!({ "reason": "function breakpoint", "threadId": 7 }))
        }

        fn start(self) -> DapBackend<Cursor<Vec<u8>>, Vec<u8>> {
            let request = LaunchRequest {
                program: PathBuf::from("/tmp/dap-tui.bin"),
                args: vec!["-v".to_string()],
                cwd: None,
                entry_breakpoints: vec!["main.main".to_string()],
            };
            DapBackend::launch(Cursor::new(self.out), Vec::new(), &request, FetchLimits::default())
                .unwrap()
        }
    }

    fn var(name: &str, type_name: &str, value: &str, reference: i64) -> Value {
        json!({ "name": name, "type": type_name, "value": value, "variablesReference": reference })
    }

    fn written(backend: &DapBackend<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(backend.written()).into_owned()
    }

    #[test]
    fn launch_handshake() {
        let backend = Script::launched().start();
        assert!(!backend.exited());
        assert_eq!(backend.thread_id, 7);

        let sent = written(&backend);
        let order = ["initialize", "launch", "setFunctionBreakpoints", "configurationDone"]
            .map(|c| sent.find(&format!(r#""command":"{c}""#)).unwrap());
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(sent.contains(r#""mode":"exec""#));
        assert!(sent.contains(r#""name":"main.main""#));
    }

    #[test]
    fn launch_failure_is_reported() {
        let script = Script::default()
            .respond("initialize", json!({}))
            .fail("launch", "could not launch process");
        let request = LaunchRequest::default();
        let result = DapBackend::launch(
            Cursor::new(script.out),
            Vec::new(),
            &request,
            FetchLimits::default(),
        );
        assert!(matches!(result, Err(BackendError::Request { .. })));
    }

    #[test]
    fn location_from_top_frame() {
        let mut backend = Script::launched()
            .respond(
                "stackTrace",
                json!({ "stackFrames": [
                    { "id": 1000, "name": "main.main", "source": { "path": "/src/main.go" }, "line": 12 }
                ]}),
            )
            .start();
        let location = backend.location().unwrap().unwrap();
        assert_eq!(location.file, PathBuf::from("/src/main.go"));
        assert_eq!(location.line, 12);
    }

    #[test]
    fn autogenerated_frame_has_no_location() {
        let mut backend = Script::launched()
            .respond(
                "stackTrace",
                json!({ "stackFrames": [
                    { "id": 1, "name": "x", "source": { "path": "<autogenerated>" }, "line": 1 }
                ]}),
            )
            .start();
        assert_eq!(backend.location().unwrap(), None);
    }

    #[test]
    fn variables_fetched_recursively() {
        let mut backend = Script::launched()
            .respond(
                "stackTrace",
                json!({ "stackFrames": [{ "id": 1000, "line": 3, "source": { "path": "/src/main.go" } }] }),
            )
            .respond(
                "scopes",
                json!({ "scopes": [{ "name": "Locals", "variablesReference": 1 }] }),
            )
            .respond(
                "variables",
                json!({ "variables": [
                    var("m", "map[string]int", "map[string]int [\"a\": 1, ]", 2),
                    var("s", "string", "\"hi\"", 0),
                ]}),
            )
            .respond("variables", json!({ "variables": [var("\"a\"", "int", "1", 0)] }))
            .start();

        let vars = backend.variables().unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].kind, Kind::Map);
        assert_eq!(vars[0].children.len(), 2);
        assert_eq!(vars[0].children[0].kind, Kind::String);
        assert_eq!(vars[0].children[0].value, "a");
        assert_eq!(vars[0].children[1].value, "1");
        assert_eq!(vars[1].kind, Kind::String);
        assert_eq!(vars[1].value, "hi");

        let decoded = variables::decode(&vars);
        assert_eq!(decoded[0].value, "{\"a\": 1}");
    }

    #[test]
    fn step_until_exit() {
        let mut backend = Script::launched()
            .respond("next", json!({}))
            .event("stopped", json!({ "reason": "step", "threadId": 7 }))
            .respond("continue", json!({ "allThreadsContinued": true }))
            .event("exited", json!({ "exitCode": 0 }))
            .start();

        backend.step().unwrap();
        assert!(!backend.exited());
        backend.r#continue().unwrap();
        assert!(backend.exited());
        assert!(matches!(backend.step(), Err(BackendError::Exited)));
        assert_eq!(backend.location().unwrap(), None);
        assert!(backend.variables().unwrap().is_empty());
    }

    #[test]
    fn breakpoints_follow_adapter_response() {
        let mut backend = Script::launched()
            .respond(
                "setBreakpoints",
                json!({ "breakpoints": [{ "id": 3, "verified": true, "line": 20 }] }),
            )
            .respond("setBreakpoints", json!({ "breakpoints": [] }))
            .start();
        let file = Path::new("/src/main.go");

        backend.create_breakpoint(file, 20).unwrap();
        assert_eq!(
            backend.breakpoints().unwrap(),
            vec![Breakpoint {
                id: 3,
                file: file.to_path_buf(),
                line: 20
            }]
        );
        assert!(written(&backend).contains(r#""breakpoints":[{"line":20}]"#));

        backend.clear_breakpoint(3).unwrap();
        assert!(backend.breakpoints().unwrap().is_empty());
        assert!(written(&backend).contains(r#""breakpoints":[]"#));
    }

    #[test]
    fn rejected_breakpoint_is_not_listed() {
        let mut backend = Script::launched()
            .respond(
                "setBreakpoints",
                json!({ "breakpoints": [{ "verified": false, "message": "no code at line" }] }),
            )
            .start();
        backend.create_breakpoint(Path::new("/src/main.go"), 1).unwrap();
        assert!(backend.breakpoints().unwrap().is_empty());
        assert!(backend.lines.is_empty());
    }

    #[test]
    fn failed_breakpoint_request_restores_lines() {
        let mut backend = Script::launched()
            .fail("setBreakpoints", "not stopped")
            .start();
        let err = backend
            .create_breakpoint(Path::new("/src/main.go"), 4)
            .unwrap_err();
        assert_eq!(err.to_string(), "setBreakpoints failed: not stopped");
        assert!(backend.lines.is_empty());
    }

    #[test]
    fn unknown_breakpoint_id() {
        let mut backend = Script::launched().start();
        assert!(backend.clear_breakpoint(99).is_err());
    }

    fn dap_var(name: &str, type_name: &str, value: &str) -> Variable {
        Variable {
            name: name.to_string(),
            value: value.to_string(),
            type_name: type_name.to_string(),
            variables_reference: 0,
        }
    }

    #[test]
    fn converts_scalars() {
        let b = to_raw(dap_var("b", "bool", "true"), vec![]);
        assert_eq!((b.kind, b.value.as_str()), (Kind::Boolean, "true"));
        let f = to_raw(dap_var("f", "func()", "nil"), vec![]);
        assert_eq!((f.kind, f.value.as_str()), (Kind::Function, ""));
        let u = to_raw(dap_var("u", "int", "(unreadable could not read)"), vec![]);
        assert_eq!(u.kind, Kind::Unreadable);
        let named = to_raw(dap_var("n", "main.Name", "\"bob\""), vec![]);
        assert_eq!((named.kind, named.value.as_str()), (Kind::String, "bob"));
    }

    #[test]
    fn pointer_with_flattened_fields_gets_a_pointee() {
        let fields = vec![
            RawVariable::new("A", Kind::Integer, "int", "1"),
            RawVariable::new("B", Kind::Integer, "int", "2"),
        ];
        let p = to_raw(dap_var("p", "*main.T", "*main.T {A: 1, B: 2}"), fields);
        assert_eq!(p.kind, Kind::Pointer);
        assert_eq!(p.children.len(), 1);
        assert_eq!(p.children[0].kind, Kind::Record);
        assert_eq!(p.children[0].type_name, "main.T");
        assert_eq!(p.children[0].children.len(), 2);
    }

    #[test]
    fn pointer_to_single_field_struct_gets_a_pointee() {
        let fields = vec![RawVariable::new("A", Kind::Integer, "int", "1")];
        let p = to_raw(dap_var("p", "*main.One", "*main.One {A: 1}"), fields);
        assert_eq!(p.children.len(), 1);
        assert_eq!(p.children[0].kind, Kind::Record);
        assert_eq!(p.children[0].type_name, "main.One");
        assert_eq!(p.children[0].children[0].name, "A");
    }

    #[test]
    fn pointer_to_scalar_keeps_its_pointee() {
        let pointee = RawVariable::new("*p", Kind::Integer, "int", "5");
        let p = to_raw(dap_var("p", "*int", "*5"), vec![pointee.clone()]);
        assert_eq!(p.children, vec![pointee]);

        let pp = RawVariable::new("*q", Kind::Pointer, "*int", "*5");
        let q = to_raw(dap_var("q", "**int", "**5"), vec![pp.clone()]);
        assert_eq!(q.children, vec![pp]);

        let nil = to_raw(dap_var("n", "*main.T", "nil"), vec![]);
        assert!(nil.children.is_empty());
    }

    #[test]
    fn interface_unwraps_concrete_value() {
        let v = to_raw(dap_var("v", "interface {}", "interface {}(string) \"x\""), vec![]);
        assert_eq!(v.kind, Kind::Dynamic);
        assert_eq!(v.children[0].kind, Kind::String);
        assert_eq!(v.children[0].type_name, "string");
        assert_eq!(v.children[0].value, "x");

        let nil = to_raw(dap_var("e", "error", "nil"), vec![]);
        assert!(nil.children.is_empty());
    }

    #[test]
    fn composite_keyed_map_is_already_paired() {
        let children = vec![
            RawVariable::new("[key 0]", Kind::Record, "main.K", ""),
            RawVariable::new("[val 0]", Kind::Integer, "int", "1"),
        ];
        let m = to_raw(dap_var("m", "map[main.K]int", ""), children.clone());
        assert_eq!(m.children, children);
    }

    #[test]
    fn infers_kinds_from_type_names() {
        assert_eq!(infer_kind("[]int", "", true), Kind::Array);
        assert_eq!(infer_kind("chan int", "", true), Kind::Channel);
        assert_eq!(infer_kind("struct { a int }", "", true), Kind::Record);
        assert_eq!(infer_kind("main.T", "main.T {A: 1}", true), Kind::Record);
        assert_eq!(infer_kind("main.Ints", "main.Ints len: 2, cap: 2, [1,2]", true), Kind::Array);
        assert_eq!(infer_kind("time.Duration", "1s", false), Kind::Integer);
    }
}
