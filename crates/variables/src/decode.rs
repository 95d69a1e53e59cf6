//! Conversion from the runtime layout into display form.
//!
//! Decoding is a pure function of its input: every call builds its own
//! output and rendering buffers, so concurrent callers never share state.

use crate::{Kind, RawVariable};

/// Rendered value of absent pointers, interfaces, functions and channels.
pub const NIL: &str = "<nil>";
/// Rendered value of a variable the debugger could not read.
pub const UNREADABLE: &str = "???";

const CHANNEL_BUF_INDEX: usize = 2;
const CHANNEL_RECVX_INDEX: usize = 7;

/// A decoded variable, ready to be flattened into panel rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayVariable {
    pub name: String,
    pub type_name: String,
    pub value: String,
    pub kind: Kind,
    /// Names from the root down to and including this node. Stable across
    /// reloads as long as the variable keeps its place in the tree.
    pub path: Vec<String>,
    pub depth: usize,
    pub children: Vec<DisplayVariable>,
}

impl DisplayVariable {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Decode a list of top-level variables.
pub fn decode(raw: &[RawVariable]) -> Vec<DisplayVariable> {
    decode_level(raw, &[], 0)
}

fn decode_level(raw: &[RawVariable], parent: &[String], depth: usize) -> Vec<DisplayVariable> {
    raw.iter()
        .map(|v| decode_one(v, v.name.clone(), parent, depth))
        .collect()
}

/// Children renamed to their position, as arrays and channel buffers show them.
fn decode_indexed(raw: &[RawVariable], parent: &[String], depth: usize) -> Vec<DisplayVariable> {
    raw.iter()
        .enumerate()
        .map(|(i, v)| decode_one(v, i.to_string(), parent, depth))
        .collect()
}

fn decode_one(raw: &RawVariable, name: String, parent: &[String], depth: usize) -> DisplayVariable {
    let mut path = Vec::with_capacity(parent.len() + 1);
    path.extend_from_slice(parent);
    path.push(name.clone());

    let mut out = DisplayVariable {
        name,
        type_name: simple_type(&raw.type_name),
        value: raw.value.clone(),
        kind: raw.kind,
        path,
        depth,
        children: Vec::new(),
    };

    match raw.kind {
        Kind::Boolean | Kind::Integer | Kind::Float | Kind::Function => {
            if let Some(zero) = zero_literal(raw.kind).filter(|_| out.value.is_empty()) {
                out.value = zero.to_owned();
            }
        }
        Kind::String => out.value = quote(&raw.value),
        Kind::Unreadable => out.value = UNREADABLE.to_owned(),
        Kind::Array => {
            out.children = decode_indexed(&raw.children, &out.path, depth + 1);
            out.value = render_list(&out.children);
        }
        Kind::Record => {
            out.children = decode_level(&raw.children, &out.path, depth + 1);
            out.value = render_fields(&out.children);
        }
        Kind::Map => {
            out.children = decode_map_entries(&raw.children, &out.path, depth + 1);
            out.value = render_fields(&out.children);
        }
        Kind::Pointer => {
            if is_null_pointer(raw) {
                out.value = NIL.to_owned();
            } else {
                out.children = raw
                    .children
                    .iter()
                    .map(|pointee| {
                        let name = if pointee.name.is_empty() {
                            "*".to_owned()
                        } else {
                            pointee.name.clone()
                        };
                        decode_one(pointee, name, &out.path, depth + 1)
                    })
                    .collect();
                out.value = out.children[0].value.clone();
            }
        }
        Kind::Dynamic => match raw.children.first() {
            Some(inner) if inner.type_name != "void" => {
                // The wrapper disappears: the concrete value takes its place
                // under the wrapper's name and path.
                let parent = &out.path[..out.path.len() - 1];
                return decode_one(inner, out.name.clone(), parent, depth);
            }
            _ => out.value = NIL.to_owned(),
        },
        Kind::Channel => {
            if raw.children.is_empty() {
                out.value = NIL.to_owned();
            } else if let Some(elements) = channel_elements(raw) {
                out.children = decode_indexed(&elements, &out.path, depth + 1);
                out.value = render_list(&out.children);
            }
        }
    }
    out
}

/// Map entries arrive as `key, value` pairs. Each value is named after the
/// rendered key; a dangling key without a value is dropped.
fn decode_map_entries(raw: &[RawVariable], parent: &[String], depth: usize) -> Vec<DisplayVariable> {
    raw.chunks_exact(2)
        .map(|pair| {
            let key = render_scalar(&pair[0]);
            decode_one(&pair[1], key, parent, depth)
        })
        .collect()
}

/// Buffered channel elements in receive order.
fn channel_elements(raw: &RawVariable) -> Option<Vec<RawVariable>> {
    let buf = raw.child_named("buf", CHANNEL_BUF_INDEX)?;
    let recvx = raw.child_named("recvx", CHANNEL_RECVX_INDEX)?;
    let array = match buf.kind {
        Kind::Pointer => buf.children.first()?,
        _ => buf,
    };
    let len = array.children.len();
    if len == 0 {
        return Some(Vec::new());
    }
    let start = recvx.value.trim().parse::<usize>().unwrap_or_else(|_| {
        tracing::debug!(value = %recvx.value, "unparseable channel receive index");
        0
    });
    Some(
        (0..len)
            .map(|i| array.children[(start + i) % len].clone())
            .collect(),
    )
}

fn is_null_pointer(raw: &RawVariable) -> bool {
    raw.children.is_empty() || matches!(raw.value.trim(), "0x0" | "0" | "nil" | NIL)
}

/// A map key as it appears in the rendered map, without decoding its children.
fn render_scalar(raw: &RawVariable) -> String {
    match raw.kind {
        Kind::String => quote(&raw.value),
        Kind::Unreadable => UNREADABLE.to_owned(),
        _ if raw.value.is_empty() => match zero_literal(raw.kind) {
            Some(zero) => zero.to_owned(),
            None if raw.kind.is_composite() => decode_one(raw, String::new(), &[], 0).value,
            None => String::new(),
        },
        _ => raw.value.clone(),
    }
}

/// What an empty scalar value stands for.
fn zero_literal(kind: Kind) -> Option<&'static str> {
    match kind {
        Kind::Boolean => Some("false"),
        Kind::Integer | Kind::Float => Some("0"),
        Kind::Function => Some(NIL),
        _ => None,
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    out.push_str(s);
    out.push('"');
    out
}

fn render_list(children: &[DisplayVariable]) -> String {
    let mut out = String::from("[");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&child.value);
    }
    out.push(']');
    out
}

fn render_fields(children: &[DisplayVariable]) -> String {
    let mut out = String::from("{");
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&child.name);
        out.push_str(": ");
        out.push_str(&child.value);
    }
    out.push('}');
    out
}

/// Shorten verbose type spellings for the type column.
pub fn simple_type(t: &str) -> String {
    if t.ends_with("interface {}") {
        return t.replacen("interface {}", "any", 1);
    }
    if t.starts_with("struct {") {
        return "struct".to_owned();
    }
    if t.starts_with("func(") {
        return "func".to_owned();
    }
    t.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(name: &str, value: &str) -> RawVariable {
        RawVariable::new(name, Kind::Integer, "int", value)
    }

    fn string(name: &str, value: &str) -> RawVariable {
        RawVariable::new(name, Kind::String, "string", value)
    }

    fn names(vars: &[DisplayVariable]) -> Vec<&str> {
        vars.iter().map(|v| v.name.as_str()).collect()
    }

    fn values(vars: &[DisplayVariable]) -> Vec<&str> {
        vars.iter().map(|v| v.value.as_str()).collect()
    }

    fn channel(values: &[&str], recvx: &str) -> RawVariable {
        let array = RawVariable::new("", Kind::Array, "[4]int", "")
            .with_children(values.iter().map(|v| int("", v)).collect());
        let buf = RawVariable::new("buf", Kind::Pointer, "*[4]int", "0xc000010000")
            .with_children(vec![array]);
        RawVariable::new("ch", Kind::Channel, "chan int", "").with_children(vec![
            int("qcount", "4"),
            int("dataqsiz", "4"),
            buf,
            int("elemsize", "8"),
            int("closed", "0"),
            RawVariable::new("elemtype", Kind::Pointer, "*runtime._type", "0x0"),
            int("sendx", "3"),
            int("recvx", recvx),
        ])
    }

    #[test]
    fn scalar_defaults() {
        let out = decode(&[
            RawVariable::new("b", Kind::Boolean, "bool", ""),
            int("i", ""),
            RawVariable::new("f", Kind::Float, "float64", ""),
            RawVariable::new("fun", Kind::Function, "func()", ""),
            RawVariable::new("u", Kind::Unreadable, "int", "(unreadable read out of bounds)"),
            string("s", "hi"),
        ]);
        assert_eq!(values(&out), vec!["false", "0", "0", NIL, UNREADABLE, "\"hi\""]);
        assert_eq!(out[3].type_name, "func");
    }

    #[test]
    fn array_children_renamed_to_indices() {
        let raw = RawVariable::new("xs", Kind::Array, "[]int", "")
            .with_children(vec![int("a", "1"), int("b", "2"), int("c", "3")]);
        let out = decode(&[raw]);
        assert_eq!(out[0].value, "[1,2,3]");
        assert_eq!(names(&out[0].children), vec!["0", "1", "2"]);
        assert_eq!(out[0].children[2].path, vec!["xs", "2"]);
        assert_eq!(out[0].children[2].depth, 1);
    }

    #[test]
    fn empty_array_renders_brackets() {
        let out = decode(&[RawVariable::new("xs", Kind::Array, "[]int", "")]);
        assert_eq!(out[0].value, "[]");
        assert!(!out[0].has_children());
    }

    #[test]
    fn record_renders_fields() {
        let raw = RawVariable::new("p", Kind::Record, "struct { X int; Y string }", "")
            .with_children(vec![int("X", "1"), string("Y", "a")]);
        let out = decode(&[raw]);
        assert_eq!(out[0].value, "{X: 1, Y: \"a\"}");
        assert_eq!(out[0].type_name, "struct");
    }

    #[test]
    fn map_values_named_after_keys() {
        let raw = RawVariable::new("m", Kind::Map, "map[string]int", "").with_children(vec![
            string("", "a"),
            int("", "1"),
            string("", "b"),
            int("", "2"),
        ]);
        let out = decode(&[raw]);
        assert_eq!(names(&out[0].children), vec!["\"a\"", "\"b\""]);
        assert_eq!(values(&out[0].children), vec!["1", "2"]);
        assert_eq!(out[0].value, "{\"a\": 1, \"b\": 2}");
        assert_eq!(out[0].children[1].path, vec!["m", "\"b\""]);
    }

    #[test]
    fn empty_scalar_keys_use_zero_literals() {
        let raw = RawVariable::new("m", Kind::Map, "map[bool]int", "").with_children(vec![
            RawVariable::new("", Kind::Boolean, "bool", ""),
            int("", ""),
            RawVariable::new("", Kind::Integer, "int", ""),
            int("", "3"),
        ]);
        let out = decode(&[raw]);
        assert_eq!(names(&out[0].children), vec!["false", "0"]);
        assert_eq!(out[0].value, "{false: 0, 0: 3}");
        assert_eq!(out[0].children[1].path, vec!["m", "0"]);
    }

    #[test]
    fn map_with_dangling_key_drops_it() {
        let raw = RawVariable::new("m", Kind::Map, "map[int]int", "").with_children(vec![
            int("", "7"),
            int("", "8"),
            int("", "9"),
        ]);
        let out = decode(&[raw]);
        assert_eq!(names(&out[0].children), vec!["7"]);
        assert_eq!(out[0].value, "{7: 8}");
    }

    #[test]
    fn nil_pointer() {
        let out = decode(&[
            RawVariable::new("p", Kind::Pointer, "*int", "0x0"),
            RawVariable::new("q", Kind::Pointer, "*int", "0x0").with_children(vec![int("", "")]),
        ]);
        assert_eq!(values(&out), vec![NIL, NIL]);
        assert!(!out[1].has_children());
    }

    #[test]
    fn pointer_adopts_pointee_value() {
        let raw = RawVariable::new("p", Kind::Pointer, "*int", "0xc000012345")
            .with_children(vec![int("", "42")]);
        let out = decode(&[raw]);
        assert_eq!(out[0].value, "42");
        assert_eq!(out[0].type_name, "*int");
        assert_eq!(out[0].children[0].name, "*");
        assert_eq!(out[0].children[0].path, vec!["p", "*"]);
    }

    #[test]
    fn dynamic_adopts_concrete_value() {
        let raw = RawVariable::new("e", Kind::Dynamic, "interface {}", "")
            .with_children(vec![string("data", "boom")]);
        let out = decode(&[raw]);
        assert_eq!(out[0].name, "e");
        assert_eq!(out[0].kind, Kind::String);
        assert_eq!(out[0].type_name, "string");
        assert_eq!(out[0].value, "\"boom\"");
        assert_eq!(out[0].path, vec!["e"]);
    }

    #[test]
    fn dynamic_keeps_concrete_children() {
        let inner = RawVariable::new("data", Kind::Record, "main.T", "")
            .with_children(vec![int("A", "1")]);
        let raw = RawVariable::new("v", Kind::Dynamic, "error", "").with_children(vec![inner]);
        let out = decode(&[raw]);
        assert_eq!(out[0].kind, Kind::Record);
        assert_eq!(out[0].value, "{A: 1}");
        assert_eq!(out[0].children[0].path, vec!["v", "A"]);
        assert_eq!(out[0].children[0].depth, 1);
    }

    #[test]
    fn nil_dynamic() {
        let void = RawVariable::new("", Kind::Dynamic, "void", "");
        let out = decode(&[
            RawVariable::new("a", Kind::Dynamic, "interface {}", ""),
            RawVariable::new("b", Kind::Dynamic, "interface {}", "").with_children(vec![void]),
        ]);
        assert_eq!(values(&out), vec![NIL, NIL]);
        assert_eq!(out[0].type_name, "any");
    }

    #[test]
    fn channel_rotates_from_receive_index() {
        let out = decode(&[channel(&["10", "20", "30", "40"], "3")]);
        let ch = &out[0];
        assert_eq!(ch.kind, Kind::Channel);
        assert_eq!(ch.type_name, "chan int");
        assert_eq!(values(&ch.children), vec!["40", "10", "20", "30"]);
        assert_eq!(names(&ch.children), vec!["0", "1", "2", "3"]);
        assert_eq!(ch.value, "[40,10,20,30]");
    }

    #[test]
    fn channel_receive_index_wraps() {
        let out = decode(&[channel(&["1", "2"], "5")]);
        assert_eq!(values(&out[0].children), vec!["2", "1"]);
    }

    #[test]
    fn nil_channel() {
        let out = decode(&[RawVariable::new("ch", Kind::Channel, "chan int", "")]);
        assert_eq!(out[0].value, NIL);
    }

    #[test]
    fn simplifies_types() {
        assert_eq!(simple_type("interface {}"), "any");
        assert_eq!(simple_type("[]interface {}"), "[]any");
        assert_eq!(simple_type("struct { a int }"), "struct");
        assert_eq!(simple_type("func(int) string"), "func");
        assert_eq!(simple_type("main.T"), "main.T");
    }

    #[test]
    fn decoding_is_repeatable() {
        let raw = vec![channel(&["1", "2", "3"], "1")];
        assert_eq!(decode(&raw), decode(&raw));
    }
}
