use serde::{Deserialize, Serialize};

/// Category of a runtime value, as reported by the debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Boolean,
    Integer,
    Float,
    String,
    Array,
    Record,
    Map,
    Pointer,
    /// An interface value; the single child is the concrete value behind it.
    Dynamic,
    Channel,
    Function,
    Unreadable,
}

impl Kind {
    /// Whether values of this kind carry their payload in `children`.
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            Kind::Array
                | Kind::Record
                | Kind::Map
                | Kind::Pointer
                | Kind::Dynamic
                | Kind::Channel
        )
    }
}

/// A variable exactly as the debugged runtime lays it out.
///
/// Maps store their entries as interleaved `key, value, key, value` children;
/// channels expose their ring buffer and receive index as named children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVariable {
    pub name: String,
    pub kind: Kind,
    #[serde(default, rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawVariable>,
}

impl RawVariable {
    pub fn new(
        name: impl Into<String>,
        kind: Kind,
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            type_name: type_name.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<RawVariable>) -> Self {
        self.children = children;
        self
    }

    pub(crate) fn child_named(&self, name: &str, fallback: usize) -> Option<&RawVariable> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.children.get(fallback))
    }
}
