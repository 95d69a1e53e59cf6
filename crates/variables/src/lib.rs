//! Variable inspector model.
//!
//! The debugger hands over variables in the debugged runtime's native layout
//! ([`RawVariable`]). [`decode`] re-interprets that layout into
//! [`DisplayVariable`]s with fully rendered values, and [`VariableTree`]
//! flattens the result into the rows currently visible given the set of
//! expanded [`Path`]s.
mod decode;
mod expansion;
mod raw;
mod tree;

pub use decode::{DisplayVariable, NIL, UNREADABLE, decode, simple_type};
pub use expansion::{ExpansionSet, Path};
pub use raw::{Kind, RawVariable};
pub use tree::{VariableTree, flatten, is_visible};
