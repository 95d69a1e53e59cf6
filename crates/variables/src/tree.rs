//! Flattening and cursor navigation over decoded variables.

use crate::{DisplayVariable, ExpansionSet, RawVariable, decode};

/// A node is visible when every strict ancestor is expanded. Roots always are.
pub fn is_visible(node: &DisplayVariable, expanded: &ExpansionSet) -> bool {
    (1..node.path.len()).all(|len| expanded.contains(&node.path[..len]))
}

/// Pre-order list of the visible nodes, in original child order.
pub fn flatten<'a>(roots: &'a [DisplayVariable], expanded: &ExpansionSet) -> Vec<&'a DisplayVariable> {
    let mut out = Vec::new();
    flatten_into(roots, expanded, &mut out);
    out
}

fn flatten_into<'a>(
    nodes: &'a [DisplayVariable],
    expanded: &ExpansionSet,
    out: &mut Vec<&'a DisplayVariable>,
) {
    for node in nodes {
        out.push(node);
        if expanded.contains(&node.path) {
            flatten_into(&node.children, expanded, out);
        }
    }
}

fn count_visible(nodes: &[DisplayVariable], expanded: &ExpansionSet) -> usize {
    nodes
        .iter()
        .map(|node| {
            1 + if expanded.contains(&node.path) {
                count_visible(&node.children, expanded)
            } else {
                0
            }
        })
        .sum()
}

/// The variable inspector's model: decoded roots, expansion state and the
/// cursor ordinal into the flattened list.
///
/// `cursor < visible_count()` holds whenever the tree is non-empty; an empty
/// tree keeps the cursor at 0 and every navigation call is a no-op.
#[derive(Debug, Clone, Default)]
pub struct VariableTree {
    roots: Vec<DisplayVariable>,
    expanded: ExpansionSet,
    cursor: usize,
}

impl VariableTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with freshly fetched variables.
    ///
    /// Expanded paths that no longer name a node with children are dropped.
    /// The cursor moves to the top when `reset_cursor` is set and is clamped
    /// into the new visible range otherwise.
    pub fn load(&mut self, raw: &[RawVariable], reset_cursor: bool) {
        self.roots = decode(raw);
        let roots = &self.roots;
        self.expanded
            .retain(|path| find(roots, path).is_some_and(DisplayVariable::has_children));
        if reset_cursor {
            self.cursor = 0;
        } else {
            self.clamp_cursor();
        }
        tracing::debug!(
            roots = self.roots.len(),
            expanded = self.expanded.len(),
            cursor = self.cursor,
            "loaded variable snapshot"
        );
    }

    pub fn roots(&self) -> &[DisplayVariable] {
        &self.roots
    }

    pub fn expanded(&self) -> &ExpansionSet {
        &self.expanded
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn visible(&self) -> Vec<&DisplayVariable> {
        flatten(&self.roots, &self.expanded)
    }

    pub fn visible_count(&self) -> usize {
        count_visible(&self.roots, &self.expanded)
    }

    pub fn selected(&self) -> Option<&DisplayVariable> {
        self.visible().get(self.cursor).copied()
    }

    /// Place the cursor on `ordinal`, clamped to the last visible row.
    pub fn select(&mut self, ordinal: usize) {
        self.cursor = ordinal;
        self.clamp_cursor();
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.visible_count() {
            self.cursor += 1;
        }
    }

    /// Expand the node under the cursor. Returns `false` if it has no
    /// children or is already expanded.
    pub fn expand(&mut self) -> bool {
        let path = match self.visible().get(self.cursor) {
            Some(node) if node.has_children() => node.path.clone(),
            _ => return false,
        };
        self.expanded.insert(&path)
    }

    /// Collapse the node under the cursor, or else its nearest expanded
    /// ancestor.
    ///
    /// When an ancestor is collapsed the cursor lands on that ancestor. Its
    /// new ordinal is found with a linear scan of the re-flattened list, so a
    /// collapse costs O(visible rows).
    pub fn collapse(&mut self) -> bool {
        let path = match self.visible().get(self.cursor) {
            Some(node) => node.path.clone(),
            None => return false,
        };
        if self.expanded.remove(&path) {
            return true;
        }
        for len in (1..path.len()).rev() {
            let ancestor = &path[..len];
            if self.expanded.remove(ancestor) {
                self.cursor = self
                    .visible()
                    .iter()
                    .position(|node| node.path.as_slice() == ancestor)
                    .unwrap_or(0);
                self.clamp_cursor();
                return true;
            }
        }
        false
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.visible_count().saturating_sub(1));
    }
}

fn find<'a>(roots: &'a [DisplayVariable], path: &[String]) -> Option<&'a DisplayVariable> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.iter().find(|n| &n.name == first)?;
    for name in rest {
        node = node.children.iter().find(|n| &n.name == name)?;
    }
    Some(node)
}
