use std::collections::HashSet;

/// Sequence of names from a root variable down to a node.
pub type Path = Vec<String>;

/// The set of expanded node paths.
///
/// Paths, not row positions, identify nodes so expansion state survives
/// re-decoding after every debugger stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionSet {
    paths: HashSet<Path>,
}

impl ExpansionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &[String]) -> bool {
        self.paths.contains(path)
    }

    /// Returns `true` if the path was not already expanded.
    pub fn insert(&mut self, path: &[String]) -> bool {
        if self.paths.contains(path) {
            return false;
        }
        self.paths.insert(path.to_vec())
    }

    /// Returns `true` if the path was expanded.
    pub fn remove(&mut self, path: &[String]) -> bool {
        self.paths.remove(path)
    }

    pub fn retain(&mut self, f: impl FnMut(&Path) -> bool) {
        self.paths.retain(f);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Path {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn insert_and_remove() {
        let mut set = ExpansionSet::new();
        assert!(set.insert(&path(&["a", "b"])));
        assert!(!set.insert(&path(&["a", "b"])));
        assert!(set.contains(&path(&["a", "b"])));
        assert!(!set.contains(&path(&["a"])));
        assert!(set.remove(&path(&["a", "b"])));
        assert!(!set.remove(&path(&["a", "b"])));
        assert!(set.is_empty());
    }
}
