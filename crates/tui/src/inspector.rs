//! The variables pane.

use canvas::{Block, Color, Line};
use variables::VariableTree;

const MARGIN: usize = 2;

/// Scroll state of the variables pane. The tree itself owns the cursor.
#[derive(Debug, Default)]
pub struct Inspector {
    offset: usize,
}

impl Inspector {
    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Scroll so the tree's cursor stays [`MARGIN`] rows away from the window
    /// edges.
    pub fn follow(&mut self, tree: &VariableTree, height: usize) {
        let cursor = tree.cursor();
        let count = tree.visible_count();
        if cursor < self.offset + MARGIN {
            self.offset = cursor.saturating_sub(MARGIN);
        } else if cursor + MARGIN + 1 > self.offset + height {
            self.offset = (cursor + MARGIN + 1).saturating_sub(height);
        }
        self.offset = self.offset.min(count.saturating_sub(height));
    }

    pub fn render(&self, tree: &VariableTree, height: usize, focused: bool) -> Block {
        let rows: Vec<_> = tree
            .visible()
            .into_iter()
            .enumerate()
            .skip(self.offset)
            .take(height)
            .collect();

        let name_width = rows
            .iter()
            .map(|(_, v)| v.depth * 2 + v.name.chars().count())
            .max()
            .unwrap_or(0);
        let type_width = rows
            .iter()
            .map(|(_, v)| v.type_name.chars().count())
            .max()
            .unwrap_or(0);

        let mut block = Block::with_capacity(rows.len());
        for (ordinal, var) in rows {
            let selected = ordinal == tree.cursor();
            let text_color = if selected && focused { Color::White } else { Color::Reset };

            let mut line = Line::new();
            match (selected, focused) {
                (true, true) => line.push(Color::Green, "=> "),
                (true, false) => line.push(Color::Black, "=> "),
                (false, _) => line.push(Color::Reset, "   "),
            };
            let marker = match (var.has_children(), tree.expanded().contains(&var.path)) {
                (false, _) => "  ",
                (true, false) => "+ ",
                (true, true) => "- ",
            };
            line.push(Color::Black, marker);

            let indent = var.depth * 2;
            let name_pad = name_width - indent - var.name.chars().count() + 1;
            let type_pad = type_width - var.type_name.chars().count() + 1;
            line.push(text_color, format!("{:indent$}{}{:name_pad$}", "", var.name, ""));
            line.push(Color::Blue, var.type_name.as_str());
            line.push(text_color, format!("{:type_pad$}= {}", "", var.value));
            block.push(line);
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use variables::{Kind, RawVariable};

    fn text(line: &Line) -> String {
        line.spans().iter().map(|s| s.text.as_str()).collect()
    }

    fn snapshot() -> Vec<RawVariable> {
        vec![
            RawVariable::new("m", Kind::Map, "map[string]int", "").with_children(vec![
                RawVariable::new("", Kind::String, "string", "a"),
                RawVariable::new("", Kind::Integer, "int", "1"),
            ]),
            RawVariable::new("count", Kind::Integer, "int", "7"),
        ]
    }

    #[test]
    fn aligns_columns() {
        let mut tree = VariableTree::new();
        tree.load(&snapshot(), true);
        tree.expand();

        let block = Inspector::default().render(&tree, 10, true);
        let lines: Vec<String> = block.lines.iter().map(text).collect();
        assert_eq!(
            lines,
            vec![
                "=> - m     map[string]int = {\"a\": 1}",
                "       \"a\" int            = 1",
                "     count int            = 7",
            ]
        );
        assert_eq!(block.lines[0].spans()[0].color, Color::Green);
    }

    #[test]
    fn collapsed_marker_and_unfocused_cursor() {
        let mut tree = VariableTree::new();
        tree.load(&snapshot(), true);
        let block = Inspector::default().render(&tree, 10, false);
        assert_eq!(block.len(), 2);
        assert!(text(&block.lines[0]).starts_with("=> + m"));
        assert_eq!(block.lines[0].spans()[0].color, Color::Black);
    }

    #[test]
    fn follows_cursor() {
        let raw: Vec<_> = (0..30)
            .map(|i| RawVariable::new(format!("v{i}"), Kind::Integer, "int", "0"))
            .collect();
        let mut tree = VariableTree::new();
        tree.load(&raw, true);
        let mut inspector = Inspector::default();
        for _ in 0..7 {
            tree.move_down();
            inspector.follow(&tree, 10);
        }
        assert_eq!((tree.cursor(), inspector.offset()), (7, 0));
        tree.move_down();
        inspector.follow(&tree, 10);
        assert_eq!((tree.cursor(), inspector.offset()), (8, 1));

        let block = inspector.render(&tree, 10, true);
        assert!(text(&block.lines[0]).contains("v1 "));
        assert!(text(&block.lines[7]).starts_with("=> "));

        tree.select(0);
        inspector.follow(&tree, 10);
        assert_eq!(inspector.offset(), 0);
    }
}
