//! Line → statement index used to pair comments with the code they sit on.

use std::collections::HashMap;

use crate::syntax::SourceNode;

/// Maps a 1-based line to the tracked statement that starts on it.
///
/// When several tracked statements start on one line, the one visited last
/// in pre-order wins, which is usually the innermost.
#[derive(Debug, Default)]
pub struct LineAnchorIndex<'a> {
    lines: HashMap<usize, &'a SourceNode>,
}

impl<'a> LineAnchorIndex<'a> {
    pub fn build(root: &'a SourceNode) -> Self {
        let mut lines = HashMap::new();
        root.walk(&mut |node| {
            if node.kind.anchor().is_some() {
                lines.insert(node.line, node);
            }
        });
        Self { lines }
    }

    pub fn get(&self, line: usize) -> Option<&'a SourceNode> {
        self.lines.get(&line).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::NodeKind;

    fn sample() -> SourceNode {
        SourceNode::new(NodeKind::Other, 1).with_children(vec![
            SourceNode::new(NodeKind::Function, 1).with_children(vec![
                SourceNode::ident("main", 1),
                SourceNode::new(NodeKind::Assignment, 3)
                    .with_children(vec![SourceNode::ident("value", 3)]),
                SourceNode::new(NodeKind::ExprStmt, 5).with_children(vec![
                    SourceNode::new(NodeKind::Conditional, 5),
                ]),
                SourceNode::new(NodeKind::Return, 8),
            ]),
        ])
    }

    #[test]
    fn records_every_tracked_start_line() {
        let tree = sample();
        let index = LineAnchorIndex::build(&tree);
        let mut tracked = Vec::new();
        tree.walk(&mut |node| {
            if node.kind.anchor().is_some() {
                tracked.push(node.line);
            }
        });
        for line in tracked {
            assert!(index.get(line).is_some(), "line {line} missing");
        }
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn later_node_on_same_line_wins() {
        let tree = sample();
        let index = LineAnchorIndex::build(&tree);
        assert_eq!(index.get(5).map(|n| &n.kind), Some(&NodeKind::Conditional));
    }

    #[test]
    fn leaves_and_structural_nodes_are_not_anchors() {
        let tree = SourceNode::new(NodeKind::Other, 2)
            .with_children(vec![SourceNode::ident("x", 2), SourceNode::string("hello", 4)]);
        let index = LineAnchorIndex::build(&tree);
        assert!(index.is_empty());
        assert!(index.get(4).is_none());
    }
}
