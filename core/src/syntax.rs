//! Language-neutral syntax model handed to the detector by a frontend.
//!
//! A frontend lowers one source file into a [`ParsedFile`]: a tree of
//! [`SourceNode`]s that keeps only what comment analysis needs (statement
//! kinds, identifiers, string literals, start lines) and the file's comments
//! grouped the way they appear in the source.

use serde::{Deserialize, Serialize};

/// Closed set of node shapes the detector understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Function,
    Assignment,
    Conditional,
    Return,
    ExprStmt,
    /// Identifier leaf with its name as written.
    Ident(String),
    /// String literal leaf with its textual content.
    StrLit(String),
    /// Structural node that only carries children.
    Other,
}

/// Statement kind a comment can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorKind {
    Function,
    Assignment,
    Conditional,
    Return,
    ExprStmt,
}

impl std::fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnchorKind::Function => "function",
            AnchorKind::Assignment => "assignment",
            AnchorKind::Conditional => "conditional",
            AnchorKind::Return => "return",
            AnchorKind::ExprStmt => "expression-statement",
        };
        f.write_str(name)
    }
}

impl NodeKind {
    /// The anchor kind for tracked statement kinds, `None` for leaves and
    /// structural nodes.
    pub fn anchor(&self) -> Option<AnchorKind> {
        match self {
            NodeKind::Function => Some(AnchorKind::Function),
            NodeKind::Assignment => Some(AnchorKind::Assignment),
            NodeKind::Conditional => Some(AnchorKind::Conditional),
            NodeKind::Return => Some(AnchorKind::Return),
            NodeKind::ExprStmt => Some(AnchorKind::ExprStmt),
            NodeKind::Ident(_) | NodeKind::StrLit(_) | NodeKind::Other => None,
        }
    }
}

/// One node of a lowered syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    pub kind: NodeKind,
    /// 1-based line on which the node starts.
    pub line: usize,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(kind: NodeKind, line: usize) -> Self {
        Self {
            kind,
            line,
            children: Vec::new(),
        }
    }

    pub fn ident(name: impl Into<String>, line: usize) -> Self {
        Self::new(NodeKind::Ident(name.into()), line)
    }

    pub fn string(content: impl Into<String>, line: usize) -> Self {
        Self::new(NodeKind::StrLit(content.into()), line)
    }

    pub fn with_children(mut self, children: Vec<SourceNode>) -> Self {
        self.children = children;
        self
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SourceNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Comment markers of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static str,
    pub block: Option<(&'static str, &'static str)>,
}

impl CommentSyntax {
    pub const C_LIKE: CommentSyntax = CommentSyntax {
        line: "//",
        block: Some(("/*", "*/")),
    };

    pub const HASH: CommentSyntax = CommentSyntax {
        line: "#",
        block: None,
    };
}

/// One comment as it appears in the source, markers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub text: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column in characters.
    pub column: usize,
    /// Byte range of the comment in the source.
    pub offset: usize,
    pub end: usize,
}

/// Run of comments with nothing but whitespace (and no blank line) between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: Vec<CommentRecord>,
}

/// Everything the detector needs from one source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub root: SourceNode,
    pub comments: Vec<CommentGroup>,
    pub syntax: CommentSyntax,
}

impl ParsedFile {
    pub fn comment_count(&self) -> usize {
        self.comments.iter().map(|group| group.comments.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_is_pre_order() {
        let tree = SourceNode::new(NodeKind::Function, 1).with_children(vec![
            SourceNode::ident("outer", 1),
            SourceNode::new(NodeKind::Return, 2).with_children(vec![SourceNode::ident("inner", 2)]),
        ]);
        let mut seen = Vec::new();
        tree.walk(&mut |node| seen.push(node.kind.clone()));
        assert_eq!(
            seen,
            vec![
                NodeKind::Function,
                NodeKind::Ident("outer".into()),
                NodeKind::Return,
                NodeKind::Ident("inner".into()),
            ]
        );
    }

    #[test]
    fn only_statement_kinds_anchor() {
        assert_eq!(NodeKind::Conditional.anchor(), Some(AnchorKind::Conditional));
        assert_eq!(NodeKind::Ident("x".into()).anchor(), None);
        assert_eq!(NodeKind::Other.anchor(), None);
    }
}
