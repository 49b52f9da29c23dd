//! Vocabulary of meaningful words carried by one statement.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::syntax::{NodeKind, SourceNode};
use crate::words::{split_identifier, tokenize};

/// Identifiers too generic to count as overlap.
static BORING_IDENTIFIERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "err", "nil", "true", "false", "int", "string", "bool", "error", "ctx", "ok", "i", "j",
        "k",
    ]
    .into_iter()
    .collect()
});

const MIN_IDENT_WORD_LEN: usize = 3;
const MIN_LITERAL_WORD_LEN: usize = 4;

/// Words a statement "says"; comment words found here count as restating it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: HashSet<String>,
}

impl Vocabulary {
    /// Build the vocabulary of `node` and everything beneath it.
    pub fn of(node: &SourceNode) -> Self {
        let mut vocab = Vocabulary::default();
        for term in implied_terms(&node.kind) {
            vocab.words.insert((*term).to_string());
        }
        node.walk(&mut |n| match &n.kind {
            NodeKind::Ident(name) => vocab.add_identifier(name),
            NodeKind::StrLit(content) => vocab.add_literal(content),
            NodeKind::Function
            | NodeKind::Assignment
            | NodeKind::Conditional
            | NodeKind::Return
            | NodeKind::ExprStmt
            | NodeKind::Other => {}
        });
        vocab
    }

    fn add_identifier(&mut self, name: &str) {
        let lower = name.to_lowercase();
        if lower.chars().count() < MIN_IDENT_WORD_LEN
            || BORING_IDENTIFIERS.contains(lower.as_str())
        {
            return;
        }
        self.words.insert(lower);
        for part in split_identifier(name) {
            let part = part.to_lowercase();
            if part.chars().count() >= MIN_IDENT_WORD_LEN {
                self.words.insert(part);
            }
        }
    }

    fn add_literal(&mut self, content: &str) {
        for word in tokenize(content) {
            if word.chars().count() >= MIN_LITERAL_WORD_LEN {
                self.words.insert(word);
            }
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

fn implied_terms(kind: &NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::Conditional => &["error", "check"],
        NodeKind::Return => &["return"],
        NodeKind::Function
        | NodeKind::Assignment
        | NodeKind::ExprStmt
        | NodeKind::Ident(_)
        | NodeKind::StrLit(_)
        | NodeKind::Other => &[],
    }
}
