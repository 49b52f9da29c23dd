//! Parrot detection: does a comment merely restate the statement it sits on?

use std::collections::HashSet;

use log::{debug, trace};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::anchor::LineAnchorIndex;
use crate::syntax::{AnchorKind, CommentRecord, CommentSyntax, ParsedFile};
use crate::vocab::Vocabulary;
use crate::words::tokenize;
use crate::{Diagnostic, Location};

/// Share of meaningful comment words that must appear in the code.
pub const OVERLAP_THRESHOLD: f32 = 0.4;

pub const PARROT_MESSAGE: &str = "comment parrots the code: consider removing or adding insight";

static FILLER_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "is", "are", "if", "then", "else", "when", "will", "to", "for", "of",
        "in", "on", "and", "or", "not", "this", "that", "it", "we", "be", "as", "with", "from",
        "by", "at", "do", "does", "has", "have", "here", "there", "was", "handles", "handle",
        "processing", "process",
    ]
    .into_iter()
    .collect()
});

pub fn is_filler(word: &str) -> bool {
    FILLER_WORDS.contains(word)
}

/// Word counts behind a parrot decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    pub meaningful: usize,
    pub matched: Vec<String>,
}

impl Overlap {
    pub fn ratio(&self) -> f32 {
        if self.meaningful == 0 {
            return 0.0;
        }
        self.matched.len() as f32 / self.meaningful as f32
    }

    pub fn is_parrot(&self) -> bool {
        self.meaningful > 0 && self.ratio() >= OVERLAP_THRESHOLD
    }
}

/// Why a comment was flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub anchor_line: usize,
    pub anchor_kind: AnchorKind,
    pub meaningful_words: usize,
    pub matched_words: Vec<String>,
    pub ratio: f32,
}

/// Comment body without its markers or a trailing nested comment.
pub fn comment_body<'a>(raw: &'a str, syntax: &CommentSyntax) -> &'a str {
    let mut text = raw.strip_prefix(syntax.line).unwrap_or(raw);
    if let Some((open, close)) = syntax.block {
        text = text.strip_prefix(open).unwrap_or(text);
        text = text.strip_suffix(close).unwrap_or(text);
    }
    let mut text = text.trim();
    if let Some(idx) = text.find(syntax.line) {
        if idx > 0 {
            text = text[..idx].trim();
        }
    }
    text
}

/// Measure how much of `comment` is already said by `vocab`.
///
/// Returns `None` when the comment is too short to judge.
pub fn overlap(comment: &str, syntax: &CommentSyntax, vocab: &Vocabulary) -> Option<Overlap> {
    let body = comment_body(comment, syntax);
    if body.is_empty() {
        return None;
    }
    let words = tokenize(body);
    if words.len() < 2 {
        return None;
    }
    let mut meaningful = 0;
    let mut matched = Vec::new();
    for word in words {
        if is_filler(&word) {
            continue;
        }
        meaningful += 1;
        if vocab.contains(&word) {
            matched.push(word);
        }
    }
    if meaningful == 0 {
        return None;
    }
    Some(Overlap {
        meaningful,
        matched,
    })
}

pub fn is_parrot_comment(comment: &str, syntax: &CommentSyntax, vocab: &Vocabulary) -> bool {
    overlap(comment, syntax, vocab).is_some_and(|o| o.is_parrot())
}

/// Run parrot detection over one parsed file.
pub fn check(file: &ParsedFile) -> Vec<Diagnostic> {
    let index = LineAnchorIndex::build(&file.root);
    let mut diagnostics = Vec::new();
    for group in &file.comments {
        for comment in &group.comments {
            if let Some(diag) = check_comment(comment, &index, &file.syntax) {
                diagnostics.push(diag);
            }
        }
    }
    debug!(
        "checked {} comments against {} anchored lines, {} flagged",
        file.comment_count(),
        index.len(),
        diagnostics.len()
    );
    diagnostics
}

fn check_comment(
    comment: &CommentRecord,
    index: &LineAnchorIndex<'_>,
    syntax: &CommentSyntax,
) -> Option<Diagnostic> {
    // Comments usually precede their code; trailing comments share its line.
    for line in [comment.line + 1, comment.line] {
        let Some(anchor) = index.get(line) else {
            continue;
        };
        let Some(anchor_kind) = anchor.kind.anchor() else {
            continue;
        };
        let vocab = Vocabulary::of(anchor);
        if vocab.is_empty() {
            continue;
        }
        let Some(found) = overlap(&comment.text, syntax, &vocab) else {
            continue;
        };
        if !found.is_parrot() {
            trace!(
                "line {}: {:.2} overlap with {} on line {}",
                comment.line,
                found.ratio(),
                anchor_kind,
                line
            );
            continue;
        }
        debug!(
            "line {}: parrots {} on line {} ({:?})",
            comment.line, anchor_kind, line, found.matched
        );
        return Some(Diagnostic {
            message: PARROT_MESSAGE.to_string(),
            location: Location {
                line: comment.line,
                column: comment.column,
            },
            span: (comment.offset, comment.end),
            snippet: comment.text.trim().to_string(),
            evidence: Evidence {
                anchor_line: line,
                anchor_kind,
                meaningful_words: found.meaningful,
                ratio: found.ratio(),
                matched_words: found.matched,
            },
        });
    }
    None
}
