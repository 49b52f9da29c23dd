//! Frontends lower real source text into a [`ParsedFile`].

mod rust;
mod treesitter;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::syntax::{CommentGroup, CommentRecord, CommentSyntax, ParsedFile};
use crate::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    Rust,
    Go,
    JavaScript,
    TypeScript,
    Python,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Rust,
        Language::Go,
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
    ];

    pub fn comment_syntax(self) -> CommentSyntax {
        match self {
            Language::Rust | Language::Go | Language::JavaScript | Language::TypeScript => {
                CommentSyntax::C_LIKE
            }
            Language::Python => CommentSyntax::HASH,
        }
    }

    pub fn from_name(name: &str) -> Option<Language> {
        match name.trim().to_lowercase().as_str() {
            "rust" | "rs" => Some(Language::Rust),
            "go" | "golang" => Some(Language::Go),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "python" | "py" => Some(Language::Python),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Language::Rust => "rust",
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
        };
        f.write_str(name)
    }
}

pub fn language_for_path(path: &Path) -> Option<Language> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("rs") => Some(Language::Rust),
        Some("go") => Some(Language::Go),
        Some("js" | "jsx" | "mjs" | "cjs") => Some(Language::JavaScript),
        Some("ts" | "tsx") => Some(Language::TypeScript),
        Some("py") => Some(Language::Python),
        _ => None,
    }
}

/// Lower `text` written in `language`.
pub fn parse(language: Language, text: &str) -> Result<ParsedFile, ParseError> {
    match language {
        Language::Rust => rust::parse(text),
        Language::Go | Language::JavaScript | Language::TypeScript | Language::Python => {
            treesitter::parse(language, text)
        }
    }
}

/// Byte offset → 1-based line/column lookups for one source text.
pub(crate) struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self { text, starts }
    }

    pub(crate) fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.text.len());
        let line_idx = match self.starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.starts[line_idx];
        let column = self
            .text
            .get(line_start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(0)
            + 1;
        Location {
            line: line_idx + 1,
            column,
        }
    }

    pub(crate) fn record(&self, start: usize, end: usize) -> CommentRecord {
        let location = self.location(start);
        CommentRecord {
            text: self.text.get(start..end).unwrap_or("").to_string(),
            line: location.line,
            column: location.column,
            offset: start,
            end,
        }
    }
}

/// Group comments that follow each other with at most one line break and
/// nothing but whitespace in between. `comments` must be in source order.
pub(crate) fn group_comments(text: &str, comments: Vec<CommentRecord>) -> Vec<CommentGroup> {
    let mut groups: Vec<CommentGroup> = Vec::new();
    let mut prev_end: Option<usize> = None;
    for comment in comments {
        let joins = prev_end.is_some_and(|end| {
            let gap = text.get(end..comment.offset).unwrap_or("\n\n");
            gap.chars().all(char::is_whitespace) && gap.matches('\n').count() <= 1
        });
        prev_end = Some(comment.end);
        match groups.last_mut() {
            Some(group) if joins => group.comments.push(comment),
            _ => groups.push(CommentGroup {
                comments: vec![comment],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_extensions() {
        assert_eq!(language_for_path(Path::new("src/lib.rs")), Some(Language::Rust));
        assert_eq!(language_for_path(Path::new("main.GO")), Some(Language::Go));
        assert_eq!(language_for_path(Path::new("app.tsx")), Some(Language::TypeScript));
        assert_eq!(language_for_path(Path::new("index.mjs")), Some(Language::JavaScript));
        assert_eq!(language_for_path(Path::new("tool.py")), Some(Language::Python));
        assert_eq!(language_for_path(Path::new("README.md")), None);
        assert_eq!(language_for_path(Path::new("Makefile")), None);
    }

    #[test]
    fn locations_count_characters() {
        let text = "ab\nçd // x\n";
        let index = LineIndex::new(text);
        let loc = index.location(text.find("//").unwrap());
        assert_eq!((loc.line, loc.column), (2, 4));
        let start = index.location(0);
        assert_eq!((start.line, start.column), (1, 1));
    }

    #[test]
    fn blank_lines_and_code_split_groups() {
        let text = "// one\n// two\n\n// three\nlet x = 1; // four\n// five\n";
        let index = LineIndex::new(text);
        let mut records = Vec::new();
        let mut from = 0;
        while let Some(pos) = text[from..].find("//") {
            let start = from + pos;
            let end = text[start..].find('\n').map(|e| start + e).unwrap_or(text.len());
            records.push(index.record(start, end));
            from = end;
        }
        let groups = group_comments(text, records);
        let sizes: Vec<usize> = groups.iter().map(|g| g.comments.len()).collect();
        assert_eq!(sizes, vec![2, 1, 2]);
        assert_eq!(groups[2].comments[0].text, "// four");
        assert_eq!(groups[2].comments[0].line, 5);
    }
}
