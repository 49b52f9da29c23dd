use std::path::PathBuf;

use thiserror::Error;

use crate::frontend::Language;

/// A source file could not be turned into a syntax tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{line}:{column}: {message}")]
    Rust {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("{line}:{column}: syntax error in {language} source")]
    Syntax {
        language: Language,
        line: usize,
        column: usize,
    },
    #[error("failed to load the {language} grammar: {message}")]
    Grammar { language: Language, message: String },
    #[error("no frontend for {}", path.display())]
    Unsupported { path: PathBuf },
}
