//! Parrot comment detection core.
//! Flags source comments that merely restate the identifiers and literals of
//! the statement they annotate. Frontends lower each supported language into
//! a small syntax model; detection runs over that model only.

use std::path::Path;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use serde::{Deserialize, Serialize};

pub mod anchor;
pub mod detect;
pub mod error;
pub mod frontend;
pub mod syntax;
pub mod vocab;
pub mod words;

pub use detect::{check, Evidence, OVERLAP_THRESHOLD, PARROT_MESSAGE};
pub use error::ParseError;
pub use frontend::{language_for_path, parse, Language};
pub use syntax::{AnchorKind, CommentGroup, CommentRecord, ParsedFile, SourceNode};

/// Top-level configuration shared by the CLI and the language server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Paths matching any of these globs are never analyzed.
    pub ignore_globs: Vec<String>,
    /// Languages to analyze; files in other languages are skipped.
    pub languages: Vec<Language>,
    /// Files larger than this are skipped when walking directories.
    pub max_file_kb: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore_globs: vec![
                "**/.git/**".into(),
                "**/target/**".into(),
                "**/node_modules/**".into(),
                "**/vendor/**".into(),
                "**/third_party/**".into(),
                "**/dist/**".into(),
                "**/build/**".into(),
                "**/*.min.*".into(),
            ],
            languages: Language::ALL.to_vec(),
            max_file_kb: Some(1024),
        }
    }
}

impl Config {
    /// Read a YAML config. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Config::from_yaml(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Config> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

/// Location metadata in 1-based line/column coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// A comment that restates its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub location: Location,
    /// Byte range of the comment in the source text.
    pub span: (usize, usize),
    pub snippet: String,
    pub evidence: Evidence,
}

/// Result of analyzing one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub language: Language,
    pub comments_checked: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Analyzer {
    config: Config,
    ignore: Option<GlobSet>,
}

impl Analyzer {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let ignore = if config.ignore_globs.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &config.ignore_globs {
                let glob = Glob::new(pattern)
                    .map_err(|e| anyhow::anyhow!("invalid ignore glob `{pattern}`: {e}"))?;
                builder.add(glob);
            }
            Some(builder.build()?)
        };
        Ok(Self { config, ignore })
    }

    /// Language of `path` if it has a frontend and is enabled.
    pub fn supports(&self, path: &Path) -> Option<Language> {
        language_for_path(path).filter(|lang| self.config.languages.contains(lang))
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignore.as_ref().is_some_and(|set| set.is_match(path))
    }

    pub fn within_size_limit(&self, path: &Path) -> bool {
        let Some(limit_kb) = self.config.max_file_kb else {
            return true;
        };
        if let Ok(meta) = std::fs::metadata(path) {
            meta.len() <= limit_kb.saturating_mul(1024)
        } else {
            false
        }
    }

    /// Analyze `text` using the language implied by `path`'s extension.
    pub fn analyze(&self, path: &Path, text: &str) -> Result<FileReport, ParseError> {
        let language = language_for_path(path).ok_or_else(|| ParseError::Unsupported {
            path: path.to_path_buf(),
        })?;
        let report = self.analyze_as(language, text)?;
        debug!(
            "{}: {} comments, {} diagnostics",
            path.display(),
            report.comments_checked,
            report.diagnostics.len()
        );
        Ok(report)
    }

    pub fn analyze_as(&self, language: Language, text: &str) -> Result<FileReport, ParseError> {
        let parsed = parse(language, text)?;
        Ok(FileReport {
            language,
            comments_checked: parsed.comment_count(),
            diagnostics: check(&parsed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> Analyzer {
        Analyzer::new(Config::default()).unwrap()
    }

    #[test]
    fn default_config_enables_every_language() {
        let a = analyzer();
        assert_eq!(a.supports(Path::new("main.go")), Some(Language::Go));
        assert_eq!(a.supports(Path::new("lib.rs")), Some(Language::Rust));
        assert_eq!(a.supports(Path::new("notes.txt")), None);
    }

    #[test]
    fn disabled_language_is_not_supported() {
        let config = Config::from_yaml("languages: [rust]\n").unwrap();
        let a = Analyzer::new(config).unwrap();
        assert_eq!(a.supports(Path::new("lib.rs")), Some(Language::Rust));
        assert_eq!(a.supports(Path::new("main.go")), None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("max_file_kb: 8\n").unwrap();
        assert_eq!(config.max_file_kb, Some(8));
        assert_eq!(config.languages.len(), Language::ALL.len());
        assert!(!config.ignore_globs.is_empty());
        assert!(Config::from_yaml("").unwrap().max_file_kb.is_some());
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = Config::load(Path::new("definitely/not/here/parrot.yml")).unwrap();
        assert_eq!(config.max_file_kb, Some(1024));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let config = Config {
            ignore_globs: vec!["[unclosed".into()],
            ..Config::default()
        };
        assert!(Analyzer::new(config).is_err());
    }

    #[test]
    fn ignores_vendored_paths() {
        let a = analyzer();
        assert!(a.is_ignored(Path::new("./node_modules/pkg/index.js")));
        assert!(a.is_ignored(Path::new("crate/target/debug/build.rs")));
        assert!(!a.is_ignored(Path::new("src/main.rs")));
    }

    #[test]
    fn size_limit_saturates() {
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let huge = Analyzer::new(Config {
            max_file_kb: Some(u64::MAX),
            ..Config::default()
        })
        .unwrap();
        assert!(huge.within_size_limit(&manifest));

        let tiny = Analyzer::new(Config {
            max_file_kb: Some(0),
            ..Config::default()
        })
        .unwrap();
        assert!(!tiny.within_size_limit(&manifest));
        assert!(!huge.within_size_limit(Path::new("no/such/file.rs")));
    }

    #[test]
    fn analyze_reports_parrot_comments() {
        let src = "fn main() {\n    // connect to the database\n    connect_to_database();\n}\n";
        let report = analyzer().analyze(Path::new("main.rs"), src).unwrap();
        assert_eq!(report.language, Language::Rust);
        assert_eq!(report.comments_checked, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].location, Location { line: 2, column: 5 });
        assert_eq!(report.diagnostics[0].snippet, "// connect to the database");
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = analyzer().analyze(Path::new("notes.txt"), "hi").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }

    #[test]
    fn diagnostics_serialize_with_evidence() {
        let src = "def run():\n    # fetch user from database\n    \
                   user = fetch_user_from_database()\n";
        let report = analyzer().analyze_as(Language::Python, src).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["language"], "python");
        assert_eq!(json["diagnostics"][0]["message"], PARROT_MESSAGE);
        assert_eq!(json["diagnostics"][0]["evidence"]["anchor_kind"], "assignment");
    }
}
