use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

use anyhow::{anyhow, Context};
use clap::{ArgAction, Parser};
use console::style;
use log::debug;
use parrot_core::{Analyzer, Config, Diagnostic, FileReport, Language};
use serde::Serialize;
use walkdir::WalkDir;

/// Parrot comment detector entry point.
#[derive(Debug, Parser)]
#[command(
    name = "parrot",
    about = "Flag comments that only restate the code they annotate."
)]
struct Args {
    /// Files or directories to check.
    #[arg(value_name = "PATH", default_value = ".", num_args = 0..)]
    paths: Vec<PathBuf>,

    /// Path to config file (YAML). Used only if it exists.
    #[arg(long, default_value = "parrot.yml")]
    config: PathBuf,

    /// Emit one JSON report instead of human-readable output.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Only print the summary line.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,

    /// Show which statement each flagged comment repeats and the words it shares.
    #[arg(long, action = ArgAction::SetTrue)]
    explain: bool,

    /// Treat every file as this language (rust, go, javascript, typescript, python).
    #[arg(long, value_name = "LANG", value_parser = parse_language)]
    lang: Option<Language>,

    /// Log analysis decisions to stderr.
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: String,
    #[serde(flatten)]
    report: FileReport,
}

#[derive(Debug, Serialize)]
struct Failure {
    path: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct OutputReport {
    files: Vec<FileResult>,
    failures: Vec<Failure>,
    total_files: usize,
    total_comments: usize,
    total_diagnostics: usize,
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Clean = 0,
    Flagged = 1,
    Failed = 2,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(outcome) => process::exit(outcome as i32),
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            process::exit(Outcome::Failed as i32);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn parse_language(name: &str) -> Result<Language, String> {
    Language::from_name(name).ok_or_else(|| format!("unsupported language `{name}`"))
}

fn run(args: Args) -> anyhow::Result<Outcome> {
    let cfg = Config::load(&args.config)?;
    debug!("config: {cfg:?}");
    let analyzer = Analyzer::new(cfg)?;
    let cwd = env::current_dir().context("failed to resolve working directory")?;

    let mut files = collect_files(&analyzer, &args.paths, args.lang)?;
    files.sort();
    files.dedup();

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for path in files {
        let display = display_path(&path, &cwd);
        match analyze_file(&analyzer, &path, args.lang) {
            Ok(report) => {
                if !args.json && !args.quiet {
                    print_human_report(&display, &report.diagnostics, args.explain);
                }
                results.push(FileResult {
                    path: display,
                    report,
                });
            }
            Err(err) => {
                if !args.json {
                    eprintln!("{} {display}: {err:#}", style("error:").red().bold());
                }
                failures.push(Failure {
                    path: display,
                    error: format!("{err:#}"),
                });
            }
        }
    }

    let output = OutputReport {
        total_files: results.len(),
        total_comments: results.iter().map(|r| r.report.comments_checked).sum(),
        total_diagnostics: results.iter().map(|r| r.report.diagnostics.len()).sum(),
        files: results,
        failures,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let summary = format!(
            "{} files, {} comments, {} diagnostics",
            output.total_files, output.total_comments, output.total_diagnostics
        );
        if output.total_diagnostics == 0 {
            println!("{}", style(summary).green());
        } else {
            println!("{}", style(summary).yellow());
        }
    }

    Ok(if !output.failures.is_empty() {
        Outcome::Failed
    } else if output.total_diagnostics > 0 {
        Outcome::Flagged
    } else {
        Outcome::Clean
    })
}

fn analyze_file(
    analyzer: &Analyzer,
    path: &Path,
    forced: Option<Language>,
) -> anyhow::Result<FileReport> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let report = match forced {
        Some(language) => analyzer.analyze_as(language, &content)?,
        None => analyzer.analyze(path, &content)?,
    };
    Ok(report)
}

/// Expand `paths` into the files to analyze. Directories are walked and
/// filtered by extension, ignore globs and size; named files skip the size
/// check, and with a forced language skip the extension check too.
fn collect_files(
    analyzer: &Analyzer,
    paths: &[PathBuf],
    forced: Option<Language>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut walker = WalkDir::new(path).into_iter();
            while let Some(entry_res) = walker.next() {
                let entry = entry_res?;
                let entry_path = entry.path();
                if analyzer.is_ignored(entry_path) {
                    if entry.file_type().is_dir() {
                        walker.skip_current_dir();
                    }
                    continue;
                }
                if !entry.file_type().is_file() || analyzer.supports(entry_path).is_none() {
                    continue;
                }
                if !analyzer.within_size_limit(entry_path) {
                    debug!("skipping {}: over size limit", entry_path.display());
                    continue;
                }
                files.push(entry_path.to_path_buf());
            }
        } else if path.is_file() {
            if analyzer.is_ignored(path) {
                continue;
            }
            if forced.is_some() || analyzer.supports(path).is_some() {
                files.push(path.clone());
            }
        } else {
            return Err(anyhow!("no such file or directory: {}", path.display()));
        }
    }
    Ok(files)
}

fn display_path(path: &Path, cwd: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let relative = pathdiff::diff_paths(&absolute, cwd).unwrap_or_else(|| path.to_path_buf());
    relative
        .to_string_lossy()
        .trim_start_matches("./")
        .replace('\\', "/")
}

fn print_human_report(path: &str, diagnostics: &[Diagnostic], explain: bool) {
    for diag in diagnostics {
        println!(
            "{}:{}:{}: {}",
            style(path).bold(),
            diag.location.line,
            diag.location.column,
            style(&diag.message).yellow()
        );
        println!("    {}", style(&diag.snippet).dim());
        if explain {
            let evidence = &diag.evidence;
            println!(
                "    repeats {} on line {}: {} of {} words ({:.2}): {}",
                evidence.anchor_kind,
                evidence.anchor_line,
                evidence.matched_words.len(),
                evidence.meaningful_words,
                evidence.ratio,
                evidence.matched_words.join(", ")
            );
        }
    }
}
