//! Parrot Language Server Protocol implementation.
//!
//! Keeps the analyzer hot in memory and pushes parrot comment diagnostics
//! for every open document, with a quick fix that deletes the comment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use parrot_core::{Analyzer, Config, Diagnostic as CoreDiagnostic, ParseError};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

const SOURCE: &str = "parrot";
const CONFIG_FILE: &str = "parrot.yml";

/// Document state cached by the server.
struct DocumentState {
    content: String,
    version: i32,
}

/// Parrot Language Server backend.
struct Backend {
    client: Client,
    /// `None` until `initialize` has loaded a config.
    analyzer: RwLock<Option<Arc<Analyzer>>>,
    documents: DashMap<Url, DocumentState>,
    workspace_root: RwLock<Option<PathBuf>>,
    config_path: RwLock<Option<PathBuf>>,
}

impl Backend {
    fn new(client: Client) -> Self {
        Self {
            client,
            analyzer: RwLock::new(None),
            documents: DashMap::new(),
            workspace_root: RwLock::new(None),
            config_path: RwLock::new(None),
        }
    }

    async fn reload_analyzer(&self) -> anyhow::Result<()> {
        let configured = self.config_path.read().await.clone();
        let root = self.workspace_root.read().await.clone();
        let resolved = configured.or_else(|| root.map(|r| r.join(CONFIG_FILE)));

        let cfg = match &resolved {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let analyzer = Analyzer::new(cfg).context("failed to create analyzer")?;
        *self.analyzer.write().await = Some(Arc::new(analyzer));

        if let Some(path) = resolved {
            let message = if path.exists() {
                format!("parrot config loaded: {}", path.display())
            } else {
                format!("parrot config {} not found, using defaults", path.display())
            };
            self.client.log_message(MessageType::INFO, message).await;
            *self.config_path.write().await = Some(path);
        }
        Ok(())
    }

    async fn reload_and_republish(&self) {
        if let Err(err) = self.reload_analyzer().await {
            self.client
                .log_message(MessageType::ERROR, format!("failed to reload config: {err:#}"))
                .await;
        }
        let uris: Vec<Url> = self.documents.iter().map(|e| e.key().clone()).collect();
        for uri in uris {
            self.publish_diagnostics(uri).await;
        }
    }

    /// Analyze a document. `None` means leave the client's diagnostics as they are.
    async fn analyze_document(&self, uri: &Url) -> Option<Vec<Diagnostic>> {
        let analyzer = self.analyzer.read().await.clone()?;
        let path = uri.to_file_path().ok()?;
        let language = analyzer.supports(&path)?;
        if analyzer.is_ignored(&path) {
            return Some(Vec::new());
        }

        let result = {
            let doc = self.documents.get(uri)?;
            analyzer
                .analyze_as(language, &doc.content)
                .map(|report| {
                    report
                        .diagnostics
                        .iter()
                        .map(|d| to_lsp_diagnostic(d, &doc.content))
                        .collect::<Vec<_>>()
                })
        };

        match result {
            Ok(diagnostics) => Some(diagnostics),
            Err(err) => {
                self.log_parse_failure(uri, &err).await;
                None
            }
        }
    }

    async fn log_parse_failure(&self, uri: &Url, err: &ParseError) {
        self.client
            .log_message(
                MessageType::WARNING,
                format!("parrot skipped {}: {err}", uri.path()),
            )
            .await;
    }

    async fn publish_diagnostics(&self, uri: Url) {
        let Some(diagnostics) = self.analyze_document(&uri).await else {
            return;
        };
        let version = self.documents.get(&uri).map(|d| d.version);
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }

    async fn resolve_config_path(&self, raw: &str) -> Option<PathBuf> {
        if raw.trim().is_empty() {
            return None;
        }
        let configured = PathBuf::from(raw);
        if configured.is_absolute() {
            return Some(configured);
        }
        let root = self.workspace_root.read().await.clone();
        Some(root.map(|r| r.join(&configured)).unwrap_or(configured))
    }
}

fn byte_to_position(text: &str, byte_offset: usize) -> Position {
    let byte_offset = byte_offset.min(text.len());
    let mut line: u32 = 0;
    let mut last_newline = 0usize;
    for (idx, ch) in text.char_indices() {
        if idx >= byte_offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            last_newline = idx + 1;
        }
    }
    let character = text
        .get(last_newline..byte_offset)
        .map(|s| s.encode_utf16().count() as u32)
        .unwrap_or(0);
    Position { line, character }
}

fn to_lsp_diagnostic(diag: &CoreDiagnostic, text: &str) -> Diagnostic {
    let range = Range {
        start: byte_to_position(text, diag.span.0),
        end: byte_to_position(text, diag.span.1),
    };
    let evidence = &diag.evidence;
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::WARNING),
        code: Some(NumberOrString::String(SOURCE.to_string())),
        code_description: None,
        source: Some(SOURCE.to_string()),
        message: format!(
            "{} (repeats {} on line {}: {})",
            diag.message,
            evidence.anchor_kind,
            evidence.anchor_line,
            evidence.matched_words.join(", ")
        ),
        related_information: None,
        tags: Some(vec![DiagnosticTag::UNNECESSARY]),
        data: None,
    }
}

/// Edit that deletes the comment at `range`. A comment alone on its line
/// takes the whole line with it.
fn removal_edit(text: &str, range: Range) -> TextEdit {
    let utf16_line = |line: u32| -> Vec<u16> {
        text.lines()
            .nth(line as usize)
            .unwrap_or("")
            .encode_utf16()
            .collect()
    };
    let first = utf16_line(range.start.line);
    let last = utf16_line(range.end.line);
    let start = (range.start.character as usize).min(first.len());
    let end = (range.end.character as usize).min(last.len());
    let before_blank = String::from_utf16_lossy(&first[..start]).trim().is_empty();
    let rest_blank = String::from_utf16_lossy(&last[end..]).trim().is_empty();

    if before_blank && rest_blank {
        TextEdit {
            range: Range {
                start: Position {
                    line: range.start.line,
                    character: 0,
                },
                end: Position {
                    line: range.end.line + 1,
                    character: 0,
                },
            },
            new_text: String::new(),
        }
    } else {
        TextEdit {
            range,
            new_text: String::new(),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root_uri) = params.root_uri.or_else(|| {
            params
                .workspace_folders
                .as_ref()
                .and_then(|folders| folders.first().map(|f| f.uri.clone()))
        }) {
            if let Ok(path) = root_uri.to_file_path() {
                *self.workspace_root.write().await = Some(path);
            }
        }

        if let Some(Value::Object(map)) = params.initialization_options {
            if let Some(Value::String(config_path)) = map.get("configPath") {
                *self.config_path.write().await = self.resolve_config_path(config_path).await;
            }
        }

        if let Err(err) = self.reload_analyzer().await {
            self.client
                .log_message(MessageType::ERROR, format!("failed to load config: {err:#}"))
                .await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                // Push diagnostics only; no pull diagnostic provider.
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        work_done_progress_options: WorkDoneProgressOptions {
                            work_done_progress: None,
                        },
                        resolve_provider: Some(false),
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "Parrot Language Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "parrot LSP initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let content = params.text_document.text;
        let version = params.text_document.version;

        self.documents
            .insert(uri.clone(), DocumentState { content, version });

        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // FULL sync: the last change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.insert(
                uri.clone(),
                DocumentState {
                    content: change.text,
                    version,
                },
            );
        }

        self.publish_diagnostics(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        let saved_path = uri.to_file_path().ok();
        let config_path = self.config_path.read().await.clone();
        let is_config = saved_path
            .as_ref()
            .zip(config_path.as_ref())
            .is_some_and(|(a, b)| a == b);

        if is_config {
            self.reload_and_republish().await;
        } else {
            self.publish_diagnostics(uri).await;
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        if let Value::Object(map) = params.settings {
            if let Some(Value::String(config_path)) = map.get("configPath") {
                *self.config_path.write().await = self.resolve_config_path(config_path).await;
            }
        }
        self.reload_and_republish().await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let config_path = self.config_path.read().await.clone();
        let should_reload = params.changes.iter().any(|change| match &config_path {
            Some(config_path) => change
                .uri
                .to_file_path()
                .is_ok_and(|path| &path == config_path),
            None => change.uri.path().ends_with(CONFIG_FILE),
        });
        if should_reload {
            self.reload_and_republish().await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = &params.text_document.uri;
        let Some(doc) = self.documents.get(uri) else {
            return Ok(None);
        };

        let mut actions = Vec::new();
        for diag in &params.context.diagnostics {
            if diag.source.as_deref() != Some(SOURCE) {
                continue;
            }
            let mut changes = HashMap::new();
            changes.insert(uri.clone(), vec![removal_edit(&doc.content, diag.range)]);
            actions.push(CodeActionOrCommand::CodeAction(CodeAction {
                title: "Remove parrot comment".to_string(),
                kind: Some(CodeActionKind::QUICKFIX),
                diagnostics: Some(vec![diag.clone()]),
                edit: Some(WorkspaceEdit {
                    changes: Some(changes),
                    ..Default::default()
                }),
                command: None,
                is_preferred: Some(true),
                disabled: None,
                data: None,
            }));
        }

        if actions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(actions))
        }
    }
}

#[tokio::main]
async fn main() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
