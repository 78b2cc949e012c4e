// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! LSP server implementation.
//!
//! Routes protocol requests onto the [`Project`] document model and maps
//! between protocol JSON and core types. Processing is strictly
//! sequential: one message is handled to completion before the next is
//! read, so the core needs no locking and no request can observe a
//! half-applied edit.

use std::io::{BufRead, Write};

use camino::Utf8PathBuf;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use sable_core::language_service::{CompletionKind, Position};
use sable_core::{DocumentError, Project, TextChange, TextRange};

use crate::rpc::{RequestMessage, ResponseMessage, error_codes};
use crate::transport::{self, TransportError};

// ============================================================================
// Protocol Parameter Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LspPosition {
    line: u32,
    character: u32,
}

#[derive(Debug, Deserialize)]
struct LspRange {
    start: LspPosition,
    end: LspPosition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextDocumentItem {
    uri: String,
    #[serde(default)]
    version: i32,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextDocumentIdentifier {
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionedTextDocumentIdentifier {
    uri: String,
    #[serde(default)]
    version: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidOpenParams {
    text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentChange {
    #[serde(default)]
    range: Option<LspRange>,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidChangeParams {
    text_document: VersionedTextDocumentIdentifier,
    content_changes: Vec<ContentChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidCloseParams {
    text_document: TextDocumentIdentifier,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextDocumentPositionParams {
    text_document: TextDocumentIdentifier,
    position: LspPosition,
}

// ============================================================================
// Server
// ============================================================================

/// The language server: a [`Project`] behind a framed JSON-RPC loop.
#[derive(Debug, Default)]
pub struct Server {
    /// The open-file set.
    project: Project,
    /// Set by the `exit` notification; ends the loop.
    exit_requested: bool,
}

impl Server {
    /// Creates a server with an empty project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the request loop until `exit` or a clean end of stream.
    ///
    /// A framing error poisons only the offending message; the loop keeps
    /// reading. I/O errors end the loop.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
    ) -> std::io::Result<()> {
        loop {
            match transport::read_message(reader) {
                Ok(None) => return Ok(()),
                Ok(Some(body)) => {
                    if let Some(response) = self.handle_message(&body) {
                        transport::write_message(writer, &response)?;
                    }
                    if self.exit_requested {
                        return Ok(());
                    }
                }
                Err(TransportError::Io(error)) => return Err(error),
                Err(error) => {
                    warn!(%error, "dropping malformed message");
                }
            }
        }
    }

    /// Handles one raw message body, returning the serialized response
    /// when one is owed.
    pub fn handle_message(&mut self, body: &[u8]) -> Option<String> {
        let request: RequestMessage = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(error) => {
                let response = ResponseMessage::failure(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    error.to_string(),
                );
                return serde_json::to_string(&response).ok();
            }
        };

        let response = self.dispatch(request)?;
        serde_json::to_string(&response).ok()
    }

    /// Routes one request or notification.
    fn dispatch(&mut self, request: RequestMessage) -> Option<ResponseMessage> {
        debug!(method = %request.method, "dispatch");
        let id = request.id.clone();

        if request.jsonrpc != crate::rpc::JSONRPC_VERSION {
            return id.map(|id| {
                ResponseMessage::failure(
                    id,
                    error_codes::INVALID_REQUEST,
                    "expected jsonrpc \"2.0\"",
                )
            });
        }

        match request.method.as_str() {
            "initialize" => id.map(|id| ResponseMessage::success(id, initialize_result())),
            "initialized" => None,
            "shutdown" => id.map(|id| ResponseMessage::success(id, Value::Null)),
            "exit" => {
                self.exit_requested = true;
                None
            }
            "textDocument/didOpen" => {
                self.did_open(request.params);
                None
            }
            "textDocument/didChange" => {
                self.did_change(request.params);
                None
            }
            "textDocument/didClose" => {
                self.did_close(request.params);
                None
            }
            "textDocument/completion" => {
                let id = id?;
                Some(self.completion(id, request.params))
            }
            "textDocument/hover" => {
                let id = id?;
                Some(self.hover(id, request.params))
            }
            method => {
                if let Some(id) = id {
                    Some(ResponseMessage::failure(
                        id,
                        error_codes::METHOD_NOT_FOUND,
                        format!("method not found: {method}"),
                    ))
                } else {
                    debug!(method, "ignoring unknown notification");
                    None
                }
            }
        }
    }

    // ========================================================================
    // Document Synchronization
    // ========================================================================

    fn did_open(&mut self, params: Option<Value>) {
        let Some(params) = decode::<DidOpenParams>(params) else {
            return;
        };
        let document = params.text_document;
        let path = uri_to_path(&document.uri);
        self.project
            .add_or_update_file(path, document.uri, document.text, document.version);
    }

    fn did_change(&mut self, params: Option<Value>) {
        let Some(params) = decode::<DidChangeParams>(params) else {
            return;
        };
        let changes: Vec<TextChange> = params
            .content_changes
            .into_iter()
            .map(to_text_change)
            .collect();
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        if let Err(error) = self
            .project
            .apply_incremental_changes(&uri, &changes, version)
        {
            warn!(%uri, version, %error, "rejected didChange");
        }
    }

    fn did_close(&mut self, params: Option<Value>) {
        let Some(params) = decode::<DidCloseParams>(params) else {
            return;
        };
        if let Err(error) = self.project.remove_file_by_uri(&params.text_document.uri) {
            warn!(uri = %params.text_document.uri, %error, "rejected didClose");
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn completion(&self, id: Value, params: Option<Value>) -> ResponseMessage {
        let Some(params) = decode::<TextDocumentPositionParams>(params) else {
            return ResponseMessage::failure(id, error_codes::INVALID_PARAMS, "invalid params");
        };

        let file = match self.project.file_by_uri(&params.text_document.uri) {
            Ok(file) => file,
            Err(error) => return failure_from(id, &error),
        };
        let position = Position::new(params.position.line, params.position.character);
        match file.completions_at(position) {
            Ok(completions) => {
                let items: Vec<Value> = completions
                    .iter()
                    .map(|completion| {
                        json!({
                            "label": completion.label.as_str(),
                            "kind": completion_item_kind(completion.kind),
                        })
                    })
                    .collect();
                ResponseMessage::success(id, Value::Array(items))
            }
            Err(error) => failure_from(id, &error),
        }
    }

    fn hover(&self, id: Value, params: Option<Value>) -> ResponseMessage {
        let Some(params) = decode::<TextDocumentPositionParams>(params) else {
            return ResponseMessage::failure(id, error_codes::INVALID_PARAMS, "invalid params");
        };

        let file = match self.project.file_by_uri(&params.text_document.uri) {
            Ok(file) => file,
            Err(error) => return failure_from(id, &error),
        };
        let position = Position::new(params.position.line, params.position.character);
        match file.hover_info(position) {
            Ok(hover) => {
                let range = file.unit().map(|unit| {
                    let start = unit.offset_to_position(hover.span.start());
                    let end = unit.offset_to_position(hover.span.end());
                    json!({
                        "start": { "line": start.line, "character": start.column },
                        "end": { "line": end.line, "character": end.column },
                    })
                });
                let mut result = json!({
                    "contents": { "kind": "plaintext", "value": hover.contents.as_str() },
                });
                if let Some(range) = range {
                    result["range"] = range;
                }
                ResponseMessage::success(id, result)
            }
            Err(error) => failure_from(id, &error),
        }
    }
}

// ============================================================================
// Mapping Helpers
// ============================================================================

/// Decodes params, logging and returning `None` on mismatch.
fn decode<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Option<T> {
    let params = params?;
    match serde_json::from_value(params) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%error, "malformed params");
            None
        }
    }
}

/// The capability set reported at handshake.
fn initialize_result() -> Value {
    json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                // Incremental sync: didChange carries range splices.
                "change": 2,
            },
            "completionProvider": {},
            "hoverProvider": true,
        },
        "serverInfo": {
            "name": "sable-lsp",
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Extracts a filesystem path from a `file://` URI; other schemes fall
/// back to the URI text itself.
fn uri_to_path(uri: &str) -> Utf8PathBuf {
    let path = uri.strip_prefix("file://").unwrap_or(uri);
    Utf8PathBuf::from(path)
}

/// Converts a protocol content change into the core edit type.
fn to_text_change(change: ContentChange) -> TextChange {
    match change.range {
        Some(range) => TextChange::splice(
            TextRange::new(
                Position::new(range.start.line, range.start.character),
                Position::new(range.end.line, range.end.character),
            ),
            change.text,
        ),
        None => TextChange::full(change.text),
    }
}

/// Maps a core completion kind to the protocol's numeric kind.
fn completion_item_kind(kind: CompletionKind) -> u32 {
    match kind {
        CompletionKind::Function => 3,
        CompletionKind::Variable => 6,
        CompletionKind::Type => 7,
        CompletionKind::Module => 9,
        CompletionKind::Keyword => 14,
    }
}

/// Maps a document error onto a JSON-RPC error response.
fn failure_from(id: Value, error: &DocumentError) -> ResponseMessage {
    let code = match error {
        DocumentError::InvalidRange
        | DocumentError::InvalidPosition
        | DocumentError::FileNotFound(_) => error_codes::INVALID_PARAMS,
        DocumentError::NoAstDefined => error_codes::REQUEST_FAILED,
    };
    ResponseMessage::failure(id, code, error.to_string())
}
