//! Wire protocol types.
//!
//! JSON-RPC envelopes plus the parameter and result shapes for the
//! methods this server speaks. Only the fields the handlers read are
//! modeled; unknown fields are ignored on the way in and optional fields
//! are omitted on the way out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The JSON-RPC version string sent on every outgoing message.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error codes used by this server.
pub mod error_codes {
    /// The payload was not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// The message was structurally invalid or arrived after shutdown.
    pub const INVALID_REQUEST: i64 = -32600;
    /// No handler is routed for the method.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// The params did not deserialize.
    pub const INVALID_PARAMS: i64 = -32602;
    /// The handler failed.
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// A request id: number or string, echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Number(i64),
    /// String id.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::String(id) => write!(f, "{id}"),
        }
    }
}

/// An incoming message before dispatch: a request when both `id` and
/// `method` are present, a notification when only `method` is, a response
/// (which this server never receives) otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// Protocol version; tolerated when absent.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Request id, absent on notifications.
    #[serde(default)]
    pub id: Option<RequestId>,
    /// Method name.
    #[serde(default)]
    pub method: Option<String>,
    /// Raw params, deserialized per method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing response.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    jsonrpc: &'static str,
    /// Null when the request id could not be recovered.
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    /// A success response.
    #[must_use]
    pub fn ok(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// An error response.
    #[must_use]
    pub fn error(id: Option<RequestId>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// The error member of a response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseError {
    /// One of [`error_codes`].
    pub code: i64,
    /// Human-readable description.
    pub message: String,
}

/// An outgoing notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification<T> {
    jsonrpc: &'static str,
    /// Method name.
    pub method: &'static str,
    /// Notification payload.
    pub params: T,
}

impl<T> Notification<T> {
    /// Builds a notification.
    #[must_use]
    pub fn new(method: &'static str, params: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

// =========================================================================
// Common structures
// =========================================================================

/// A zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based character within the line.
    pub character: u32,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl From<Position> for seltab_syntax::Position {
    fn from(position: Position) -> Self {
        Self::new(position.line, position.character)
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

/// Identifies a document by URI.
#[derive(Debug, Clone, Deserialize)]
pub struct TextDocumentIdentifier {
    /// The document URI.
    pub uri: String,
}

/// A document with its content, as sent on open.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentItem {
    /// The document URI.
    pub uri: String,
    /// The full document text.
    pub text: String,
}

// =========================================================================
// Requests and notifications this server receives
// =========================================================================

/// `textDocument/didOpen` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidOpenParams {
    /// The opened document.
    pub text_document: TextDocumentItem,
}

/// One content change; with full sync the last change carries the whole
/// document.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentChange {
    /// The new text.
    pub text: String,
}

/// `textDocument/didChange` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidChangeParams {
    /// The changed document.
    pub text_document: TextDocumentIdentifier,
    /// The change set.
    pub content_changes: Vec<ContentChange>,
}

/// `textDocument/didClose` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidCloseParams {
    /// The closed document.
    pub text_document: TextDocumentIdentifier,
}

/// `textDocument/didSave` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidSaveParams {
    /// The saved document.
    pub text_document: TextDocumentIdentifier,
    /// The saved text, when the client includes it.
    #[serde(default)]
    pub text: Option<String>,
}

/// Shared params for position-keyed requests (completion, hover).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentPositionParams {
    /// The document.
    pub text_document: TextDocumentIdentifier,
    /// The cursor position.
    pub position: Position,
}

/// `textDocument/codeAction` params.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeActionParams {
    /// The document.
    pub text_document: TextDocumentIdentifier,
    /// The requested range.
    pub range: Range,
    /// Context carrying the diagnostics the client sees in the range.
    #[serde(default)]
    pub context: CodeActionContext,
}

/// The context member of a code action request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeActionContext {
    /// Diagnostics overlapping the requested range.
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// `$/cancelRequest` params.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelParams {
    /// The id of the request to cancel.
    pub id: RequestId,
}

// =========================================================================
// Results and notifications this server sends
// =========================================================================

/// `initialize` result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// What the server can do.
    pub capabilities: ServerCapabilities,
    /// Server name and version.
    pub server_info: ServerInfo,
}

/// Advertised server capabilities.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Document sync options.
    pub text_document_sync: TextDocumentSyncOptions,
    /// Completion options.
    pub completion_provider: CompletionOptions,
    /// Hover support.
    pub hover_provider: bool,
    /// Code action support.
    pub code_action_provider: bool,
}

/// Document sync: full-text replacement on every change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentSyncOptions {
    /// Open/close notifications are wanted.
    pub open_close: bool,
    /// 1 = full sync.
    pub change: u8,
    /// Save options.
    pub save: SaveOptions,
}

/// Save notification options.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
    /// Ask the client to include the saved text.
    pub include_text: bool,
}

/// Completion registration options.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    /// Characters that trigger completion automatically.
    pub trigger_characters: Vec<String>,
}

/// Server name and version.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Completion item kinds used by this server.
pub mod completion_kind {
    /// An enum member: the fixed annotation keys.
    pub const ENUM: u8 = 13;
    /// A reference: a cached selector.
    pub const REFERENCE: u8 = 18;
}

/// One completion item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    /// The inserted label.
    pub label: String,
    /// Kind constant from [`completion_kind`].
    pub kind: u8,
    /// Short description beside the label.
    pub detail: String,
    /// Longer documentation.
    pub documentation: String,
}

/// Hover result.
#[derive(Debug, Clone, Serialize)]
pub struct Hover {
    /// Markdown contents.
    pub contents: MarkupContent,
    /// The range the hover applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

/// Markup payload for hover contents.
#[derive(Debug, Clone, Serialize)]
pub struct MarkupContent {
    /// Always `"markdown"`.
    pub kind: &'static str,
    /// The markdown text.
    pub value: String,
}

impl MarkupContent {
    /// Markdown content.
    #[must_use]
    pub fn markdown(value: String) -> Self {
        Self {
            kind: "markdown",
            value,
        }
    }
}

/// Diagnostic severity constants.
pub mod severity {
    /// A warning.
    pub const WARNING: u8 = 2;
}

/// One diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The range the diagnostic covers.
    pub range: Range,
    /// Severity constant from [`severity`].
    #[serde(default)]
    pub severity: u8,
    /// The producing tool. Clients may echo diagnostics without one.
    #[serde(default)]
    pub source: String,
    /// What went wrong.
    pub message: String,
}

/// `textDocument/publishDiagnostics` params.
#[derive(Debug, Clone, Serialize)]
pub struct PublishDiagnosticsParams {
    /// The document the diagnostics belong to.
    pub uri: String,
    /// The current diagnostic set; empty clears.
    pub diagnostics: Vec<Diagnostic>,
}

/// One text edit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    /// The range to replace.
    pub range: Range,
    /// The replacement text.
    pub new_text: String,
}

/// A workspace edit keyed by document URI.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceEdit {
    /// Edits per document.
    pub changes: BTreeMap<String, Vec<TextEdit>>,
}

/// One code action.
#[derive(Debug, Clone, Serialize)]
pub struct CodeAction {
    /// Shown in the client's action menu.
    pub title: String,
    /// Always `"quickfix"` here.
    pub kind: &'static str,
    /// The diagnostics this action resolves.
    pub diagnostics: Vec<Diagnostic>,
    /// The edit to apply.
    pub edit: WorkspaceEdit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_and_notification_decode() {
        let message: IncomingMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":7,"method":"textDocument/hover","params":{}}"#,
        )
        .expect("decode");
        assert_eq!(message.id, Some(RequestId::Number(7)));
        assert_eq!(message.method.as_deref(), Some("textDocument/hover"));

        let notification: IncomingMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#)
                .expect("decode");
        assert!(notification.id.is_none());
    }

    #[test]
    fn string_ids_are_echoed_verbatim() {
        let message: IncomingMessage =
            serde_json::from_str(r#"{"id":"abc-1","method":"shutdown"}"#).expect("decode");
        let id = message.id.expect("id");
        let response = Response::ok(id, Value::Null);
        let encoded = serde_json::to_string(&response).expect("encode");
        assert!(encoded.contains(r#""id":"abc-1""#));
    }

    #[test]
    fn error_response_omits_result() {
        let response = Response::error(
            Some(RequestId::Number(1)),
            error_codes::METHOD_NOT_FOUND,
            "unknown method",
        );
        let encoded = serde_json::to_string(&response).expect("encode");
        assert!(encoded.contains(r#""error""#));
        assert!(!encoded.contains(r#""result""#));
    }

    #[test]
    fn parse_error_response_carries_null_id() {
        let response = Response::error(None, error_codes::PARSE_ERROR, "bad json");
        let encoded = serde_json::to_string(&response).expect("encode");
        assert!(encoded.contains(r#""id":null"#));
    }
}
