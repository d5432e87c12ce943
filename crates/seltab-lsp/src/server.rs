//! The protocol loop.
//!
//! One task reads framed messages off the input stream and dispatches
//! them: notifications are handled inline in arrival order (document
//! mutations stay serialized), requests are spawned as independent tasks
//! registered with the cancellation registry. A single writer task owns
//! the output stream; every response and notification funnels through it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::handlers;
use crate::protocol::{
    error_codes, CancelParams, CodeActionParams, CompletionOptions, DidChangeParams,
    DidCloseParams, DidOpenParams, DidSaveParams, IncomingMessage, InitializeResult, RequestId,
    Response, SaveOptions, ServerCapabilities, ServerInfo, TextDocumentPositionParams,
    TextDocumentSyncOptions,
};
use crate::rpc;
use crate::state::ServerState;

const OUTGOING_QUEUE: usize = 64;
const READ_CHUNK: usize = 8 * 1024;

/// Handle for sending messages to the client.
#[derive(Debug, Clone)]
pub struct Outgoing {
    tx: mpsc::Sender<Vec<u8>>,
}

impl Outgoing {
    /// Frames and enqueues any serializable message.
    pub async fn send<T: Serialize>(&self, message: &T) {
        match rpc::encode(message) {
            Ok(frame) => {
                let _ = self.tx.send(frame).await;
            }
            Err(error) => error!(%error, "failed to encode outgoing message"),
        }
    }

    /// Sends a response.
    pub async fn respond(&self, response: Response) {
        self.send(&response).await;
    }

    /// Sends a notification.
    pub async fn notify<T: Serialize>(&self, method: &'static str, params: T) {
        self.send(&crate::protocol::Notification::new(method, params))
            .await;
    }
}

/// Whether the loop keeps going after a message.
enum Flow {
    Continue,
    Exit(i32),
}

/// Runs the server over stdio. Returns the process exit code.
///
/// # Errors
///
/// Propagates I/O failures on the input stream.
pub async fn run(state: Arc<ServerState>) -> anyhow::Result<i32> {
    run_loop(state, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Runs the server over arbitrary streams (tests drive this directly).
///
/// # Errors
///
/// Propagates I/O failures on the input stream.
pub async fn run_loop<R, W>(state: Arc<ServerState>, reader: R, writer: W) -> anyhow::Result<i32>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(OUTGOING_QUEUE);
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(frame) = rx.recv().await {
            if writer.write_all(&frame).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });
    let outgoing = Outgoing { tx };

    let mut reader = reader;
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    let exit_code = 'outer: loop {
        // Drain every complete frame already buffered.
        loop {
            match rpc::split(&buffer) {
                Ok(Some((consumed, payload))) => {
                    buffer.drain(..consumed);
                    match handle_payload(&state, &outgoing, &payload).await {
                        Flow::Continue => {}
                        Flow::Exit(code) => break 'outer code,
                    }
                }
                Ok(None) => break,
                Err(frame_error) => {
                    // Fatal to this message only; skip the bad header block
                    // and resume on the rest of the stream.
                    warn!(%frame_error, "dropping malformed frame");
                    buffer.drain(..frame_error.consumed.max(1).min(buffer.len()));
                }
            }
        }

        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            info!("input stream closed");
            break if state.is_shutdown() { 0 } else { 1 };
        }
        buffer.extend_from_slice(&chunk[..read]);
    };

    drop(outgoing);
    let _ = writer_task.await;
    Ok(exit_code)
}

async fn handle_payload(state: &Arc<ServerState>, outgoing: &Outgoing, payload: &[u8]) -> Flow {
    let message: IncomingMessage = match serde_json::from_slice(payload) {
        Ok(message) => message,
        Err(parse_error) => {
            warn!(%parse_error, "undecodable payload");
            outgoing
                .respond(Response::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("payload is not valid JSON: {parse_error}"),
                ))
                .await;
            return Flow::Continue;
        }
    };

    let Some(method) = message.method else {
        if let Some(id) = message.id {
            outgoing
                .respond(Response::error(
                    Some(id),
                    error_codes::INVALID_REQUEST,
                    "message carries no method",
                ))
                .await;
        }
        return Flow::Continue;
    };

    match (method.as_str(), message.id) {
        // Lifecycle.
        ("exit", _) => {
            info!("exit received");
            return Flow::Exit(i32::from(!state.is_shutdown()));
        }
        ("shutdown", Some(id)) => {
            info!("shutdown received");
            state.set_shutdown();
            outgoing.respond(Response::ok(id, Value::Null)).await;
        }
        ("initialize", Some(id)) => {
            info!("initializing");
            match serde_json::to_value(initialize_result()) {
                Ok(result) => outgoing.respond(Response::ok(id, result)).await,
                Err(error) => {
                    outgoing
                        .respond(Response::error(
                            Some(id),
                            error_codes::INTERNAL_ERROR,
                            error.to_string(),
                        ))
                        .await;
                }
            }
        }
        ("initialized", None) => {
            info!("client initialized");
        }

        // Cancellation: unknown or completed ids are a silent no-op.
        ("$/cancelRequest", _) => {
            if let Ok(params) = params_from::<CancelParams>(message.params) {
                debug!(id = %params.id, "cancel requested");
                state.cancels().cancel(&params.id);
            }
        }

        // Document sync notifications, handled inline so mutations keep
        // arrival order.
        ("textDocument/didOpen", None) => {
            if let Ok(params) = params_or_warn::<DidOpenParams>(message.params, &method) {
                handlers::did_open(Arc::clone(state), outgoing.clone(), params).await;
            }
        }
        ("textDocument/didChange", None) => {
            if let Ok(params) = params_or_warn::<DidChangeParams>(message.params, &method) {
                handlers::did_change(Arc::clone(state), outgoing.clone(), params).await;
            }
        }
        ("textDocument/didSave", None) => {
            if let Ok(params) = params_or_warn::<DidSaveParams>(message.params, &method) {
                handlers::did_save(Arc::clone(state), outgoing.clone(), params).await;
            }
        }
        ("textDocument/didClose", None) => {
            if let Ok(params) = params_or_warn::<DidCloseParams>(message.params, &method) {
                handlers::did_close(Arc::clone(state), outgoing.clone(), params).await;
            }
        }

        // Everything else with an id runs as an independent request task.
        (_, Some(id)) => {
            if state.is_shutdown() {
                outgoing
                    .respond(Response::error(
                        Some(id),
                        error_codes::INVALID_REQUEST,
                        "server is shutting down",
                    ))
                    .await;
                return Flow::Continue;
            }
            spawn_request(
                Arc::clone(state),
                outgoing.clone(),
                id,
                method.clone(),
                message.params,
            );
        }
        (_, None) => {
            trace!(%method, "ignoring unknown notification");
        }
    }
    Flow::Continue
}

/// Registers the request in the cancellation registry, then runs its
/// handler as a spawned task. A cancellation that lands before the
/// handler's first suspension point wins: no response is sent.
fn spawn_request(
    state: Arc<ServerState>,
    outgoing: Outgoing,
    id: RequestId,
    method: String,
    params: Option<Value>,
) {
    let token = state.cancels().register(id.clone());
    tokio::spawn(async move {
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => None,
            result = route_request(&state, &method, params) => Some(result),
        };
        state.cancels().complete(&id);
        match outcome {
            None => debug!(%id, %method, "request cancelled, dropping response"),
            Some(Ok(result)) => outgoing.respond(Response::ok(id, result)).await,
            Some(Err(request_error)) => {
                outgoing
                    .respond(Response::error(
                        Some(id),
                        request_error.code,
                        request_error.message,
                    ))
                    .await;
            }
        }
    });
}

struct RequestError {
    code: i64,
    message: String,
}

async fn route_request(
    state: &Arc<ServerState>,
    method: &str,
    params: Option<Value>,
) -> Result<Value, RequestError> {
    match method {
        "textDocument/completion" => {
            let params: TextDocumentPositionParams = params_from(params)?;
            to_result(&handlers::completion(state, params).await)
        }
        "textDocument/hover" => {
            let params: TextDocumentPositionParams = params_from(params)?;
            to_result(&handlers::hover(state, params).await)
        }
        "textDocument/codeAction" => {
            let params: CodeActionParams = params_from(params)?;
            to_result(&handlers::code_action(state, params))
        }
        _ => Err(RequestError {
            code: error_codes::METHOD_NOT_FOUND,
            message: format!("unknown method: {method}"),
        }),
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, RequestError> {
    serde_json::to_value(value).map_err(|error| RequestError {
        code: error_codes::INTERNAL_ERROR,
        message: error.to_string(),
    })
}

fn params_from<T: DeserializeOwned>(params: Option<Value>) -> Result<T, RequestError> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|error| RequestError {
        code: error_codes::INVALID_PARAMS,
        message: format!("invalid params: {error}"),
    })
}

fn params_or_warn<T: DeserializeOwned>(
    params: Option<Value>,
    method: &str,
) -> Result<T, RequestError> {
    params_from(params).inspect_err(|request_error| {
        warn!(method, message = %request_error.message, "dropping notification");
    })
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: TextDocumentSyncOptions {
                open_close: true,
                change: 1,
                save: SaveOptions { include_text: true },
            },
            completion_provider: CompletionOptions {
                trigger_characters: vec![":".to_string(), "\"".to_string()],
            },
            hover_provider: true,
            code_action_provider: true,
        },
        server_info: ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }
}
