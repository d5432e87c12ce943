//! Document synchronization handlers.
//!
//! Documents use full-text sync: every change replaces the text
//! wholesale. Each mutation kicks off a diagnostics pass over the new
//! snapshot.

use std::sync::Arc;

use tracing::{info, warn};

use crate::protocol::{
    DidChangeParams, DidCloseParams, DidOpenParams, DidSaveParams, PublishDiagnosticsParams,
};
use crate::server::Outgoing;
use crate::state::ServerState;

use super::diagnostics;

pub async fn did_open(state: Arc<ServerState>, outgoing: Outgoing, params: DidOpenParams) {
    let uri = params.text_document.uri;
    let text = params.text_document.text;
    info!(%uri, "document opened");

    let revision = state.set_document(&uri, text.clone());
    diagnostics::spawn_publish(state, outgoing, uri, text, revision);
}

pub async fn did_change(state: Arc<ServerState>, outgoing: Outgoing, params: DidChangeParams) {
    let uri = params.text_document.uri;
    // Full sync: the last change carries the whole document.
    let Some(change) = params.content_changes.into_iter().next_back() else {
        return;
    };
    let revision = state.set_document(&uri, change.text.clone());
    diagnostics::spawn_publish(state, outgoing, uri, change.text, revision);
}

pub async fn did_save(state: Arc<ServerState>, outgoing: Outgoing, params: DidSaveParams) {
    let uri = params.text_document.uri;
    info!(%uri, "document saved");

    let text = match params.text {
        Some(text) => Some(text),
        None => read_from_disk(&uri),
    };
    // Clients that send neither text nor a readable path keep the open
    // snapshot.
    let text = match text.or_else(|| state.document(&uri).map(|doc| doc.text)) {
        Some(text) => text,
        None => {
            warn!(%uri, "save for unknown document");
            return;
        }
    };
    let revision = state.set_document(&uri, text.clone());
    diagnostics::spawn_publish(state, outgoing, uri, text, revision);
}

pub async fn did_close(state: Arc<ServerState>, outgoing: Outgoing, params: DidCloseParams) {
    let uri = params.text_document.uri;
    info!(%uri, "document closed");

    state.remove_document(&uri);
    outgoing
        .notify(
            "textDocument/publishDiagnostics",
            PublishDiagnosticsParams {
                uri,
                diagnostics: Vec::new(),
            },
        )
        .await;
}

fn read_from_disk(uri: &str) -> Option<String> {
    let parsed = url::Url::parse(uri).ok()?;
    let path = parsed.to_file_path().ok()?;
    std::fs::read_to_string(path).ok()
}
