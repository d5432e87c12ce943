//! Selector verification diagnostics.
//!
//! For every declaration with a target URL, each selector-role tag is
//! checked against the cached cleaned page. Verification of independent
//! tags runs as concurrent tasks joined before the set is returned;
//! ordering within the set carries no meaning.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use seltab_scrape::{ensure_page, verify_selector, Verification};
use seltab_syntax::{is_selector_role, parse};

use crate::protocol::{severity, Diagnostic, PublishDiagnosticsParams};
use crate::server::Outgoing;
use crate::state::ServerState;

use super::util::range_in;

/// The `source` field stamped on every diagnostic this server produces.
pub const DIAGNOSTIC_SOURCE: &str = "seltab-lsp";

/// Computes the diagnostic set for one text snapshot.
///
/// A declaration whose page cannot be fetched contributes no diagnostics;
/// a document with no parseable declarations yields an empty set.
pub async fn compute_diagnostics(state: &ServerState, text: &str) -> Vec<Diagnostic> {
    let file = parse(text);
    let mut diagnostics = Vec::new();

    for decl in &file.structs {
        let Some(url) = decl.header.url() else {
            continue;
        };
        let ignores = state.effective_ignores(&decl.header.ignore_elements);
        let page: Arc<str> = match ensure_page(state.store(), state.fetcher(), url, &ignores).await
        {
            Ok(page) => Arc::from(page),
            Err(error) => {
                warn!(url, %error, "page unavailable, skipping selector verification");
                continue;
            }
        };

        let mut verifications = JoinSet::new();
        for field in &decl.fields {
            for tag in &field.tags {
                if !is_selector_role(&tag.key) {
                    continue;
                }
                let page = Arc::clone(&page);
                let key = tag.key.clone();
                let selector = tag.value.clone();
                let range = range_in(text, tag.value_range);
                verifications.spawn(async move {
                    let verification = verify_selector(&page, &selector);
                    (key, selector, range, verification)
                });
            }
        }

        while let Some(joined) = verifications.join_next().await {
            let Ok((key, selector, range, verification)) = joined else {
                continue;
            };
            let message = match verification {
                Verification::Match(count) => {
                    debug!(%selector, count, "selector verified");
                    continue;
                }
                Verification::NoMatch => {
                    format!("selector '{selector}' ({key}) did not match anything at {url}")
                }
                Verification::LookupFailed(reason) => {
                    format!("selector '{selector}' ({key}) failed to evaluate: {reason}")
                }
            };
            diagnostics.push(Diagnostic {
                range,
                severity: severity::WARNING,
                source: DIAGNOSTIC_SOURCE.to_string(),
                message,
            });
        }
    }
    diagnostics
}

/// Spawns a diagnostics pass over `text` and publishes the result, unless
/// the document has moved to a newer revision in the meantime.
pub fn spawn_publish(
    state: Arc<ServerState>,
    outgoing: Outgoing,
    uri: String,
    text: String,
    revision: u64,
) {
    tokio::spawn(async move {
        let diagnostics = compute_diagnostics(&state, &text).await;
        if state.document_revision(&uri) != Some(revision) {
            debug!(%uri, revision, "dropping diagnostics for superseded revision");
            return;
        }
        outgoing
            .notify(
                "textDocument/publishDiagnostics",
                PublishDiagnosticsParams { uri, diagnostics },
            )
            .await;
    });
}
