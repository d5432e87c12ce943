//! Completion.
//!
//! What gets offered depends on the cursor zone: annotation keys inside
//! the tag region, cached selectors inside a value or right after the
//! separator (quoted there, since the client is about to type the opening
//! quote).

use tracing::warn;

use seltab_scrape::{get_selectors, SelectorRecord};
use seltab_syntax::{classify, parse, CursorZone, SELECTOR_ROLES};

use crate::protocol::{completion_kind, CompletionItem, TextDocumentPositionParams};
use crate::state::ServerState;

use super::util::trim_snippet;

const SNIPPET_LIMIT: usize = 480;

/// Computes completion items for a position. Failures degrade to an
/// empty list; the session always continues.
pub async fn completion(
    state: &ServerState,
    params: TextDocumentPositionParams,
) -> Vec<CompletionItem> {
    let Some(doc) = state.document(&params.text_document.uri) else {
        return Vec::new();
    };
    let position = seltab_syntax::Position::from(params.position);

    match classify(&doc.text, position) {
        CursorZone::InTagRegion => role_items(),
        zone @ (CursorZone::InTagValue | CursorZone::AfterColon) => {
            selector_items(state, &doc.text, position, zone == CursorZone::AfterColon).await
        }
        CursorZone::Outside | CursorZone::Invalid(_) => Vec::new(),
    }
}

fn role_items() -> Vec<CompletionItem> {
    SELECTOR_ROLES
        .iter()
        .map(|role| CompletionItem {
            label: role.key.to_string(),
            kind: completion_kind::ENUM,
            detail: role.detail.to_string(),
            documentation: role.documentation.to_string(),
        })
        .collect()
}

async fn selector_items(
    state: &ServerState,
    text: &str,
    position: seltab_syntax::Position,
    quoted: bool,
) -> Vec<CompletionItem> {
    let Some(offset) = position.offset_in(text) else {
        return Vec::new();
    };
    let file = parse(text);
    let Some(decl) = file.struct_at(offset) else {
        return Vec::new();
    };
    let Some(url) = decl.header.url() else {
        return Vec::new();
    };

    let ignores = state.effective_ignores(&decl.header.ignore_elements);
    let records = match get_selectors(
        state.store(),
        state.fetcher(),
        url,
        &ignores,
        state.config().min_occurrences,
    )
    .await
    {
        Ok(records) => records,
        Err(error) => {
            warn!(url, %error, "completion without selectors");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .map(|record| selector_item(record, quoted))
        .collect()
}

fn selector_item(record: SelectorRecord, quoted: bool) -> CompletionItem {
    let label = if quoted {
        format!("\"{}\"", record.value)
    } else {
        record.value
    };
    CompletionItem {
        label,
        kind: completion_kind::REFERENCE,
        detail: format!("{} occurrences", record.occurrences),
        documentation: format!("context:\n{}", trim_snippet(&record.context, SNIPPET_LIMIT)),
    }
}
