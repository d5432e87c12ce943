//! Hover.
//!
//! Hovering a selector-valued tag answers with the selector's match count
//! against the cached page plus a context snippet. No page in the cache
//! means no hover; hovering never triggers a fetch.

use seltab_scrape::{first_match_html, verify_selector, Verification};
use seltab_syntax::{is_selector_role, parse};

use crate::protocol::{Hover, MarkupContent, TextDocumentPositionParams};
use crate::state::ServerState;

use super::util::{range_in, trim_snippet};

const SNIPPET_LIMIT: usize = 600;

/// Computes the hover for a position, if the cursor sits on a
/// selector-role tag value and the page is cached.
pub async fn hover(state: &ServerState, params: TextDocumentPositionParams) -> Option<Hover> {
    let doc = state.document(&params.text_document.uri)?;
    let position = seltab_syntax::Position::from(params.position);
    let offset = position.offset_in(&doc.text)?;

    let file = parse(&doc.text);
    let decl = file.struct_at(offset)?;
    let url = decl.header.url()?;
    let tag = decl
        .fields
        .iter()
        .flat_map(|field| field.tags.iter())
        .find(|tag| tag.value_range.contains_inclusive(offset) && is_selector_role(&tag.key))?;

    let html = state.store().html_for_url(url).await.ok().flatten()?;
    let value = match verify_selector(&html, &tag.value) {
        Verification::Match(count) => {
            let snippet = first_match_html(&html, &tag.value)
                .map(|snippet| {
                    format!("\n\n```html\n{}\n```", trim_snippet(&snippet, SNIPPET_LIMIT))
                })
                .unwrap_or_default();
            format!(
                "`{}` matches **{count}** element(s) at {url}{snippet}",
                tag.value
            )
        }
        Verification::NoMatch => {
            format!("`{}` matches nothing at {url}", tag.value)
        }
        Verification::LookupFailed(reason) => {
            format!("`{}` does not parse as a selector: {reason}", tag.value)
        }
    };

    Some(Hover {
        contents: MarkupContent::markdown(value),
        range: Some(range_in(&doc.text, tag.value_range)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Position, TextDocumentIdentifier};
    use crate::state::test_support::canned_state;
    use seltab_scrape::ensure_page;

    const PAGE: &str = "<table><tr><td>cell</td></tr></table>";

    const DOCUMENT: &str = "// @url: https://example.com/table\n\
                            type Row struct {\n\
                            \tA string `dSel:\"table tr td\"`\n\
                            }\n";

    fn params(line: u32, character: u32) -> TextDocumentPositionParams {
        TextDocumentPositionParams {
            text_document: TextDocumentIdentifier {
                uri: "file:///row.go".to_string(),
            },
            position: Position::new(line, character),
        }
    }

    fn value_column() -> u32 {
        DOCUMENT
            .lines()
            .nth(2)
            .expect("field line")
            .find("table tr td")
            .expect("value") as u32
    }

    #[tokio::test]
    async fn hover_on_cached_selector_reports_matches() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = canned_state(&dir, PAGE).await;
        state.set_document("file:///row.go", DOCUMENT.to_string());
        ensure_page(state.store(), state.fetcher(), "https://example.com/table", &[])
            .await
            .expect("warm the cache");

        let hover = hover(&state, params(2, value_column() + 1))
            .await
            .expect("hover");
        assert!(hover.contents.value.contains("matches **1** element"));
        assert!(hover.contents.value.contains("<td>cell</td>"));
        assert_eq!(hover.range.expect("range").start.line, 2);
    }

    #[tokio::test]
    async fn hover_without_cached_page_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = canned_state(&dir, PAGE).await;
        state.set_document("file:///row.go", DOCUMENT.to_string());

        assert!(hover(&state, params(2, value_column() + 1)).await.is_none());
    }

    #[tokio::test]
    async fn hover_off_the_tag_value_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = canned_state(&dir, PAGE).await;
        state.set_document("file:///row.go", DOCUMENT.to_string());
        ensure_page(state.store(), state.fetcher(), "https://example.com/table", &[])
            .await
            .expect("warm the cache");

        assert!(hover(&state, params(1, 2)).await.is_none());
    }
}
