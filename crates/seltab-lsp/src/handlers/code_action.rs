//! Code actions.
//!
//! For every verification warning the client hands back in the request
//! context, offer a quickfix that deletes the failing tag from its
//! annotation literal.

use std::collections::BTreeMap;

use text_size::{TextRange, TextSize};

use seltab_syntax::{is_selector_role, parse, Tag};

use crate::protocol::{CodeAction, CodeActionParams, Position, TextEdit, WorkspaceEdit};
use crate::state::ServerState;

use super::diagnostics::DIAGNOSTIC_SOURCE;
use super::util::range_in;

/// Computes quickfix actions for the diagnostics in the request context.
pub fn code_action(state: &ServerState, params: CodeActionParams) -> Vec<CodeAction> {
    let Some(doc) = state.document(&params.text_document.uri) else {
        return Vec::new();
    };
    let file = parse(&doc.text);

    let mut actions = Vec::new();
    for diagnostic in &params.context.diagnostics {
        if diagnostic.source != DIAGNOSTIC_SOURCE {
            continue;
        }
        let Some(offset) = syntax_position(diagnostic.range.start).offset_in(&doc.text) else {
            continue;
        };
        let tag = file.structs.iter().find_map(|decl| {
            decl.fields
                .iter()
                .flat_map(|field| field.tags.iter())
                .find(|tag| {
                    tag.value_range.contains_inclusive(offset) && is_selector_role(&tag.key)
                })
        });
        let Some(tag) = tag else {
            continue;
        };

        let mut changes = BTreeMap::new();
        changes.insert(
            doc.uri.clone(),
            vec![TextEdit {
                range: range_in(&doc.text, tag_deletion_range(&doc.text, tag)),
                new_text: String::new(),
            }],
        );
        actions.push(CodeAction {
            title: format!("Remove unverified '{}' tag", tag.key),
            kind: "quickfix",
            diagnostics: vec![diagnostic.clone()],
            edit: WorkspaceEdit { changes },
        });
    }
    actions
}

/// The byte range that removes the whole `key:"value"` pair, including a
/// separating space before it when present.
fn tag_deletion_range(text: &str, tag: &Tag) -> TextRange {
    let bytes = text.as_bytes();
    let mut start = tag.key_range.start();
    if usize::from(start) > 0 && bytes[usize::from(start) - 1] == b' ' {
        start -= TextSize::from(1);
    }
    let mut end = tag.value_range.end();
    if bytes.get(usize::from(end)) == Some(&b'"') {
        end += TextSize::from(1);
    }
    TextRange::new(start, end)
}

fn syntax_position(position: Position) -> seltab_syntax::Position {
    seltab_syntax::Position::new(position.line, position.character)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{
        severity, CodeActionContext, Diagnostic, Range, TextDocumentIdentifier,
    };
    use crate::state::test_support::canned_state;

    const DOCUMENT: &str = "// @url: https://example.com/table\n\
                            type Row struct {\n\
                            \tA string `hSel:\"tr th\" dSel:\"tr td\"`\n\
                            }\n";

    fn value_range(needle: &str) -> Range {
        let line = DOCUMENT.lines().nth(2).expect("field line");
        let start = line.find(needle).expect("needle") as u32;
        Range {
            start: Position::new(2, start),
            end: Position::new(2, start + needle.len() as u32),
        }
    }

    fn diagnostic_at(needle: &str) -> Diagnostic {
        Diagnostic {
            range: value_range(needle),
            severity: severity::WARNING,
            source: DIAGNOSTIC_SOURCE.to_string(),
            message: format!("selector '{needle}' did not match"),
        }
    }

    fn action_params(diagnostics: Vec<Diagnostic>) -> CodeActionParams {
        CodeActionParams {
            text_document: TextDocumentIdentifier {
                uri: "file:///row.go".to_string(),
            },
            range: value_range("tr td"),
            context: CodeActionContext { diagnostics },
        }
    }

    #[tokio::test]
    async fn offers_removal_of_the_failing_tag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = canned_state(&dir, "<p>x</p>").await;
        state.set_document("file:///row.go", DOCUMENT.to_string());

        let actions = code_action(&state, action_params(vec![diagnostic_at("tr td")]));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].title, "Remove unverified 'dSel' tag");

        let edits = &actions[0].edit.changes["file:///row.go"];
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "");
        // The edit removes ` dSel:"tr td"` including the separating space.
        let line = DOCUMENT.lines().nth(2).expect("line");
        let removed =
            &line[edits[0].range.start.character as usize..edits[0].range.end.character as usize];
        assert_eq!(removed, " dSel:\"tr td\"");
    }

    #[tokio::test]
    async fn foreign_diagnostics_produce_no_actions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = canned_state(&dir, "<p>x</p>").await;
        state.set_document("file:///row.go", DOCUMENT.to_string());

        let mut foreign = diagnostic_at("tr td");
        foreign.source = "rust-analyzer".to_string();
        assert!(code_action(&state, action_params(vec![foreign])).is_empty());
    }

    #[tokio::test]
    async fn diagnostics_off_any_tag_produce_no_actions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = canned_state(&dir, "<p>x</p>").await;
        state.set_document("file:///row.go", DOCUMENT.to_string());

        let mut stray = diagnostic_at("tr td");
        stray.range = Range {
            start: Position::new(0, 0),
            end: Position::new(0, 4),
        };
        assert!(code_action(&state, action_params(vec![stray])).is_empty());
    }
}
