//! Cursor-zone classification.
//!
//! Given a document and a cursor position, decide which lexical zone the
//! cursor occupies so completion and hover know what to offer. The
//! classifier is stateless: it reparses the document on every call, which
//! is cheap at the sizes annotated source files reach.

use text_size::TextSize;

use crate::ast::Position;
use crate::parse::parse;

/// Why a position could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The line or character falls outside the document's bounds.
    OutOfRange,
}

/// The lexical zone a cursor occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorZone {
    /// Not inside any annotated declaration, or inside one but outside
    /// every tag literal.
    Outside,
    /// Inside a tag literal, between pairs: key completions apply.
    InTagRegion,
    /// Inside a quoted tag value: selector completions apply.
    InTagValue,
    /// Immediately after the `:` separator, before the opening quote:
    /// quoted selector completions apply.
    AfterColon,
    /// The position could not be classified.
    Invalid(InvalidReason),
}

/// Classifies `position` within `text`.
///
/// Total over in-bounds positions: every call returns exactly one zone and
/// never panics.
#[must_use]
pub fn classify(text: &str, position: Position) -> CursorZone {
    let Some(offset) = position.offset_in(text) else {
        return CursorZone::Invalid(InvalidReason::OutOfRange);
    };

    let file = parse(text);
    let Some(decl) = file.struct_at(offset) else {
        return CursorZone::Outside;
    };

    let literal = decl.fields.iter().find_map(|field| {
        field
            .tag_literal
            .filter(|range| range.contains_inclusive(offset))
    });
    let Some(literal) = literal else {
        return CursorZone::Outside;
    };

    // The separator wins regardless of automaton state: the client is about
    // to type the opening quote and wants quoted-value completions.
    let before = byte_before(text, offset);
    if before == Some(b':') {
        return CursorZone::AfterColon;
    }

    // Quote automaton scoped to the literal: OutsideQuotes <-> InsideQuotes,
    // toggled by `"` between the backticks.
    let content_start = usize::from(literal.start()) + 1;
    let cursor = usize::from(offset);
    let mut inside_quotes = false;
    if cursor > content_start {
        for byte in text.as_bytes()[content_start..cursor].iter() {
            if *byte == b'"' {
                inside_quotes = !inside_quotes;
            }
        }
    }
    if inside_quotes || before == Some(b'"') {
        return CursorZone::InTagValue;
    }
    CursorZone::InTagRegion
}

fn byte_before(text: &str, offset: TextSize) -> Option<u8> {
    usize::from(offset)
        .checked_sub(1)
        .and_then(|index| text.as_bytes().get(index).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "\
// @url: https://example.com/stats
type Row struct {
\tA string `json:\"a\"`
}
";

    // Column helper: byte offset of `needle` within line `line` of DOCUMENT.
    fn col(line: u32, needle: &str) -> Position {
        let text = DOCUMENT.lines().nth(line as usize).expect("line");
        let index = text.find(needle).expect("needle") as u32;
        Position::new(line, index)
    }

    #[test]
    fn cursor_between_quotes_is_in_tag_value() {
        // `json:"a"` with the cursor between the quotes, after `json:"`.
        let position = col(2, "a\"");
        assert_eq!(classify(DOCUMENT, position), CursorZone::InTagValue);
    }

    #[test]
    fn cursor_after_colon_is_after_colon() {
        // Immediately after the colon, before the opening quote.
        let position = col(2, "\"a\"");
        assert_eq!(classify(DOCUMENT, position), CursorZone::AfterColon);
    }

    #[test]
    fn cursor_on_field_name_is_outside() {
        let position = col(2, "A string");
        assert_eq!(classify(DOCUMENT, position), CursorZone::Outside);
    }

    #[test]
    fn cursor_between_tag_pairs_is_in_tag_region() {
        let source = "type T struct {\n\tA string `hSel:\"th\" dSel:\"td\"`\n}\n";
        let line = source.lines().nth(1).expect("line");
        // The space between the two pairs.
        let column = line.find("\" dSel").expect("gap") as u32 + 1;
        assert_eq!(
            classify(source, Position::new(1, column + 1)),
            CursorZone::InTagRegion
        );
    }

    #[test]
    fn cursor_outside_any_struct_is_outside() {
        assert_eq!(
            classify(DOCUMENT, Position::new(0, 3)),
            CursorZone::Outside
        );
    }

    #[test]
    fn out_of_bounds_position_is_invalid() {
        assert_eq!(
            classify(DOCUMENT, Position::new(99, 0)),
            CursorZone::Invalid(InvalidReason::OutOfRange)
        );
        assert_eq!(
            classify(DOCUMENT, Position::new(0, 999)),
            CursorZone::Invalid(InvalidReason::OutOfRange)
        );
    }

    #[test]
    fn struct_without_annotations_is_outside() {
        let source = "type T struct {\n\tA string\n}\n";
        assert_eq!(
            classify(source, Position::new(1, 3)),
            CursorZone::Outside
        );
    }

    #[test]
    fn classification_is_total_over_in_bounds_positions() {
        for (line_index, line) in DOCUMENT.lines().enumerate() {
            for column in 0..=line.len() {
                let zone = classify(
                    DOCUMENT,
                    Position::new(line_index as u32, column as u32),
                );
                assert!(
                    !matches!(zone, CursorZone::Invalid(_)),
                    "in-bounds position classified invalid at {line_index}:{column}"
                );
            }
        }
    }
}
