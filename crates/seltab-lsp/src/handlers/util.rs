//! Small helpers shared by the handlers.

use text_size::TextRange;

use seltab_syntax::ast::position_at;

use crate::protocol::{Position, Range};

/// Converts a byte range into a line/character protocol range.
pub fn range_in(text: &str, range: TextRange) -> Range {
    let start = position_at(text, range.start());
    let end = position_at(text, range.end());
    Range {
        start: Position::new(start.line, start.character),
        end: Position::new(end.line, end.character),
    }
}

/// Trims an HTML snippet for display, cutting at `max_chars` bytes on a
/// character boundary.
pub fn trim_snippet(html: &str, max_chars: usize) -> String {
    let trimmed = html.trim();
    if trimmed.len() <= max_chars {
        return trimmed.to_string();
    }
    let mut cut = max_chars;
    while cut > 0 && !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &trimmed[..cut])
}
