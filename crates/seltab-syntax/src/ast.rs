//! Position-annotated view of tagged declarations.
//!
//! The parser produces these types fresh from document text on every call;
//! they are never persisted and become stale the moment the text changes.

use text_size::{TextRange, TextSize};

/// A zero-based line/character cursor position, as editors report them.
///
/// `character` counts bytes within the line, matching how tag offsets are
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Zero-based line index.
    pub line: u32,
    /// Zero-based byte column within the line.
    pub character: u32,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Converts the position to a byte offset into `text`.
    ///
    /// Returns `None` when the line does not exist or the character falls
    /// past the end of the line.
    #[must_use]
    pub fn offset_in(&self, text: &str) -> Option<TextSize> {
        let mut remaining = self.line;
        let mut line_start = 0usize;
        if remaining > 0 {
            for (index, byte) in text.bytes().enumerate() {
                if byte == b'\n' {
                    remaining -= 1;
                    line_start = index + 1;
                    if remaining == 0 {
                        break;
                    }
                }
            }
            if remaining > 0 {
                return None;
            }
        }
        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |i| line_start + i);
        let offset = line_start + self.character as usize;
        if offset > line_end {
            return None;
        }
        Some(TextSize::from(offset as u32))
    }
}

/// Converts a byte offset back into a line/character position.
///
/// Offsets past the end of the text clamp to the final position.
#[must_use]
pub fn position_at(text: &str, offset: TextSize) -> Position {
    let offset = usize::from(offset).min(text.len());
    let mut line = 0u32;
    let mut line_start = 0usize;
    for (index, byte) in text[..offset].bytes().enumerate() {
        if byte == b'\n' {
            line += 1;
            line_start = index + 1;
        }
    }
    Position::new(line, (offset - line_start) as u32)
}

/// One `key:"value"` pair inside a tag literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The tag key, e.g. `dSel`.
    pub key: String,
    /// The tag value with quotes stripped.
    pub value: String,
    /// Byte range of the key in the document.
    pub key_range: TextRange,
    /// Byte range of the value (between, not including, the quotes).
    pub value_range: TextRange,
}

/// A struct field together with its tag literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The field's type as written, trimmed.
    pub type_name: String,
    /// Zero-based line the field starts on.
    pub line: u32,
    /// Byte range covering the field declaration.
    pub range: TextRange,
    /// Byte range of the backtick literal (including the backticks), when
    /// the field carries one.
    pub tag_literal: Option<TextRange>,
    /// Parsed tags, empty when there is no literal.
    pub tags: Vec<Tag>,
}

impl Field {
    /// Returns the tag with the given key, if present.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.key == key)
    }
}

/// The `@url:` / `@ignore-elements:` markers pulled from the doc comment
/// block preceding a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderComment {
    /// Target URLs, in comment order. The first one drives extraction.
    pub urls: Vec<String>,
    /// Element tag names to strip before selector enumeration.
    pub ignore_elements: Vec<String>,
}

impl HeaderComment {
    /// Parses marker lines out of a doc comment block.
    #[must_use]
    pub fn parse(lines: &[&str]) -> Self {
        let mut header = Self::default();
        for line in lines {
            let text = line.trim_start_matches('/').trim();
            if let Some(rest) = text.strip_prefix("@url:") {
                let url = rest.trim();
                if !url.is_empty() {
                    header.urls.push(url.to_string());
                }
            } else if let Some(rest) = text.strip_prefix("@ignore-elements:") {
                header.ignore_elements.extend(
                    rest.split(',')
                        .map(str::trim)
                        .filter(|element| !element.is_empty())
                        .map(str::to_string),
                );
            }
        }
        header
    }

    /// The primary target URL, when one was declared.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }
}

/// One `type Name struct { ... }` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedStruct {
    /// The declared type name.
    pub name: String,
    /// Byte range from the `type` keyword to the closing brace.
    pub range: TextRange,
    /// Markers from the preceding doc comment block.
    pub header: HeaderComment,
    /// The declaration's fields.
    pub fields: Vec<Field>,
}

impl TaggedStruct {
    /// Returns true if any field carries a tag literal.
    #[must_use]
    pub fn has_annotations(&self) -> bool {
        self.fields.iter().any(|field| field.tag_literal.is_some())
    }
}

/// All declarations found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    /// Declarations in document order.
    pub structs: Vec<TaggedStruct>,
}

impl SourceFile {
    /// Returns the declaration whose range contains `offset`, if any.
    #[must_use]
    pub fn struct_at(&self, offset: TextSize) -> Option<&TaggedStruct> {
        self.structs
            .iter()
            .find(|decl| decl.range.contains_inclusive(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_offset_roundtrip() {
        let text = "abc\ndef\n";
        let pos = Position::new(1, 2);
        let offset = pos.offset_in(text).expect("offset");
        assert_eq!(usize::from(offset), 6);
        assert_eq!(position_at(text, offset), pos);
    }

    #[test]
    fn position_past_line_end_is_none() {
        let text = "abc\ndef";
        assert!(Position::new(0, 4).offset_in(text).is_none());
        assert!(Position::new(2, 0).offset_in(text).is_none());
        // End of line is a valid cursor position.
        assert!(Position::new(0, 3).offset_in(text).is_some());
    }

    #[test]
    fn header_comment_markers() {
        let header = HeaderComment::parse(&[
            "// Stats table for the leaderboard.",
            "// @url: https://example.com/stats",
            "// @ignore-elements: script, style , img",
        ]);
        assert_eq!(header.url(), Some("https://example.com/stats"));
        assert_eq!(header.ignore_elements, vec!["script", "style", "img"]);
    }

    #[test]
    fn header_comment_without_markers_is_empty() {
        let header = HeaderComment::parse(&["// just prose"]);
        assert_eq!(header.url(), None);
        assert!(header.ignore_elements.is_empty());
    }
}
