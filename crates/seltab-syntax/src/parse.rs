//! Declaration scanner.
//!
//! Walks the token stream and collects `type Name struct { ... }` blocks
//! together with their doc comments and field tag literals. The scanner is
//! error-tolerant: malformed regions contribute no declarations instead of
//! failing the whole document, so an in-progress edit still parses.

use text_size::{TextRange, TextSize};

use crate::ast::{position_at, Field, HeaderComment, SourceFile, Tag, TaggedStruct};
use crate::lexer::{lex, Token, TokenKind};

/// Parses every tagged declaration out of `text`.
#[must_use]
pub fn parse(text: &str) -> SourceFile {
    Parser::new(text).run()
}

struct Parser<'src> {
    text: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(text: &'src str) -> Self {
        Self {
            text,
            tokens: lex(text),
            pos: 0,
        }
    }

    fn run(mut self) -> SourceFile {
        let mut file = SourceFile::default();
        let mut pending_comments: Vec<TextRange> = Vec::new();
        let mut newlines_since_comment = 0u32;

        while let Some(token) = self.tokens.get(self.pos).copied() {
            match token.kind {
                TokenKind::LineComment => {
                    if newlines_since_comment >= 2 {
                        pending_comments.clear();
                    }
                    pending_comments.push(token.range);
                    newlines_since_comment = 0;
                    self.pos += 1;
                }
                TokenKind::Newline => {
                    newlines_since_comment += 1;
                    self.pos += 1;
                }
                TokenKind::Whitespace => {
                    self.pos += 1;
                }
                TokenKind::KwType => {
                    let doc = if newlines_since_comment >= 2 {
                        Vec::new()
                    } else {
                        std::mem::take(&mut pending_comments)
                    };
                    if let Some(decl) = self.struct_decl(token.range.start(), &doc) {
                        file.structs.push(decl);
                    }
                    pending_comments.clear();
                    newlines_since_comment = 0;
                }
                _ => {
                    pending_comments.clear();
                    newlines_since_comment = 0;
                    self.pos += 1;
                }
            }
        }
        file
    }

    /// Parses one declaration starting at the `type` keyword. Returns
    /// `None` when the shape is not `type Ident struct {`.
    fn struct_decl(&mut self, start: TextSize, doc: &[TextRange]) -> Option<TaggedStruct> {
        self.pos += 1; // past `type`
        let name = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::KwStruct)?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        let mut end = self.prev_end(start);
        loop {
            self.skip_trivia_and_comments();
            match self.tokens.get(self.pos).copied() {
                None => break,
                Some(token) if token.kind == TokenKind::RBrace => {
                    end = token.range.end();
                    self.pos += 1;
                    break;
                }
                Some(token) if token.kind == TokenKind::Ident => {
                    let field = self.field(token);
                    end = field.range.end();
                    fields.push(field);
                }
                Some(_) => {
                    // Not a field start; resynchronize at the next line.
                    self.skip_to_newline();
                }
            }
        }

        let doc_lines: Vec<&str> = doc.iter().map(|range| slice(self.text, *range)).collect();
        Some(TaggedStruct {
            name: name.text(self.text).to_string(),
            range: TextRange::new(start, end),
            header: HeaderComment::parse(&doc_lines),
            fields,
        })
    }

    fn field(&mut self, name: Token) -> Field {
        self.pos += 1; // past the name
        let mut type_start: Option<TextSize> = None;
        let mut type_end = name.range.end();
        let mut tag_literal = None;
        let mut tags = Vec::new();
        let mut end = name.range.end();

        while let Some(token) = self.tokens.get(self.pos).copied() {
            match token.kind {
                TokenKind::Newline | TokenKind::RBrace => break,
                TokenKind::RawString => {
                    tag_literal = Some(token.range);
                    tags = parse_tag_literal(self.text, token.range);
                    end = token.range.end();
                    self.pos += 1;
                    break;
                }
                TokenKind::Whitespace | TokenKind::LineComment => {
                    self.pos += 1;
                }
                _ => {
                    type_start.get_or_insert(token.range.start());
                    type_end = token.range.end();
                    end = token.range.end();
                    self.pos += 1;
                }
            }
        }

        let type_name = match type_start {
            Some(start) => slice(self.text, TextRange::new(start, type_end))
                .trim()
                .to_string(),
            None => String::new(),
        };
        Field {
            name: name.text(self.text).to_string(),
            type_name,
            line: position_at(self.text, name.range.start()).line,
            range: TextRange::new(name.range.start(), end),
            tag_literal,
            tags,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        self.skip_trivia();
        let token = self.tokens.get(self.pos).copied()?;
        if token.kind == kind {
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if token.is_trivia() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn skip_trivia_and_comments(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment => self.pos += 1,
                _ => break,
            }
        }
    }

    fn skip_to_newline(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            let kind = token.kind;
            self.pos += 1;
            if kind == TokenKind::Newline {
                break;
            }
        }
    }

    fn prev_end(&self, fallback: TextSize) -> TextSize {
        self.pos
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or(fallback, |token| token.range.end())
    }
}

/// Parses `key:"value"` pairs out of a backtick literal.
///
/// `literal` is the token range including the backticks. Offsets on the
/// returned tags are absolute document offsets.
fn parse_tag_literal(text: &str, literal: TextRange) -> Vec<Tag> {
    let raw = slice(text, literal);
    let content = raw
        .strip_prefix('`')
        .map_or(raw, |rest| rest.strip_suffix('`').unwrap_or(rest));
    let base = usize::from(literal.start()) + 1;

    let bytes = content.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b':' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_end = i;
        if i >= bytes.len() || bytes[i] != b':' || key_end == key_start {
            // Malformed pair; resynchronize at the next whitespace run.
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            continue;
        }
        i += 1; // past ':'
        if i >= bytes.len() || bytes[i] != b'"' {
            continue;
        }
        i += 1; // past opening quote
        let value_start = i;
        while i < bytes.len() && bytes[i] != b'"' {
            i += 1;
        }
        let value_end = i;
        if i < bytes.len() {
            i += 1; // past closing quote
        }
        tags.push(Tag {
            key: content[key_start..key_end].to_string(),
            value: content[value_start..value_end].to_string(),
            key_range: range_at(base + key_start, base + key_end),
            value_range: range_at(base + value_start, base + value_end),
        });
    }
    tags
}

fn range_at(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32))
}

fn slice(text: &str, range: TextRange) -> &str {
    &text[usize::from(range.start())..usize::from(range.end())]
}
