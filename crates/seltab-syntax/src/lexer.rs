//! Lexer for seltab-annotated source files.
//!
//! The token set is deliberately small: the parser only needs to find
//! `type ... struct { ... }` declarations, their doc comments, and the
//! backtick tag literals attached to fields. Everything else is carried
//! through as punctuation or error tokens so lexing never fails.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// All token kinds the declaration scanner cares about.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Horizontal whitespace (spaces and tabs).
    #[regex(r"[ \t]+")]
    Whitespace,

    /// A line break. Kept distinct from whitespace because fields are
    /// line-oriented.
    #[regex(r"\r?\n")]
    Newline,

    /// Single-line comment: `// ...`
    #[regex(r"//[^\r\n]*", allow_greedy = true)]
    LineComment,

    /// Block comment: `/* ... */`
    #[regex(r"/\*([^*]|\*[^/])*\*/", allow_greedy = true)]
    BlockComment,

    /// The `type` keyword.
    #[token("type")]
    KwType,

    /// The `struct` keyword.
    #[token("struct")]
    KwStruct,

    /// An identifier.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// `{`
    #[token("{")]
    LBrace,

    /// `}`
    #[token("}")]
    RBrace,

    /// A backtick-delimited raw string: the tag literal. The closing
    /// backtick may be missing at end of input; the token then runs to
    /// the end of the line so an in-progress edit still lexes.
    #[regex(r"`[^`\r\n]*`?", allow_greedy = true)]
    RawString,

    /// A double-quoted string.
    #[regex(r#""([^"\\\r\n]|\\.)*"?"#, allow_greedy = true)]
    String,

    /// Any other single character (punctuation, operators, digits).
    #[regex(r".", priority = 0)]
    Punct,
}

/// A token with its byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The byte range of the token in the source text.
    pub range: TextRange,
}

impl Token {
    /// Returns the token's text within `source`.
    #[must_use]
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[usize::from(self.range.start())..usize::from(self.range.end())]
    }

    /// Returns true for whitespace and newlines.
    #[must_use]
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Newline)
    }
}

/// Tokenizes the entire source text.
///
/// Unrecognized input is folded into [`TokenKind::Punct`] tokens, so the
/// output always covers the whole text and lexing never fails.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(result) = lexer.next() {
        let kind = result.unwrap_or(TokenKind::Punct);
        let span = lexer.span();
        let range = TextRange::new(
            TextSize::from(span.start as u32),
            TextSize::from(span.end as u32),
        );
        tokens.push(Token { kind, range });
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .into_iter()
            .filter(|token| !token.is_trivia())
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lexes_struct_declaration() {
        let source = "type Row struct {\n\tA string `dSel:\"td\"`\n}\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::KwType,
                TokenKind::Ident,
                TokenKind::KwStruct,
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::RawString,
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn raw_string_spans_tag_literal() {
        let source = "`hSel:\"tr th\" dSel:\"tr td\"`";
        let tokens = lex(source);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::RawString);
        assert_eq!(tokens[0].text(source), source);
    }

    #[test]
    fn unterminated_raw_string_stops_at_line_end() {
        let source = "`dSel:\"td\n}";
        let tokens = lex(source);
        assert_eq!(tokens[0].kind, TokenKind::RawString);
        assert_eq!(tokens[0].text(source), "`dSel:\"td");
    }

    #[test]
    fn comments_and_punctuation_survive() {
        let source = "// @url: https://example.com\ntype T struct {}\n// trailing\n";
        let comment_count = lex(source)
            .iter()
            .filter(|token| token.kind == TokenKind::LineComment)
            .count();
        assert_eq!(comment_count, 2);
    }

    #[test]
    fn lexing_covers_every_byte() {
        let source = "type X struct { A []*foo.Bar `k:\"v\"` }";
        let tokens = lex(source);
        let mut offset = TextSize::from(0);
        for token in &tokens {
            assert_eq!(token.range.start(), offset);
            offset = token.range.end();
        }
        assert_eq!(offset, TextSize::of(source));
    }
}
