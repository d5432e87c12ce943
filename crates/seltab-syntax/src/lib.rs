//! `seltab-syntax` - Lexer, declaration parser, and cursor classifier for
//! seltab-annotated source files.
//!
//! A seltab annotation is a backtick-delimited tag literal attached to a
//! struct field, whose values are CSS selectors describing how to pull
//! tabular data out of an HTML page:
//!
//! ```text
//! // @url: https://example.com/stats
//! // @ignore-elements: script, style
//! type Row struct {
//!     Name string `hSel:"table tr th" dSel:"table tr td"`
//! }
//! ```
//!
//! This crate provides the syntactic half of the language server:
//!
//! - **Lexer**: tokenizes source text with byte ranges (`logos`)
//! - **Parser**: extracts tagged struct declarations, fields, and tags,
//!   all carrying offsets into the original text
//! - **Classifier**: maps a cursor position to the lexical zone it occupies
//!
//! Everything here is pure and recomputed from the source text on every
//! call; nothing is cached between edits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod ast;
pub mod classify;
pub mod lexer;
pub mod parse;
pub mod roles;

pub use ast::{Field, HeaderComment, Position, SourceFile, Tag, TaggedStruct};
pub use classify::{classify, CursorZone, InvalidReason};
pub use lexer::{lex, Token, TokenKind};
pub use parse::parse;
pub use roles::{is_selector_role, selector_role_keys, SelectorRole, SELECTOR_ROLES};
