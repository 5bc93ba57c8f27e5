//! Syntax layer for rgql.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization
//! - `ast`: Owned abstract syntax tree for executable documents
//! - `parser`: Recursive descent parser
//! - `error`: Syntax diagnostics

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::*;
pub use error::{SyntaxError, SyntaxErrors};
pub use lexer::Lexer;
pub use parser::{parse, ParseResult, Parser};
pub use span::Span;
pub use token::{Token, TokenKind};
