//! Syntax diagnostics.

use crate::span::Span;
use miette::{Diagnostic, LabeledSpan};
use std::fmt;
use thiserror::Error;

/// Diagnostic codes for syntax errors.
pub mod codes {
    pub const UNEXPECTED_TOKEN: &str = "rgql::syntax::unexpected_token";
    pub const INVALID_TOKEN: &str = "rgql::syntax::invalid_token";
    pub const INVALID_SYNTAX: &str = "rgql::syntax::invalid_syntax";
    pub const INVALID_LITERAL: &str = "rgql::syntax::invalid_literal";
}

/// A single syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    pub label: Option<String>,
}

impl SyntaxError {
    pub fn new(code: &'static str, span: Span, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span,
            label: None,
        }
    }

    /// Sets the label text shown under the span.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Diagnostic for SyntaxError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = self.label.clone().unwrap_or_else(|| self.message.clone());
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(label),
            self.span,
        ))))
    }
}

/// All syntax errors found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrors {
    pub errors: Vec<SyntaxError>,
}

impl SyntaxErrors {
    /// Returns the first error.
    pub fn first(&self) -> Option<&SyntaxError> {
        self.errors.first()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for SyntaxErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("syntax error"),
            [only] => write!(f, "syntax error: {}", only.message),
            [first, rest @ ..] => write!(
                f,
                "syntax error: {} (and {} more)",
                first.message,
                rest.len()
            ),
        }
    }
}

impl std::error::Error for SyntaxErrors {}

impl Diagnostic for SyntaxErrors {
    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        Some(Box::new(self.errors.iter().map(|e| e as &dyn Diagnostic)))
    }
}
