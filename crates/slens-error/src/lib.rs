//! Error taxonomy and result envelope for SchemaLens statement parsing.
//!
//! Parsing never panics and never returns a half-built tree: an entry point
//! either yields its node or a [`ParseFailure`] carrying every
//! [`ParserError`] recorded before the hard stop. Failures keep the same
//! shape whether tokenization or parsing broke, so callers branch on
//! [`ErrorName`] rather than on which stage produced the error.
//!
//! [`ParserResult`] is a plain [`Result`], which is what makes staged
//! pipelines absorbing: `parse(sql).map(lower)` runs the lowering only on
//! success and forwards the failure untouched otherwise.

use serde::{Deserialize, Serialize};
use slens_ast::Span;
use std::fmt;
use thiserror::Error;

/// Alias used by every fallible parsing entry point.
pub type ParserResult<T> = Result<T, ParseFailure>;

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// Which recognition rule broke.
///
/// The four names partition every way a parse can fail: text the lexer
/// cannot tokenize, a single required token that mismatched, an alternation
/// where no branch applied, and input left over after a rule completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorName {
    LexingError,
    MismatchedToken,
    NoViableAlternative,
    RedundantInput,
}

impl ErrorName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LexingError => "LexingError",
            Self::MismatchedToken => "MismatchedToken",
            Self::NoViableAlternative => "NoViableAlternative",
            Self::RedundantInput => "RedundantInput",
        }
    }
}

impl fmt::Display for ErrorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much a diagnostic matters to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Hint => "hint",
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A single diagnostic: what failed, how severe it is, a human-readable
/// message, and the span of the offending text.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{name} at {position}: {message}")]
pub struct ParserError {
    pub name: ErrorName,
    pub kind: Severity,
    pub message: String,
    pub position: Span,
}

impl ParserError {
    #[must_use]
    pub fn new(
        name: ErrorName,
        kind: Severity,
        message: impl Into<String>,
        position: Span,
    ) -> Self {
        Self {
            name,
            kind,
            message: message.into(),
            position,
        }
    }

    /// Text the lexer could not turn into any token.
    #[must_use]
    pub fn lexing(message: impl Into<String>, position: Span) -> Self {
        Self::new(ErrorName::LexingError, Severity::Error, message, position)
    }

    /// A required token was something else.
    #[must_use]
    pub fn mismatched_token(message: impl Into<String>, position: Span) -> Self {
        Self::new(ErrorName::MismatchedToken, Severity::Error, message, position)
    }

    /// None of an alternation's branches matched.
    #[must_use]
    pub fn no_viable_alternative(message: impl Into<String>, position: Span) -> Self {
        Self::new(
            ErrorName::NoViableAlternative,
            Severity::Error,
            message,
            position,
        )
    }

    /// A rule finished but input remained.
    #[must_use]
    pub fn redundant_input(message: impl Into<String>, position: Span) -> Self {
        Self::new(ErrorName::RedundantInput, Severity::Error, message, position)
    }
}

/// Everything collected from one failed parse.
///
/// The list is never empty and keeps recording order; the first entry is
/// the error closest to the original cause. Alternations that tried and
/// rejected several branches may record one entry per branch before the
/// summarizing hard stop, so more than one entry per failure is normal.
/// The field stays private so [`ParseFailure::new`], [`ParseFailure::single`]
/// and the [`From`] conversion are the only ways to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseFailure {
    errors: Vec<ParserError>,
}

impl ParseFailure {
    /// Wraps already-collected diagnostics. Order is preserved.
    #[must_use]
    pub fn new(errors: Vec<ParserError>) -> Self {
        debug_assert!(!errors.is_empty(), "a parse failure carries at least one error");
        Self { errors }
    }

    #[must_use]
    pub fn single(error: ParserError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Every recorded diagnostic, in recording order.
    #[must_use]
    pub fn errors(&self) -> &[ParserError] {
        &self.errors
    }

    /// The diagnostic recorded first.
    #[must_use]
    pub fn first(&self) -> &ParserError {
        &self.errors[0]
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first())?;
        if self.errors.len() > 1 {
            write!(f, " (and {} more)", self.errors.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseFailure {}

impl From<ParserError> for ParseFailure {
    fn from(error: ParserError) -> Self {
        Self::single(error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
