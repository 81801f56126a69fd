//! Recognition errors.
//!
//! These are ordinary values: combinators return them through `Result`
//! and the rule wrapper decides whether to repair (re-sync) or keep
//! unwinding. Every error carries the offending token and the rule-stack
//! context at the point of failure.

use serde::Serialize;

use lyrebird_core::tokens::{Token, TokenType};

/// Where in the grammar the failure happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorContext {
    pub rule_stack: Vec<String>,
    pub rule_occurrence_stack: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecognitionErrorKind {
    /// A specific terminal was expected, another token was found.
    MismatchedToken { expected: TokenType },
    /// No OR alternative matched the lookahead window.
    NoViableAlt,
    /// An AT_LEAST_ONE(_SEP) matched zero iterations.
    EarlyExit,
    /// The top rule succeeded but input remains.
    NotAllInputParsed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionError {
    pub kind: RecognitionErrorKind,
    pub message: String,
    pub token: Token,
    pub context: ErrorContext,
    /// Tokens discarded while re-synchronizing after this error.
    pub resynced_tokens: Vec<Token>,
}

impl std::fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RecognitionError {}

/// Result type of combinators and rule bodies.
///
/// Boxed so the success path stays lean; recognition errors are the
/// exceptional path by construction.
pub type ParseResult<T> = std::result::Result<T, Box<RecognitionError>>;
