//! Parser runtime: instance state, token access, rule invocation.
//!
//! This module contains the `Parser` struct and its foundational
//! operations:
//! - token lookahead (`la`, `la_type`) and consumption
//! - the rule wrapper state machine (enter, run, repair, exit)
//! - backtracking snapshots, restored on every exit path
//!
//! The combinator primitives live in `combinators`, the recovery
//! algorithms in `recovery`.

mod combinators;
mod error;
mod recovery;

#[cfg(test)]
mod tests;

use std::rc::Rc;
use std::sync::Arc;

use lyrebird_core::grammar::{DslKind, RuleId};
use lyrebird_core::tokens::{Token, TokenRegistry, TokenType};

use crate::analyze;
use crate::analyze::lookahead::{DecisionTable, decision_key};
use crate::cache::{self, AnalysisEntry};
use crate::define::Grammar;
use crate::errors::DefinitionErrors;

pub use combinators::OrAlt;
pub use error::{ErrorContext, ParseResult, RecognitionError, RecognitionErrorKind};

/// One parser instance: a grammar handle plus per-parse runtime state.
///
/// Instances are cheap; the expensive part (self-analysis) runs once per
/// grammar class and is shared through the process-wide cache. A parser
/// is single-threaded and not reentrant.
pub struct Parser<V> {
    grammar: Rc<Grammar<V>>,
    analysis: Arc<AnalysisEntry>,
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
    errors: Vec<RecognitionError>,
    rule_stack: Vec<RuleId>,
    occurrence_stack: Vec<u32>,
    backtracking_depth: u32,
    recovery_enabled: bool,
}

/// O(1) state checkpoint for backtracking.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Snapshot {
    pos: usize,
    error_count: usize,
    rule_depth: usize,
}

impl<V> Parser<V> {
    /// Construct an instance, running self-analysis if this is the first
    /// instance of the grammar class.
    pub fn new(grammar: Rc<Grammar<V>>, tokens: Vec<Token>) -> crate::Result<Self> {
        if grammar.name().is_empty() {
            return Err(crate::Error::AnonymousGrammar);
        }
        let analysis = cache::analysis_for(grammar.name(), || {
            analyze::run(grammar.view(), grammar.config())
        });
        if !analysis.errors.is_empty() && !grammar.config().defer_definition_errors {
            return Err(crate::Error::InvalidGrammar {
                name: grammar.name().to_owned(),
                errors: analysis.errors.clone(),
            });
        }
        let recovery_enabled = grammar.config().recovery_enabled;
        Ok(Self {
            grammar,
            analysis,
            tokens,
            pos: 0,
            eof: Token::eof(),
            errors: Vec::new(),
            rule_stack: Vec::new(),
            occurrence_stack: Vec::new(),
            backtracking_depth: 0,
            recovery_enabled,
        })
    }

    /// Recognition errors accumulated by the current parse.
    pub fn errors(&self) -> &[RecognitionError] {
        &self.errors
    }

    /// Definition errors of the grammar class (non-empty only when
    /// `defer_definition_errors` let construction proceed).
    pub fn definition_errors(&self) -> &DefinitionErrors {
        &self.analysis.errors
    }

    /// Reuse the instance for a new token sequence.
    pub fn reset(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
        self.pos = 0;
        self.errors.clear();
        self.rule_stack.clear();
        self.occurrence_stack.clear();
        self.backtracking_depth = 0;
    }

    pub fn registry(&self) -> &TokenRegistry {
        self.grammar.registry()
    }

    /// Lookahead, 1-based. Positions beyond the input are EOF.
    pub fn la(&self, n: u32) -> &Token {
        debug_assert!(n >= 1, "lookahead is 1-based");
        self.tokens
            .get(self.pos + (n as usize - 1))
            .unwrap_or(&self.eof)
    }

    pub fn la_type(&self, n: u32) -> TokenType {
        self.la(n).token_type
    }

    pub fn is_backtracking(&self) -> bool {
        self.backtracking_depth > 0
    }

    pub(crate) fn enter_backtracking(&mut self) {
        self.backtracking_depth += 1;
    }

    pub(crate) fn exit_backtracking(&mut self) {
        self.backtracking_depth = self.backtracking_depth.saturating_sub(1);
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.la(1).clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn current_rule(&self) -> RuleId {
        *self
            .rule_stack
            .last()
            .unwrap_or_else(|| panic!("combinator called outside of a rule invocation"))
    }

    pub(crate) fn current_rule_name(&self) -> &str {
        self.analysis.rule_name(self.current_rule())
    }

    /// The decision table for a construct of the current rule.
    ///
    /// # Panics
    /// Panics when no such construct exists in the rule's declaration;
    /// that means the body and the declaration are out of sync.
    pub(crate) fn decision(&self, kind: DslKind, occurrence: u32) -> &DecisionTable {
        let rule_name = self.current_rule_name();
        let key = decision_key(kind, occurrence, rule_name);
        self.analysis.decision(&key).unwrap_or_else(|| {
            panic!(
                "rule `{rule_name}`: no {kind} with occurrence {occurrence} in the grammar \
                 declaration (body and declaration are out of sync)"
            )
        })
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            error_count: self.errors.len(),
            rule_depth: self.rule_stack.len(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.errors.truncate(snapshot.error_count);
        self.rule_stack.truncate(snapshot.rule_depth);
        self.occurrence_stack.truncate(snapshot.rule_depth);
    }

    pub(crate) fn context(&self) -> ErrorContext {
        ErrorContext {
            rule_stack: self
                .rule_stack
                .iter()
                .map(|id| self.analysis.rule_name(*id).to_owned())
                .collect(),
            rule_occurrence_stack: self.occurrence_stack.clone(),
        }
    }

    fn token_display(token: &Token) -> String {
        if token.is_eof() {
            "<end of input>".to_owned()
        } else {
            format!("'{}'", token.image)
        }
    }

    pub(crate) fn mismatch_error_with(
        &self,
        expected: TokenType,
        token: Token,
    ) -> RecognitionError {
        RecognitionError {
            kind: RecognitionErrorKind::MismatchedToken { expected },
            message: format!(
                "expecting {} but found {}",
                self.registry().label(expected),
                Self::token_display(&token)
            ),
            token,
            context: self.context(),
            resynced_tokens: Vec::new(),
        }
    }

    pub(crate) fn mismatch_error(&self, expected: TokenType) -> RecognitionError {
        self.mismatch_error_with(expected, self.la(1).clone())
    }

    pub(crate) fn no_viable_alt_error(&self, err_msg: Option<&str>) -> RecognitionError {
        let token = self.la(1).clone();
        let message = match err_msg {
            Some(msg) => msg.to_owned(),
            None => format!(
                "none of the alternatives matched, found {}",
                Self::token_display(&token)
            ),
        };
        RecognitionError {
            kind: RecognitionErrorKind::NoViableAlt,
            message,
            token,
            context: self.context(),
            resynced_tokens: Vec::new(),
        }
    }

    pub(crate) fn early_exit_error(&self, err_msg: Option<&str>) -> RecognitionError {
        let token = self.la(1).clone();
        let message = match err_msg {
            Some(msg) => msg.to_owned(),
            None => format!(
                "expecting at least one iteration, found {}",
                Self::token_display(&token)
            ),
        };
        RecognitionError {
            kind: RecognitionErrorKind::EarlyExit,
            message,
            token,
            context: self.context(),
            resynced_tokens: Vec::new(),
        }
    }
}

impl<V: Default> Parser<V> {
    /// Parse the input starting from `rule`.
    ///
    /// With recovery enabled this never returns a recognition error from
    /// the entry rule: failures are repaired or recorded and the rule's
    /// recovery value is returned. With recovery disabled the first
    /// recognition error aborts the parse and is also recorded in
    /// [`Self::errors`].
    pub fn parse(&mut self, rule: RuleId) -> ParseResult<V> {
        let result = self.invoke_rule(rule, 1);
        if let Err(err) = &result {
            self.errors.push((**err).clone());
        }
        result
    }

    /// The rule wrapper: push the stacks, run the body, repair by
    /// re-sync when allowed, pop on every exit path.
    pub(crate) fn invoke_rule(&mut self, rule: RuleId, occurrence: u32) -> ParseResult<V> {
        let is_top = self.rule_stack.is_empty();
        self.rule_stack.push(rule);
        self.occurrence_stack.push(occurrence);

        let body = self.grammar.body(rule);
        let result = match (body.as_ref())(self) {
            Ok(value) => Ok(value),
            Err(err) if self.resync_allowed(rule, is_top) => {
                self.resync_from_error(*err);
                Ok(self.recovery_value(rule))
            }
            Err(err) => Err(err),
        };

        self.rule_stack.pop();
        self.occurrence_stack.pop();

        if self.rule_stack.is_empty()
            && result.is_ok()
            && !self.is_backtracking()
            && !self.la(1).is_eof()
        {
            let token = self.la(1).clone();
            let message = format!(
                "redundant input, expecting end of input but found {}",
                Self::token_display(&token)
            );
            self.errors.push(RecognitionError {
                kind: RecognitionErrorKind::NotAllInputParsed,
                message,
                token,
                context: self.context(),
                resynced_tokens: Vec::new(),
            });
        }
        result
    }

    fn resync_allowed(&self, rule: RuleId, is_top: bool) -> bool {
        self.recovery_enabled
            && !self.is_backtracking()
            && (is_top || self.grammar.decl(rule).config.resync_enabled)
    }

    fn recovery_value(&self, rule: RuleId) -> V {
        match &self.grammar.decl(rule).config.recovery_value {
            Some(make) => (make.as_ref())(),
            None => V::default(),
        }
    }
}
