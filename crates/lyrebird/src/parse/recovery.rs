//! Error recovery.
//!
//! Three tiers, all disabled while backtracking:
//! - single-token repair inside `consume`: fabricate the expected token
//!   (insertion) or discard one unexpected token (deletion)
//! - in-repetition re-sync: after a repetition stops early, skip ahead
//!   to the terminal expected after the construct, or re-enter the
//!   repetition if its lookahead fires again
//! - between-rules re-sync in the rule wrapper: skip to a token in the
//!   flattened FOLLOW stack and yield the rule's recovery value
//!
//! Every repair records exactly one recognition error; skipped tokens
//! travel on the error as `resynced_tokens`.

use log::debug;

use lyrebird_core::grammar::DslKind;
use lyrebird_core::tokens::{Token, TokenType};

use super::Parser;
use super::error::ParseResult;
use crate::analyze::TokenTypeSet;
use crate::analyze::follow::follow_key;
use crate::analyze::walker;

impl<V: Default> Parser<V> {
    /// Single-token repair for a failed `consume`. Insertion is tried
    /// first: when LA(1) can legally follow the expected terminal within
    /// the current rule, the input merely omitted it. Deletion applies
    /// when dropping LA(1) makes the expected terminal line up.
    pub(crate) fn try_single_token_recovery(
        &mut self,
        expected: TokenType,
        occurrence: u32,
    ) -> Option<Token> {
        let follows = {
            let rule = self.analysis.rule(self.current_rule());
            walker::after_terminal(rule, expected, occurrence, &self.analysis.rules)
        };
        if follows.contains(&self.la_type(1)) {
            let err = self.mismatch_error(expected);
            self.errors.push(err);
            debug!(
                "inserted missing {} before '{}'",
                self.registry().label(expected),
                self.la(1).image
            );
            return Some(Token::invented(expected));
        }

        if self.la_type(2) == expected {
            let err = self.mismatch_error(expected);
            self.errors.push(err);
            let dropped = self.advance();
            debug!(
                "deleted unexpected '{}' before {}",
                dropped.image,
                self.registry().label(expected)
            );
            return Some(self.advance());
        }

        None
    }

    /// The union of the FOLLOW sets of every active rule invocation,
    /// bottom to top, with EOF as the terminal backstop.
    pub(crate) fn flattened_follow_set(&self) -> TokenTypeSet {
        let mut out = TokenTypeSet::new();
        out.insert(TokenType::EOF);
        for i in 1..self.rule_stack.len() {
            let caller = self.analysis.rule_name(self.rule_stack[i - 1]);
            let name = self.analysis.rule_name(self.rule_stack[i]);
            let key = follow_key(name, self.occurrence_stack[i], caller);
            if let Some(set) = self.analysis.follow(&key) {
                out.extend(set.iter().copied());
            }
        }
        out
    }

    /// Between-rules re-sync: skip input up to (not including) the first
    /// token that may follow one of the active rules, then record the
    /// error with the skipped tokens attached.
    pub(crate) fn resync_from_error(&mut self, mut err: super::RecognitionError) {
        let follow = self.flattened_follow_set();
        let mut skipped = Vec::new();
        while !follow.contains(&self.la_type(1)) {
            skipped.push(self.advance());
        }
        if !skipped.is_empty() {
            debug!(
                "re-synchronized rule `{}` by skipping {} tokens",
                self.current_rule_name(),
                skipped.len()
            );
        }
        err.resynced_tokens = skipped;
        self.errors.push(err);
    }

    /// Recovery after a repetition stopped early. `reenter` re-runs the
    /// repetition's iteration loop and returns how many extra iterations
    /// it completed.
    pub(crate) fn in_repetition_recovery(
        &mut self,
        kind: DslKind,
        occurrence: u32,
        reenter: &mut dyn FnMut(&mut Self) -> ParseResult<u32>,
    ) -> ParseResult<u32> {
        let expected = {
            let rule = self.analysis.rule(self.current_rule());
            walker::next_terminal_after(rule, kind, occurrence, &self.analysis.rules)
        };
        let Some(expected) = expected else {
            return Ok(0);
        };
        // Healthy exits need no repair.
        if self.la_type(1) == expected {
            return Ok(0);
        }
        let follow = self.flattened_follow_set();
        if follow.contains(&self.la_type(1)) {
            return Ok(0);
        }

        let start = self.snapshot();
        let first_bad = self.la(1).clone();
        let mut skipped = Vec::new();
        loop {
            if self.la_type(1) == expected {
                // The terminal after the construct showed up; report the
                // gap and let the enclosing consume match it.
                let mut err = self.mismatch_error_with(expected, first_bad);
                err.resynced_tokens = skipped;
                self.errors.push(err);
                return Ok(0);
            }
            let fires = self
                .decision(kind, occurrence)
                .should_enter(|n| self.la_type(n));
            if fires {
                let mut err = self.mismatch_error_with(expected, first_bad);
                err.resynced_tokens = skipped;
                self.errors.push(err);
                return reenter(self);
            }
            if self.la(1).is_eof() || follow.contains(&self.la_type(1)) {
                // Nothing recognizable ahead; undo and let the next
                // mismatch unwind to a re-syncing rule.
                self.restore(start);
                return Ok(0);
            }
            skipped.push(self.advance());
        }
    }
}
