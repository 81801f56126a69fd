//! The grammar combinator primitives.
//!
//! Every primitive takes its occurrence index (1..=5, a call-site
//! constant) first; the index pairs the call with the production of the
//! same kind and occurrence in the rule's declaration, because both key
//! the same precomputed decision table.

use lyrebird_core::grammar::{DslKind, RuleId};
use lyrebird_core::tokens::{Token, TokenType};

use super::error::ParseResult;
use super::Parser;

/// One alternative of an [`Parser::or`] call: a body closure plus an
/// optional semantic gate. The gate must hold in addition to the
/// lookahead match; a vetoed alternative falls through to the next
/// matching one.
pub struct OrAlt<'a, V, T> {
    pub(crate) gate: Option<&'a dyn Fn(&Parser<V>) -> bool>,
    pub(crate) body: &'a mut dyn FnMut(&mut Parser<V>) -> ParseResult<T>,
}

impl<'a, V, T> OrAlt<'a, V, T> {
    pub fn new(body: &'a mut dyn FnMut(&mut Parser<V>) -> ParseResult<T>) -> Self {
        Self { gate: None, body }
    }

    pub fn when(
        gate: &'a dyn Fn(&Parser<V>) -> bool,
        body: &'a mut dyn FnMut(&mut Parser<V>) -> ParseResult<T>,
    ) -> Self {
        Self {
            gate: Some(gate),
            body,
        }
    }
}

impl<V: Default> Parser<V> {
    /// Match one terminal. On mismatch, single-token repair is attempted
    /// when recovery is on (and not backtracking); otherwise the
    /// mismatch unwinds to the nearest re-syncing rule.
    pub fn consume(&mut self, occurrence: u32, token_type: TokenType) -> ParseResult<Token> {
        if self.la_type(1) == token_type {
            return Ok(self.advance());
        }
        if self.recovery_enabled && !self.is_backtracking()
            && let Some(repaired) = self.try_single_token_recovery(token_type, occurrence)
        {
            return Ok(repaired);
        }
        Err(Box::new(self.mismatch_error(token_type)))
    }

    /// Invoke another rule through the rule wrapper.
    pub fn subrule(&mut self, occurrence: u32, rule: RuleId) -> ParseResult<V> {
        self.invoke_rule(rule, occurrence)
    }

    /// Run `action` once if the lookahead says the optional part is
    /// present. Returns the action's value, or `None` when skipped.
    pub fn option<T>(
        &mut self,
        occurrence: u32,
        action: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Option<T>> {
        self.option_when(occurrence, |_| true, action)
    }

    pub fn option_when<T>(
        &mut self,
        occurrence: u32,
        gate: impl Fn(&Self) -> bool,
        mut action: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Option<T>> {
        let enter = self
            .decision(DslKind::Option, occurrence)
            .should_enter(|n| self.la_type(n));
        if enter && gate(self) {
            return action(self).map(Some);
        }
        Ok(None)
    }

    /// Pick the first alternative whose lookahead paths match LA(1..k)
    /// and whose gate (if any) holds.
    pub fn or<T>(
        &mut self,
        occurrence: u32,
        alternatives: &mut [OrAlt<'_, V, T>],
        err_msg: Option<&str>,
    ) -> ParseResult<T> {
        for i in 0..alternatives.len() {
            let matches = self
                .decision(DslKind::Or, occurrence)
                .alt_matches(i, |n| self.la_type(n));
            if !matches {
                continue;
            }
            if let Some(gate) = alternatives[i].gate
                && !gate(self)
            {
                continue;
            }
            return (alternatives[i].body)(self);
        }
        Err(Box::new(self.no_viable_alt_error(err_msg)))
    }

    /// Zero or more. Returns the iteration count.
    pub fn many(
        &mut self,
        occurrence: u32,
        action: impl FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<u32> {
        self.many_when(occurrence, |_| true, action)
    }

    pub fn many_when(
        &mut self,
        occurrence: u32,
        gate: impl Fn(&Self) -> bool,
        mut action: impl FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<u32> {
        let mut count = self.repetition_loop(DslKind::Many, occurrence, &gate, &mut action)?;
        if self.recovery_enabled && !self.is_backtracking() {
            count += self.in_repetition_recovery(DslKind::Many, occurrence, &mut |p| {
                p.repetition_loop(DslKind::Many, occurrence, &|_| true, &mut action)
            })?;
        }
        Ok(count)
    }

    /// Zero or more, separated. The separator is consumed internally.
    pub fn many_sep(
        &mut self,
        occurrence: u32,
        separator: TokenType,
        mut action: impl FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<u32> {
        let mut count = 0;
        let enter = self
            .decision(DslKind::ManySep, occurrence)
            .should_enter(|n| self.la_type(n));
        if enter {
            action(self)?;
            count = 1;
            count += self.separated_tail(separator, &mut action)?;
        }
        if self.recovery_enabled && !self.is_backtracking() {
            count += self.in_repetition_recovery(DslKind::ManySep, occurrence, &mut |p| {
                action(p)?;
                let tail = p.separated_tail(separator, &mut action)?;
                Ok(tail + 1)
            })?;
        }
        Ok(count)
    }

    /// One or more; zero iterations is an `EarlyExit` recognition error.
    pub fn at_least_one(
        &mut self,
        occurrence: u32,
        action: impl FnMut(&mut Self) -> ParseResult<()>,
        err_msg: Option<&str>,
    ) -> ParseResult<u32> {
        self.at_least_one_when(occurrence, |_| true, action, err_msg)
    }

    pub fn at_least_one_when(
        &mut self,
        occurrence: u32,
        gate: impl Fn(&Self) -> bool,
        mut action: impl FnMut(&mut Self) -> ParseResult<()>,
        err_msg: Option<&str>,
    ) -> ParseResult<u32> {
        let mut count =
            self.repetition_loop(DslKind::AtLeastOne, occurrence, &gate, &mut action)?;
        if count == 0 {
            return Err(Box::new(self.early_exit_error(err_msg)));
        }
        if self.recovery_enabled && !self.is_backtracking() {
            count += self.in_repetition_recovery(DslKind::AtLeastOne, occurrence, &mut |p| {
                p.repetition_loop(DslKind::AtLeastOne, occurrence, &|_| true, &mut action)
            })?;
        }
        Ok(count)
    }

    /// One or more, separated; zero iterations is an `EarlyExit`.
    pub fn at_least_one_sep(
        &mut self,
        occurrence: u32,
        separator: TokenType,
        mut action: impl FnMut(&mut Self) -> ParseResult<()>,
        err_msg: Option<&str>,
    ) -> ParseResult<u32> {
        let enter = self
            .decision(DslKind::AtLeastOneSep, occurrence)
            .should_enter(|n| self.la_type(n));
        if !enter {
            return Err(Box::new(self.early_exit_error(err_msg)));
        }
        action(self)?;
        let mut count = 1 + self.separated_tail(separator, &mut action)?;
        if self.recovery_enabled && !self.is_backtracking() {
            count += self.in_repetition_recovery(DslKind::AtLeastOneSep, occurrence, &mut |p| {
                action(p)?;
                let tail = p.separated_tail(separator, &mut action)?;
                Ok(tail + 1)
            })?;
        }
        Ok(count)
    }

    /// Speculatively run `rule`; restore all state afterwards. Returns
    /// whether the rule matched and `is_valid` accepted its value. All
    /// recovery is off while speculating.
    pub fn backtrack(&mut self, rule: RuleId, is_valid: impl FnOnce(&V) -> bool) -> bool {
        self.enter_backtracking();
        let snapshot = self.snapshot();
        let outcome = self.invoke_rule(rule, 1);
        let ok = match &outcome {
            Ok(value) => is_valid(value),
            Err(_) => false,
        };
        self.restore(snapshot);
        self.exit_backtracking();
        ok
    }

    fn repetition_loop(
        &mut self,
        kind: DslKind,
        occurrence: u32,
        gate: &dyn Fn(&Self) -> bool,
        action: &mut dyn FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<u32> {
        let mut count = 0;
        loop {
            let enter = self
                .decision(kind, occurrence)
                .should_enter(|n| self.la_type(n));
            if !enter || !gate(self) {
                break;
            }
            let before = self.pos;
            action(self)?;
            count += 1;
            // An iteration that consumed nothing would never stop.
            if self.pos == before {
                break;
            }
        }
        Ok(count)
    }

    fn separated_tail(
        &mut self,
        separator: TokenType,
        action: &mut dyn FnMut(&mut Self) -> ParseResult<()>,
    ) -> ParseResult<u32> {
        let mut count = 0;
        while self.la_type(1) == separator {
            self.advance();
            action(self)?;
            count += 1;
        }
        Ok(count)
    }
}
