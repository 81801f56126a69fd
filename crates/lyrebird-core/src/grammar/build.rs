//! Constructor helpers for grammar definitions.
//!
//! Names mirror the runtime DSL, so a rule's declaration reads like its
//! body: `consume(1, comma)` in the declaration pairs with
//! `p.consume(1, comma)` in the body.

use super::{Production, Rule};
use crate::tokens::TokenType;

pub fn rule(name: impl Into<String>, definition: Vec<Production>) -> Rule {
    Rule::new(name, definition)
}

pub fn consume(occurrence: u32, token_type: TokenType) -> Production {
    Production::Terminal {
        token_type,
        occurrence,
    }
}

pub fn subrule(occurrence: u32, name: impl Into<String>) -> Production {
    Production::NonTerminal {
        name: name.into(),
        occurrence,
        resolved: None,
    }
}

pub fn option(occurrence: u32, definition: Vec<Production>) -> Production {
    Production::Option {
        definition,
        occurrence,
    }
}

pub fn many(occurrence: u32, definition: Vec<Production>) -> Production {
    Production::Repetition {
        definition,
        occurrence,
    }
}

pub fn many_sep(occurrence: u32, separator: TokenType, definition: Vec<Production>) -> Production {
    Production::RepetitionWithSeparator {
        definition,
        separator,
        occurrence,
    }
}

pub fn at_least_one(occurrence: u32, definition: Vec<Production>) -> Production {
    Production::RepetitionMandatory {
        definition,
        occurrence,
    }
}

pub fn at_least_one_sep(
    occurrence: u32,
    separator: TokenType,
    definition: Vec<Production>,
) -> Production {
    Production::RepetitionMandatoryWithSeparator {
        definition,
        separator,
        occurrence,
    }
}

pub fn or(occurrence: u32, alternatives: Vec<Vec<Production>>) -> Production {
    Production::Alternation {
        alternatives,
        occurrence,
    }
}

pub fn flat(definition: Vec<Production>) -> Production {
    Production::Flat { definition }
}
