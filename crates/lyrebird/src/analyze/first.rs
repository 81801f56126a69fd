//! FIRST-set computation over resolved productions.

use indexmap::IndexSet;

use lyrebird_core::grammar::{Production, Rule, RuleId};

use super::{RuleArena, TokenTypeSet};

/// FIRST of a production or sequence: the terminals that can begin it,
/// and whether it can match without consuming anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirstSet {
    pub tokens: TokenTypeSet,
    pub nullable: bool,
}

impl FirstSet {
    pub(crate) fn empty() -> Self {
        Self {
            tokens: TokenTypeSet::new(),
            nullable: false,
        }
    }
}

pub(crate) fn rule_at(rules: &RuleArena, id: RuleId) -> &Rule {
    rules
        .get_index(id.as_usize())
        .map(|(_, rule)| rule)
        .unwrap_or_else(|| panic!("rule id {id:?} is out of bounds for this grammar"))
}

pub fn first_of_sequence(defs: &[Production], rules: &RuleArena) -> FirstSet {
    let mut visiting = IndexSet::new();
    sequence_first(defs, rules, &mut visiting)
}

pub fn first_of(prod: &Production, rules: &RuleArena) -> FirstSet {
    let mut visiting = IndexSet::new();
    production_first(prod, rules, &mut visiting)
}

fn sequence_first(
    defs: &[Production],
    rules: &RuleArena,
    visiting: &mut IndexSet<RuleId>,
) -> FirstSet {
    let mut out = FirstSet {
        tokens: TokenTypeSet::new(),
        nullable: true,
    };
    for prod in defs {
        let f = production_first(prod, rules, visiting);
        out.tokens.extend(f.tokens);
        if !f.nullable {
            out.nullable = false;
            break;
        }
    }
    out
}

fn production_first(
    prod: &Production,
    rules: &RuleArena,
    visiting: &mut IndexSet<RuleId>,
) -> FirstSet {
    match prod {
        Production::Flat { definition } => sequence_first(definition, rules, visiting),

        Production::Terminal { token_type, .. } => FirstSet {
            tokens: std::iter::once(*token_type).collect(),
            nullable: false,
        },

        Production::NonTerminal { resolved, .. } => match resolved {
            Some(id) => {
                // A rule already being expanded marks a cycle reachable
                // without consuming a terminal; validation reports it,
                // so contribute nothing here.
                if !visiting.insert(*id) {
                    return FirstSet::empty();
                }
                let f = sequence_first(&rule_at(rules, *id).definition, rules, visiting);
                visiting.swap_remove(id);
                f
            }
            None => FirstSet::empty(),
        },

        Production::Option { definition, .. }
        | Production::Repetition { definition, .. }
        | Production::RepetitionWithSeparator { definition, .. } => {
            let inner = sequence_first(definition, rules, visiting);
            FirstSet {
                tokens: inner.tokens,
                nullable: true,
            }
        }

        Production::RepetitionMandatory { definition, .. }
        | Production::RepetitionMandatoryWithSeparator { definition, .. } => {
            sequence_first(definition, rules, visiting)
        }

        Production::Alternation { alternatives, .. } => {
            let mut out = FirstSet::empty();
            for alt in alternatives {
                let f = sequence_first(alt, rules, visiting);
                out.tokens.extend(f.tokens);
                out.nullable |= f.nullable;
            }
            out
        }
    }
}

/// Whether a sequence can match without consuming any terminal.
pub fn sequence_nullable(defs: &[Production], rules: &RuleArena) -> bool {
    first_of_sequence(defs, rules).nullable
}
