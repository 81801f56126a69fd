//! "Next terminal after a production" walks used by error recovery.
//!
//! Both walks stay within the declaring rule: they step out of enclosing
//! combinators but never loop back into a repetition or cross into a
//! caller. That keeps single-token insertion conservative - a token is
//! only fabricated when the input genuinely looks like one token was
//! omitted from this rule's sequence.

use lyrebird_core::grammar::{DslKind, Production, Rule};
use lyrebird_core::tokens::TokenType;

use super::first::first_of_sequence;
use super::{RuleArena, TokenTypeSet};

enum Target {
    Terminal {
        token_type: TokenType,
        occurrence: u32,
    },
    Construct {
        kind: DslKind,
        occurrence: u32,
    },
}

/// Terminals that can appear right after `Terminal(token_type, occurrence)`
/// within `rule`. Empty when the terminal closes the rule.
pub(crate) fn after_terminal(
    rule: &Rule,
    token_type: TokenType,
    occurrence: u32,
    rules: &RuleArena,
) -> TokenTypeSet {
    let target = Target::Terminal {
        token_type,
        occurrence,
    };
    let mut continuations = Vec::new();
    if !find_continuations(&rule.definition, &target, &mut continuations) {
        return TokenTypeSet::new();
    }
    first_of_continuations(&continuations, rules)
}

/// The terminal expected right after a repetition construct, if the
/// continuation starts with one. Drives in-repetition re-sync.
pub(crate) fn next_terminal_after(
    rule: &Rule,
    kind: DslKind,
    occurrence: u32,
    rules: &RuleArena,
) -> Option<TokenType> {
    let target = Target::Construct { kind, occurrence };
    let mut continuations = Vec::new();
    if !find_continuations(&rule.definition, &target, &mut continuations) {
        return None;
    }
    first_of_continuations(&continuations, rules).first().copied()
}

fn matches_target(prod: &Production, target: &Target) -> bool {
    match target {
        Target::Terminal {
            token_type,
            occurrence,
        } => matches!(
            prod,
            Production::Terminal {
                token_type: tt,
                occurrence: occ,
            } if tt == token_type && occ == occurrence
        ),
        Target::Construct { kind, occurrence } => {
            prod.dsl_kind() == Some(*kind) && prod.occurrence() == Some(*occurrence)
        }
    }
}

/// Locate the target and record the rest-of-sequence slices from the
/// innermost enclosing sequence outwards.
fn find_continuations<'r>(
    defs: &'r [Production],
    target: &Target,
    out: &mut Vec<&'r [Production]>,
) -> bool {
    for (i, prod) in defs.iter().enumerate() {
        if matches_target(prod, target) {
            out.push(&defs[i + 1..]);
            return true;
        }
        let found_inside = match prod {
            Production::Alternation { alternatives, .. } => alternatives
                .iter()
                .any(|alt| find_continuations(alt, target, out)),
            _ => find_continuations(prod.children(), target, out),
        };
        if found_inside {
            out.push(&defs[i + 1..]);
            return true;
        }
    }
    false
}

fn first_of_continuations(continuations: &[&[Production]], rules: &RuleArena) -> TokenTypeSet {
    let mut out = TokenTypeSet::new();
    for slice in continuations {
        let f = first_of_sequence(slice, rules);
        out.extend(f.tokens);
        if !f.nullable {
            break;
        }
    }
    out
}
