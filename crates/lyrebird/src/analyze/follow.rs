//! Re-sync FOLLOW sets.
//!
//! For each rule reference occurrence, the set of terminals that may
//! immediately follow a successful match of that occurrence inside its
//! caller. The runtime flattens these along the active rule stack to
//! find re-synchronization points after a recognition error.
//!
//! Keys are `"<ruleName><occurrence>IN<callingRuleName>"`; the
//! [`EOF_FOLLOW_KEY`] sentinel holds the FOLLOW of entry rules, which is
//! always `{EOF}`.

use indexmap::{IndexMap, IndexSet};

use lyrebird_core::grammar::Production;
use lyrebird_core::tokens::TokenType;

use super::first::first_of_sequence;
use super::{RuleArena, TokenTypeSet};

/// Sentinel key for the FOLLOW of the parse entry point.
pub const EOF_FOLLOW_KEY: &str = "$$EOF_FOLLOW$$";

/// Key of the FOLLOW set for one rule-reference occurrence.
pub fn follow_key(rule: &str, occurrence: u32, caller: &str) -> String {
    format!("{rule}{occurrence}IN{caller}")
}

/// Continuation of a position: the terminals that can come next within
/// the enclosing contexts, and whether the continuation can reach the
/// end of the rule (so the caller's rule-level FOLLOW applies too).
#[derive(Clone)]
struct Cont {
    tokens: TokenTypeSet,
    open: bool,
}

pub(crate) fn compute(rules: &RuleArena) -> IndexMap<String, TokenTypeSet> {
    let mut referenced: IndexSet<String> = IndexSet::new();
    for rule in rules.values() {
        collect_references(&rule.definition, &mut referenced);
    }

    // Rule-level FOLLOW, seeded with EOF for entry rules (rules no other
    // rule references).
    let mut rule_follow: IndexMap<String, TokenTypeSet> = rules
        .keys()
        .map(|name| {
            let mut set = TokenTypeSet::new();
            if !referenced.contains(name) {
                set.insert(TokenType::EOF);
            }
            (name.clone(), set)
        })
        .collect();

    let mut occ_follow: IndexMap<String, TokenTypeSet> = IndexMap::new();

    // Fixpoint: occurrence FOLLOWs feed rule-level FOLLOWs, which feed
    // back into occurrences whose continuation is nullable.
    loop {
        let mut ctx = FollowCtx {
            rules,
            rule_follow: &mut rule_follow,
            occ_follow: &mut occ_follow,
            changed: false,
        };
        for rule in rules.values() {
            let tail = Cont {
                tokens: TokenTypeSet::new(),
                open: true,
            };
            ctx.walk_sequence(rule.name.as_str(), &rule.definition, &tail);
        }
        if !ctx.changed {
            break;
        }
    }

    occ_follow.insert(
        EOF_FOLLOW_KEY.to_owned(),
        std::iter::once(TokenType::EOF).collect(),
    );
    occ_follow
}

fn collect_references(defs: &[Production], out: &mut IndexSet<String>) {
    for prod in defs {
        match prod {
            Production::NonTerminal { name, .. } => {
                out.insert(name.clone());
            }
            Production::Alternation { alternatives, .. } => {
                for alt in alternatives {
                    collect_references(alt, out);
                }
            }
            _ => collect_references(prod.children(), out),
        }
    }
}

struct FollowCtx<'a> {
    rules: &'a RuleArena,
    rule_follow: &'a mut IndexMap<String, TokenTypeSet>,
    occ_follow: &'a mut IndexMap<String, TokenTypeSet>,
    changed: bool,
}

impl FollowCtx<'_> {
    fn walk_sequence(&mut self, caller: &str, defs: &[Production], tail: &Cont) {
        for (i, prod) in defs.iter().enumerate() {
            let suffix = first_of_sequence(&defs[i + 1..], self.rules);
            let mut cont = Cont {
                tokens: suffix.tokens,
                open: false,
            };
            if suffix.nullable {
                cont.tokens.extend(tail.tokens.iter().copied());
                cont.open = tail.open;
            }
            self.walk_production(caller, prod, &cont);
        }
    }

    fn walk_production(&mut self, caller: &str, prod: &Production, cont: &Cont) {
        match prod {
            Production::Terminal { .. } => {}

            Production::NonTerminal {
                name, occurrence, ..
            } => {
                let mut set = cont.tokens.clone();
                if cont.open
                    && let Some(caller_follow) = self.rule_follow.get(caller)
                {
                    set.extend(caller_follow.iter().copied());
                }
                let key = follow_key(name, *occurrence, caller);
                self.changed |= union_into(self.occ_follow, &key, &set);
                self.changed |= union_into(self.rule_follow, name, &set);
            }

            Production::Flat { definition } | Production::Option { definition, .. } => {
                self.walk_sequence(caller, definition, cont);
            }

            Production::Repetition { definition, .. }
            | Production::RepetitionMandatory { definition, .. } => {
                // After one iteration the interior can start over.
                let mut inner = cont.clone();
                inner
                    .tokens
                    .extend(first_of_sequence(definition, self.rules).tokens);
                self.walk_sequence(caller, definition, &inner);
            }

            Production::RepetitionWithSeparator {
                definition,
                separator,
                ..
            }
            | Production::RepetitionMandatoryWithSeparator {
                definition,
                separator,
                ..
            } => {
                // Looping back always goes through the separator.
                let mut inner = cont.clone();
                inner.tokens.insert(*separator);
                self.walk_sequence(caller, definition, &inner);
            }

            Production::Alternation { alternatives, .. } => {
                for alt in alternatives {
                    self.walk_sequence(caller, alt, cont);
                }
            }
        }
    }
}

fn union_into(map: &mut IndexMap<String, TokenTypeSet>, key: &str, set: &TokenTypeSet) -> bool {
    let entry = map.entry(key.to_owned()).or_default();
    let before = entry.len();
    entry.extend(set.iter().copied());
    entry.len() != before
}
