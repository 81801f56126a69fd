//! Grammar validation.
//!
//! Runs only when reference resolution was clean. Findings:
//! - rule names that are not identifiers
//! - duplicate rule registrations and invalid overrides
//! - duplicate DSL occurrence indices within one rule
//! - left recursion (direct or indirect), with the offending chain
//! - empty alternatives that are not last
//! - alternatives indistinguishable within `max_lookahead` tokens
//!
//! Duplicate-production and ambiguity findings can be silenced per rule
//! through `ParserConfig::ignored_issues`.

use indexmap::{IndexMap, IndexSet};

use lyrebird_core::grammar::{DslKind, Production, RuleId};
use lyrebird_core::tokens::{TokenRegistry, TokenType};

use super::first::{rule_at, sequence_nullable};
use super::{RuleArena, lookahead};
use crate::config::ParserConfig;
use crate::define::GrammarView;
use crate::errors::{DefinitionError, DefinitionErrorKind, DefinitionErrors};

pub(crate) fn validate(
    view: &GrammarView<'_>,
    rules: &RuleArena,
    config: &ParserConfig,
) -> DefinitionErrors {
    let mut errors = DefinitionErrors::new();

    for name in rules.keys() {
        if !is_valid_rule_name(name) {
            errors.push(DefinitionError::new(
                DefinitionErrorKind::InvalidRuleName,
                name,
            ));
        }
    }

    for name in view.duplicates {
        errors.push(DefinitionError::new(
            DefinitionErrorKind::DuplicateRuleName,
            name,
        ));
    }

    for name in view.invalid_overrides {
        errors.push(DefinitionError::new(
            DefinitionErrorKind::InvalidRuleOverride,
            name,
        ));
    }

    for rule in rules.values() {
        check_duplicate_productions(rule.name.as_str(), &rule.definition, config, &mut errors);
    }

    let before_recursion = errors.len();
    check_left_recursion(rules, &mut errors);
    // Path enumeration does not terminate on left-recursive grammars, so
    // the ambiguity check only runs when recursion is clean.
    let check_ambiguities = errors.len() == before_recursion;

    for rule in rules.values() {
        check_alternations(
            rule.name.as_str(),
            &rule.definition,
            rules,
            view.registry,
            config,
            check_ambiguities,
            &mut errors,
        );
    }

    errors
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_valid_rule_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_duplicate_productions(
    rule_name: &str,
    defs: &[Production],
    config: &ParserConfig,
    errors: &mut DefinitionErrors,
) {
    let mut seen: IndexMap<(DslKind, u32), u32> = IndexMap::new();
    collect_occurrences(defs, &mut seen);

    for ((dsl, occurrence), count) in seen {
        if count < 2 || config.ignored_issues.is_ignored(rule_name, dsl, occurrence) {
            continue;
        }
        errors.push(DefinitionError::new(
            DefinitionErrorKind::DuplicateProductions { dsl, occurrence },
            rule_name,
        ));
    }
}

fn collect_occurrences(defs: &[Production], seen: &mut IndexMap<(DslKind, u32), u32>) {
    for prod in defs {
        if let (Some(dsl), Some(occurrence)) = (prod.dsl_kind(), prod.occurrence()) {
            *seen.entry((dsl, occurrence)).or_insert(0) += 1;
        }
        if let Production::Alternation { alternatives, .. } = prod {
            for alt in alternatives {
                collect_occurrences(alt, seen);
            }
        } else {
            collect_occurrences(prod.children(), seen);
        }
    }
}

fn check_left_recursion(rules: &RuleArena, errors: &mut DefinitionErrors) {
    // Edges: rules reachable in first position without consuming a
    // terminal.
    let mut first_nts: IndexMap<RuleId, IndexSet<RuleId>> = IndexMap::new();
    for (i, rule) in rules.values().enumerate() {
        let mut targets = IndexSet::new();
        first_nonterminals(&rule.definition, rules, &mut targets);
        first_nts.insert(RuleId::from_raw(i as u32), targets);
    }

    for (i, rule) in rules.values().enumerate() {
        let start = RuleId::from_raw(i as u32);
        let mut visited = IndexSet::new();
        let mut path = vec![rule.name.clone()];
        if find_cycle(start, start, &first_nts, rules, &mut visited, &mut path) {
            errors.push(DefinitionError::new(
                DefinitionErrorKind::LeftRecursion { path },
                rule.name.as_str(),
            ));
        }
    }
}

fn find_cycle(
    current: RuleId,
    target: RuleId,
    first_nts: &IndexMap<RuleId, IndexSet<RuleId>>,
    rules: &RuleArena,
    visited: &mut IndexSet<RuleId>,
    path: &mut Vec<String>,
) -> bool {
    let Some(nexts) = first_nts.get(&current) else {
        return false;
    };
    for next in nexts {
        if *next == target {
            path.push(rule_at(rules, *next).name.clone());
            return true;
        }
        if visited.insert(*next) {
            path.push(rule_at(rules, *next).name.clone());
            if find_cycle(*next, target, first_nts, rules, visited, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}

/// Collect rules reachable in first position of `defs`. Returns whether
/// the whole sequence is traversable without consuming a terminal.
fn first_nonterminals(
    defs: &[Production],
    rules: &RuleArena,
    out: &mut IndexSet<RuleId>,
) -> bool {
    for prod in defs {
        let nullable = match prod {
            Production::Terminal { .. } => false,
            Production::NonTerminal { resolved, .. } => match resolved {
                Some(id) => {
                    out.insert(*id);
                    sequence_nullable(&rule_at(rules, *id).definition, rules)
                }
                None => false,
            },
            Production::Flat { definition } => first_nonterminals(definition, rules, out),
            Production::Option { definition, .. }
            | Production::Repetition { definition, .. }
            | Production::RepetitionWithSeparator { definition, .. } => {
                first_nonterminals(definition, rules, out);
                true
            }
            Production::RepetitionMandatory { definition, .. }
            | Production::RepetitionMandatoryWithSeparator { definition, .. } => {
                first_nonterminals(definition, rules, out)
            }
            Production::Alternation { alternatives, .. } => {
                let mut any_nullable = false;
                for alt in alternatives {
                    any_nullable |= first_nonterminals(alt, rules, out);
                }
                any_nullable
            }
        };
        if !nullable {
            return false;
        }
    }
    true
}

fn check_alternations(
    rule_name: &str,
    defs: &[Production],
    rules: &RuleArena,
    registry: &TokenRegistry,
    config: &ParserConfig,
    check_ambiguities: bool,
    errors: &mut DefinitionErrors,
) {
    for prod in defs {
        if let Production::Alternation {
            alternatives,
            occurrence,
        } = prod
        {
            check_empty_alternatives(rule_name, alternatives, *occurrence, rules, errors);
            if check_ambiguities
                && !config
                    .ignored_issues
                    .is_ignored(rule_name, DslKind::Or, *occurrence)
            {
                check_ambiguous_alternatives(
                    rule_name,
                    alternatives,
                    *occurrence,
                    rules,
                    registry,
                    config.max_lookahead,
                    errors,
                );
            }
            for alt in alternatives {
                check_alternations(
                    rule_name,
                    alt,
                    rules,
                    registry,
                    config,
                    check_ambiguities,
                    errors,
                );
            }
        } else {
            check_alternations(
                rule_name,
                prod.children(),
                rules,
                registry,
                config,
                check_ambiguities,
                errors,
            );
        }
    }
}

fn check_empty_alternatives(
    rule_name: &str,
    alternatives: &[Vec<Production>],
    occurrence: u32,
    rules: &RuleArena,
    errors: &mut DefinitionErrors,
) {
    for (i, alt) in alternatives.iter().enumerate() {
        let is_last = i + 1 == alternatives.len();
        if !is_last && sequence_nullable(alt, rules) {
            errors.push(DefinitionError::new(
                DefinitionErrorKind::NoneLastEmptyAlt {
                    or_occurrence: occurrence,
                    alternative: i + 1,
                },
                rule_name,
            ));
        }
    }
}

fn check_ambiguous_alternatives(
    rule_name: &str,
    alternatives: &[Vec<Production>],
    occurrence: u32,
    rules: &RuleArena,
    registry: &TokenRegistry,
    max_lookahead: u32,
    errors: &mut DefinitionErrors,
) {
    // path -> alternatives (1-based) sharing it
    let mut owners: IndexMap<Vec<TokenType>, Vec<usize>> = IndexMap::new();
    for (i, alt) in alternatives.iter().enumerate() {
        for path in lookahead::possible_paths(alt, max_lookahead, rules) {
            let owner = owners.entry(path).or_default();
            if owner.last() != Some(&(i + 1)) {
                owner.push(i + 1);
            }
        }
    }

    // One error per distinct group of colliding alternatives, carrying a
    // sample path.
    let mut reported: IndexMap<Vec<usize>, Vec<TokenType>> = IndexMap::new();
    for (path, alts) in owners {
        if alts.len() > 1 {
            reported.entry(alts).or_insert(path);
        }
    }
    for (alts, path) in reported {
        errors.push(DefinitionError::new(
            DefinitionErrorKind::AmbiguousAlts {
                or_occurrence: occurrence,
                alternatives: alts,
                path: path.iter().map(|tt| registry.name(*tt).to_owned()).collect(),
            },
            rule_name,
        ));
    }
}
