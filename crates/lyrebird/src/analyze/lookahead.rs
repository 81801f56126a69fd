//! Lookahead decision tables.
//!
//! For every OPTION/MANY/MANY_SEP/AT_LEAST_ONE/AT_LEAST_ONE_SEP/OR
//! occurrence the analysis enumerates the token paths (bounded at
//! `max_lookahead`) that can begin the construct. At parse time the
//! runtime matches LA(1..k) against those paths: repetitions and options
//! ask "does the next input start the interior?", alternations pick the
//! first alternative with a matching path.
//!
//! Tables are plain data rather than closures, keyed
//! `"<KIND><occurrence>IN<ruleName>"`.

use indexmap::{IndexMap, IndexSet};

use lyrebird_core::grammar::{DslKind, Production};
use lyrebird_core::tokens::TokenType;

use super::RuleArena;
use super::first::rule_at;

type PathSet = IndexSet<Vec<TokenType>>;

/// Precomputed lookahead decision data for one construct occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionTable {
    /// OPTION and the four repetitions: paths that begin the interior.
    Entry { paths: Vec<Vec<TokenType>> },
    /// OR: per-alternative path sets, in declaration order.
    Alternatives { paths: Vec<Vec<Vec<TokenType>>> },
}

impl DecisionTable {
    /// Whether LA(1..k) can begin the construct's interior.
    pub fn should_enter(&self, la: impl Fn(u32) -> TokenType) -> bool {
        match self {
            DecisionTable::Entry { paths } => paths.iter().any(|p| path_matches(p, &la)),
            DecisionTable::Alternatives { .. } => {
                panic!("should_enter called on an alternation decision table")
            }
        }
    }

    /// The smallest alternative index whose path set matches LA(1..k).
    pub fn choose(&self, la: impl Fn(u32) -> TokenType) -> Option<usize> {
        match self {
            DecisionTable::Alternatives { paths } => paths
                .iter()
                .position(|alt| alt.iter().any(|p| path_matches(p, &la))),
            DecisionTable::Entry { .. } => {
                panic!("choose called on a non-alternation decision table")
            }
        }
    }

    /// Whether a specific alternative matches LA(1..k). Used when a
    /// semantic gate vetoes the first match and the next one is needed.
    pub fn alt_matches(&self, index: usize, la: impl Fn(u32) -> TokenType) -> bool {
        match self {
            DecisionTable::Alternatives { paths } => paths
                .get(index)
                .is_some_and(|alt| alt.iter().any(|p| path_matches(p, &la))),
            DecisionTable::Entry { .. } => {
                panic!("alt_matches called on a non-alternation decision table")
            }
        }
    }

    pub fn alternative_count(&self) -> usize {
        match self {
            DecisionTable::Alternatives { paths } => paths.len(),
            DecisionTable::Entry { .. } => 0,
        }
    }
}

fn path_matches(path: &[TokenType], la: &impl Fn(u32) -> TokenType) -> bool {
    path.iter()
        .enumerate()
        .all(|(i, tt)| la(i as u32 + 1) == *tt)
}

/// Cache key for one decision table.
pub fn decision_key(kind: DslKind, occurrence: u32, rule_name: &str) -> String {
    format!("{kind}{occurrence}IN{rule_name}")
}

pub(crate) fn build(rules: &RuleArena, max_lookahead: u32) -> IndexMap<String, DecisionTable> {
    let mut tables = IndexMap::new();
    for rule in rules.values() {
        collect_tables(
            rule.name.as_str(),
            &rule.definition,
            max_lookahead,
            rules,
            &mut tables,
        );
    }
    tables
}

fn collect_tables(
    rule_name: &str,
    defs: &[Production],
    k: u32,
    rules: &RuleArena,
    tables: &mut IndexMap<String, DecisionTable>,
) {
    for prod in defs {
        match prod {
            Production::Alternation {
                alternatives,
                occurrence,
            } => {
                let paths = alternatives
                    .iter()
                    .map(|alt| possible_paths(alt, k, rules))
                    .collect();
                tables.insert(
                    decision_key(DslKind::Or, *occurrence, rule_name),
                    DecisionTable::Alternatives { paths },
                );
                for alt in alternatives {
                    collect_tables(rule_name, alt, k, rules, tables);
                }
            }
            Production::Option { definition, occurrence }
            | Production::Repetition { definition, occurrence }
            | Production::RepetitionMandatory { definition, occurrence }
            | Production::RepetitionWithSeparator {
                definition,
                occurrence,
                ..
            }
            | Production::RepetitionMandatoryWithSeparator {
                definition,
                occurrence,
                ..
            } => {
                let kind = prod
                    .dsl_kind()
                    .unwrap_or_else(|| panic!("combinator production without a DSL kind"));
                tables.insert(
                    decision_key(kind, *occurrence, rule_name),
                    DecisionTable::Entry {
                        paths: possible_paths(definition, k, rules),
                    },
                );
                collect_tables(rule_name, definition, k, rules, tables);
            }
            Production::Flat { definition } => {
                collect_tables(rule_name, definition, k, rules, tables);
            }
            Production::Terminal { .. } | Production::NonTerminal { .. } => {}
        }
    }
}

/// All token paths of length <= `k` that derivations of `defs` can
/// begin with. A path shorter than `k` means the whole sequence can be
/// matched by exactly those tokens.
pub fn possible_paths(defs: &[Production], k: u32, rules: &RuleArena) -> Vec<Vec<TokenType>> {
    let mut start = PathSet::new();
    start.insert(Vec::new());
    append_sequence(start, defs, k as usize, rules)
        .into_iter()
        .collect()
}

fn append_sequence(prefixes: PathSet, defs: &[Production], k: usize, rules: &RuleArena) -> PathSet {
    let mut current = prefixes;
    for prod in defs {
        current = append_production(current, prod, k, rules);
    }
    current
}

fn append_production(
    prefixes: PathSet,
    prod: &Production,
    k: usize,
    rules: &RuleArena,
) -> PathSet {
    let mut out = PathSet::new();
    for prefix in prefixes {
        if prefix.len() >= k {
            out.insert(prefix);
            continue;
        }
        match prod {
            Production::Terminal { token_type, .. } => {
                let mut path = prefix;
                path.push(*token_type);
                out.insert(path);
            }
            Production::NonTerminal { resolved, .. } => match resolved {
                Some(id) => {
                    let definition = &rule_at(rules, *id).definition;
                    out.extend(append_sequence(
                        PathSet::from_iter([prefix]),
                        definition,
                        k,
                        rules,
                    ));
                }
                // Unresolved references only survive into analysis when
                // resolution already failed; contribute nothing.
                None => {
                    out.insert(prefix);
                }
            },
            Production::Flat { definition } => {
                out.extend(append_sequence(
                    PathSet::from_iter([prefix]),
                    definition,
                    k,
                    rules,
                ));
            }
            Production::Option { definition, .. } => {
                out.insert(prefix.clone());
                out.extend(append_sequence(
                    PathSet::from_iter([prefix]),
                    definition,
                    k,
                    rules,
                ));
            }
            Production::Repetition { definition, .. } => {
                out.extend(append_repetition(prefix, definition, None, false, k, rules));
            }
            Production::RepetitionMandatory { definition, .. } => {
                out.extend(append_repetition(prefix, definition, None, true, k, rules));
            }
            Production::RepetitionWithSeparator {
                definition,
                separator,
                ..
            } => {
                out.extend(append_repetition(
                    prefix,
                    definition,
                    Some(*separator),
                    false,
                    k,
                    rules,
                ));
            }
            Production::RepetitionMandatoryWithSeparator {
                definition,
                separator,
                ..
            } => {
                out.extend(append_repetition(
                    prefix,
                    definition,
                    Some(*separator),
                    true,
                    k,
                    rules,
                ));
            }
            Production::Alternation { alternatives, .. } => {
                for alt in alternatives {
                    out.extend(append_sequence(
                        PathSet::from_iter([prefix.clone()]),
                        alt,
                        k,
                        rules,
                    ));
                }
            }
        }
    }
    out
}

/// Expand zero-or-more / one-or-more iterations, deduplicating paths so
/// nullable interiors terminate.
fn append_repetition(
    prefix: Vec<TokenType>,
    definition: &[Production],
    separator: Option<TokenType>,
    min_one: bool,
    k: usize,
    rules: &RuleArena,
) -> PathSet {
    let mut out = PathSet::new();
    if !min_one {
        out.insert(prefix.clone());
    }

    let mut frontier = PathSet::from_iter([prefix]);
    let mut first = true;
    while !frontier.is_empty() {
        let mut stepped = PathSet::new();
        for path in frontier {
            let mut base = path;
            if !first
                && let Some(sep) = separator
                && base.len() < k
            {
                base.push(sep);
            }
            stepped.extend(append_sequence(
                PathSet::from_iter([base]),
                definition,
                k,
                rules,
            ));
        }
        first = false;
        frontier = PathSet::new();
        for path in stepped {
            let is_new = out.insert(path.clone());
            if is_new && path.len() < k {
                frontier.insert(path);
            }
        }
    }
    out
}
