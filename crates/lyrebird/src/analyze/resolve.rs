//! Reference resolution: bind every rule reference to its arena index.
//!
//! Unresolved names leave the reference empty and produce an
//! `UnresolvedSubruleRef` error; the validator skips a grammar that
//! still has unresolved references.

use indexmap::IndexMap;

use lyrebird_core::grammar::{Production, RuleId};

use super::RuleArena;
use crate::errors::{DefinitionError, DefinitionErrorKind, DefinitionErrors};

pub(crate) fn resolve_references(rules: &mut RuleArena) -> DefinitionErrors {
    let ids: IndexMap<String, RuleId> = rules
        .keys()
        .enumerate()
        .map(|(i, name)| (name.clone(), RuleId::from_raw(i as u32)))
        .collect();

    let mut errors = DefinitionErrors::new();
    for rule in rules.values_mut() {
        let rule_name = rule.name.clone();
        resolve_in(&mut rule.definition, &ids, &rule_name, &mut errors);
    }
    errors
}

fn resolve_in(
    defs: &mut [Production],
    ids: &IndexMap<String, RuleId>,
    rule_name: &str,
    errors: &mut DefinitionErrors,
) {
    for prod in defs {
        match prod {
            Production::NonTerminal { name, resolved, .. } => match ids.get(name.as_str()) {
                Some(id) => *resolved = Some(*id),
                None => errors.push(DefinitionError::new(
                    DefinitionErrorKind::UnresolvedSubruleRef {
                        target: name.clone(),
                    },
                    rule_name,
                )),
            },
            Production::Alternation { alternatives, .. } => {
                for alt in alternatives {
                    resolve_in(alt, ids, rule_name, errors);
                }
            }
            Production::Flat { definition }
            | Production::Option { definition, .. }
            | Production::Repetition { definition, .. }
            | Production::RepetitionMandatory { definition, .. }
            | Production::RepetitionWithSeparator { definition, .. }
            | Production::RepetitionMandatoryWithSeparator { definition, .. } => {
                resolve_in(definition, ids, rule_name, errors);
            }
            Production::Terminal { .. } => {}
        }
    }
}
