//! Grammar self-analysis pipeline.
//!
//! Runs once per grammar class, in stages that each require the previous
//! one to be clean:
//! 1. clone the declared productions into a fresh rule arena
//! 2. `resolve` - bind rule references to arena indices
//! 3. `validate` - names, duplicates, left recursion, alternations
//! 4. `follow` + `lookahead` - the tables the runtime parses with
//!
//! The output is a [`crate::cache::AnalysisEntry`]; the cache shares it
//! across every parser instance of the class.

pub mod first;
pub mod follow;
pub mod lookahead;
pub mod resolve;
pub mod validate;
pub mod walker;

#[cfg(test)]
mod first_tests;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use lyrebird_core::grammar::{Rule, clone_definition};
use lyrebird_core::tokens::TokenType;

use crate::cache::AnalysisEntry;
use crate::config::ParserConfig;
use crate::define::GrammarView;
use crate::errors::DefinitionErrors;

/// Set of terminal token types, in deterministic insertion order.
pub type TokenTypeSet = IndexSet<TokenType>;

/// Rule arena: name to resolved rule, indexed by `RuleId`.
pub type RuleArena = IndexMap<String, Rule>;

pub(crate) fn run(view: GrammarView<'_>, config: &ParserConfig) -> AnalysisEntry {
    let mut rules: RuleArena = view
        .rules
        .iter()
        .map(|r| {
            (
                r.name.clone(),
                Rule::new(r.name.clone(), clone_definition(&r.definition)),
            )
        })
        .collect();

    let mut errors = DefinitionErrors::new();
    errors.extend(resolve::resolve_references(&mut rules));
    debug!(
        "resolved references for {} rules ({} errors)",
        rules.len(),
        errors.len()
    );

    if errors.is_empty() {
        errors.extend(validate::validate(&view, &rules, config));
        debug!("validation finished ({} errors)", errors.len());
    }

    let (follow_sets, lookahead) = if errors.is_empty() {
        let follow_sets = follow::compute(&rules);
        let lookahead = lookahead::build(&rules, config.max_lookahead);
        debug!(
            "computed {} follow sets and {} decision tables",
            follow_sets.len(),
            lookahead.len()
        );
        (follow_sets, lookahead)
    } else {
        (IndexMap::new(), IndexMap::new())
    };

    AnalysisEntry {
        rules,
        follow_sets,
        lookahead,
        errors,
        overridden: view.overridden.clone(),
        max_lookahead: config.max_lookahead,
    }
}
