//! Grammar AST type definitions.
//!
//! A grammar is a set of named `Rule`s whose bodies are trees of
//! `Production` variants: terminals, references to other rules, and the
//! EBNF combinators (option, repetitions, alternation). The engine clones
//! these trees into its per-class cache, resolves rule references to
//! arena indices, and derives lookahead tables from them.

pub mod build;
pub mod visit;


use serde::{Deserialize, Serialize};

use crate::tokens::TokenType;

/// Handle to a rule in a grammar's rule arena (registration order).
///
/// References between rules are stored as these indices rather than as
/// pointers, so cyclic grammars need no ownership cycles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RuleId(u32);

impl RuleId {
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// The DSL primitive a production corresponds to.
///
/// Occurrence indices are unique per kind per rule, and the kind's
/// display form is part of the lookahead cache keys
/// (`"<KIND><occurrence>IN<ruleName>"`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DslKind {
    Consume,
    SubRule,
    Option,
    Many,
    ManySep,
    AtLeastOne,
    AtLeastOneSep,
    Or,
}

impl std::fmt::Display for DslKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DslKind::Consume => "CONSUME",
            DslKind::SubRule => "SUBRULE",
            DslKind::Option => "OPTION",
            DslKind::Many => "MANY",
            DslKind::ManySep => "MANY_SEP",
            DslKind::AtLeastOne => "AT_LEAST_ONE",
            DslKind::AtLeastOneSep => "AT_LEAST_ONE_SEP",
            DslKind::Or => "OR",
        };
        f.write_str(name)
    }
}

/// A named production rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub definition: Vec<Production>,
}

impl Rule {
    pub fn new(name: impl Into<String>, definition: Vec<Production>) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }
}

/// One node of a rule body.
///
/// `occurrence` disambiguates multiple uses of the same DSL kind inside
/// one rule (1..=5); it must match the occurrence argument of the
/// corresponding runtime call because both key the same decision table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Production {
    /// Plain concatenation, used for alternation branches and grouping.
    Flat { definition: Vec<Production> },
    /// A terminal consumed from the token stream.
    Terminal {
        token_type: TokenType,
        occurrence: u32,
    },
    /// A reference to another rule, resolved by the engine to an arena
    /// index. Deep clones drop the resolution; the resolver re-binds it.
    NonTerminal {
        name: String,
        occurrence: u32,
        resolved: Option<RuleId>,
    },
    /// EBNF `[...]`.
    Option {
        definition: Vec<Production>,
        occurrence: u32,
    },
    /// EBNF `{...}`, zero or more.
    Repetition {
        definition: Vec<Production>,
        occurrence: u32,
    },
    /// One or more.
    RepetitionMandatory {
        definition: Vec<Production>,
        occurrence: u32,
    },
    /// Zero or more, separated.
    RepetitionWithSeparator {
        definition: Vec<Production>,
        separator: TokenType,
        occurrence: u32,
    },
    /// One or more, separated.
    RepetitionMandatoryWithSeparator {
        definition: Vec<Production>,
        separator: TokenType,
        occurrence: u32,
    },
    /// EBNF `A | B | C`. Each alternative is a plain sequence.
    Alternation {
        alternatives: Vec<Vec<Production>>,
        occurrence: u32,
    },
}

impl Production {
    /// The DSL kind this node keys decision tables under.
    /// `Flat` is structural and has no kind.
    pub fn dsl_kind(&self) -> Option<DslKind> {
        match self {
            Production::Flat { .. } => None,
            Production::Terminal { .. } => Some(DslKind::Consume),
            Production::NonTerminal { .. } => Some(DslKind::SubRule),
            Production::Option { .. } => Some(DslKind::Option),
            Production::Repetition { .. } => Some(DslKind::Many),
            Production::RepetitionWithSeparator { .. } => Some(DslKind::ManySep),
            Production::RepetitionMandatory { .. } => Some(DslKind::AtLeastOne),
            Production::RepetitionMandatoryWithSeparator { .. } => Some(DslKind::AtLeastOneSep),
            Production::Alternation { .. } => Some(DslKind::Or),
        }
    }

    pub fn occurrence(&self) -> Option<u32> {
        match self {
            Production::Flat { .. } => None,
            Production::Terminal { occurrence, .. }
            | Production::NonTerminal { occurrence, .. }
            | Production::Option { occurrence, .. }
            | Production::Repetition { occurrence, .. }
            | Production::RepetitionMandatory { occurrence, .. }
            | Production::RepetitionWithSeparator { occurrence, .. }
            | Production::RepetitionMandatoryWithSeparator { occurrence, .. }
            | Production::Alternation { occurrence, .. } => Some(*occurrence),
        }
    }

    /// The uniform child sequence. Leaves and alternations return an
    /// empty slice; alternation branches are reached via `alternatives`.
    pub fn children(&self) -> &[Production] {
        match self {
            Production::Flat { definition }
            | Production::Option { definition, .. }
            | Production::Repetition { definition, .. }
            | Production::RepetitionMandatory { definition, .. }
            | Production::RepetitionWithSeparator { definition, .. }
            | Production::RepetitionMandatoryWithSeparator { definition, .. } => definition,
            Production::Terminal { .. }
            | Production::NonTerminal { .. }
            | Production::Alternation { .. } => &[],
        }
    }

    pub fn separator(&self) -> Option<TokenType> {
        match self {
            Production::RepetitionWithSeparator { separator, .. }
            | Production::RepetitionMandatoryWithSeparator { separator, .. } => Some(*separator),
            _ => None,
        }
    }
}

/// Deep-copy a definition, dropping any rule-reference resolution.
///
/// The engine clones declared rules into its per-class cache with this
/// before running the resolver, so resolved indices always refer to the
/// arena the clone lives in.
pub fn clone_definition(definition: &[Production]) -> Vec<Production> {
    definition.iter().map(clone_production).collect()
}

fn clone_production(prod: &Production) -> Production {
    match prod {
        Production::Flat { definition } => Production::Flat {
            definition: clone_definition(definition),
        },
        Production::Terminal {
            token_type,
            occurrence,
        } => Production::Terminal {
            token_type: *token_type,
            occurrence: *occurrence,
        },
        Production::NonTerminal {
            name, occurrence, ..
        } => Production::NonTerminal {
            name: name.clone(),
            occurrence: *occurrence,
            resolved: None,
        },
        Production::Option {
            definition,
            occurrence,
        } => Production::Option {
            definition: clone_definition(definition),
            occurrence: *occurrence,
        },
        Production::Repetition {
            definition,
            occurrence,
        } => Production::Repetition {
            definition: clone_definition(definition),
            occurrence: *occurrence,
        },
        Production::RepetitionMandatory {
            definition,
            occurrence,
        } => Production::RepetitionMandatory {
            definition: clone_definition(definition),
            occurrence: *occurrence,
        },
        Production::RepetitionWithSeparator {
            definition,
            separator,
            occurrence,
        } => Production::RepetitionWithSeparator {
            definition: clone_definition(definition),
            separator: *separator,
            occurrence: *occurrence,
        },
        Production::RepetitionMandatoryWithSeparator {
            definition,
            separator,
            occurrence,
        } => Production::RepetitionMandatoryWithSeparator {
            definition: clone_definition(definition),
            separator: *separator,
            occurrence: *occurrence,
        },
        Production::Alternation {
            alternatives,
            occurrence,
        } => Production::Alternation {
            alternatives: alternatives.iter().map(|alt| clone_definition(alt)).collect(),
            occurrence: *occurrence,
        },
    }
}
