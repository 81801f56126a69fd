//! Definition-time errors.
//!
//! These are produced by grammar self-analysis (resolution and
//! validation), not by parsing. Unless deferral is enabled they abort
//! parser construction, aggregated into [`crate::Error::InvalidGrammar`].

use serde::Serialize;

use lyrebird_core::grammar::DslKind;

/// What went wrong, with the kind-specific evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DefinitionErrorKind {
    /// Rule name does not match `[A-Za-z_][A-Za-z0-9_]*`.
    InvalidRuleName,
    /// A second rule was registered under an already used name.
    DuplicateRuleName,
    /// An override declaration that shadows no inherited rule.
    InvalidRuleOverride,
    /// Two productions of one DSL kind share an occurrence index.
    DuplicateProductions { dsl: DslKind, occurrence: u32 },
    /// A rule reference that resolution could not bind.
    UnresolvedSubruleRef { target: String },
    /// The rule can reach itself without consuming a terminal.
    LeftRecursion { path: Vec<String> },
    /// An empty alternative that is not the last one (1-based index).
    NoneLastEmptyAlt { or_occurrence: u32, alternative: usize },
    /// Two or more alternatives share a lookahead path (1-based indices).
    AmbiguousAlts {
        or_occurrence: u32,
        alternatives: Vec<usize>,
        path: Vec<String>,
    },
}

/// One grammar analysis finding, anchored to a rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefinitionError {
    pub kind: DefinitionErrorKind,
    pub rule_name: String,
}

impl DefinitionError {
    pub fn new(kind: DefinitionErrorKind, rule_name: impl Into<String>) -> Self {
        Self {
            kind,
            rule_name: rule_name.into(),
        }
    }
}

impl std::fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = &self.rule_name;
        match &self.kind {
            DefinitionErrorKind::InvalidRuleName => {
                write!(
                    f,
                    "invalid rule name `{rule}`: expected [A-Za-z_][A-Za-z0-9_]*"
                )
            }
            DefinitionErrorKind::DuplicateRuleName => {
                write!(f, "duplicate rule name `{rule}`")
            }
            DefinitionErrorKind::InvalidRuleOverride => {
                write!(
                    f,
                    "rule `{rule}` is marked as an override but no inherited rule has that name"
                )
            }
            DefinitionErrorKind::DuplicateProductions { dsl, occurrence } => {
                write!(
                    f,
                    "rule `{rule}` uses {dsl} with occurrence {occurrence} more than once"
                )
            }
            DefinitionErrorKind::UnresolvedSubruleRef { target } => {
                write!(f, "rule `{rule}` references undefined rule `{target}`")
            }
            DefinitionErrorKind::LeftRecursion { path } => {
                write!(
                    f,
                    "left recursion detected in rule `{rule}`: {}",
                    path.join(" -> ")
                )
            }
            DefinitionErrorKind::NoneLastEmptyAlt {
                or_occurrence,
                alternative,
            } => {
                write!(
                    f,
                    "rule `{rule}`: alternative {alternative} of OR {or_occurrence} can match an \
                     empty sequence but is not the last alternative"
                )
            }
            DefinitionErrorKind::AmbiguousAlts {
                or_occurrence,
                alternatives,
                path,
            } => {
                write!(
                    f,
                    "rule `{rule}`: alternatives <{}> of OR {or_occurrence} are ambiguous, the \
                     lookahead path <{}> matches more than one of them",
                    alternatives
                        .iter()
                        .map(|i| i.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    path.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for DefinitionError {}

/// Collection of definition errors from one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefinitionErrors(Vec<DefinitionError>);

impl DefinitionErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: DefinitionError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, iter: impl IntoIterator<Item = DefinitionError>) {
        self.0.extend(iter);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DefinitionError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[DefinitionError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<DefinitionError> {
        self.0
    }
}

impl IntoIterator for DefinitionErrors {
    type Item = DefinitionError;
    type IntoIter = std::vec::IntoIter<DefinitionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DefinitionErrors {
    type Item = &'a DefinitionError;
    type IntoIter = std::slice::Iter<'a, DefinitionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<DefinitionError> for DefinitionErrors {
    fn from_iter<T: IntoIterator<Item = DefinitionError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for DefinitionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}
