//! Parser configuration.

use indexmap::{IndexMap, IndexSet};
use lyrebird_core::grammar::DslKind;

/// Class-wide configuration, fixed at the first instance construction of
/// a grammar class (it parameterizes the cached analysis).
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Enable error recovery (single-token repair and re-sync).
    pub recovery_enabled: bool,
    /// Maximum lookahead depth `k` for decision tables.
    pub max_lookahead: u32,
    /// Validation issues to silence, per rule.
    pub ignored_issues: IgnoredIssues,
    /// Collect definition errors instead of failing construction.
    pub defer_definition_errors: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            recovery_enabled: false,
            max_lookahead: 5,
            ignored_issues: IgnoredIssues::default(),
            defer_definition_errors: false,
        }
    }
}

/// Per-rule silencing of validation issues.
///
/// Keys are `"<KIND><occurrence>"` (e.g. `"OR3"`). Only duplicate
/// production and ambiguous alternative findings can be silenced; the
/// remaining validations guard engine invariants and always apply.
#[derive(Debug, Clone, Default)]
pub struct IgnoredIssues {
    by_rule: IndexMap<String, IndexSet<String>>,
}

impl IgnoredIssues {
    pub fn ignore(&mut self, rule_name: &str, dsl: DslKind, occurrence: u32) {
        self.by_rule
            .entry(rule_name.to_owned())
            .or_default()
            .insert(format!("{dsl}{occurrence}"));
    }

    pub fn is_ignored(&self, rule_name: &str, dsl: DslKind, occurrence: u32) -> bool {
        self.by_rule
            .get(rule_name)
            .is_some_and(|keys| keys.contains(&format!("{dsl}{occurrence}")))
    }

    pub fn is_empty(&self) -> bool {
        self.by_rule.is_empty()
    }
}
