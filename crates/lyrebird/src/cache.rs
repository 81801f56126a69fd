//! Per-class analysis cache.
//!
//! Self-analysis runs once per grammar class, keyed by the class name,
//! and its output is shared by every parser instance in the process.
//! The registry mutex also serializes the first construction, so
//! concurrent first instances cannot race the analysis.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use indexmap::{IndexMap, IndexSet};
use log::debug;

use lyrebird_core::grammar::{Rule, RuleId};

use crate::analyze::lookahead::DecisionTable;
use crate::analyze::{RuleArena, TokenTypeSet, first};
use crate::errors::DefinitionErrors;

/// Everything self-analysis produced for one grammar class.
pub struct AnalysisEntry {
    /// Cloned, resolved rules; `RuleId` indexes this arena.
    pub rules: RuleArena,
    /// Re-sync FOLLOW sets, keyed `"<rule><occ>IN<caller>"`.
    pub follow_sets: IndexMap<String, TokenTypeSet>,
    /// Decision tables, keyed `"<KIND><occ>IN<rule>"`.
    pub lookahead: IndexMap<String, DecisionTable>,
    /// Definition errors; non-empty entries fail construction unless
    /// deferral is enabled.
    pub errors: DefinitionErrors,
    /// Names of inherited rules replaced by this class.
    pub overridden: IndexSet<String>,
    /// The `k` the tables were computed for.
    pub max_lookahead: u32,
}

impl AnalysisEntry {
    pub fn rule(&self, id: RuleId) -> &Rule {
        first::rule_at(&self.rules, id)
    }

    pub fn rule_name(&self, id: RuleId) -> &str {
        self.rule(id).name.as_str()
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.rules
            .get_index_of(name)
            .map(|i| RuleId::from_raw(i as u32))
    }

    pub fn decision(&self, key: &str) -> Option<&DecisionTable> {
        self.lookahead.get(key)
    }

    pub fn follow(&self, key: &str) -> Option<&TokenTypeSet> {
        self.follow_sets.get(key)
    }
}

static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<AnalysisEntry>>>> = OnceLock::new();

/// The cached analysis for `class_name`, running `build` under the
/// registry lock if this is the first instance of the class.
pub(crate) fn analysis_for(
    class_name: &str,
    build: impl FnOnce() -> AnalysisEntry,
) -> Arc<AnalysisEntry> {
    let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut entries = registry.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(entry) = entries.get(class_name) {
        return Arc::clone(entry);
    }
    debug!("running self-analysis for grammar class `{class_name}`");
    let entry = Arc::new(build());
    entries.insert(class_name.to_owned(), Arc::clone(&entry));
    entry
}
