//! Grammar declaration: builder, rule registration, per-rule config.
//!
//! A rule has two halves that must agree: the grammar-AST declaration
//! (what the analysis pipeline consumes) and the body closure (what the
//! runtime executes). Occurrence indices are the contract between them -
//! `consume(1, comma)` in the declaration keys the same table as
//! `p.consume(1, comma)` in the body.
//!
//! Mutually recursive rules are handled by declaring before defining:
//! `declare` hands out the `RuleId` a body needs to capture, `define`
//! fills the slot in later.

use std::rc::Rc;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use lyrebird_core::grammar::{Production, Rule, RuleId};
use lyrebird_core::tokens::TokenRegistry;

use crate::config::ParserConfig;
use crate::parse::{ParseResult, Parser};

/// A rule body: an ordinary closure over the combinator primitives.
pub type RuleBody<V> = Rc<dyn Fn(&mut Parser<V>) -> ParseResult<V>>;

/// Per-rule runtime configuration.
pub struct RuleConfig<V> {
    /// Whether a recognition error inside this rule may be repaired by
    /// re-synchronizing to the FOLLOW stack. Forced on for the top-level
    /// invocation regardless of this flag.
    pub resync_enabled: bool,
    /// Value returned after re-sync repaired this rule. Defaults to
    /// `V::default()`.
    pub recovery_value: Option<Rc<dyn Fn() -> V>>,
}

impl<V> Default for RuleConfig<V> {
    fn default() -> Self {
        Self {
            resync_enabled: true,
            recovery_value: None,
        }
    }
}

impl<V> Clone for RuleConfig<V> {
    fn clone(&self) -> Self {
        Self {
            resync_enabled: self.resync_enabled,
            recovery_value: self.recovery_value.clone(),
        }
    }
}

impl<V> std::fmt::Debug for RuleConfig<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleConfig")
            .field("resync_enabled", &self.resync_enabled)
            .field("recovery_value", &self.recovery_value.is_some())
            .finish()
    }
}

pub(crate) struct RuleDecl<V> {
    pub gast: Rule,
    pub body: Option<RuleBody<V>>,
    pub config: RuleConfig<V>,
}

impl<V> Clone for RuleDecl<V> {
    fn clone(&self) -> Self {
        Self {
            gast: self.gast.clone(),
            body: self.body.clone(),
            config: self.config.clone(),
        }
    }
}

/// A fully declared grammar class: rules, bodies, class configuration.
///
/// Built once with [`GrammarBuilder`], then shared (`Rc`) across any
/// number of parser instances on the same thread. The grammar name keys
/// the process-wide analysis cache.
pub struct Grammar<V> {
    name: String,
    registry: Arc<TokenRegistry>,
    rules: IndexMap<String, RuleDecl<V>>,
    duplicates: Vec<String>,
    inherited: IndexSet<String>,
    overridden: IndexSet<String>,
    invalid_overrides: Vec<String>,
    config: ParserConfig,
}

impl<V> Grammar<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Look up a rule handle by name.
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.rules
            .get_index_of(name)
            .map(|i| RuleId::from_raw(i as u32))
    }

    pub fn rule_name(&self, id: RuleId) -> &str {
        self.decl(id).gast.name.as_str()
    }

    pub(crate) fn decl(&self, id: RuleId) -> &RuleDecl<V> {
        self.rules
            .get_index(id.as_usize())
            .map(|(_, decl)| decl)
            .unwrap_or_else(|| panic!("rule id {id:?} does not belong to grammar `{}`", self.name))
    }

    pub(crate) fn body(&self, id: RuleId) -> RuleBody<V> {
        let decl = self.decl(id);
        match &decl.body {
            Some(body) => Rc::clone(body),
            None => panic!(
                "rule `{}` of grammar `{}` was declared but never defined",
                decl.gast.name, self.name
            ),
        }
    }

    pub(crate) fn view(&self) -> GrammarView<'_> {
        GrammarView {
            registry: &self.registry,
            rules: self.rules.values().map(|d| &d.gast).collect(),
            duplicates: &self.duplicates,
            invalid_overrides: &self.invalid_overrides,
            overridden: &self.overridden,
        }
    }
}

impl<V> std::fmt::Debug for Grammar<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The analysis-facing, value-type-independent slice of a grammar.
pub(crate) struct GrammarView<'g> {
    pub registry: &'g TokenRegistry,
    pub rules: Vec<&'g Rule>,
    pub duplicates: &'g [String],
    pub invalid_overrides: &'g [String],
    pub overridden: &'g IndexSet<String>,
}

/// Incrementally registers rules for a grammar class.
pub struct GrammarBuilder<V> {
    grammar: Grammar<V>,
}

impl<V> GrammarBuilder<V> {
    pub fn new(name: impl Into<String>, registry: Arc<TokenRegistry>, config: ParserConfig) -> Self {
        Self {
            grammar: Grammar {
                name: name.into(),
                registry,
                rules: IndexMap::new(),
                duplicates: Vec::new(),
                inherited: IndexSet::new(),
                overridden: IndexSet::new(),
                invalid_overrides: Vec::new(),
                config,
            },
        }
    }

    /// Start from an existing grammar's rules. The inherited rules keep
    /// their bodies and may be replaced with [`Self::override_rule`].
    pub fn extend(name: impl Into<String>, base: &Grammar<V>, config: ParserConfig) -> Self {
        let mut builder = Self::new(name, Arc::clone(&base.registry), config);
        for (rule_name, decl) in &base.rules {
            builder.grammar.rules.insert(rule_name.clone(), decl.clone());
            builder.grammar.inherited.insert(rule_name.clone());
        }
        builder
    }

    /// Reserve a rule slot, returning the handle bodies capture for
    /// `subrule` calls. Re-declaring a name records a duplicate (the
    /// validator reports it) and returns the existing handle.
    pub fn declare(&mut self, name: &str) -> RuleId {
        if let Some(existing) = self.grammar.rule_id(name) {
            self.grammar.duplicates.push(name.to_owned());
            return existing;
        }
        let id = RuleId::from_raw(self.grammar.rules.len() as u32);
        self.grammar.rules.insert(
            name.to_owned(),
            RuleDecl {
                gast: Rule::new(name, Vec::new()),
                body: None,
                config: RuleConfig::default(),
            },
        );
        id
    }

    /// Fill in a declared rule's grammar AST and body.
    pub fn define(
        &mut self,
        id: RuleId,
        definition: Vec<Production>,
        body: impl Fn(&mut Parser<V>) -> ParseResult<V> + 'static,
    ) {
        self.define_with_config(id, definition, RuleConfig::default(), body);
    }

    pub fn define_with_config(
        &mut self,
        id: RuleId,
        definition: Vec<Production>,
        config: RuleConfig<V>,
        body: impl Fn(&mut Parser<V>) -> ParseResult<V> + 'static,
    ) {
        let name = self.grammar.rule_name(id).to_owned();
        let decl = self
            .grammar
            .rules
            .get_mut(&name)
            .unwrap_or_else(|| panic!("rule id {id:?} is not declared"));
        decl.gast = Rule::new(name, definition);
        decl.body = Some(Rc::new(body));
        decl.config = config;
    }

    /// Declare and define in one step, for rules nothing refers forward to.
    pub fn rule(
        &mut self,
        name: &str,
        definition: Vec<Production>,
        body: impl Fn(&mut Parser<V>) -> ParseResult<V> + 'static,
    ) -> RuleId {
        let id = self.declare(name);
        // On duplicate registration the first definition wins; the
        // validator reports the name clash.
        if self.grammar.rules[id.as_usize()].body.is_none() {
            self.define(id, definition, body);
        }
        id
    }

    /// Replace an inherited rule. Overriding a name that was not
    /// inherited is a definition error (reported by the validator), but
    /// the rule is still registered so analysis can continue.
    pub fn override_rule(
        &mut self,
        name: &str,
        definition: Vec<Production>,
        body: impl Fn(&mut Parser<V>) -> ParseResult<V> + 'static,
    ) -> RuleId {
        if self.grammar.inherited.contains(name) {
            self.grammar.overridden.insert(name.to_owned());
        } else {
            self.grammar.invalid_overrides.push(name.to_owned());
        }
        let id = match self.grammar.rule_id(name) {
            Some(id) => id,
            None => self.declare(name),
        };
        self.define(id, definition, body);
        id
    }

    /// Attach per-rule runtime configuration to an already defined rule.
    pub fn configure(&mut self, id: RuleId, config: RuleConfig<V>) {
        let name = self.grammar.rule_name(id).to_owned();
        if let Some(decl) = self.grammar.rules.get_mut(&name) {
            decl.config = config;
        }
    }

    /// Finish the declaration phase.
    ///
    /// # Panics
    /// Panics if any declared rule was never defined; that is a bug in
    /// the grammar declaration, not an input-dependent condition.
    pub fn build(self) -> Grammar<V> {
        for decl in self.grammar.rules.values() {
            if decl.body.is_none() {
                panic!(
                    "rule `{}` of grammar `{}` was declared but never defined",
                    decl.gast.name, self.grammar.name
                );
            }
        }
        self.grammar
    }
}
