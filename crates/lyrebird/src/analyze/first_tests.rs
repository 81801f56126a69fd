use lyrebird_core::grammar::Rule;
use lyrebird_core::grammar::build::{at_least_one, consume, many, option, or, subrule};
use lyrebird_core::tokens::TokenRegistry;

use super::RuleArena;
use super::first::{first_of_sequence, sequence_nullable};
use super::resolve::resolve_references;

fn resolved_arena(rules: Vec<Rule>) -> RuleArena {
    let mut arena: RuleArena = rules.into_iter().map(|r| (r.name.clone(), r)).collect();
    let errors = resolve_references(&mut arena);
    assert!(errors.is_empty(), "fixture must resolve: {errors}");
    arena
}

#[test]
fn first_of_terminal_sequence() {
    let mut reg = TokenRegistry::new();
    let a = reg.register("A");
    let b = reg.register("B");

    let rules = resolved_arena(vec![Rule::new("r", vec![consume(1, a), consume(1, b)])]);
    let f = first_of_sequence(&rules["r"].definition, &rules);
    assert_eq!(f.tokens.len(), 1);
    assert!(f.tokens.contains(&a));
    assert!(!f.nullable);
}

#[test]
fn optional_prefix_exposes_following_terminal() {
    let mut reg = TokenRegistry::new();
    let a = reg.register("A");
    let b = reg.register("B");

    let rules = resolved_arena(vec![Rule::new(
        "r",
        vec![option(1, vec![consume(1, a)]), consume(1, b)],
    )]);
    let f = first_of_sequence(&rules["r"].definition, &rules);
    assert!(f.tokens.contains(&a));
    assert!(f.tokens.contains(&b));
    assert!(!f.nullable);
}

#[test]
fn fully_optional_sequence_is_nullable() {
    let mut reg = TokenRegistry::new();
    let a = reg.register("A");
    let b = reg.register("B");

    let rules = resolved_arena(vec![Rule::new(
        "r",
        vec![option(1, vec![consume(1, a)]), many(1, vec![consume(1, b)])],
    )]);
    assert!(sequence_nullable(&rules["r"].definition, &rules));
}

#[test]
fn first_expands_through_rule_references() {
    let mut reg = TokenRegistry::new();
    let a = reg.register("A");
    let b = reg.register("B");

    let rules = resolved_arena(vec![
        Rule::new("r", vec![subrule(1, "inner"), consume(1, b)]),
        Rule::new("inner", vec![consume(1, a)]),
    ]);
    let f = first_of_sequence(&rules["r"].definition, &rules);
    assert!(f.tokens.contains(&a));
    assert!(!f.tokens.contains(&b));
}

#[test]
fn alternation_unions_branch_firsts() {
    let mut reg = TokenRegistry::new();
    let a = reg.register("A");
    let b = reg.register("B");
    let c = reg.register("C");

    let rules = resolved_arena(vec![Rule::new(
        "r",
        vec![or(
            1,
            vec![vec![consume(1, a)], vec![consume(1, b), consume(1, c)]],
        )],
    )]);
    let f = first_of_sequence(&rules["r"].definition, &rules);
    assert!(f.tokens.contains(&a));
    assert!(f.tokens.contains(&b));
    assert!(!f.tokens.contains(&c));
    assert!(!f.nullable);
}

#[test]
fn mandatory_repetition_keeps_interior_nullability() {
    let mut reg = TokenRegistry::new();
    let a = reg.register("A");

    let rules = resolved_arena(vec![Rule::new(
        "r",
        vec![at_least_one(1, vec![option(1, vec![consume(1, a)])])],
    )]);
    let f = first_of_sequence(&rules["r"].definition, &rules);
    assert!(f.tokens.contains(&a));
    assert!(f.nullable);
}

#[test]
fn terminates_on_cyclic_references() {
    // The cycle guard makes FIRST well-defined even on grammars the
    // validator will reject for left recursion.
    let rules = resolved_arena(vec![
        Rule::new("a", vec![subrule(1, "b")]),
        Rule::new("b", vec![subrule(1, "a")]),
    ]);
    let f = first_of_sequence(&rules["a"].definition, &rules);
    assert!(f.tokens.is_empty());
    assert!(!f.nullable);
}
