//! Error recovery: single-token insertion/deletion, in-repetition
//! re-sync, and between-rules re-sync.

use std::rc::Rc;

use super::support::{
    Json, block_grammar, json_grammar, json_tokens, lex, num_list_grammar,
};
use crate::config::ParserConfig;
use crate::parse::{Parser, RecognitionErrorKind};

fn recovering() -> ParserConfig {
    ParserConfig {
        recovery_enabled: true,
        ..ParserConfig::default()
    }
}

#[test]
fn missing_closer_resyncs_at_eof_and_returns_the_recovery_value() {
    let toks = json_tokens();
    let (grammar, rules) = json_grammar("recov-missing-closer", recovering(), &toks);
    let mut parser = Parser::new(grammar, lex(r#"{ "a": 1 "#, &toks)).unwrap();

    let parsed = parser.parse(rules.object).unwrap();
    assert_eq!(parsed, Json::Null);

    assert_eq!(parser.errors().len(), 1);
    let err = &parser.errors()[0];
    assert!(matches!(
        err.kind,
        RecognitionErrorKind::MismatchedToken { expected } if expected == toks.rcurly
    ));
    assert!(err.resynced_tokens.is_empty());
}

#[test]
fn missing_colon_is_repaired_by_insertion() {
    let toks = json_tokens();
    let (grammar, rules) = json_grammar("recov-insertion", recovering(), &toks);
    let mut parser = Parser::new(grammar, lex(r#"{ "a" 1 }"#, &toks)).unwrap();

    let parsed = parser.parse(rules.object).unwrap();
    assert_eq!(
        parsed,
        Json::Obj(vec![("a".to_owned(), Json::Num(1.0))])
    );

    assert_eq!(parser.errors().len(), 1);
    let err = &parser.errors()[0];
    assert!(matches!(
        err.kind,
        RecognitionErrorKind::MismatchedToken { expected } if expected == toks.colon
    ));
    assert_eq!(err.token.image, "1");
}

#[test]
fn doubled_separator_is_repaired_by_deletion() {
    let toks = json_tokens();
    let (grammar, list) = num_list_grammar("recov-deletion", recovering(), &toks);
    let mut parser = Parser::new(grammar, lex("[1,,2]", &toks)).unwrap();

    let parsed = parser.parse(list).unwrap();
    assert_eq!(parsed, vec![1.0, 2.0]);

    assert_eq!(parser.errors().len(), 1);
    let err = &parser.errors()[0];
    assert!(matches!(
        err.kind,
        RecognitionErrorKind::MismatchedToken { expected } if expected == toks.number
    ));
    assert_eq!(err.token.image, ",");
    assert!(err.resynced_tokens.is_empty());
}

#[test]
fn inserted_tokens_are_flagged() {
    let toks = json_tokens();
    let (grammar, rules) = json_grammar("recov-inserted-flag", recovering(), &toks);
    let mut parser = Parser::new(grammar, lex(r#"{ "a" true }"#, &toks)).unwrap();

    // The fabricated colon never reaches user code here, but the parse
    // must succeed with the real tokens intact.
    let parsed = parser.parse(rules.object).unwrap();
    assert_eq!(
        parsed,
        Json::Obj(vec![("a".to_owned(), Json::Bool(true))])
    );
    assert_eq!(parser.errors().len(), 1);
}

#[test]
fn in_repetition_recovery_skips_to_the_expected_terminal() {
    let toks = json_tokens();
    let (grammar, block) = block_grammar("recov-rep-skip", recovering(), &toks);
    // The comma cannot start an iteration and cannot follow the block.
    let mut parser = Parser::new(grammar, lex("{ 1 : , }", &toks)).unwrap();

    assert_eq!(parser.parse(block).unwrap(), 1);
    assert_eq!(parser.errors().len(), 1);
    let err = &parser.errors()[0];
    assert!(matches!(
        err.kind,
        RecognitionErrorKind::MismatchedToken { expected } if expected == toks.rcurly
    ));
    assert_eq!(err.resynced_tokens.len(), 1);
    assert_eq!(err.resynced_tokens[0].image, ",");
}

#[test]
fn in_repetition_recovery_reenters_when_the_lookahead_fires_again() {
    let toks = json_tokens();
    let (grammar, block) = block_grammar("recov-rep-reenter", recovering(), &toks);
    let mut parser = Parser::new(grammar, lex("{ 1 : , 2 : }", &toks)).unwrap();

    // Both iterations complete despite the stray comma between them.
    assert_eq!(parser.parse(block).unwrap(), 2);
    assert_eq!(parser.errors().len(), 1);
    assert_eq!(parser.errors()[0].resynced_tokens.len(), 1);
}

#[test]
fn between_rules_resync_attaches_the_skipped_tokens() {
    let toks = json_tokens();
    let (grammar, rules) = json_grammar("recov-resync-skip", recovering(), &toks);
    // The entry rule fails on `:` where a value should be; re-sync
    // skips to the `}` that may follow the entry's caller position.
    let mut parser = Parser::new(grammar, lex(r#"{ "a": : }"#, &toks)).unwrap();

    let parsed = parser.parse(rules.object).unwrap();
    assert!(matches!(parsed, Json::Obj(_)));

    assert_eq!(parser.errors().len(), 1);
    let err = &parser.errors()[0];
    assert!(matches!(err.kind, RecognitionErrorKind::NoViableAlt));
    assert_eq!(err.resynced_tokens.len(), 1);
    assert_eq!(err.resynced_tokens[0].image, ":");
}

#[test]
fn recovery_never_raises_out_of_the_top_rule() {
    let toks = json_tokens();
    let (grammar, rules) = json_grammar("recov-never-raises", recovering(), &toks);
    let inputs = [
        "{",
        "}",
        ":",
        r#"{ "a": }"#,
        r#"{ "a" 1"#,
        "[1,,2]",
        "[,]",
        r#"{ "a": 1 } }"#,
    ];

    let mut parser = Parser::new(Rc::clone(&grammar), Vec::new()).unwrap();
    for input in inputs {
        parser.reset(lex(input, &toks));
        let outcome = parser.parse(rules.value);
        assert!(outcome.is_ok(), "input {input:?} raised: {outcome:?}");
        assert!(
            !parser.errors().is_empty(),
            "input {input:?} produced no errors"
        );
    }
}

#[test]
fn rules_with_resync_disabled_defer_to_their_caller() {
    use std::sync::Arc;

    use lyrebird_core::grammar::build::{consume, subrule};

    use crate::define::{GrammarBuilder, RuleConfig};

    let toks = json_tokens();
    let (lcurly, rcurly, number) = (toks.lcurly, toks.rcurly, toks.number);

    let build = |name: &str, resync_enabled: bool| {
        let mut b: GrammarBuilder<u32> =
            GrammarBuilder::new(name, Arc::clone(&toks.registry), recovering());
        let inner = b.declare("inner");
        b.define_with_config(
            inner,
            vec![consume(1, number)],
            RuleConfig {
                resync_enabled,
                recovery_value: None,
            },
            move |p| p.consume(1, number).map(|_| 1),
        );
        let outer = b.rule(
            "outer",
            vec![consume(1, lcurly), subrule(1, "inner"), consume(2, rcurly)],
            move |p| {
                p.consume(1, lcurly)?;
                p.subrule(1, inner)?;
                p.consume(2, rcurly)?;
                Ok(2)
            },
        );
        (Rc::new(b.build()), outer)
    };

    // With re-sync on, `inner` repairs itself and the caller goes on to
    // consume the closing brace.
    let (grammar, outer) = build("recov-resync-inner-on", true);
    let mut parser = Parser::new(grammar, lex("{ }", &toks)).unwrap();
    assert_eq!(parser.parse(outer).unwrap(), 2);
    assert_eq!(parser.errors().len(), 1);
    assert!(parser.errors()[0].resynced_tokens.is_empty());

    // With re-sync off, the failure unwinds to the top rule, which can
    // only discard the rest of the input.
    let (grammar, outer) = build("recov-resync-inner-off", false);
    let mut parser = Parser::new(grammar, lex("{ }", &toks)).unwrap();
    assert_eq!(parser.parse(outer).unwrap(), 0);
    assert_eq!(parser.errors().len(), 1);
    assert_eq!(parser.errors()[0].resynced_tokens.len(), 1);
    assert_eq!(parser.errors()[0].resynced_tokens[0].image, "}");
}

#[test]
fn recovery_is_disabled_while_backtracking() {
    use std::sync::Arc;

    use lyrebird_core::grammar::build::consume;

    use crate::define::GrammarBuilder;

    let toks = json_tokens();
    let (number, colon) = (toks.number, toks.colon);

    let mut b: GrammarBuilder<u32> = GrammarBuilder::new(
        "recov-backtrack-off",
        Arc::clone(&toks.registry),
        recovering(),
    );
    let probe = b.rule(
        "probe",
        vec![consume(1, number), consume(2, colon)],
        move |p| {
            p.consume(1, number)?;
            p.consume(2, colon)?;
            Ok(1)
        },
    );
    let top = b.rule("top", vec![consume(1, number)], move |p| {
        let speculated = p.backtrack(probe, |_| true);
        p.consume(1, number)?;
        Ok(u32::from(speculated))
    });
    let grammar = Rc::new(b.build());

    // Inside backtracking the missing colon must not be repaired or
    // recorded; the speculation just fails.
    let mut parser = Parser::new(grammar, lex("1", &toks)).unwrap();
    assert_eq!(parser.parse(top).unwrap(), 0);
    assert!(parser.errors().is_empty());
}
