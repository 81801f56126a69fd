//! Shared fixtures: a JSON-like token set, a logos lexer for it, and
//! grammars used across the runtime tests.
//!
//! Every test builds its grammar under a unique class name because the
//! analysis cache is keyed by name and lives for the whole test process.

use std::rc::Rc;
use std::sync::Arc;

use logos::Logos;

use lyrebird_core::grammar::RuleId;
use lyrebird_core::grammar::build::{consume, many, many_sep, or, subrule};
use lyrebird_core::tokens::{Token, TokenRegistry, TokenType};

use crate::config::ParserConfig;
use crate::define::{Grammar, GrammarBuilder};
use crate::parse::OrAlt;

/// Value type of the JSON fixture grammar. `Entry` is what the `entry`
/// rule returns to the `object` rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) enum Json {
    #[default]
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Arr(Vec<Json>),
    Obj(Vec<(String, Json)>),
    Entry(String, Box<Json>),
}

pub(crate) struct JsonTokens {
    pub registry: Arc<TokenRegistry>,
    pub lcurly: TokenType,
    pub rcurly: TokenType,
    pub lbracket: TokenType,
    pub rbracket: TokenType,
    pub colon: TokenType,
    pub comma: TokenType,
    pub string: TokenType,
    pub number: TokenType,
    pub true_tok: TokenType,
    pub false_tok: TokenType,
    pub null_tok: TokenType,
}

pub(crate) fn json_tokens() -> JsonTokens {
    let mut reg = TokenRegistry::new();
    let lcurly = reg.register_with_label("LCurly", "'{'");
    let rcurly = reg.register_with_label("RCurly", "'}'");
    let lbracket = reg.register_with_label("LBracket", "'['");
    let rbracket = reg.register_with_label("RBracket", "']'");
    let colon = reg.register_with_label("Colon", "':'");
    let comma = reg.register_with_label("Comma", "','");
    let string = reg.register("Str");
    let number = reg.register("Number");
    let true_tok = reg.register("True");
    let false_tok = reg.register("False");
    let null_tok = reg.register("Null");
    JsonTokens {
        registry: Arc::new(reg),
        lcurly,
        rcurly,
        lbracket,
        rbracket,
        colon,
        comma,
        string,
        number,
        true_tok,
        false_tok,
        null_tok,
    }
}

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\r\n]+")]
enum RawTok {
    #[token("{")]
    LCurly,
    #[token("}")]
    RCurly,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    Str,
    #[regex(r"-?[0-9]+(?:\.[0-9]+)?")]
    Num,
}

/// Lex a fixture source into engine tokens. Test inputs lex cleanly by
/// construction; parse-level breakage is introduced at the token level.
pub(crate) fn lex(src: &str, toks: &JsonTokens) -> Vec<Token> {
    let mut out = Vec::new();
    let mut lexer = RawTok::lexer(src);
    while let Some(result) = lexer.next() {
        let raw = result.unwrap_or_else(|_| panic!("fixture does not lex: {src:?}"));
        let tt = match raw {
            RawTok::LCurly => toks.lcurly,
            RawTok::RCurly => toks.rcurly,
            RawTok::LBracket => toks.lbracket,
            RawTok::RBracket => toks.rbracket,
            RawTok::Colon => toks.colon,
            RawTok::Comma => toks.comma,
            RawTok::True => toks.true_tok,
            RawTok::False => toks.false_tok,
            RawTok::Null => toks.null_tok,
            RawTok::Str => toks.string,
            RawTok::Num => toks.number,
        };
        let span = lexer.span();
        out.push(Token::new(tt, &src[span.clone()]).with_span(span.start as u32, span.end as u32));
    }
    out
}

pub(crate) fn unquote(image: &str) -> String {
    image.trim_matches('"').to_owned()
}

pub(crate) struct JsonRules {
    pub value: RuleId,
    pub object: RuleId,
    pub array: RuleId,
    pub entry: RuleId,
}

/// The JSON-like grammar from the end-to-end scenarios.
pub(crate) fn json_grammar(
    class_name: &str,
    config: ParserConfig,
    toks: &JsonTokens,
) -> (Rc<Grammar<Json>>, JsonRules) {
    let mut b: GrammarBuilder<Json> =
        GrammarBuilder::new(class_name, Arc::clone(&toks.registry), config);

    let value = b.declare("value");
    let object = b.declare("object");
    let array = b.declare("array");
    let entry = b.declare("entry");

    let (lcurly, rcurly) = (toks.lcurly, toks.rcurly);
    let (lbracket, rbracket) = (toks.lbracket, toks.rbracket);
    let (colon, comma) = (toks.colon, toks.comma);
    let (string, number) = (toks.string, toks.number);
    let (true_tok, false_tok, null_tok) = (toks.true_tok, toks.false_tok, toks.null_tok);

    b.define(
        value,
        vec![or(
            1,
            vec![
                vec![consume(1, string)],
                vec![consume(2, number)],
                vec![consume(3, true_tok)],
                vec![consume(4, false_tok)],
                vec![consume(5, null_tok)],
                vec![subrule(1, "object")],
                vec![subrule(2, "array")],
            ],
        )],
        move |p| {
            p.or(
                1,
                &mut [
                    OrAlt::new(&mut |p| {
                        p.consume(1, string).map(|t| Json::Str(unquote(&t.image)))
                    }),
                    OrAlt::new(&mut |p| {
                        p.consume(2, number)
                            .map(|t| Json::Num(t.image.parse().unwrap_or(f64::NAN)))
                    }),
                    OrAlt::new(&mut |p| p.consume(3, true_tok).map(|_| Json::Bool(true))),
                    OrAlt::new(&mut |p| p.consume(4, false_tok).map(|_| Json::Bool(false))),
                    OrAlt::new(&mut |p| p.consume(5, null_tok).map(|_| Json::Null)),
                    OrAlt::new(&mut |p| p.subrule(1, object)),
                    OrAlt::new(&mut |p| p.subrule(2, array)),
                ],
                None,
            )
        },
    );

    b.define(
        object,
        vec![
            consume(1, lcurly),
            many_sep(1, comma, vec![subrule(1, "entry")]),
            consume(2, rcurly),
        ],
        move |p| {
            p.consume(1, lcurly)?;
            let mut fields = Vec::new();
            p.many_sep(1, comma, |p| {
                match p.subrule(1, entry)? {
                    Json::Entry(key, val) => fields.push((key, *val)),
                    // A re-synced entry yields its recovery value.
                    other => fields.push((String::new(), other)),
                }
                Ok(())
            })?;
            p.consume(2, rcurly)?;
            Ok(Json::Obj(fields))
        },
    );

    b.define(
        array,
        vec![
            consume(1, lbracket),
            many_sep(1, comma, vec![subrule(1, "value")]),
            consume(2, rbracket),
        ],
        move |p| {
            p.consume(1, lbracket)?;
            let mut items = Vec::new();
            p.many_sep(1, comma, |p| {
                items.push(p.subrule(1, value)?);
                Ok(())
            })?;
            p.consume(2, rbracket)?;
            Ok(Json::Arr(items))
        },
    );

    b.define(
        entry,
        vec![consume(1, string), consume(2, colon), subrule(1, "value")],
        move |p| {
            let key = p.consume(1, string)?;
            p.consume(2, colon)?;
            let val = p.subrule(1, value)?;
            Ok(Json::Entry(unquote(&key.image), Box::new(val)))
        },
    );

    (
        Rc::new(b.build()),
        JsonRules {
            value,
            object,
            array,
            entry,
        },
    )
}

/// `[` Number (`,` Number)* `]`, collecting the numeric values.
pub(crate) fn num_list_grammar(
    class_name: &str,
    config: ParserConfig,
    toks: &JsonTokens,
) -> (Rc<Grammar<Vec<f64>>>, RuleId) {
    let mut b: GrammarBuilder<Vec<f64>> =
        GrammarBuilder::new(class_name, Arc::clone(&toks.registry), config);
    let (lbracket, rbracket, comma, number) =
        (toks.lbracket, toks.rbracket, toks.comma, toks.number);

    let list = b.rule(
        "list",
        vec![
            consume(1, lbracket),
            many_sep(1, comma, vec![consume(2, number)]),
            consume(3, rbracket),
        ],
        move |p| {
            p.consume(1, lbracket)?;
            let mut items = Vec::new();
            p.many_sep(1, comma, |p| {
                let tok = p.consume(2, number)?;
                items.push(tok.image.parse().unwrap_or(f64::NAN));
                Ok(())
            })?;
            p.consume(3, rbracket)?;
            Ok(items)
        },
    );
    (Rc::new(b.build()), list)
}

/// `{` (Number `:`)* `}`, returning the iteration count. Exercises the
/// in-repetition recovery paths.
pub(crate) fn block_grammar(
    class_name: &str,
    config: ParserConfig,
    toks: &JsonTokens,
) -> (Rc<Grammar<u32>>, RuleId) {
    let mut b: GrammarBuilder<u32> =
        GrammarBuilder::new(class_name, Arc::clone(&toks.registry), config);
    let (lcurly, rcurly, colon, number) = (toks.lcurly, toks.rcurly, toks.colon, toks.number);

    let block = b.rule(
        "block",
        vec![
            consume(1, lcurly),
            many(1, vec![consume(2, number), consume(3, colon)]),
            consume(4, rcurly),
        ],
        move |p| {
            p.consume(1, lcurly)?;
            let count = p.many(1, |p| {
                p.consume(2, number)?;
                p.consume(3, colon)?;
                Ok(())
            })?;
            p.consume(4, rcurly)?;
            Ok(count)
        },
    );
    (Rc::new(b.build()), block)
}
