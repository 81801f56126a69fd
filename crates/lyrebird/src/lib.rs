//! lyrebird: declare LL(k) grammars as plain Rust, parse with recovery.
//!
//! Rules are registered on a [`GrammarBuilder`] as a grammar-AST
//! declaration plus an ordinary closure over the combinator primitives
//! (`consume`, `subrule`, `option`, `or`, `many`, ...). The first parser
//! constructed for a grammar class runs self-analysis - reference
//! resolution, validation, FOLLOW sets, lookahead decision tables - and
//! caches the result process-wide; at parse time the precomputed tables
//! drive both alternative selection and error recovery (single-token
//! insertion/deletion and re-synchronization).
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! use lyrebird::{GrammarBuilder, Parser, ParserConfig};
//! use lyrebird_core::grammar::build::{consume, many_sep};
//! use lyrebird_core::tokens::{Token, TokenRegistry};
//!
//! let mut registry = TokenRegistry::new();
//! let comma = registry.register_with_label("Comma", "','");
//! let number = registry.register("Number");
//! let registry = Arc::new(registry);
//!
//! let mut builder: GrammarBuilder<u32> =
//!     GrammarBuilder::new("doc-example", Arc::clone(&registry), ParserConfig::default());
//! let list = builder.rule(
//!     "list",
//!     vec![many_sep(1, comma, vec![consume(1, number)])],
//!     move |p| {
//!         let mut total = 0;
//!         p.many_sep(1, comma, |p| {
//!             total += p.consume(1, number)?.image.parse::<u32>().unwrap_or(0);
//!             Ok(())
//!         })?;
//!         Ok(total)
//!     },
//! );
//! let grammar = Rc::new(builder.build());
//!
//! let tokens = vec![
//!     Token::new(number, "1"),
//!     Token::new(comma, ","),
//!     Token::new(number, "2"),
//! ];
//! let mut parser = Parser::new(grammar, tokens).expect("valid grammar");
//! assert_eq!(parser.parse(list).unwrap(), 3);
//! ```

pub mod analyze;
pub mod cache;
pub mod config;
pub mod define;
pub mod errors;
pub mod parse;

pub use config::{IgnoredIssues, ParserConfig};
pub use define::{Grammar, GrammarBuilder, RuleConfig};
pub use errors::{DefinitionError, DefinitionErrorKind, DefinitionErrors};
pub use parse::{OrAlt, ParseResult, Parser, RecognitionError, RecognitionErrorKind};

pub use lyrebird_core::grammar::{DslKind, Production, Rule, RuleId};
pub use lyrebird_core::tokens::{Token, TokenRegistry, TokenType};

/// Errors surfaced when constructing a parser instance.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The analysis cache is keyed by grammar-class name, so a grammar
    /// without a stable name cannot be analyzed.
    #[error("anonymous grammar class: the analysis cache requires a stable grammar name")]
    AnonymousGrammar,

    /// Self-analysis found definition errors and deferral is disabled.
    #[error("grammar `{name}` is invalid:\n{errors}")]
    InvalidGrammar {
        name: String,
        errors: DefinitionErrors,
    },
}

/// Result type for parser construction.
pub type Result<T> = std::result::Result<T, Error>;
