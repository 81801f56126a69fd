//! Core data model for the lyrebird parsing engine.
//!
//! This crate is pure data:
//! - `tokens` - token-type handles, the token-type registry, token values
//! - `grammar` - the grammar AST, constructor helpers, visitor, deep clone
//!
//! The analysis pipeline and the parser runtime live in the `lyrebird`
//! crate; everything here can be built, serialized, and inspected without
//! pulling in the engine.

pub mod grammar;
pub mod tokens;

pub use grammar::{DslKind, Production, Rule, RuleId};
pub use tokens::{Token, TokenRegistry, TokenType};
