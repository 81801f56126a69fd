//! Runtime tests: combinator behavior, error recovery, and the
//! JSON-like end-to-end scenarios.

mod recovery_tests;
pub(crate) mod support;
