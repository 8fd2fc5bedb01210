//! Access control resolution.

pub mod resolver;

pub use resolver::{AccessDecision, AccessResolver, AccessVia};
