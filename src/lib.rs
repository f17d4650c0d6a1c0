//! A small symbolic algebra system for polynomial expressions.
//!
//! Expressions are sums and products of numbers and `coefficient *
//! name^power` terms. They can be parsed from text, differentiated, simplified
//! against a set of known values, and written back out in a canonical form
//! which parses to an equal [`Expression`].
//!
//! ```rust
//! use polyexpr::ops;
//! use std::collections::HashMap;
//!
//! let expr = polyexpr::parse("4x^2 * 4.37 + 3y").unwrap();
//! let derivative = ops::differentiate(&expr, "x");
//! assert_eq!(derivative.to_string(), "(4.37 * 8x)");
//!
//! let mut env = HashMap::new();
//! env.insert("x", 3.0);
//! let cubed = polyexpr::parse("x*x*x").unwrap();
//! assert_eq!(ops::simplify(&cubed, &env).to_string(), "27");
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod build;
pub mod commands;
mod expr;
pub mod ops;
mod parse;
#[cfg(test)]
mod proptests;

pub use build::{build, parse, BuilderInvariantError};
pub use expr::{Expression, Variable};
pub use parse::{recognize, ParseError, ParseTree, Rule, TokenKind};

/// Anything that can go wrong when turning text into an [`Expression`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The parse tree and the builder disagree about the grammar (a bug).
    #[error(transparent)]
    Builder(#[from] BuilderInvariantError),
    #[error("\"{name}\" is not a valid variable name")]
    InvalidVariableName { name: String },
}
