//! Turning a [`ParseTree`] into an [`Expression`].

use crate::{
    parse::{recognize, ParseTree, Rule},
    Error, Expression,
};
use std::{ops::Range, str::FromStr};

/// Parse an [`Expression`] from some text.
pub fn parse(src: &str) -> Result<Expression, Error> {
    tracing::trace!(src, "Parsing an expression");

    let tree = recognize(src).map_err(|e| {
        tracing::debug!(src, error = %e, "Unable to parse");
        e
    })?;
    let expr = build(&tree)?;

    Ok(expr)
}

impl FromStr for Expression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse(s) }
}

/// Build an [`Expression`] from a recognised [`ParseTree`], folding sums and
/// products through the smart constructors.
pub fn build(tree: &ParseTree<'_>) -> Result<Expression, BuilderInvariantError> {
    match tree.rule {
        Rule::Number => number(tree),
        Rule::Variable => variable(tree),
        Rule::Sum => fold(tree, Expression::plus),
        Rule::Product => fold(tree, Expression::times),
    }
}

fn fold<F>(
    tree: &ParseTree<'_>,
    combine: F,
) -> Result<Expression, BuilderInvariantError>
where
    F: Fn(Expression, Expression) -> Expression,
{
    let mut children = tree.children.iter();

    let first = match children.next() {
        Some(child) => build(child)?,
        None => {
            return Err(BuilderInvariantError::NoChildren {
                rule: tree.rule,
                span: tree.span.clone(),
            })
        },
    };

    children.try_fold(first, |acc, child| Ok(combine(acc, build(child)?)))
}

fn number(tree: &ParseTree<'_>) -> Result<Expression, BuilderInvariantError> {
    match tree.text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Expression::number(value)),
        _ => Err(malformed(tree)),
    }
}

fn variable(tree: &ParseTree<'_>) -> Result<Expression, BuilderInvariantError> {
    let (coefficient, name, power) =
        split_variable(tree.text).ok_or_else(|| malformed(tree))?;

    Ok(Expression::variable(name, coefficient, power))
}

fn malformed(tree: &ParseTree<'_>) -> BuilderInvariantError {
    BuilderInvariantError::MalformedLeaf {
        rule: tree.rule,
        text: tree.text.to_string(),
        span: tree.span.clone(),
    }
}

/// Split a variable token (e.g. `4.5x^3`) into its coefficient, name and
/// power.
fn split_variable(text: &str) -> Option<(f64, &str, u32)> {
    let name_start = text.find(|c: char| c.is_ascii_alphabetic())?;
    let (coefficient, rest) = text.split_at(name_start);
    let name_end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or_else(|| rest.len());
    let (name, power) = rest.split_at(name_end);

    let coefficient = if coefficient.is_empty() {
        1.0
    } else {
        coefficient.parse().ok().filter(|c: &f64| c.is_finite())?
    };

    let power = if power.is_empty() {
        1
    } else {
        let digits = power.strip_prefix('^')?;
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()?
    };

    Some((coefficient, name, power))
}

/// The [`ParseTree`] handed to [`build()`] couldn't have come from the
/// grammar. This is a bug, not bad input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuilderInvariantError {
    #[error("a {rule:?} at {span:?} has no children")]
    NoChildren { rule: Rule, span: Range<usize> },
    #[error("{text:?} at {span:?} isn't a valid {rule:?}")]
    MalformedLeaf {
        rule: Rule,
        text: String,
        span: Range<usize>,
    },
}
