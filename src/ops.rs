//! [`Expression`] operations.

use crate::Expression;
use smol_str::SmolStr;
use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap},
    convert::TryFrom,
    hash::{BuildHasher, Hash},
};

/// The values of known variables, used when evaluating or simplifying an
/// [`Expression`].
pub trait Environment {
    /// Look up the value of a variable, if it is known.
    fn value_of(&self, name: &str) -> Option<f64>;
}

impl<'e, E: Environment + ?Sized> Environment for &'e E {
    fn value_of(&self, name: &str) -> Option<f64> { (**self).value_of(name) }
}

impl<K, S> Environment for HashMap<K, f64, S>
where
    K: Borrow<str> + Hash + Eq,
    S: BuildHasher,
{
    fn value_of(&self, name: &str) -> Option<f64> { self.get(name).copied() }
}

impl<K> Environment for BTreeMap<K, f64>
where
    K: Borrow<str> + Ord,
{
    fn value_of(&self, name: &str) -> Option<f64> { self.get(name).copied() }
}

/// A list of `(name, value)` pairs, where the first binding for a name wins.
impl<N: AsRef<str>> Environment for [(N, f64)] {
    fn value_of(&self, name: &str) -> Option<f64> {
        self.iter()
            .find(|(candidate, _)| candidate.as_ref() == name)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("the variable \"{name}\" has no value")]
    UnknownVariable { name: SmolStr },
    #[error("the empty expression has no value")]
    Empty,
}

/// Can `expr` be reduced to a single number using the known variables in
/// `env`?
pub fn has_value<E>(expr: &Expression, env: &E) -> bool
where
    E: Environment + ?Sized,
{
    match expr {
        Expression::Empty => false,
        Expression::Number(_) => true,
        Expression::Variable(var) => env.value_of(var.name()).is_some(),
        Expression::Plus { left, right } | Expression::Times { left, right } => {
            has_value(left, env) && has_value(right, env)
        },
    }
}

/// Calculate the numeric value of an [`Expression`].
///
/// This succeeds exactly when [`has_value()`] is `true`.
pub fn evaluate<E>(expr: &Expression, env: &E) -> Result<f64, EvaluationError>
where
    E: Environment + ?Sized,
{
    match expr {
        Expression::Empty => Err(EvaluationError::Empty),
        Expression::Number(value) => Ok(*value),
        Expression::Variable(var) => match env.value_of(var.name()) {
            Some(value) => Ok(var.coefficient() * pow(value, var.power())),
            None => Err(EvaluationError::UnknownVariable {
                name: var.name().into(),
            }),
        },
        Expression::Plus { left, right } => {
            Ok(evaluate(left, env)? + evaluate(right, env)?)
        },
        Expression::Times { left, right } => {
            Ok(evaluate(left, env)? * evaluate(right, env)?)
        },
    }
}

fn pow(base: f64, power: u32) -> f64 {
    match i32::try_from(power) {
        Ok(power) => base.powi(power),
        Err(_) => base.powf(f64::from(power)),
    }
}

/// Simplify an expression by substituting the values in `env` and evaluating
/// every sub-expression which no longer depends on an unknown variable.
///
/// A sub-expression whose value isn't finite (e.g. it overflows) is left
/// unevaluated, because there is no way to write that value back out.
pub fn simplify<E>(expr: &Expression, env: &E) -> Expression
where
    E: Environment + ?Sized,
{
    let simplified = fold_constants(expr, env);
    tracing::trace!(input = %expr, output = %simplified, "Simplified");

    simplified
}

fn fold_constants<E>(expr: &Expression, env: &E) -> Expression
where
    E: Environment + ?Sized,
{
    match evaluate(expr, env) {
        Ok(value) if value.is_finite() => return Expression::number(value),
        _ => {},
    }

    match expr {
        Expression::Plus { left, right } => {
            match (fold_constants(left, env), fold_constants(right, env)) {
                // an unknown which got multiplied by zero leaves two numbers
                (Expression::Number(l), Expression::Number(r))
                    if (l + r).is_finite() =>
                {
                    Expression::number(l + r)
                },
                (left, right) => Expression::plus(left, right),
            }
        },
        Expression::Times { left, right } => {
            match (fold_constants(left, env), fold_constants(right, env)) {
                (Expression::Number(l), Expression::Number(r))
                    if (l * r).is_finite() =>
                {
                    Expression::number(l * r)
                },
                (left, right) => Expression::times(left, right),
            }
        },
        // empty, or a variable we don't know the value of
        _ => expr.clone(),
    }
}

/// Calculate an [`Expression`]'s derivative with respect to a particular
/// variable.
pub fn differentiate(expr: &Expression, variable: &str) -> Expression {
    let got = derivative(expr, variable);
    tracing::trace!(input = %expr, variable, output = %got, "Differentiated");

    got
}

fn derivative(expr: &Expression, variable: &str) -> Expression {
    match expr {
        Expression::Empty => Expression::empty(),
        Expression::Number(_) => Expression::number(0),
        Expression::Variable(var) => {
            if var.name() != variable || var.power() == 0 {
                return Expression::number(0);
            }

            // The power rule
            let coefficient = var.coefficient() * f64::from(var.power());

            if coefficient.is_finite() {
                Expression::variable(var.name(), coefficient, var.power() - 1)
            } else {
                Expression::times(
                    Expression::number(var.power()),
                    Expression::variable(
                        var.name(),
                        var.coefficient(),
                        var.power() - 1,
                    ),
                )
            }
        },
        Expression::Plus { left, right } => Expression::plus(
            derivative(left, variable),
            derivative(right, variable),
        ),
        Expression::Times { left, right } => {
            // The product rule
            let d_left = derivative(left, variable);
            let d_right = derivative(right, variable);
            let left = Expression::clone(left);
            let right = Expression::clone(right);

            Expression::plus(
                Expression::times(left, d_right),
                Expression::times(right, d_left),
            )
        },
    }
}
