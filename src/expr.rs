use crate::Error;
use smol_str::SmolStr;
use std::{
    collections::hash_map::DefaultHasher,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    ops::{Add, Mul},
};

/// An immutable polynomial expression.
///
/// The variants are public so callers can pattern match on them, but trees
/// should be built with [`Expression::plus()`] and [`Expression::times()`]
/// (or by parsing) so the canonical-form guarantees hold.
///
/// Every operation recurses over the tree. Parsing rejects text which would
/// nest more than 256 levels deep, so a deeper tree (built by hand, or by
/// repeatedly differentiating) won't parse back from its text form, and a
/// much deeper one can overflow the stack.
#[derive(Debug, Clone)]
pub enum Expression {
    /// The absent expression, an identity for both `+` and `*`.
    Empty,
    /// A numeric literal.
    Number(f64),
    /// A single `coefficient * name^power` term.
    Variable(Variable),
    Plus {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Times {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn empty() -> Self { Expression::Empty }

    /// Create a [`Expression::Number`]. Negative zero is stored as `0`.
    ///
    /// Only finite, non-negative numbers can be written out and parsed back.
    pub fn number<N: Into<f64>>(value: N) -> Self {
        let value = value.into();

        if value == 0.0 {
            Expression::Number(0.0)
        } else {
            Expression::Number(value)
        }
    }

    /// Create the term `coefficient * name^power`.
    ///
    /// Terms which don't depend on `name` collapse to a plain number (a zero
    /// coefficient gives `0`, a zero power gives `coefficient`), because that
    /// is how they are written out.
    ///
    /// The `name` must be a non-empty run of ASCII letters. This is only
    /// checked in debug builds, use [`Expression::try_variable()`] when the
    /// name comes from outside the program.
    pub fn variable<S: Into<SmolStr>>(
        name: S,
        coefficient: f64,
        power: u32,
    ) -> Self {
        let name = name.into();
        debug_assert!(
            is_valid_name(&name),
            "\"{}\" is not a valid variable name",
            name
        );

        if coefficient == 0.0 {
            Expression::number(0.0)
        } else if power == 0 {
            Expression::number(coefficient)
        } else {
            Expression::Variable(Variable {
                name,
                coefficient,
                power,
            })
        }
    }

    /// Create the term `coefficient * name^power`, checking that `name` is a
    /// valid variable name.
    pub fn try_variable<S: Into<SmolStr>>(
        name: S,
        coefficient: f64,
        power: u32,
    ) -> Result<Self, Error> {
        let name = name.into();

        if is_valid_name(&name) {
            Ok(Expression::variable(name, coefficient, power))
        } else {
            Err(Error::InvalidVariableName {
                name: name.to_string(),
            })
        }
    }

    /// Add two expressions, dropping empty/zero operands and folding `a + a`
    /// into its doubled form.
    pub fn plus(left: Expression, right: Expression) -> Expression {
        if left.is_empty() {
            return right;
        }
        if right.is_empty() {
            return left;
        }
        if left.is_zero() {
            return right;
        }
        if right.is_zero() {
            return left;
        }

        if left == right {
            return match (left, right) {
                (Expression::Number(value), _) if (value * 2.0).is_finite() => {
                    Expression::number(value * 2.0)
                },
                (Expression::Variable(var), _)
                    if (var.coefficient * 2.0).is_finite() =>
                {
                    Expression::variable(
                        var.name,
                        var.coefficient * 2.0,
                        var.power,
                    )
                },
                // there's no single-node way to write "2(a + b)", or a
                // doubled value which overflows
                (left, right) => Expression::Plus {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }

        Expression::Plus {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Multiply two expressions, absorbing zeroes, dropping empty operands and
    /// folding `a * a` into its squared form.
    pub fn times(left: Expression, right: Expression) -> Expression {
        if left.is_zero() || right.is_zero() {
            return Expression::number(0.0);
        }
        if left.is_empty() {
            return right;
        }
        if right.is_empty() {
            return left;
        }

        if left == right {
            return match (left, right) {
                (Expression::Number(value), _) if (value * value).is_finite() => {
                    Expression::number(value * value)
                },
                (Expression::Variable(var), right) => {
                    let coefficient = var.coefficient * var.coefficient;

                    match var.power.checked_mul(2) {
                        Some(power) if coefficient.is_finite() => {
                            Expression::variable(var.name, coefficient, power)
                        },
                        _ => Expression::Times {
                            left: Box::new(Expression::Variable(var)),
                            right: Box::new(right),
                        },
                    }
                },
                (left, right) => Expression::Times {
                    left: Box::new(left),
                    right: Box::new(right),
                },
            };
        }

        Expression::Times {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Expression::Empty => true,
            _ => false,
        }
    }

    /// Is this expression numerically zero?
    pub fn is_zero(&self) -> bool {
        match self {
            Expression::Number(value) => *value == 0.0,
            Expression::Variable(var) => var.coefficient == 0.0,
            _ => false,
        }
    }

    /// The distinct variable names used by this expression, in the order they
    /// first appear.
    pub fn variables(&self) -> impl Iterator<Item = &str> + '_ {
        let mut names = Vec::new();
        collect_variables(self, &mut names);
        names.into_iter()
    }

    /// Does this expression mention the variable, `name`?
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Expression::Empty | Expression::Number(_) => false,
            Expression::Variable(var) => var.name() == name,
            Expression::Plus { left, right }
            | Expression::Times { left, right } => {
                left.depends_on(name) || right.depends_on(name)
            },
        }
    }

    /// A hash code consistent with structural equality.
    pub fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn collect_variables<'a>(expr: &'a Expression, names: &mut Vec<&'a str>) {
    match expr {
        Expression::Empty | Expression::Number(_) => {},
        Expression::Variable(var) => {
            if !names.contains(&var.name()) {
                names.push(var.name());
            }
        },
        Expression::Plus { left, right } | Expression::Times { left, right } => {
            collect_variables(left, names);
            collect_variables(right, names);
        },
    }
}

/// Variable names are a non-empty run of ASCII letters.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic())
}

/// The `coefficient * name^power` part of an [`Expression::Variable`].
#[derive(Debug, Clone)]
pub struct Variable {
    name: SmolStr,
    coefficient: f64,
    power: u32,
}

impl Variable {
    pub fn name(&self) -> &str { &self.name }

    pub fn coefficient(&self) -> f64 { self.coefficient }

    pub fn power(&self) -> u32 { self.power }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Variable) -> bool {
        self.name == other.name
            && canonical_bits(self.coefficient)
                == canonical_bits(other.coefficient)
            && self.power == other.power
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        canonical_bits(self.coefficient).hash(state);
        self.power.hash(state);
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.coefficient == 0.0 {
            return write!(f, "0");
        }

        // "1x" is redundant, but a bare "1" still needs its coefficient
        if self.coefficient != 1.0 || self.power == 0 {
            write!(f, "{}", self.coefficient)?;
        }

        if self.power != 0 {
            write!(f, "{}", self.name)?;
        }

        if self.power > 1 {
            write!(f, "^{}", self.power)?;
        }

        Ok(())
    }
}

/// The bits used when comparing and hashing numbers, so `-0.0 == 0.0` and
/// every `NaN` is equal to itself.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0_f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Expression) -> bool {
        match (self, other) {
            (Expression::Empty, Expression::Empty) => true,
            (Expression::Number(left), Expression::Number(right)) => {
                canonical_bits(*left) == canonical_bits(*right)
            },
            (Expression::Variable(left), Expression::Variable(right)) => {
                left == right
            },
            (
                Expression::Plus {
                    left: l_left,
                    right: l_right,
                },
                Expression::Plus {
                    left: r_left,
                    right: r_right,
                },
            )
            | (
                Expression::Times {
                    left: l_left,
                    right: l_right,
                },
                Expression::Times {
                    left: r_left,
                    right: r_right,
                },
            ) => l_left == r_left && l_right == r_right,
            _ => false,
        }
    }
}

impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Expression::Empty => {},
            Expression::Number(value) => canonical_bits(*value).hash(state),
            Expression::Variable(var) => var.hash(state),
            Expression::Plus { left, right }
            | Expression::Times { left, right } => {
                left.hash(state);
                right.hash(state);
            },
        }
    }
}

impl Default for Expression {
    fn default() -> Expression { Expression::Empty }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Expression { Expression::number(value) }
}

impl From<u32> for Expression {
    fn from(value: u32) -> Expression { Expression::number(value) }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Expression {
        Expression::variable(var.name, var.coefficient, var.power)
    }
}

// define some operator overloads to make constructing an expression easier.

impl Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression { Expression::plus(self, rhs) }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression { Expression::times(self, rhs) }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Empty => Ok(()),
            // f64's Display already drops the ".0" from integers
            Expression::Number(value) => write!(f, "{}", value),
            Expression::Variable(var) => write!(f, "{}", var),
            Expression::Plus { left, right } => {
                write!(f, "({} + {})", left, right)
            },
            Expression::Times { left, right } => {
                write!(f, "({} * {})", left, right)
            },
        }
    }
}
