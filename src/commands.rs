//! Text-in, text-out versions of the [`crate::ops`] functions.

use crate::{
    expr::is_valid_name,
    ops::{self, Environment},
    parse, Error,
};

/// Differentiate `expression` with respect to `variable`, returning the
/// derivative in its canonical text form.
pub fn differentiate(expression: &str, variable: &str) -> Result<String, Error> {
    if !is_valid_name(variable) {
        return Err(Error::InvalidVariableName {
            name: variable.to_string(),
        });
    }

    let expr = parse(expression)?;

    Ok(ops::differentiate(&expr, variable).to_string())
}

/// Simplify `expression` using the values in `environment`, returning the
/// result in its canonical text form.
pub fn simplify<E>(expression: &str, environment: &E) -> Result<String, Error>
where
    E: Environment + ?Sized,
{
    let expr = parse(expression)?;

    Ok(ops::simplify(&expr, environment).to_string())
}
