//! Property-based tests for the algebraic laws expressions should obey.

use crate::{ops, parse, Expression};
use proptest::prelude::*;
use std::collections::HashMap;

fn name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["x", "y", "Z"])
}

fn leaf() -> impl Strategy<Value = Expression> {
    prop_oneof![
        (0u32..50).prop_map(Expression::number),
        (0u32..40).prop_map(|n| Expression::number(f64::from(n) / 4.0)),
        (name(), 1u32..8, 1u32..5).prop_map(|(name, c, power)| {
            Expression::variable(name, f64::from(c) / 2.0, power)
        }),
    ]
}

fn expression() -> impl Strategy<Value = Expression> {
    leaf().prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(l, r)| Expression::plus(l, r)),
            (inner.clone(), inner).prop_map(|(l, r)| Expression::times(l, r)),
        ]
    })
}

fn environment() -> impl Strategy<Value = HashMap<&'static str, f64>> {
    prop::collection::hash_map(name(), (0u32..6).prop_map(f64::from), 0..3)
}

proptest! {
    #[test]
    fn display_round_trips(e in expression()) {
        let round_tripped = parse(&e.to_string()).unwrap();

        prop_assert_eq!(round_tripped, e);
    }

    #[test]
    fn empty_is_an_identity(e in expression()) {
        prop_assert_eq!(Expression::plus(e.clone(), Expression::empty()), e.clone());
        prop_assert_eq!(Expression::plus(Expression::empty(), e.clone()), e.clone());
        prop_assert_eq!(Expression::times(e.clone(), Expression::empty()), e);
    }

    #[test]
    fn zero_absorbs_products(e in expression()) {
        prop_assert_eq!(
            Expression::times(e, Expression::number(0)),
            Expression::number(0)
        );
    }

    #[test]
    fn equal_expressions_hash_the_same(e in expression()) {
        let copy = parse(&e.to_string()).unwrap();

        prop_assert_eq!(copy.hash_code(), e.hash_code());
    }

    #[test]
    fn simplify_is_idempotent(e in expression(), env in environment()) {
        let once = ops::simplify(&e, &env);
        let twice = ops::simplify(&once, &env);

        prop_assert_eq!(twice, once);
    }

    #[test]
    fn simplify_agrees_with_evaluate(e in expression(), env in environment()) {
        if let Ok(value) = ops::evaluate(&e, &env) {
            prop_assume!(value.is_finite());
            prop_assert_eq!(ops::simplify(&e, &env), Expression::number(value));
        }
    }

    #[test]
    fn differentiation_is_linear(
        a in expression(),
        b in expression(),
        variable in name(),
    ) {
        let sum = Expression::plus(a.clone(), b.clone());

        let got = ops::differentiate(&sum, variable);

        let should_be = Expression::plus(
            ops::differentiate(&a, variable),
            ops::differentiate(&b, variable),
        );
        prop_assert_eq!(got, should_be);
    }

    #[test]
    fn derivatives_round_trip(e in expression(), variable in name()) {
        let derivative = ops::differentiate(&e, variable);

        let round_tripped = parse(&derivative.to_string()).unwrap();

        prop_assert_eq!(round_tripped, derivative);
    }
}
