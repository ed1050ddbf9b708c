//! End-to-end checks of the formula engine's public contract

use branch_report_formula::{
    evaluate_formula, evaluate_formula_outcome, tokenize, try_evaluate_formula,
    validate_formula_variables, FormulaError, FormulaValidation, TokenKind,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn table(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Seeded "Monthly Report" formulas against a realistic entry
#[test]
fn test_monthly_report_formulas() {
    let values = table(&[("A", 1000.0), ("B", 600.0)]);
    assert_eq!(evaluate_formula("A - B", &values), 400.0);
    assert_eq!(evaluate_formula("(A - B) / A", &values), 0.4);

    // Nothing entered yet: running totals stay at zero instead of failing
    let empty = table(&[]);
    assert_eq!(evaluate_formula("A - B", &empty), 0.0);
    assert_eq!(evaluate_formula("(A - B) / A", &empty), 0.0);
}

#[test]
fn test_arithmetic_table() {
    let cases: &[(&str, &[(&str, f64)], f64)] = &[
        ("A + B", &[("A", 2.0), ("B", 3.0)], 5.0),
        ("A - B", &[("A", 5.0), ("B", 3.0)], 2.0),
        ("A * B", &[("A", 4.0), ("B", 3.0)], 12.0),
        ("A / B", &[("A", 9.0), ("B", 3.0)], 3.0),
        ("A + B * C", &[("A", 1.0), ("B", 2.0), ("C", 3.0)], 7.0),
        ("(A + B) * C", &[("A", 1.0), ("B", 2.0), ("C", 3.0)], 9.0),
        ("A - B - C", &[("A", 10.0), ("B", 3.0), ("C", 2.0)], 5.0),
        ("A + B", &[("A", 5.0)], 5.0),
        ("A / B", &[("A", 5.0), ("B", 0.0)], 0.0),
        ("", &[], 0.0),
    ];

    for (formula, values, expected) in cases {
        assert_eq!(
            evaluate_formula(formula, &table(values)),
            *expected,
            "formula {formula:?}"
        );
    }
}

#[test]
fn test_validation_contract() {
    let keys: HashSet<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
    assert_eq!(
        FormulaValidation::from(validate_formula_variables("A + B", &keys)),
        FormulaValidation::ok()
    );

    let keys: HashSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
    let verdict = FormulaValidation::from(validate_formula_variables("A + Z", &keys));
    assert!(!verdict.valid);
    assert!(verdict.error.unwrap().contains('Z'));
}

#[test]
fn test_soft_failure_is_distinguishable_from_zero() {
    let values = table(&[("A", 3.0)]);

    let genuine = evaluate_formula_outcome("A - A", &values);
    assert!(!genuine.is_soft_failure());
    assert_eq!(genuine.value(), 0.0);

    let suppressed = evaluate_formula_outcome("(A - A", &values);
    assert!(suppressed.is_soft_failure());
    assert_eq!(suppressed.value(), 0.0);
    assert!(matches!(
        suppressed.error(),
        Some(FormulaError::UnbalancedParenthesis { .. })
    ));
}

#[test]
fn test_engine_is_shareable_across_threads() {
    let values = std::sync::Arc::new(table(&[("A", 1000.0), ("B", 600.0)]));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let values = values.clone();
            std::thread::spawn(move || evaluate_formula("(A - B) / A", &*values))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0.4);
    }
}

proptest! {
    #[test]
    fn tokenizer_and_evaluator_never_panic(formula in "\\PC{0,40}") {
        let values = table(&[("A", 1.0), ("B", 2.0)]);
        let _ = tokenize(&formula);
        let _ = evaluate_formula(&formula, &values);
    }

    #[test]
    fn evaluation_is_idempotent(formula in "[AB0-9+*/() .-]{0,24}", a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let values = table(&[("A", a), ("B", b)]);
        let first = evaluate_formula(&formula, &values);
        let second = evaluate_formula(&formula, &values);
        prop_assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn subtraction_is_left_associative(a in -1e6f64..1e6, b in -1e6f64..1e6, c in -1e6f64..1e6) {
        let values = table(&[("A", a), ("B", b), ("C", c)]);
        prop_assert_eq!(evaluate_formula("A - B - C", &values), (a - b) - c);
    }

    #[test]
    fn division_never_produces_non_finite(a in -1e6f64..1e6, b in prop_oneof![Just(0.0), -1e6f64..1e6]) {
        let values = table(&[("A", a), ("B", b)]);
        prop_assert!(evaluate_formula("A / B", &values).is_finite());
    }

    #[test]
    fn identifiers_tokenize_as_single_variable(name in "[a-zA-Z_][a-zA-Z0-9_]{0,12}") {
        let tokens = tokenize(&name);
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].kind, TokenKind::Variable);
        prop_assert_eq!(&tokens[0].text, &name);
    }

    #[test]
    fn strict_and_lenient_agree_on_success(a in -1e3f64..1e3, b in 1f64..1e3) {
        let values = table(&[("A", a), ("B", b)]);
        let strict = try_evaluate_formula("(A + B) * 2 / B", &values).unwrap();
        prop_assert_eq!(strict, evaluate_formula("(A + B) * 2 / B", &values));
    }
}
