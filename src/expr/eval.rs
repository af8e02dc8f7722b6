//! Expression evaluator.
//!
//! The evaluator knows nothing about the document tree. Property references are
//! handed to a caller-supplied [`RefResolver`], which is where the style
//! resolver plugs in its registry lookups and memoization.

use crate::ast::{BinaryOp, ExprAst, Selector};

use super::value::EvaluatedValue;

/// Errors from evaluating a single property expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("unit mismatch: '{left_unit}' vs '{right_unit}'")]
    UnitMismatch {
        left_unit: String,
        right_unit: String,
    },
    #[error("operator '{op}' expects {expected}, found {found}")]
    InvalidOperandType {
        op: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("unresolved reference {selector}.{property}")]
    UnresolvedReference { selector: String, property: String },
    #[error("unresolved variable {group}({var})")]
    UnresolvedVariable { group: String, var: String },
    #[error("circular reference through {selector}.{property}")]
    CircularProperty { selector: String, property: String },
}

/// Resolves a property reference.
///
/// `selector` is `None` for a reference into the current element's own style.
/// Returns `Ok(None)` when no such element or property exists.
pub type RefResolver<'a> =
    dyn Fn(Option<&Selector>, &str) -> Result<Option<EvaluatedValue>, EvalError> + 'a;

/// Evaluate an expression.
///
/// A bare property name that the current element does not define evaluates
/// to itself as a keyword, so `color: black` yields the string `black`.
pub fn evaluate(expr: &ExprAst, resolve_ref: &RefResolver<'_>) -> Result<EvaluatedValue, EvalError> {
    match expr {
        ExprAst::Literal(value) => Ok(EvaluatedValue::Str(value.clone())),
        ExprAst::Dimension(value, unit) => Ok(EvaluatedValue::Dim(*value, normalize(unit))),
        ExprAst::PropertyRef { selector, property } => {
            match (resolve_ref(selector.as_ref(), property)?, selector) {
                (Some(value), _) => Ok(value),
                (None, None) => Ok(EvaluatedValue::Str(property.clone())),
                (None, Some(selector)) => Err(EvalError::UnresolvedReference {
                    selector: selector.to_string(),
                    property: property.clone(),
                }),
            }
        }
        ExprAst::VarRef { group, var } => Err(EvalError::UnresolvedVariable {
            group: group.clone(),
            var: var.clone(),
        }),
        ExprAst::Binary { op, left, right } => evaluate_binary(*op, left, right, resolve_ref),
        ExprAst::Conditional {
            cond,
            if_true,
            if_false,
        } => {
            if expect_bool("?:", evaluate(cond, resolve_ref)?)? {
                evaluate(if_true, resolve_ref)
            } else {
                evaluate(if_false, resolve_ref)
            }
        }
    }
}

fn normalize(unit: &Option<String>) -> Option<String> {
    unit.as_ref().filter(|u| !u.is_empty()).cloned()
}

fn evaluate_binary(
    op: BinaryOp,
    left: &ExprAst,
    right: &ExprAst,
    resolve_ref: &RefResolver<'_>,
) -> Result<EvaluatedValue, EvalError> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let lhs = expect_bool(op.symbol(), evaluate(left, resolve_ref)?)?;
            // Short-circuit: the right side is not evaluated.
            if (op == BinaryOp::And && !lhs) || (op == BinaryOp::Or && lhs) {
                return Ok(EvaluatedValue::Bool(lhs));
            }
            let rhs = expect_bool(op.symbol(), evaluate(right, resolve_ref)?)?;
            Ok(EvaluatedValue::Bool(rhs))
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = values_equal(&evaluate(left, resolve_ref)?, &evaluate(right, resolve_ref)?);
            Ok(EvaluatedValue::Bool(equal == (op == BinaryOp::Eq)))
        }
        BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le => {
            let (a, a_unit) = expect_dim(op, evaluate(left, resolve_ref)?)?;
            let (b, b_unit) = expect_dim(op, evaluate(right, resolve_ref)?)?;
            if let Err(EvalError::UnitMismatch { left_unit, right_unit }) = check_units(&a_unit, &b_unit) {
                log::warn!("comparing {a}{left_unit} {op} {b}{right_unit} by magnitude only");
            }
            let result = match op {
                BinaryOp::Gt => a > b,
                BinaryOp::Ge => a >= b,
                BinaryOp::Lt => a < b,
                _ => a <= b,
            };
            Ok(EvaluatedValue::Bool(result))
        }
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Rem
        | BinaryOp::Pow => {
            let (a, a_unit) = expect_dim(op, evaluate(left, resolve_ref)?)?;
            let (b, b_unit) = expect_dim(op, evaluate(right, resolve_ref)?)?;
            if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
                check_units(&a_unit, &b_unit)?;
            }
            let value = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
                    log::debug!("{a} {op} 0 evaluated to infinity");
                    f64::INFINITY
                }
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => a.powf(b),
            };
            Ok(EvaluatedValue::Dim(value, a_unit.or(b_unit)))
        }
    }
}

fn expect_bool(op: &str, value: EvaluatedValue) -> Result<bool, EvalError> {
    match value {
        EvaluatedValue::Bool(b) => Ok(b),
        other => Err(EvalError::InvalidOperandType {
            op: op.to_owned(),
            expected: "boolean",
            found: other.type_name(),
        }),
    }
}

fn expect_dim(op: BinaryOp, value: EvaluatedValue) -> Result<(f64, Option<String>), EvalError> {
    match value {
        EvaluatedValue::Dim(v, unit) => Ok((v, normalize(&unit))),
        other => Err(EvalError::InvalidOperandType {
            op: op.symbol().to_owned(),
            expected: "dimension",
            found: other.type_name(),
        }),
    }
}

/// Both units present and different is a mismatch; a missing unit adopts the other.
fn check_units(left: &Option<String>, right: &Option<String>) -> Result<(), EvalError> {
    match (left, right) {
        (Some(l), Some(r)) if l != r => Err(EvalError::UnitMismatch {
            left_unit: l.clone(),
            right_unit: r.clone(),
        }),
        _ => Ok(()),
    }
}

fn values_equal(left: &EvaluatedValue, right: &EvaluatedValue) -> bool {
    match (left, right) {
        (EvaluatedValue::Dim(a, a_unit), EvaluatedValue::Dim(b, b_unit)) => {
            a == b && normalize(a_unit) == normalize(b_unit)
        }
        (EvaluatedValue::Str(a), EvaluatedValue::Str(b)) => a == b,
        (EvaluatedValue::Bool(a), EvaluatedValue::Bool(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;

    use super::*;
    use crate::expr::parse_value;

    /// Evaluate `source` where local properties come from `locals` and
    /// `#other.<prop>` comes from `remote`.
    fn eval_with(
        source: &str,
        locals: &[(&str, EvaluatedValue)],
        remote: &[(&str, EvaluatedValue)],
    ) -> Result<EvaluatedValue, EvalError> {
        let locals: HashMap<_, _> = locals.iter().cloned().collect();
        let remote: HashMap<_, _> = remote.iter().cloned().collect();
        let resolve = |selector: Option<&Selector>, property: &str| {
            Ok::<_, EvalError>(match selector {
                None => locals.get(property).cloned(),
                Some(sel) if sel.to_string() == "#other" => remote.get(property).cloned(),
                Some(_) => None,
            })
        };
        evaluate(&parse_value(source).unwrap(), &resolve)
    }

    fn eval(source: &str) -> Result<EvaluatedValue, EvalError> {
        eval_with(source, &[], &[])
    }

    #[test]
    fn arithmetic_keeps_left_unit() {
        assert_eq!(eval("100px / 2").unwrap(), EvaluatedValue::dim(50.0, "px"));
        assert_eq!(eval("2 * 8em").unwrap(), EvaluatedValue::dim(16.0, "em"));
        assert_eq!(eval("10px + 5").unwrap(), EvaluatedValue::dim(15.0, "px"));
        assert_eq!(eval("2 ** 3").unwrap(), EvaluatedValue::dim(8.0, ""));
        assert_eq!(eval("7 % 4").unwrap(), EvaluatedValue::dim(3.0, ""));
    }

    #[test]
    fn add_requires_matching_units() {
        assert_eq!(
            eval("10px + 2em"),
            Err(EvalError::UnitMismatch {
                left_unit: "px".into(),
                right_unit: "em".into(),
            })
        );
        assert!(eval("10px - 2em").is_err());
        assert_eq!(eval("10px + 2px").unwrap(), EvaluatedValue::dim(12.0, "px"));
    }

    #[test]
    fn multiply_does_not_check_units() {
        assert_eq!(eval("2px * 3em").unwrap(), EvaluatedValue::dim(6.0, "px"));
    }

    #[test]
    fn division_by_zero_is_infinity() {
        assert_eq!(
            eval("10px / 0").unwrap(),
            EvaluatedValue::dim(f64::INFINITY, "px")
        );
        assert_eq!(eval("10 % 0").unwrap(), EvaluatedValue::dim(f64::INFINITY, ""));
    }

    #[test]
    fn comparisons_return_bool() {
        assert_eq!(eval("100px > 50px").unwrap(), EvaluatedValue::Bool(true));
        assert_eq!(eval("1 >= 2").unwrap(), EvaluatedValue::Bool(false));
        assert_eq!(eval("1 <= 1").unwrap(), EvaluatedValue::Bool(true));
        assert!(matches!(
            eval("\"a\" < 1"),
            Err(EvalError::InvalidOperandType { .. })
        ));
    }

    #[test]
    fn comparisons_ignore_differing_units() {
        assert_eq!(eval("10px > 1em").unwrap(), EvaluatedValue::Bool(true));
        assert_eq!(eval("2em <= 1px").unwrap(), EvaluatedValue::Bool(false));
        assert_eq!(eval("5% < 10px").unwrap(), EvaluatedValue::Bool(true));
    }

    #[test]
    fn equality_compares_units() {
        assert_eq!(eval("10px == 10px").unwrap(), EvaluatedValue::Bool(true));
        assert_eq!(eval("10px == 10em").unwrap(), EvaluatedValue::Bool(false));
        assert_eq!(eval("10px != 10").unwrap(), EvaluatedValue::Bool(true));
        assert_eq!(eval("'a' == 'a'").unwrap(), EvaluatedValue::Bool(true));
        assert_eq!(eval("'1' == 1").unwrap(), EvaluatedValue::Bool(false));
    }

    #[test]
    fn logical_requires_bool() {
        assert_eq!(eval("1 < 2 && 2 < 3").unwrap(), EvaluatedValue::Bool(true));
        assert_eq!(
            eval("1 && 2"),
            Err(EvalError::InvalidOperandType {
                op: "&&".into(),
                expected: "boolean",
                found: "dimension",
            })
        );
    }

    #[test]
    fn logical_short_circuits() {
        let calls = Cell::new(0);
        let resolve = |_: Option<&Selector>, _: &str| {
            calls.set(calls.get() + 1);
            Ok::<_, EvalError>(Some(EvaluatedValue::Bool(true)))
        };
        let expr = parse_value("1 > 2 && flag").unwrap();
        assert_eq!(evaluate(&expr, &resolve).unwrap(), EvaluatedValue::Bool(false));
        let expr = parse_value("1 < 2 || flag").unwrap();
        assert_eq!(evaluate(&expr, &resolve).unwrap(), EvaluatedValue::Bool(true));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn conditional_on_local_property() {
        let result = eval_with(
            "width > 50px ? \"red\" : \"blue\"",
            &[("width", EvaluatedValue::dim(100.0, "px"))],
            &[],
        );
        assert_eq!(result.unwrap(), EvaluatedValue::str("red"));
    }

    #[test]
    fn conditional_requires_bool() {
        assert!(matches!(
            eval("1 ? 2 : 3"),
            Err(EvalError::InvalidOperandType { .. })
        ));
    }

    #[test]
    fn cross_reference() {
        let result = eval_with("#other.width / 2", &[], &[("width", EvaluatedValue::dim(100.0, "px"))]);
        assert_eq!(result.unwrap(), EvaluatedValue::dim(50.0, "px"));
    }

    #[test]
    fn missing_cross_reference() {
        assert_eq!(
            eval("#nowhere.width"),
            Err(EvalError::UnresolvedReference {
                selector: "#nowhere".into(),
                property: "width".into(),
            })
        );
    }

    #[test]
    fn unknown_bare_name_is_keyword() {
        assert_eq!(eval("black").unwrap(), EvaluatedValue::str("black"));
    }

    #[test]
    fn var_ref_must_be_substituted_first() {
        assert!(matches!(
            eval("Theme(primary)"),
            Err(EvalError::UnresolvedVariable { .. })
        ));
    }

    #[test]
    fn resolver_errors_propagate() {
        let resolve = |_: Option<&Selector>, property: &str| {
            Err::<Option<EvaluatedValue>, _>(EvalError::CircularProperty {
                selector: "#a".into(),
                property: property.to_owned(),
            })
        };
        let expr = parse_value("width + 1px").unwrap();
        assert!(matches!(
            evaluate(&expr, &resolve),
            Err(EvalError::CircularProperty { .. })
        ));
    }
}
