// SPDX-License-Identifier: MIT

//! When-expression evaluator
//!
//! Evaluation is total. Missing paths produce undefined (`None`), and an
//! ordering comparison between anything other than two numbers or two
//! strings is `false`.

use super::ast::{CompareOp, Expr};
use super::parser::parse;
use super::scope::BindingScope;
use serde_json::Value;

/// Parse and evaluate `input`, coercing the result to a boolean.
///
/// Parse errors evaluate to `false`.
pub fn evaluate(input: &str, scope: &BindingScope) -> bool {
    match parse(input) {
        Ok(expr) => is_truthy(evaluate_expr(&expr, scope).as_ref()),
        Err(e) => {
            log::debug!("Failed to parse expression '{}': {}", input, e);
            false
        }
    }
}

/// Evaluate a parsed expression. `None` is the undefined value.
pub fn evaluate_expr(expr: &Expr, scope: &BindingScope) -> Option<Value> {
    match expr {
        Expr::Literal(value) => Some(value.clone()),
        Expr::Path { root, segments } => scope.lookup(root, segments).cloned(),
        Expr::Not(inner) => Some(Value::Bool(!is_truthy(
            evaluate_expr(inner, scope).as_ref(),
        ))),
        Expr::And(operands) => short_circuit(operands, scope, false),
        Expr::Or(operands) => short_circuit(operands, scope, true),
        Expr::Compare { left, op, right } => {
            let left = evaluate_expr(left, scope);
            let right = evaluate_expr(right, scope);
            Some(Value::Bool(compare(left.as_ref(), *op, right.as_ref())))
        }
    }
}

/// Evaluate operands left to right, stopping at the first whose
/// truthiness equals `stop_on`. Yields that operand or the last one.
fn short_circuit(operands: &[Expr], scope: &BindingScope, stop_on: bool) -> Option<Value> {
    let mut last = None;
    for operand in operands {
        let value = evaluate_expr(operand, scope);
        if is_truthy(value.as_ref()) == stop_on {
            return value;
        }
        last = value;
    }
    last
}

/// `false`, `null`, undefined, `0`, `NaN` and `""` are falsy; everything
/// else, including empty arrays and objects, is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn compare(left: Option<&Value>, op: CompareOp, right: Option<&Value>) -> bool {
    match op {
        CompareOp::Eq => strict_equals(left, right),
        CompareOp::NotEq => !strict_equals(left, right),
        CompareOp::Gt => ordered(left, right, |o| o.is_gt()),
        CompareOp::Gte => ordered(left, right, |o| o.is_ge()),
        CompareOp::Lt => ordered(left, right, |o| o.is_lt()),
        CompareOp::Lte => ordered(left, right, |o| o.is_le()),
    }
}

/// Equality without coercion: `undefined != null`, `1 != '1'`.
pub fn strict_equals(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn ordered<F>(left: Option<&Value>, right: Option<&Value>, check: F) -> bool
where
    F: Fn(std::cmp::Ordering) -> bool,
{
    let ordering = match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
        (Some(Value::String(a)), Some(Value::String(b))) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.map(check).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(data: Value) -> BindingScope {
        BindingScope::with_data(data)
    }

    #[test]
    fn test_admin_and_enabled() {
        let scope = BindingScope {
            data: json!({"user": "admin"}),
            node: json!({"props": {"enabled": true}}),
            project: Value::Null,
        };
        assert!(evaluate(
            "data.user == 'admin' && node.props.enabled == true",
            &scope
        ));
    }

    #[test]
    fn test_mismatched_comparison_is_false() {
        let empty = BindingScope::default();
        assert!(!evaluate("3 > 'a'", &empty));
        assert!(!evaluate("3 < 'a'", &empty));
        assert!(!evaluate("'a' >= 3", &empty));
        assert!(!evaluate("null <= 0", &empty));
        assert!(!evaluate("true > false", &empty));
    }

    #[test]
    fn test_missing_path_is_undefined() {
        let scope = scope(json!({}));
        assert!(!evaluate("data.missing.path == 1", &scope));
        assert!(evaluate("data.missing.path != 1", &scope));
        assert!(!evaluate("data.missing", &scope));
    }

    #[test]
    fn test_undefined_is_not_null() {
        let scope = scope(json!({"present": null}));
        assert!(evaluate("data.present == null", &scope));
        assert!(!evaluate("data.absent == null", &scope));
        assert!(evaluate("data.absent == data.other", &scope));
    }

    #[test]
    fn test_strict_equality_has_no_coercion() {
        let scope = scope(json!({"n": 1, "s": "1"}));
        assert!(evaluate("data.n == 1", &scope));
        assert!(evaluate("data.n == 1.0", &scope));
        assert!(!evaluate("data.s == 1", &scope));
        assert!(!evaluate("data.n == true", &scope));
    }

    #[test]
    fn test_number_ordering() {
        let scope = scope(json!({"score": 7.5}));
        assert!(evaluate("data.score > 5", &scope));
        assert!(!evaluate("data.score > 10", &scope));
        assert!(evaluate("data.score >= 7.5", &scope));
        assert!(evaluate("data.score < 10", &scope));
        assert!(evaluate("data.score <= 7.5", &scope));
        assert!(!evaluate("data.score <= 7", &scope));
    }

    #[test]
    fn test_string_ordering() {
        let empty = BindingScope::default();
        assert!(evaluate("'apple' < 'banana'", &empty));
        assert!(evaluate("'b' >= 'b'", &empty));
        assert!(!evaluate("'b' > 'c'", &empty));
    }

    #[test]
    fn test_truthiness() {
        let scope = scope(json!({
            "zero": 0,
            "empty": "",
            "list": [],
            "obj": {},
            "text": "x",
            "f": false
        }));
        assert!(!evaluate("data.zero", &scope));
        assert!(!evaluate("data.empty", &scope));
        assert!(!evaluate("data.f", &scope));
        assert!(evaluate("data.list", &scope));
        assert!(evaluate("data.obj", &scope));
        assert!(evaluate("data.text", &scope));
        assert!(evaluate("!data.zero", &scope));
        assert!(evaluate("!!data.text", &scope));
    }

    #[test]
    fn test_logical_operators_yield_operands() {
        let scope = scope(json!({"name": ""}));
        assert!(evaluate("(data.name || 'guest') == 'guest'", &scope));
        assert!(evaluate("(1 && 'x') == 'x'", &scope));
        assert!(evaluate("(0 && 'x') == 0", &scope));
    }

    #[test]
    fn test_long_logical_chains() {
        let scope = scope(json!({"a": 0, "b": 1}));
        let terms = vec!["data.a"; 200_000];

        assert!(!evaluate(&terms.join(" || "), &scope));
        assert!(!evaluate(&terms.join(" && "), &scope));

        let mut tail = terms.clone();
        tail.push("data.b");
        assert!(evaluate(&tail.join(" || "), &scope));

        let all_true = vec!["data.b"; 200_000].join(" && ");
        assert!(evaluate(&all_true, &scope));
        assert!(evaluate(&format!("({}) == 1", all_true), &scope));
    }

    #[test]
    fn test_unknown_root_evaluates_false() {
        let scope = scope(json!({"a": 1}));
        assert!(!evaluate("window.alert", &scope));
        assert!(!evaluate("env.secret == 1", &scope));
        assert!(evaluate("env.secret != 1", &scope));
    }

    #[test]
    fn test_parse_errors_evaluate_false() {
        let empty = BindingScope::default();
        assert!(!evaluate("data.a ==", &empty));
        assert!(!evaluate("(true", &empty));
        assert!(!evaluate("true true", &empty));
        assert!(!evaluate("", &empty));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let scope = scope(json!({"a": 2}));
        let expr = "data.a > 1 && !(data.a == 3)";
        let first = evaluate(expr, &scope);
        for _ in 0..10 {
            assert_eq!(evaluate(expr, &scope), first);
        }
        assert!(first);
    }

    #[test]
    fn test_evaluate_expr_returns_value() {
        let scope = scope(json!({"user": {"role": "editor"}}));
        let expr = parse("data.user.role").unwrap();
        assert_eq!(evaluate_expr(&expr, &scope), Some(json!("editor")));

        let expr = parse("data.user.missing").unwrap();
        assert_eq!(evaluate_expr(&expr, &scope), None);
    }
}
