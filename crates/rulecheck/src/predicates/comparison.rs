//! Value comparisons: equality, numeric bounds and set membership
//!
//! `min`, `max` and `between` compare numerically when the value is numeric
//! (including numeric strings) and fall back to string length otherwise.

use super::length::{length_between, max_length, min_length};
use super::{flag, number, param_number};
use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use serde_json::Value;

/// Separates the members of a literal `in` set
pub const SET_SEPARATOR: char = ',';

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("equals", Arity::Exact(1), equals);
    registry.register_fn("different", Arity::Exact(1), different);
    registry.register_fn("min", Arity::Exact(1), min);
    registry.register_fn("max", Arity::Exact(1), max);
    registry.register_fn("between", Arity::Exact(2), between);
    registry.register_fn("in", Arity::Range { min: 1, max: 2 }, is_in);
}

/// Equality that treats numeric strings and numbers alike
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (number(left), number(right)) {
        (Some(a), Some(b)) => a == b,
        _ => match (left, right) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::String(text)) | (Value::String(text), Value::Null) => {
                text.is_empty()
            }
            _ => left == right,
        },
    }
}

pub fn equals(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(loose_equals(value, params.first().unwrap_or(&Value::Null)).into())
}

pub fn different(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok((!loose_equals(value, params.first().unwrap_or(&Value::Null))).into())
}

pub fn min(
    ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    match number(value) {
        Some(actual) => Ok((actual >= param_number("min", params, 0)?).into()),
        None if value.is_string() => min_length(ctx, value, params),
        None => Ok(Truth::Bool(false)),
    }
}

pub fn max(
    ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    match number(value) {
        Some(actual) => Ok((actual <= param_number("max", params, 0)?).into()),
        None if value.is_string() => max_length(ctx, value, params),
        None => Ok(Truth::Bool(false)),
    }
}

/// Numeric range for numeric values, `lengthBetween` for other strings
pub fn between(
    ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    match number(value) {
        Some(actual) => {
            let low = param_number("between", params, 0)?;
            let high = param_number("between", params, 1)?;
            Ok((actual >= low && actual <= high).into())
        }
        None if value.is_string() => length_between(ctx, value, params),
        None => Ok(Truth::Bool(false)),
    }
}

/// Membership in a set given as a comma-separated literal or a referenced collection
///
/// A second, truthy parameter switches to strict comparison, which also compares
/// JSON types.
pub fn is_in(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let members: Vec<Value> = match params.first() {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(entries)) => entries.values().cloned().collect(),
        Some(Value::String(list)) => list
            .split(SET_SEPARATOR)
            .map(|member| Value::String(member.trim().to_string()))
            .collect(),
        Some(other) => vec![other.clone()],
        None => return Err(PredicateError::invalid_parameter("in", "", "a set of values")),
    };

    let strict = flag(params, 1);
    let found = members.iter().any(|member| {
        if strict {
            member == value
        } else {
            loose_equals(value, member)
        }
    });
    Ok(found.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::testing::{passes, run};
    use serde_json::json;

    #[test]
    fn test_loose_equality() {
        assert!(loose_equals(&json!("10"), &json!(10)));
        assert!(loose_equals(&json!("1.0"), &json!("1")));
        assert!(loose_equals(&json!("abc"), &json!("abc")));
        assert!(loose_equals(&json!(null), &json!("")));
        assert!(!loose_equals(&json!("abc"), &json!("ABC")));
        assert!(!loose_equals(&json!(true), &json!("true")));
    }

    #[test]
    fn test_equals_and_different() {
        assert!(passes(equals, json!("secret"), &[json!("secret")]));
        assert!(!passes(equals, json!("secret"), &[json!("other")]));
        assert!(passes(different, json!("a"), &[json!("b")]));
        assert!(!passes(different, json!(5), &[json!("5")]));
    }

    #[test]
    fn test_min_max_numeric() {
        assert!(passes(min, json!(8), &[json!("8")]));
        assert!(!passes(min, json!("7"), &[json!("8")]));
        assert!(passes(max, json!(2.5), &[json!("3")]));
        assert!(!passes(max, json!(4), &[json!("3")]));
    }

    #[test]
    fn test_min_max_fall_back_to_length() {
        assert!(!passes(min, json!("ab"), &[json!("3")]));
        assert!(passes(min, json!("abc"), &[json!("3")]));
        assert!(!passes(max, json!("abcd"), &[json!("3")]));
        assert!(!passes(min, json!(["a", "b", "c"]), &[json!("1")]));
    }

    #[test]
    fn test_between_matches_min_and_max() {
        let bounds = [json!("1"), json!("10")];
        for value in [json!(0), json!(1), json!(5), json!(10), json!(11), json!("7")] {
            let expected = passes(min, value.clone(), &bounds[..1]) && passes(max, value.clone(), &bounds[1..]);
            assert_eq!(passes(between, value.clone(), &bounds), expected, "{}", value);
        }
    }

    #[test]
    fn test_between_on_strings_is_length_between() {
        let bounds = [json!("2"), json!("4")];
        for value in [json!("a"), json!("ab"), json!("abcd"), json!("abcde")] {
            assert_eq!(
                passes(between, value.clone(), &bounds),
                passes(length_between, value.clone(), &bounds),
                "{}",
                value
            );
        }
    }

    #[test]
    fn test_in_literal_set() {
        let set = [json!("red, green,blue")];
        assert!(passes(is_in, json!("green"), &set));
        assert!(!passes(is_in, json!("purple"), &set));
    }

    #[test]
    fn test_in_loose_and_strict() {
        let numbers = [json!("1,2,3")];
        assert!(passes(is_in, json!(2), &numbers));
        assert!(!passes(is_in, json!(2), &[json!("1,2,3"), json!("strict")]));
        assert!(passes(is_in, json!("2"), &[json!("1,2,3"), json!("strict")]));
    }

    #[test]
    fn test_in_referenced_collection() {
        assert!(passes(is_in, json!("b"), &[json!(["a", "b"])]));
        assert!(passes(is_in, json!(1), &[json!({"x": 1})]));
        assert!(!passes(is_in, json!("c"), &[json!(["a", "b"])]));
    }

    #[test]
    fn test_bad_bounds_fault() {
        assert!(run(between, json!(5), &[json!("low"), json!("10")]).is_err());
    }
}
