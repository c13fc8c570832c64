//! Length-based checks on strings
//!
//! Lengths count Unicode scalar values, so `"héllo"` has length 5. Non-string
//! values always fail.

use super::param_number;
use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use serde_json::Value;

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("minLength", Arity::Exact(1), min_length);
    registry.register_fn("maxLength", Arity::Exact(1), max_length);
    registry.register_fn("length", Arity::Exact(1), length);
    registry.register_fn("lengthBetween", Arity::Exact(2), length_between);
}

fn char_count(value: &Value) -> Option<f64> {
    value.as_str().map(|text| text.chars().count() as f64)
}

pub fn min_length(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let min = param_number("minLength", params, 0)?;
    Ok(char_count(value).is_some_and(|len| len >= min).into())
}

pub fn max_length(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let max = param_number("maxLength", params, 0)?;
    Ok(char_count(value).is_some_and(|len| len <= max).into())
}

pub fn length(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let exact = param_number("length", params, 0)?;
    Ok(char_count(value).is_some_and(|len| len == exact).into())
}

pub fn length_between(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let min = param_number("lengthBetween", params, 0)?;
    let max = param_number("lengthBetween", params, 1)?;
    Ok(char_count(value)
        .is_some_and(|len| len >= min && len <= max)
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::testing::{passes, run};
    use serde_json::json;

    #[test]
    fn test_min_and_max_length() {
        assert!(passes(min_length, json!("abc"), &[json!("3")]));
        assert!(!passes(min_length, json!("ab"), &[json!("3")]));
        assert!(passes(max_length, json!("abc"), &[json!("3")]));
        assert!(!passes(max_length, json!("abcd"), &[json!("3")]));
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(passes(length, json!("héllo"), &[json!("5")]));
        assert!(!passes(length, json!("hello!"), &[json!(5)]));
    }

    #[test]
    fn test_length_between() {
        let bounds = [json!("2"), json!("4")];
        assert!(passes(length_between, json!("ab"), &bounds));
        assert!(passes(length_between, json!("abcd"), &bounds));
        assert!(!passes(length_between, json!("a"), &bounds));
        assert!(!passes(length_between, json!("abcde"), &bounds));
    }

    #[test]
    fn test_non_strings_fail() {
        assert!(!passes(min_length, json!(12345), &[json!("1")]));
        assert!(!passes(length, json!(["a", "b"]), &[json!("2")]));
    }

    #[test]
    fn test_non_numeric_parameter_faults() {
        assert!(run(min_length, json!("abc"), &[json!("three")]).is_err());
    }
}
