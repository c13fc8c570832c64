//! Type checks

use super::{flag, number};
use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static LOOSE_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?(0|[1-9][0-9]*)\s*$").expect("integer pattern"));
static STRICT_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|-?[1-9][0-9]*)$").expect("strict integer pattern"));

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("isArray", Arity::Exact(0), is_array);
    registry.register_fn("isInteger", Arity::Range { min: 0, max: 1 }, is_integer);
    registry.register_fn("isNumeric", Arity::Exact(0), is_numeric);
    registry.register_fn("isString", Arity::Exact(0), is_string);
    registry.register_fn("isBoolean", Arity::Exact(0), is_boolean);
}

/// Arrays and objects both count as collections
pub fn is_array(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(matches!(value, Value::Array(_) | Value::Object(_)).into())
}

/// Integer numbers or integer strings; `isInteger:strict` only accepts canonical strings
pub fn is_integer(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let strict = flag(params, 0);
    let result = match value {
        Value::Number(number) => number.is_i64() || number.is_u64(),
        Value::String(text) if strict => STRICT_INTEGER.is_match(text),
        Value::String(text) => LOOSE_INTEGER.is_match(text),
        _ => false,
    };
    Ok(result.into())
}

pub fn is_numeric(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(number(value).is_some().into())
}

pub fn is_string(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value.is_string().into())
}

pub fn is_boolean(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value.is_boolean().into())
}
