//! Presence checks: `required`, `optional` and `accepted`

use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use crate::rules::OPTIONAL_RULE;
use serde_json::Value;

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("required", Arity::Exact(0), required);
    registry.register_fn(OPTIONAL_RULE, Arity::Exact(0), optional);
    registry.register_fn("accepted", Arity::Exact(0), accepted);
}

/// Whether a value counts as filled in
///
/// Null, blank strings, `"0"`, zero, `false` and empty collections are all empty.
pub fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() != Some(0.0),
        Value::String(text) => {
            let trimmed = text.trim();
            !trimmed.is_empty() && text != "0"
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}

pub fn required(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(is_filled(value).into())
}

/// Always passes; the engine uses its presence to let empty values through
pub fn optional(
    _ctx: &PredicateContext<'_>,
    _value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(Truth::Bool(true))
}

/// `"yes"`, `"on"`, `1`, `"1"` or `true`
pub fn accepted(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    let accepted = match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_u64() == Some(1),
        Value::String(text) => matches!(text.as_str(), "yes" | "on" | "1"),
        _ => false,
    };
    Ok((accepted && is_filled(value)).into())
}
