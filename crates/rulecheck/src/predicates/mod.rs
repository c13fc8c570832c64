//! Built-in predicates
//!
//! Every predicate receives the field value and the resolved parameters. Literal
//! parameters arrive as JSON strings, so numeric parameters are coerced here.

pub mod comparison;
pub mod creditcard;
pub mod date;
pub mod dns;
pub mod length;
pub mod network;
pub mod pattern;
pub mod required;
pub mod types;

pub use dns::{DnsResolver, StaticResolver, SystemResolver};
pub use required::is_filled;

use crate::error::PredicateError;
use crate::registry::PredicateRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("numeric pattern")
});

/// Register the full built-in rule set
pub fn register_defaults(registry: &mut PredicateRegistry) {
    required::register(registry);
    types::register(registry);
    comparison::register(registry);
    length::register(registry);
    pattern::register(registry);
    network::register(registry);
    dns::register(registry);
    date::register(registry);
    creditcard::register(registry);
}

/// Numeric reading of a value: JSON numbers and numeric strings
pub(crate) fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if NUMERIC.is_match(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// String rendering of scalar values, used by the character-class checks
pub(crate) fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text)),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(true) => Some(Cow::Borrowed("1")),
        Value::Bool(false) | Value::Null => Some(Cow::Borrowed("")),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Human rendering of a value; strings are not quoted, null is empty
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn param_number(
    rule: &'static str,
    params: &[Value],
    index: usize,
) -> Result<f64, PredicateError> {
    let param = params.get(index).unwrap_or(&Value::Null);
    number(param).ok_or_else(|| PredicateError::invalid_parameter(rule, display_value(param), "a number"))
}

pub(crate) fn param_text(
    rule: &'static str,
    params: &[Value],
    index: usize,
) -> Result<String, PredicateError> {
    match params.get(index) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => scalar_text(other)
            .map(Cow::into_owned)
            .ok_or_else(|| PredicateError::invalid_parameter(rule, other.to_string(), "a string")),
        None => Err(PredicateError::invalid_parameter(rule, "", "a string")),
    }
}

/// Flag parameters such as `isInteger:strict`; anything but an explicit "off" enables them
pub(crate) fn flag(params: &[Value], index: usize) -> bool {
    match params.get(index) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(text)) => {
            !matches!(text.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "off" | "no")
        }
        Some(Value::Number(number)) => number.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::registry::{PredicateContext, Truth};
    use std::time::Duration;

    pub(crate) type CheckFn =
        fn(&PredicateContext<'_>, &Value, &[Value]) -> Result<Truth, PredicateError>;

    pub(crate) const PREFIXES: [&str; 3] = ["http://", "https://", "ftp://"];

    /// Run a predicate with default prefixes and an offline resolver
    pub(crate) fn run(check: CheckFn, value: Value, params: &[Value]) -> Result<bool, PredicateError> {
        let resolver = StaticResolver::default();
        run_with(check, &resolver, value, params)
    }

    pub(crate) fn run_with(
        check: CheckFn,
        resolver: &dyn DnsResolver,
        value: Value,
        params: &[Value],
    ) -> Result<bool, PredicateError> {
        let prefixes: Vec<String> = PREFIXES.iter().map(|p| p.to_string()).collect();
        let ctx = PredicateContext {
            url_prefixes: &prefixes,
            dns: resolver,
            dns_timeout: Duration::from_millis(50),
        };
        check(&ctx, &value, params).map(Truth::is_true)
    }

    /// Shorthand for a passing/failing check that must not fault
    pub(crate) fn passes(check: CheckFn, value: Value, params: &[Value]) -> bool {
        run(check, value, params).expect("predicate fault")
    }
}
