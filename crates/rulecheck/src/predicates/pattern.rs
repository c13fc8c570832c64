//! Pattern-based checks using regular expressions

use super::{param_text, scalar_text};
use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::Value;

static SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[-a-z0-9_]+$").expect("slug pattern"));
static ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z]+$").expect("alpha pattern"));
static ALPHA_NUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z0-9]+$").expect("alpha-numeric pattern"));

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("regex", Arity::Exact(1), regex);
    registry.register_fn("slug", Arity::Exact(0), slug);
    registry.register_fn("alpha", Arity::Exact(0), alpha);
    registry.register_fn("alphaNum", Arity::Exact(0), alpha_num);
    registry.register_fn("contains", Arity::Exact(1), contains);
}

/// Compile a pattern, accepting both bare patterns and `/pattern/flags`
///
/// Supported flags are `i`, `m`, `s`, `x` and `u` (`u` is implied).
pub fn compile(pattern: &str) -> Result<Regex, PredicateError> {
    let invalid = |message: String| PredicateError::InvalidPattern {
        pattern: pattern.to_string(),
        message,
    };

    let (body, flags) = match delimited(pattern) {
        Some(parts) => parts,
        None => (pattern, ""),
    };

    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => builder.unicode(true),
            other => return Err(invalid(format!("unsupported flag '{}'", other))),
        };
    }
    builder.build().map_err(|error| invalid(error.to_string()))
}

fn delimited(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    Some((&rest[..end], &rest[end + 1..]))
}

/// Number of matches of the pattern in the value
pub fn regex(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let pattern = compile(&param_text("regex", params, 0)?)?;
    let matches = scalar_text(value).map_or(0, |text| pattern.find_iter(&text).count());
    Ok(Truth::Matches(matches))
}

fn matches(pattern: &Regex, value: &Value) -> Truth {
    Truth::Matches(scalar_text(value).map_or(0, |text| usize::from(pattern.is_match(&text))))
}

/// Letters, digits, dashes and underscores
pub fn slug(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(matches(&SLUG, value))
}

pub fn alpha(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(matches(&ALPHA, value))
}

pub fn alpha_num(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(matches(&ALPHA_NUM, value))
}

pub fn contains(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let found = match (value.as_str(), params.first().and_then(Value::as_str)) {
        (Some(text), Some(needle)) => text.contains(needle),
        _ => false,
    };
    Ok(found.into())
}
