//! Date checks
//!
//! Free-form dates accept RFC 3339, RFC 2822, a set of common numeric layouts and
//! the keywords `now`, `today`, `tomorrow` and `yesterday`. Formats for
//! `dateFormat` may be written with `%` directives or with single-letter tokens
//! (`Y-m-d H:i:s`). A format may describe only part of a date, such as `Y-m` or
//! `m/y`.
//!
//! Comparisons run on UTC. Inputs with an offset are converted, inputs without one
//! are read as UTC and the keywords follow the UTC calendar.

use super::param_text;
use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use chrono::format::{parse, Item, Parsed, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"];

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("date", Arity::Exact(0), date);
    registry.register_fn("dateFormat", Arity::Exact(1), date_format);
    registry.register_fn("dateBefore", Arity::Exact(1), date_before);
    registry.register_fn("dateAfter", Arity::Exact(1), date_after);
}

/// Parse a free-form date or datetime as a UTC wall time
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0);
    let now = Utc::now();
    let today = now.date_naive();
    match text.to_ascii_lowercase().as_str() {
        "now" => return Some(now.naive_utc()),
        "today" => return midnight(today),
        "tomorrow" => return today.succ_opt().and_then(midnight),
        "yesterday" => return today.pred_opt().and_then(midnight),
        _ => {}
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.naive_utc());
    }
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                .and_then(midnight)
        })
}

/// Translate single-letter format tokens to `%` directives
///
/// Formats that already contain `%` are returned unchanged. A backslash makes the
/// next character literal.
pub fn to_strftime(format: &str) -> String {
    if format.contains('%') {
        return format.to_string();
    }

    let mut translated = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        let directive = match c {
            'Y' => "%Y",
            'y' => "%y",
            'm' | 'n' => "%m",
            'd' | 'j' => "%d",
            'H' | 'G' => "%H",
            'h' | 'g' => "%I",
            'i' => "%M",
            's' => "%S",
            'A' | 'a' => "%p",
            'D' => "%a",
            'l' => "%A",
            'M' => "%b",
            'F' => "%B",
            'U' => "%s",
            '\\' => {
                if let Some(literal) = chars.next() {
                    translated.push(literal);
                }
                continue;
            }
            other => {
                translated.push(other);
                continue;
            }
        };
        translated.push_str(directive);
    }
    translated
}

fn matches_format(text: &str, format: &str) -> Result<bool, PredicateError> {
    let layout = to_strftime(format);
    if StrftimeItems::new(&layout).any(|item| matches!(item, Item::Error)) {
        return Err(PredicateError::InvalidFormat {
            format: format.to_string(),
        });
    }

    let mut parsed = Parsed::new();
    if parse(&mut parsed, text, StrftimeItems::new(&layout)).is_err() {
        return Ok(false);
    }
    // a complete calendar date must exist, e.g. no 30 February
    let complete = parsed.year().is_some() && parsed.month().is_some() && parsed.day().is_some();
    Ok(!complete || parsed.to_naive_date().is_ok())
}

fn datetime_of(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(text) => parse_datetime(text),
        Value::Number(number) => number
            .as_i64()
            .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
            .map(|parsed| parsed.naive_utc()),
        _ => None,
    }
}

pub fn date(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value.as_str().and_then(parse_datetime).is_some().into())
}

pub fn date_format(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let format = param_text("dateFormat", params, 0)?;
    match value.as_str() {
        Some(text) => matches_format(text, &format).map(Truth::Bool),
        None => Ok(Truth::Bool(false)),
    }
}

pub fn date_before(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let limit = params.first().and_then(datetime_of);
    Ok(matches!((datetime_of(value), limit), (Some(actual), Some(limit)) if actual < limit).into())
}

pub fn date_after(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let limit = params.first().and_then(datetime_of);
    Ok(matches!((datetime_of(value), limit), (Some(actual), Some(limit)) if actual > limit).into())
}
