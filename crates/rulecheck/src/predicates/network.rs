//! Address syntax checks: IP addresses, e-mail addresses and URLs

use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::Url;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9._%+-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}$",
    )
    .expect("email pattern")
});

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("ip", Arity::Exact(0), ip);
    registry.register_fn("ipv4", Arity::Exact(0), ipv4);
    registry.register_fn("ipv6", Arity::Exact(0), ipv6);
    registry.register_fn("email", Arity::Exact(0), email);
    registry.register_fn("url", Arity::Exact(0), url);
}

/// Validate e-mail syntax
pub fn is_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    // RFC 5321 limits
    if local.is_empty() || local.len() > 64 || domain.is_empty() || domain.len() > 255 {
        return false;
    }
    if address.contains("..") {
        return false;
    }

    EMAIL.is_match(address)
}

/// Parse `value` as a URL when it starts with one of the accepted prefixes
pub fn accepted_url(value: &str, prefixes: &[String]) -> Option<Url> {
    let lowered = value.to_ascii_lowercase();
    if !prefixes
        .iter()
        .any(|prefix| lowered.starts_with(&prefix.to_ascii_lowercase()))
    {
        return None;
    }
    Url::parse(value).ok().filter(|url| url.host_str().is_some())
}

pub fn ip(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value
        .as_str()
        .is_some_and(|text| text.parse::<IpAddr>().is_ok())
        .into())
}

pub fn ipv4(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value
        .as_str()
        .is_some_and(|text| text.parse::<Ipv4Addr>().is_ok())
        .into())
}

pub fn ipv6(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value
        .as_str()
        .is_some_and(|text| text.parse::<Ipv6Addr>().is_ok())
        .into())
}

pub fn email(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value.as_str().is_some_and(is_email).into())
}

pub fn url(
    ctx: &PredicateContext<'_>,
    value: &Value,
    _params: &[Value],
) -> Result<Truth, PredicateError> {
    Ok(value
        .as_str()
        .and_then(|text| accepted_url(text, ctx.url_prefixes))
        .is_some()
        .into())
}
