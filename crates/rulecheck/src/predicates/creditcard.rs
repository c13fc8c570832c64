//! Credit card numbers: Luhn checksum with an optional brand filter
//!
//! Spaces and dashes between digit groups are ignored. Brands are restricted by
//! passing one or more names, e.g. `creditcard:visa` or `creditcard:visa,amex`, or
//! a reference to a list of names.

use super::{display_value, param_text, scalar_text};
use crate::error::PredicateError;
use crate::registry::{Arity, PredicateContext, PredicateRegistry, Truth};
use serde_json::Value;
use std::str::FromStr;

pub(crate) fn register(registry: &mut PredicateRegistry) {
    registry.register_fn("creditcard", Arity::Range { min: 0, max: 2 }, creditcard);
}

/// Card brand detected from the number prefix and length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

impl CardType {
    /// Detect the brand of a digit-only card number
    pub fn detect(digits: &str) -> Option<Self> {
        let prefix = |len: usize| digits.get(..len).and_then(|p| p.parse::<u32>().ok());
        let length = digits.len();

        if digits.starts_with('4') && matches!(length, 13 | 16 | 19) {
            return Some(Self::Visa);
        }
        if length == 16
            && (prefix(2).is_some_and(|p| (51..=55).contains(&p))
                || prefix(4).is_some_and(|p| (2221..=2720).contains(&p)))
        {
            return Some(Self::Mastercard);
        }
        if length == 15 && prefix(2).is_some_and(|p| p == 34 || p == 37) {
            return Some(Self::Amex);
        }
        if length == 16
            && (prefix(4) == Some(6011)
                || prefix(2) == Some(65)
                || prefix(3).is_some_and(|p| (644..=649).contains(&p))
                || prefix(6).is_some_and(|p| (622126..=622925).contains(&p)))
        {
            return Some(Self::Discover);
        }
        None
    }
}

impl FromStr for CardType {
    type Err = PredicateError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "visa" => Ok(Self::Visa),
            "mastercard" => Ok(Self::Mastercard),
            "amex" | "americanexpress" => Ok(Self::Amex),
            "discover" => Ok(Self::Discover),
            _ => Err(PredicateError::invalid_parameter(
                "creditcard",
                name,
                "visa, mastercard, amex or discover",
            )),
        }
    }
}

/// Luhn checksum over a digit-only string
pub fn luhn(digits: &str) -> bool {
    let mut sum = 0;
    for (index, c) in digits.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if index % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    !digits.is_empty() && sum % 10 == 0
}

fn normalise(number: &str) -> Option<String> {
    let digits: String = number.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let valid = (12..=19).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    valid.then_some(digits)
}

fn parse_brands(names: &str) -> Result<Vec<CardType>, PredicateError> {
    names.split(',').map(str::parse).collect()
}

pub fn creditcard(
    _ctx: &PredicateContext<'_>,
    value: &Value,
    params: &[Value],
) -> Result<Truth, PredicateError> {
    let mut allowed = Vec::new();
    for (index, param) in params.iter().enumerate() {
        match param {
            Value::Array(items) => {
                for item in items {
                    let Value::String(names) = item else {
                        return Err(PredicateError::invalid_parameter(
                            "creditcard",
                            display_value(item),
                            "a card brand name",
                        ));
                    };
                    allowed.extend(parse_brands(names)?);
                }
            }
            _ => allowed.extend(parse_brands(&param_text("creditcard", params, index)?)?),
        }
    }

    let Some(digits) = scalar_text(value).and_then(|text| normalise(&text)) else {
        return Ok(Truth::Bool(false));
    };
    if !luhn(&digits) {
        return Ok(Truth::Bool(false));
    }
    if allowed.is_empty() {
        return Ok(Truth::Bool(true));
    }
    Ok(CardType::detect(&digits)
        .is_some_and(|brand| allowed.contains(&brand))
        .into())
}
