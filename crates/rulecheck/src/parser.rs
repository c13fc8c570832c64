//! Rule token parsing
//!
//! A rule token is `name`, `name:param` or `name:first|second`. A parameter
//! starting with `$` names another input field instead of carrying a literal.
//! Parsing never fails: unknown names and odd payloads are reported later, when
//! the rule is dispatched.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Separates the rule name from its parameter payload
pub const RULE_SEPARATOR: char = ':';
/// Marks a parameter as a reference to another input field
pub const REFERENCE_MARKER: char = '$';
/// Separates the two parameters of a pair payload
pub const LIST_SEPARATOR: char = '|';

/// A single rule parameter, before resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    /// Passed to the predicate as a string
    Literal(String),
    /// Replaced by the value of the named input field at evaluation time
    Reference(String),
}

impl Param {
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => f.write_str(literal),
            Self::Reference(field) => write!(f, "{}{}", REFERENCE_MARKER, field),
        }
    }
}

/// A rule name with its unresolved parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedRule {
    name: String,
    params: Vec<Param>,
}

impl ParsedRule {
    /// Create a rule without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a literal parameter
    pub fn literal(mut self, value: impl Into<String>) -> Self {
        self.params.push(Param::Literal(value.into()));
        self
    }

    /// Append a reference to another input field
    pub fn reference(mut self, field: impl Into<String>) -> Self {
        self.params.push(Param::Reference(field.into()));
        self
    }

    /// Parse a rule token
    pub fn parse(token: &str) -> Self {
        let Some((name, payload)) = token.split_once(RULE_SEPARATOR) else {
            return Self::new(token.trim());
        };

        let rule = Self::new(name.trim());
        if let Some(field) = payload.strip_prefix(REFERENCE_MARKER) {
            rule.reference(field)
        } else if let Some((first, second)) = payload.split_once(LIST_SEPARATOR) {
            rule.literal(first).literal(second)
        } else {
            rule.literal(payload)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn has_references(&self) -> bool {
        self.params.iter().any(Param::is_reference)
    }
}

impl FromStr for ParsedRule {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(token))
    }
}

impl From<&str> for ParsedRule {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}

impl From<String> for ParsedRule {
    fn from(token: String) -> Self {
        Self::parse(&token)
    }
}

/// Renders the token form; a parsed token renders back to itself
impl fmt::Display for ParsedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (index, param) in self.params.iter().enumerate() {
            let separator = if index == 0 {
                RULE_SEPARATOR
            } else {
                LIST_SEPARATOR
            };
            write!(f, "{}{}", separator, param)?;
        }
        Ok(())
    }
}
