//! Parameter resolution against the input set

use crate::error::ResolveError;
use crate::parser::{Param, ParsedRule};
use serde_json::Value;

/// Input values keyed by field name, in insertion order
pub type Inputs = serde_json::Map<String, Value>;

/// A parameter after resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedParam {
    /// A literal from the rule token, as a JSON string
    Literal(Value),
    /// The current value of another input field
    Reference { field: String, value: Value },
}

impl ResolvedParam {
    /// The value handed to the predicate
    pub fn value(&self) -> &Value {
        match self {
            Self::Literal(value) | Self::Reference { value, .. } => value,
        }
    }
}

/// Resolve every parameter of `rule`; a reference to a missing field fails the whole rule
pub fn resolve(rule: &ParsedRule, inputs: &Inputs) -> Result<Vec<ResolvedParam>, ResolveError> {
    rule.params()
        .iter()
        .map(|param| match param {
            Param::Literal(literal) => Ok(ResolvedParam::Literal(Value::String(literal.clone()))),
            Param::Reference(field) => inputs
                .get(field)
                .map(|value| ResolvedParam::Reference {
                    field: field.clone(),
                    value: value.clone(),
                })
                .ok_or_else(|| ResolveError::UnresolvableReference {
                    rule: rule.name().to_string(),
                    reference: field.clone(),
                }),
        })
        .collect()
}
