//! Error types and structured failure reports

use crate::registry::Arity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Configuration faults that abort a validation run before any predicate executes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown rule '{rule}' on field '{field}'")]
    UnknownRule { field: String, rule: String },

    #[error("rule '{rule}' on field '{field}' expects {expected} parameter(s), got {given}")]
    InvalidArity {
        field: String,
        rule: String,
        expected: Arity,
        given: usize,
    },
}

impl EngineError {
    /// Field the faulty rule was attached to
    pub fn field(&self) -> &str {
        match self {
            Self::UnknownRule { field, .. } | Self::InvalidArity { field, .. } => field,
        }
    }

    /// Name of the faulty rule
    pub fn rule(&self) -> &str {
        match self {
            Self::UnknownRule { rule, .. } | Self::InvalidArity { rule, .. } => rule,
        }
    }
}

/// Parameter resolution failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("rule '{rule}' references '{reference}', which is not among the inputs")]
    UnresolvableReference { rule: String, reference: String },
}

/// Faults raised inside a single predicate
///
/// These never abort a run: the engine records the affected rule as failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid date format '{format}'")]
    InvalidFormat { format: String },

    #[error("invalid parameter '{value}' for rule '{rule}', expected {expected}")]
    InvalidParameter {
        rule: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("lookup of '{host}' timed out after {timeout_ms}ms")]
    Timeout { host: String, timeout_ms: u128 },
}

impl PredicateError {
    pub fn invalid_parameter(
        rule: &'static str,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidParameter {
            rule,
            value: value.into(),
            expected,
        }
    }
}

/// One rendered failure for a specific field and rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// The rule that rejected the field
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Failure context: the input value followed by the rule parameters
    pub context: Option<serde_json::Value>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        field: impl Into<String>,
        rule: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            message: message.into(),
            code: "validation_failed".to_string(),
            context: None,
        }
    }

    /// Set the error code
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Set additional context
    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collection of validation errors, grouped by field in evaluation order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationErrors {
    pub errors: IndexMap<String, Vec<ValidationError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors
            .entry(error.field.clone())
            .or_default()
            .push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of fields with errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Total number of errors across all fields
    pub fn total_errors(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn get_field_errors(&self, field: &str) -> Option<&Vec<ValidationError>> {
        self.errors.get(field)
    }

    pub fn has_field_errors(&self, field: &str) -> bool {
        self.errors.get(field).is_some_and(|errors| !errors.is_empty())
    }

    /// All messages in evaluation order
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .values()
            .flatten()
            .map(|error| error.message.clone())
            .collect()
    }

    /// Convert to a JSON-serializable format for API responses
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": "validation_failed",
                "message": "Validation failed",
                "fields": self.errors
            }
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "No validation errors");
        }
        write!(f, "Validation failed for {} field(s):", self.errors.len())?;
        for error in self.errors.values().flatten() {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_creation() {
        let error = ValidationError::new("email", "email", "Invalid email format");
        assert_eq!(error.field, "email");
        assert_eq!(error.rule, "email");
        assert_eq!(error.code, "validation_failed");
        assert!(error.context.is_none());
        assert_eq!(error.to_string(), "email: Invalid email format");
    }

    #[test]
    fn test_validation_errors_collection() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("email", "email", "Invalid format"));
        errors.add(ValidationError::new("age", "min", "Too small"));
        errors.add(ValidationError::new("email", "required", "Missing"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.total_errors(), 3);
        assert!(errors.has_field_errors("email"));
        assert!(!errors.has_field_errors("name"));
        assert_eq!(
            errors.messages(),
            vec!["Invalid format", "Missing", "Too small"]
        );
    }

    #[test]
    fn test_engine_error_accessors() {
        let error = EngineError::UnknownRule {
            field: "name".to_string(),
            rule: "mni".to_string(),
        };
        assert_eq!(error.field(), "name");
        assert_eq!(error.rule(), "mni");
        assert_eq!(error.to_string(), "unknown rule 'mni' on field 'name'");
    }

    #[test]
    fn test_errors_json_shape() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("age", "min", "Too small").code("rule_failed"));
        let json = errors.to_json();
        assert_eq!(json["error"]["code"], "validation_failed");
        assert_eq!(json["error"]["fields"]["age"][0]["code"], "rule_failed");
    }
}
