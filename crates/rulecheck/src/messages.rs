//! Failure message templates
//!
//! Templates are plain strings with `:`-prefixed placeholders:
//!
//! - `:field` (alias `:input`) - the field name
//! - `:value` - the value that failed
//! - `:param1`, `:param2` - the rule parameters; for a reference these are the
//!   referenced field name and its value
//! - `:prefixes` - the accepted URL prefixes
//! - `:rule`, `:reason` - the rule name and, for faults, what went wrong
//!
//! Placeholders without a value render as the empty string.

use crate::engine::{Failure, FailureReason};
use crate::predicates::display_value;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Message rendered when neither inputs nor requirements were supplied
pub const NOTHING_TO_VALIDATE: &str =
    "You are missing a set of either/both inputs or/and requirements.";

/// Used for rules without a template of their own
pub const FALLBACK_TEMPLATE: &str = "':field' failed the ':rule' rule.";

/// Used when a rule could not be checked at all
pub const FAULT_TEMPLATE: &str = "':field' could not be checked by ':rule': :reason.";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r":(field|input|value|param1|param2|prefixes|rule|reason)\b")
        .expect("placeholder pattern")
});

const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    ("required", "':field' is required."),
    ("optional", "':field' is optional."),
    ("isArray", "':field' is not an array."),
    ("isInteger", "':field' is not an integer."),
    ("isNumeric", "':field' is not a numeric string."),
    ("isString", "':field' is not a string."),
    ("isBoolean", "':field' must be a valid boolean."),
    ("equals", "':field' is not equal to ':param1'."),
    ("different", "':field' is not different from ':param1'."),
    ("min", "':field' is too small. (min: :param1)"),
    ("max", "':field' is too big. (max: :param1)"),
    ("between", "':field' must be between :param1 and :param2."),
    ("minLength", "':field' is too short. (min: :param1 characters)"),
    ("maxLength", "':field' is too long. (max: :param1 characters)"),
    (
        "length",
        "':field' is either too long or short. (should be: :param1 characters)",
    ),
    (
        "lengthBetween",
        "':field' must be between :param1 and :param2 characters long.",
    ),
    ("in", "':value' is not in ':param1'."),
    ("ip", "':field' is not a valid IP."),
    ("ipv4", "':field' is not a valid IPv4."),
    ("ipv6", "':field' is not a valid IPv6."),
    ("email", "':field' is not a valid e-mail address."),
    ("emailDNS", "':field' is not an active e-mail address."),
    ("url", "':field' is not a valid URL. (Valid prefixes: :prefixes)"),
    ("urlActive", "':field' is not an active URL."),
    ("regex", "':field' had no matches with ':param1'."),
    ("date", "':field' is not a valid date."),
    ("dateFormat", "':field' must match the format ':param1'."),
    ("dateBefore", "':field' must be date before ':param1'."),
    ("dateAfter", "':field' must be date after ':param1'."),
    ("contains", "':field' does not contain ':param1'."),
    ("accepted", "':field' must be accepted."),
    (
        "slug",
        "':field' must only contain alpha-numeric characters, dashes and underscores. (a-z & 0-9 & - & _)",
    ),
    ("alpha", "':field' must only contain alphabetic characters. (a-z)"),
    (
        "alphaNum",
        "':field' must only contain alpha-numeric characters. (a-z & 0-9)",
    ),
    ("creditcard", "':field' is not a valid credit card number."),
];

/// Rule name to message template table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplates {
    templates: HashMap<String, String>,
    fault: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            templates: DEFAULT_TEMPLATES
                .iter()
                .map(|(rule, template)| (rule.to_string(), template.to_string()))
                .collect(),
            fault: FAULT_TEMPLATE.to_string(),
        }
    }
}

impl MessageTemplates {
    /// Templates for every built-in rule
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the template for `rule`, or add one for a custom rule
    pub fn set(&mut self, rule: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(rule.into(), template.into());
    }

    /// Replace the template used when a rule faults
    pub fn set_fault(&mut self, template: impl Into<String>) {
        self.fault = template.into();
    }

    pub fn get(&self, rule: &str) -> Option<&str> {
        self.templates.get(rule).map(String::as_str)
    }

    /// Render the message for one failure record
    pub fn render(&self, field: &str, rule: &str, failure: &Failure, prefixes: &[String]) -> String {
        let template = match failure.reason {
            FailureReason::Rejected => self.get(rule).unwrap_or(FALLBACK_TEMPLATE),
            _ => self.fault.as_str(),
        };

        render(template, |name| match name {
            "field" | "input" => field.to_string(),
            "rule" => rule.to_string(),
            "value" => display_value(&failure.value),
            "param1" => failure.params.first().map(display_value).unwrap_or_default(),
            "param2" => failure.params.get(1).map(display_value).unwrap_or_default(),
            "prefixes" => quoted_list(prefixes),
            "reason" => failure.reason.to_string(),
            _ => String::new(),
        })
    }
}

impl<R, T> Extend<(R, T)> for MessageTemplates
where
    R: Into<String>,
    T: Into<String>,
{
    fn extend<I: IntoIterator<Item = (R, T)>>(&mut self, iter: I) {
        for (rule, template) in iter {
            self.set(rule, template);
        }
    }
}

/// Substitute every placeholder in a single pass
///
/// Substituted text is never scanned again, so values containing `:param1` and
/// the like come out verbatim.
pub fn render(template: &str, lookup: impl Fn(&str) -> String) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| lookup(&caps[1]))
        .into_owned()
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{}'", item))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn failure(value: Value, params: Vec<Value>) -> Failure {
        Failure {
            value,
            params,
            reason: FailureReason::Rejected,
        }
    }

    fn prefixes() -> Vec<String> {
        vec!["http://".to_string(), "https://".to_string()]
    }

    #[test]
    fn test_default_templates() {
        let templates = MessageTemplates::new();
        let message = templates.render("password", "min", &failure(json!("short"), vec![json!("8")]), &[]);
        assert_eq!(message, "'password' is too small. (min: 8)");

        let message = templates.render(
            "age",
            "between",
            &failure(json!(99), vec![json!("1"), json!("10")]),
            &[],
        );
        assert_eq!(message, "'age' must be between 1 and 10.");
    }

    #[test]
    fn test_reference_params_render_name_and_value() {
        let templates = MessageTemplates::new();
        let message = templates.render(
            "confirm",
            "equals",
            &failure(json!("a"), vec![json!("password"), json!("b")]),
            &[],
        );
        assert_eq!(message, "'confirm' is not equal to 'password'.");
    }

    #[test]
    fn test_prefixes_placeholder() {
        let templates = MessageTemplates::new();
        let message = templates.render("site", "url", &failure(json!("x"), vec![]), &prefixes());
        assert_eq!(
            message,
            "'site' is not a valid URL. (Valid prefixes: 'http://', 'https://')"
        );
    }

    #[test]
    fn test_missing_placeholders_render_empty() {
        let message = render(":field/:param1/:param2/:unknown", |name| match name {
            "field" => "name".to_string(),
            _ => String::new(),
        });
        assert_eq!(message, "name///:unknown");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let mut templates = MessageTemplates::new();
        templates.set("equals", ":value vs :param1");
        let message = templates.render(
            "a",
            "equals",
            &failure(json!(":param1"), vec![json!("x")]),
            &[],
        );
        assert_eq!(message, ":param1 vs x");
    }

    #[test]
    fn test_override_and_custom_rules() {
        let mut templates = MessageTemplates::new();
        templates.extend([("required", "Please fill in :input"), ("even", ":field must be even")]);
        assert_eq!(
            templates.render("name", "required", &failure(json!(null), vec![]), &[]),
            "Please fill in name"
        );
        assert_eq!(
            templates.render("n", "even", &failure(json!(3), vec![]), &[]),
            "n must be even"
        );
        assert_eq!(
            templates.render("n", "odd", &failure(json!(2), vec![]), &[]),
            "'n' failed the 'odd' rule."
        );
    }

    #[test]
    fn test_fault_template() {
        let templates = MessageTemplates::new();
        let fault = Failure {
            value: json!("x"),
            params: vec![],
            reason: FailureReason::UnresolvableReference {
                field: "password".to_string(),
            },
        };
        assert_eq!(
            templates.render("confirm", "equals", &fault, &[]),
            "'confirm' could not be checked by 'equals': input 'password' is missing."
        );
    }
}
