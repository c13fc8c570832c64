//! Requirement sets: the rules assigned to each input field

use crate::parser::ParsedRule;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of the rule that lets an empty field pass regardless of its other rules
pub const OPTIONAL_RULE: &str = "optional";

/// Ordered rules attached to a single field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    rules: Vec<ParsedRule>,
}

impl Requirement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule, given as a token or a typed rule
    pub fn rule(mut self, rule: impl Into<ParsedRule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    pub fn rules(&self) -> &[ParsedRule] {
        &self.rules
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name() == name)
    }

    pub fn is_optional(&self) -> bool {
        self.has_rule(OPTIONAL_RULE)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<ParsedRule> for Requirement {
    fn from(rule: ParsedRule) -> Self {
        Self { rules: vec![rule] }
    }
}

impl From<&str> for Requirement {
    fn from(token: &str) -> Self {
        ParsedRule::parse(token).into()
    }
}

impl From<String> for Requirement {
    fn from(token: String) -> Self {
        ParsedRule::parse(&token).into()
    }
}

impl<R: Into<ParsedRule>> From<Vec<R>> for Requirement {
    fn from(rules: Vec<R>) -> Self {
        rules.into_iter().collect()
    }
}

impl<R: Into<ParsedRule>, const N: usize> From<[R; N]> for Requirement {
    fn from(rules: [R; N]) -> Self {
        rules.into_iter().collect()
    }
}

impl<R: Into<ParsedRule>> FromIterator<R> for Requirement {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementRepr {
    Single(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for Requirement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RequirementRepr::deserialize(deserializer)? {
            RequirementRepr::Single(token) => token.into(),
            RequirementRepr::Many(tokens) => tokens.into(),
        })
    }
}

impl Serialize for Requirement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tokens: Vec<String> = self.rules.iter().map(ToString::to_string).collect();
        match tokens.as_slice() {
            [single] => serializer.serialize_str(single),
            _ => tokens.serialize(serializer),
        }
    }
}

/// Requirements for every validated field, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirements {
    fields: IndexMap<String, Requirement>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the requirement for a field, replacing any earlier one
    pub fn field(mut self, field: impl Into<String>, requirement: impl Into<Requirement>) -> Self {
        self.insert(field, requirement);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, requirement: impl Into<Requirement>) {
        self.fields.insert(field.into(), requirement.into());
    }

    pub fn get(&self, field: &str) -> Option<&Requirement> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Requirement)> {
        self.fields.iter()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Field names that carry requirements
    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }
}

impl<K, R> FromIterator<(K, R)> for Requirements
where
    K: Into<String>,
    R: Into<Requirement>,
{
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        let mut requirements = Self::new();
        for (field, requirement) in iter {
            requirements.insert(field, requirement);
        }
        requirements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Param;

    #[test]
    fn test_single_token_requirement() {
        let requirement = Requirement::from("min:3");
        assert_eq!(requirement.rules().len(), 1);
        assert_eq!(requirement.rules()[0].name(), "min");
    }

    #[test]
    fn test_list_requirement_keeps_order() {
        let requirement = Requirement::from(["required", "min:3", "optional"]);
        let names: Vec<&str> = requirement.rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["required", "min", "optional"]);
        assert!(requirement.is_optional());
        assert!(!requirement.has_rule("max"));
    }

    #[test]
    fn test_requirements_builder_replaces_field() {
        let requirements = Requirements::new()
            .field("name", "required")
            .field("age", vec!["isInteger", "min:18"])
            .field("name", "alpha");

        assert_eq!(requirements.len(), 2);
        assert!(requirements.get("name").is_some_and(|r| r.has_rule("alpha")));
        let fields: Vec<&String> = requirements.fields().collect();
        assert_eq!(fields, vec!["name", "age"]);
    }

    #[test]
    fn test_deserialize_mixed_shapes() {
        let requirements: Requirements = serde_json::from_value(serde_json::json!({
            "username": "required",
            "password": ["required", "min:8"],
            "confirm": "equals:$password"
        }))
        .unwrap();

        assert_eq!(requirements.len(), 3);
        assert_eq!(requirements.get("password").unwrap().rules().len(), 2);
        assert_eq!(
            requirements.get("confirm").unwrap().rules()[0].params(),
            &[Param::Reference("password".to_string())]
        );
    }

    #[test]
    fn test_serialize_back_to_tokens() {
        let requirements = Requirements::new()
            .field("a", "required")
            .field("b", ["required", "between:1|10"]);
        let json = serde_json::to_value(&requirements).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"a": "required", "b": ["required", "between:1|10"]})
        );
    }
}
