//! Validation runs: rule dispatch, outcome tables and aggregation
//!
//! A [`Validator`] holds inputs, requirements and settings. Every call to
//! [`Validator::evaluate`] builds a fresh [`Evaluation`] holding two tables:
//!
//! - the outcome table, field → (rule → passed), where fields without
//!   requirements record `{optional: true}`
//! - the failure table, field → (rule → [`Failure`]), holding an entry exactly
//!   when the outcome table holds `false`
//!
//! [`Validator::validate`] aggregates the tables according to the configured
//! [`Mode`].

use crate::config::{AbsentFieldPolicy, ConfigError, Mode, ValidatorConfig};
use crate::error::{EngineError, PredicateError, ResolveError, ValidationError, ValidationErrors};
use crate::messages::{MessageTemplates, NOTHING_TO_VALIDATE};
use crate::parser::{Param, ParsedRule};
use crate::predicates::{is_filled, DnsResolver, SystemResolver};
use crate::registry::{Arity, Predicate, PredicateContext, PredicateRegistry, Truth};
use crate::resolver::{resolve, Inputs, ResolvedParam};
use crate::rules::{Requirement, Requirements, OPTIONAL_RULE};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, debug_span, trace, warn};

/// field → (rule → passed)
pub type OutcomeTable = IndexMap<String, IndexMap<String, bool>>;

/// field → (rule → failure record)
pub type FailureTable = IndexMap<String, IndexMap<String, Failure>>;

/// Why a rule was recorded as failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The predicate returned false or zero matches
    Rejected,
    /// A reference parameter named a field missing from the inputs
    UnresolvableReference { field: String },
    /// The predicate could not run, e.g. because of an invalid pattern
    PredicateFault(String),
    /// A DNS lookup exceeded its timeout
    Timeout,
}

impl FailureReason {
    /// Machine-readable code used in structured reports
    pub fn code(&self) -> &'static str {
        match self {
            Self::Rejected => "validation_failed",
            Self::UnresolvableReference { .. } => "unresolvable_reference",
            Self::PredicateFault(_) => "predicate_fault",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::UnresolvableReference { field } => write!(f, "input '{}' is missing", field),
            Self::PredicateFault(message) => write!(f, "{}", message),
            Self::Timeout => write!(f, "lookup timed out"),
        }
    }
}

/// Failure record: the input value, the rule parameters and the reason
///
/// Literal parameters are recorded as given. A reference contributes two
/// entries: the referenced field name and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub value: Value,
    pub params: Vec<Value>,
    pub reason: FailureReason,
}

impl Failure {
    /// Value followed by the parameters, as a JSON array
    pub fn context(&self) -> Value {
        let mut context = Vec::with_capacity(self.params.len() + 1);
        context.push(self.value.clone());
        context.extend(self.params.iter().cloned());
        Value::Array(context)
    }
}

/// Tables produced by one validation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    outcomes: OutcomeTable,
    failures: FailureTable,
}

impl Evaluation {
    fn record(&mut self, field: &str, rule: &str, failure: Option<Failure>) {
        let passed = failure.is_none();
        self.outcomes
            .entry(field.to_string())
            .or_default()
            .insert(rule.to_string(), passed);

        match failure {
            Some(failure) => {
                self.failures
                    .entry(field.to_string())
                    .or_default()
                    .insert(rule.to_string(), failure);
            }
            None => {
                // A repeated rule overwrites the earlier outcome
                if let Some(records) = self.failures.get_mut(field) {
                    records.shift_remove(rule);
                    if records.is_empty() {
                        self.failures.shift_remove(field);
                    }
                }
            }
        }
    }

    fn mark_optional(&mut self, field: &str) {
        let mut optional = IndexMap::new();
        optional.insert(OPTIONAL_RULE.to_string(), true);
        self.outcomes.insert(field.to_string(), optional);
        self.failures.shift_remove(field);
    }

    pub fn outcomes(&self) -> &OutcomeTable {
        &self.outcomes
    }

    pub fn failures(&self) -> &FailureTable {
        &self.failures
    }

    pub fn outcome(&self, field: &str, rule: &str) -> Option<bool> {
        self.outcomes.get(field)?.get(rule).copied()
    }

    pub fn failure(&self, field: &str, rule: &str) -> Option<&Failure> {
        self.failures.get(field)?.get(rule)
    }

    /// Whether the field passed implicitly: no requirements, or empty and optional
    pub fn is_optional(&self, field: &str) -> bool {
        self.outcomes.get(field).is_some_and(|rules| {
            rules.len() == 1 && rules.get(OPTIONAL_RULE).copied() == Some(true)
        })
    }

    /// True when every recorded outcome passed
    pub fn passed(&self) -> bool {
        self.outcomes.values().flat_map(|rules| rules.values()).all(|passed| *passed)
    }

    /// Number of failure records
    pub fn failure_count(&self) -> usize {
        self.failures.values().map(|records| records.len()).sum()
    }

    /// Failure records in evaluation order
    pub fn iter_failures(&self) -> impl Iterator<Item = (&str, &str, &Failure)> {
        self.failures.iter().flat_map(|(field, records)| {
            records
                .iter()
                .map(move |(rule, failure)| (field.as_str(), rule.as_str(), failure))
        })
    }
}

/// Aggregated result of a validation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Strict mode: one message per failed rule, empty on success
    Messages(Vec<String>),
    /// Boolean mode
    Boolean(bool),
    /// Neither inputs nor requirements were supplied
    NothingToValidate(Mode),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        match self {
            Self::Messages(messages) => messages.is_empty(),
            Self::Boolean(passed) => *passed,
            Self::NothingToValidate(_) => false,
        }
    }

    /// Failure messages; boolean verdicts carry none
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Messages(messages) => messages.clone(),
            Self::Boolean(_) | Self::NothingToValidate(Mode::Boolean) => Vec::new(),
            Self::NothingToValidate(Mode::Strict) => vec![NOTHING_TO_VALIDATE.to_string()],
        }
    }

    pub fn is_nothing_to_validate(&self) -> bool {
        matches!(self, Self::NothingToValidate(_))
    }
}

/// Validates a set of inputs against per-field rule lists
///
/// ```
/// use rulecheck::{Requirements, Validator};
/// use serde_json::json;
///
/// let verdict = Validator::new()
///     .input("username", json!("ab"))
///     .input("password", json!("short"))
///     .requirements(
///         Requirements::new()
///             .field("username", ["required", "min:3"])
///             .field("password", ["required", "min:8"]),
///     )
///     .validate()
///     .unwrap();
///
/// assert_eq!(verdict.messages().len(), 2);
/// ```
#[derive(Clone)]
pub struct Validator {
    inputs: Inputs,
    requirements: Requirements,
    config: ValidatorConfig,
    templates: MessageTemplates,
    registry: Arc<PredicateRegistry>,
    dns: Arc<dyn DnsResolver>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("inputs", &self.inputs)
            .field("requirements", &self.requirements)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

impl Validator {
    /// Validator with the built-in rules and default settings
    pub fn new() -> Self {
        Self::with_config(ValidatorConfig::default())
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            inputs: Inputs::new(),
            requirements: Requirements::new(),
            config,
            templates: MessageTemplates::new(),
            registry: Arc::new(PredicateRegistry::with_defaults()),
            dns: Arc::new(SystemResolver),
        }
    }

    /// Validator configured from `RULECHECK_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::with_config(ValidatorConfig::from_env()?))
    }

    /// Replace the inputs
    pub fn inputs<I, K, V>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_inputs(inputs);
        self
    }

    /// Add or replace a single input
    pub fn input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_input(name, value);
        self
    }

    /// Replace the requirements
    pub fn requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Add or replace the requirement of a single field
    pub fn requirement(mut self, field: impl Into<String>, requirement: impl Into<Requirement>) -> Self {
        self.requirements.insert(field, requirement);
        self
    }

    pub fn set_inputs<I, K, V>(&mut self, inputs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.inputs = inputs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
    }

    pub fn set_input(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.inputs.insert(name.into(), value.into());
    }

    pub fn set_requirements(&mut self, requirements: Requirements) {
        self.requirements = requirements;
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Override the message template of one rule
    pub fn message(mut self, rule: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.set(rule, template);
        self
    }

    /// Override several message templates
    pub fn messages<I, R, T>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = (R, T)>,
        R: Into<String>,
        T: Into<String>,
    {
        self.templates.extend(templates);
        self
    }

    /// Replace the accepted URL prefixes
    ///
    /// Blank prefixes are dropped. A list with no prefix left is ignored and the
    /// current prefixes stay in place.
    pub fn url_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|prefix| !prefix.trim().is_empty())
            .collect();
        if prefixes.is_empty() {
            warn!(current = ?self.config.url_prefixes, "ignoring empty URL prefix list");
            return self;
        }
        self.config.url_prefixes = prefixes;
        self
    }

    pub fn dns_resolver(mut self, resolver: impl DnsResolver + 'static) -> Self {
        self.dns = Arc::new(resolver);
        self
    }

    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.config.dns_timeout = timeout;
        self
    }

    pub fn absent_fields(mut self, policy: AbsentFieldPolicy) -> Self {
        self.config.absent_fields = policy;
        self
    }

    /// Register a predicate, replacing any built-in with the same name
    pub fn register<P>(mut self, predicate: P) -> Self
    where
        P: Predicate + 'static,
    {
        Arc::make_mut(&mut self.registry).register(predicate);
        self
    }

    /// Register a function as a predicate
    pub fn register_fn<F>(mut self, name: impl Into<String>, arity: Arity, check: F) -> Self
    where
        F: Fn(&PredicateContext<'_>, &Value, &[Value]) -> Result<Truth, PredicateError>
            + Send
            + Sync
            + 'static,
    {
        Arc::make_mut(&mut self.registry).register_fn(name, arity, check);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Check that every rule exists and receives an accepted number of parameters
    pub fn check_rules(&self) -> Result<(), EngineError> {
        for (field, requirement) in self.requirements.iter() {
            for rule in requirement.rules() {
                self.lookup(field, rule)?;
            }
        }
        Ok(())
    }

    fn lookup(&self, field: &str, rule: &ParsedRule) -> Result<&Arc<dyn Predicate>, EngineError> {
        let predicate = self
            .registry
            .get(rule.name())
            .ok_or_else(|| EngineError::UnknownRule {
                field: field.to_string(),
                rule: rule.name().to_string(),
            })?;

        let given = rule.params().len();
        if !predicate.arity().accepts(given) {
            return Err(EngineError::InvalidArity {
                field: field.to_string(),
                rule: rule.name().to_string(),
                expected: predicate.arity(),
                given,
            });
        }
        Ok(predicate)
    }

    /// Run every rule and return the raw outcome and failure tables
    pub fn evaluate(&self) -> Result<Evaluation, EngineError> {
        let span = debug_span!(
            "evaluate",
            inputs = self.inputs.len(),
            requirements = self.requirements.len()
        );
        let _enter = span.enter();

        self.check_rules()?;

        let ctx = PredicateContext {
            url_prefixes: &self.config.url_prefixes,
            dns: self.dns.as_ref(),
            dns_timeout: self.config.dns_timeout,
        };

        let mut evaluation = Evaluation::default();
        for (name, value) in &self.inputs {
            self.evaluate_field(&ctx, &mut evaluation, name, value)?;
        }

        if self.config.absent_fields == AbsentFieldPolicy::EvaluateAsNull {
            for name in self.requirements.fields() {
                if !self.inputs.contains_key(name) {
                    debug!(field = %name, "evaluating absent field as null");
                    self.evaluate_field(&ctx, &mut evaluation, name, &Value::Null)?;
                }
            }
        }

        debug!(failures = evaluation.failure_count(), "evaluation finished");
        Ok(evaluation)
    }

    fn evaluate_field(
        &self,
        ctx: &PredicateContext<'_>,
        evaluation: &mut Evaluation,
        name: &str,
        value: &Value,
    ) -> Result<(), EngineError> {
        let Some(requirement) = self.requirements.get(name) else {
            evaluation.mark_optional(name);
            return Ok(());
        };

        for rule in requirement.rules() {
            let predicate = self.lookup(name, rule)?;
            let failure = self.dispatch(ctx, predicate.as_ref(), name, value, rule);
            evaluation.record(name, rule.name(), failure);
        }

        if requirement.is_optional() && !is_filled(value) {
            trace!(field = %name, "empty optional field passes");
            evaluation.mark_optional(name);
        }
        Ok(())
    }

    /// Check one rule, returning the failure record when it does not pass
    fn dispatch(
        &self,
        ctx: &PredicateContext<'_>,
        predicate: &dyn Predicate,
        field: &str,
        value: &Value,
        rule: &ParsedRule,
    ) -> Option<Failure> {
        let resolved = match resolve(rule, &self.inputs) {
            Ok(resolved) => resolved,
            Err(ResolveError::UnresolvableReference { reference, .. }) => {
                warn!(field, rule = rule.name(), reference = %reference, "unresolvable reference");
                return Some(Failure {
                    value: value.clone(),
                    params: rule.params().iter().map(param_name).collect(),
                    reason: FailureReason::UnresolvableReference { field: reference },
                });
            }
        };

        let args: Vec<Value> = resolved.iter().map(|param| param.value().clone()).collect();
        let reason = match predicate.check(ctx, value, &args) {
            Ok(truth) => {
                trace!(field, rule = rule.name(), ?truth, "rule checked");
                if truth.is_true() {
                    return None;
                }
                FailureReason::Rejected
            }
            Err(error @ PredicateError::Timeout { .. }) => {
                warn!(field, rule = rule.name(), %error, "rule timed out");
                FailureReason::Timeout
            }
            Err(error) => {
                warn!(field, rule = rule.name(), %error, "rule faulted");
                FailureReason::PredicateFault(error.to_string())
            }
        };

        Some(Failure {
            value: value.clone(),
            params: failure_params(&resolved),
            reason,
        })
    }

    /// Run the rules and aggregate the result by mode
    pub fn validate(&self) -> Result<Verdict, EngineError> {
        let evaluation = self.evaluate()?;
        Ok(self.aggregate(&evaluation))
    }

    /// Aggregate an evaluation of this validator according to its mode
    pub fn aggregate(&self, evaluation: &Evaluation) -> Verdict {
        let mode = self.config.mode;
        if self.inputs.is_empty() && self.requirements.is_empty() {
            debug!(%mode, "nothing to validate");
            return Verdict::NothingToValidate(mode);
        }

        match mode {
            Mode::Strict => Verdict::Messages(self.render(evaluation)),
            Mode::Boolean => Verdict::Boolean(evaluation.passed()),
        }
    }

    /// Run the rules and report failures as structured errors
    pub fn errors(&self) -> Result<ValidationErrors, EngineError> {
        let evaluation = self.evaluate()?;
        Ok(self.report(&evaluation))
    }

    /// Structured errors for an evaluation of this validator
    pub fn report(&self, evaluation: &Evaluation) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for (field, rule, failure) in evaluation.iter_failures() {
            let message = self.render_failure(field, rule, failure);
            errors.add(
                ValidationError::new(field, rule, message)
                    .code(failure.reason.code())
                    .context(failure.context()),
            );
        }
        errors
    }

    /// One message per failure record, in evaluation order
    pub fn render(&self, evaluation: &Evaluation) -> Vec<String> {
        evaluation
            .iter_failures()
            .map(|(field, rule, failure)| self.render_failure(field, rule, failure))
            .collect()
    }

    fn render_failure(&self, field: &str, rule: &str, failure: &Failure) -> String {
        self.templates
            .render(field, rule, failure, &self.config.url_prefixes)
    }
}

fn param_name(param: &Param) -> Value {
    match param {
        Param::Literal(text) | Param::Reference(text) => Value::String(text.clone()),
    }
}

fn failure_params(resolved: &[ResolvedParam]) -> Vec<Value> {
    let mut params = Vec::with_capacity(resolved.len());
    for param in resolved {
        match param {
            ResolvedParam::Literal(value) => params.push(value.clone()),
            ResolvedParam::Reference { field, value } => {
                params.push(Value::String(field.clone()));
                params.push(value.clone());
            }
        }
    }
    params
}
