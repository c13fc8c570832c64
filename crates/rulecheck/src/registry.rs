//! Predicate capabilities and the name-to-predicate table used for dispatch

use crate::error::PredicateError;
use crate::predicates::{self, DnsResolver};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Number of parameters a predicate accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range { min: usize, max: usize },
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Self::Exact(n) => count == n,
            Self::Range { min, max } => (min..=max).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{}", n),
            Self::Range { min, max } => write!(f, "{} to {}", min, max),
        }
    }
}

/// Raw predicate result, normalised to a boolean at the dispatch boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    Bool(bool),
    /// Number of matches, as returned by pattern checks
    Matches(usize),
}

impl Truth {
    pub fn is_true(self) -> bool {
        match self {
            Self::Bool(value) => value,
            Self::Matches(count) => count > 0,
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Settings a predicate may consult besides its value and parameters
#[derive(Clone, Copy)]
pub struct PredicateContext<'a> {
    pub url_prefixes: &'a [String],
    pub dns: &'a dyn DnsResolver,
    pub dns_timeout: Duration,
}

impl fmt::Debug for PredicateContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateContext")
            .field("url_prefixes", &self.url_prefixes)
            .field("dns_timeout", &self.dns_timeout)
            .finish()
    }
}

/// A check registered under a rule name
pub trait Predicate: Send + Sync {
    /// Rule name used in tokens
    fn name(&self) -> &str;

    /// Accepted parameter count
    fn arity(&self) -> Arity;

    /// Check `value` against resolved `params`
    fn check(
        &self,
        ctx: &PredicateContext<'_>,
        value: &Value,
        params: &[Value],
    ) -> Result<Truth, PredicateError>;
}

/// Signature of function-backed predicates
pub type PredicateFn = Arc<
    dyn Fn(&PredicateContext<'_>, &Value, &[Value]) -> Result<Truth, PredicateError>
        + Send
        + Sync,
>;

/// Predicate backed by a plain function or closure
#[derive(Clone)]
pub struct FnPredicate {
    name: String,
    arity: Arity,
    check: PredicateFn,
}

impl FnPredicate {
    pub fn new<F>(name: impl Into<String>, arity: Arity, check: F) -> Self
    where
        F: Fn(&PredicateContext<'_>, &Value, &[Value]) -> Result<Truth, PredicateError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            arity,
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for FnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Predicate for FnPredicate {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn check(
        &self,
        ctx: &PredicateContext<'_>,
        value: &Value,
        params: &[Value],
    ) -> Result<Truth, PredicateError> {
        (self.check)(ctx, value, params)
    }
}

/// Lookup table from rule name to predicate
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Arc<dyn Predicate>>,
}

impl PredicateRegistry {
    /// Registry with no predicates at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in rule set
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        predicates::register_defaults(&mut registry);
        registry
    }

    /// Register a predicate, replacing any predicate with the same name
    pub fn register<P>(&mut self, predicate: P)
    where
        P: Predicate + 'static,
    {
        self.predicates
            .insert(predicate.name().to_string(), Arc::new(predicate));
    }

    /// Register a function under `name`
    pub fn register_fn<F>(&mut self, name: impl Into<String>, arity: Arity, check: F)
    where
        F: Fn(&PredicateContext<'_>, &Value, &[Value]) -> Result<Truth, PredicateError>
            + Send
            + Sync
            + 'static,
    {
        self.register(FnPredicate::new(name, arity, check));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Predicate>> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Registered names with their arity, sorted by name
    pub fn catalog(&self) -> Vec<(&str, Arity)> {
        let mut entries: Vec<(&str, Arity)> = self
            .predicates
            .values()
            .map(|predicate| (predicate.name(), predicate.arity()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}
