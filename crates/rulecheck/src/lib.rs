//! # rulecheck
//!
//! Rule-based validation of named input values. Each field gets a list of rule
//! tokens such as `required`, `min:8`, `between:1|10` or `equals:$password`; a run
//! reports either one message per failed rule or a single pass/fail flag.

pub mod config;
pub mod engine;
pub mod error;
pub mod messages;
pub mod parser;
pub mod predicates;
pub mod registry;
pub mod resolver;
pub mod rules;

pub use config::{AbsentFieldPolicy, ConfigError, Mode, ValidatorConfig};
pub use engine::{Evaluation, Failure, FailureReason, FailureTable, OutcomeTable, Validator, Verdict};
pub use error::{EngineError, PredicateError, ResolveError, ValidationError, ValidationErrors};
pub use messages::{MessageTemplates, NOTHING_TO_VALIDATE};
pub use parser::{Param, ParsedRule};
pub use predicates::{DnsResolver, StaticResolver, SystemResolver};
pub use registry::{Arity, FnPredicate, Predicate, PredicateContext, PredicateRegistry, Truth};
pub use resolver::{Inputs, ResolvedParam};
pub use rules::{Requirement, Requirements};
