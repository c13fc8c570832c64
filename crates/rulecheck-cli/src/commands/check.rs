use super::Outcome;
use crate::loader;
use anyhow::{Context, Result};
use clap::ValueEnum;
use rulecheck::{
    AbsentFieldPolicy, Inputs, Mode, Requirements, Validator, ValidatorConfig, Verdict,
};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub inputs: PathBuf,
    pub rules: PathBuf,
    pub mode: Option<Mode>,
    pub url_prefixes: Vec<String>,
    pub absent_fields: Option<AbsentFieldPolicy>,
    pub dns_timeout_ms: Option<u64>,
    pub format: OutputFormat,
}

/// Settings from the environment, overridden by command-line flags
fn config(args: &CheckArgs) -> Result<ValidatorConfig> {
    let mut config = ValidatorConfig::from_env().context("invalid RULECHECK_* environment")?;

    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if !args.url_prefixes.is_empty() {
        config.url_prefixes = args.url_prefixes.clone();
    }
    if let Some(policy) = args.absent_fields {
        config.absent_fields = policy;
    }
    if let Some(millis) = args.dns_timeout_ms {
        config.dns_timeout = Duration::from_millis(millis);
    }

    config.validate()?;
    Ok(config)
}

pub fn run(args: &CheckArgs) -> Result<Outcome> {
    let inputs: Inputs = loader::load(&args.inputs)?;
    let requirements: Requirements = loader::load(&args.rules)?;
    let config = config(args)?;
    tracing::info!(
        inputs = inputs.len(),
        requirements = requirements.len(),
        mode = %config.mode,
        "running validation"
    );

    let validator = Validator::with_config(config)
        .inputs(inputs)
        .requirements(requirements);
    let evaluation = validator.evaluate()?;
    let verdict = validator.aggregate(&evaluation);

    match args.format {
        OutputFormat::Text => print_text(&verdict),
        OutputFormat::Json => {
            let report = validator.report(&evaluation);
            let output = json!({
                "passed": verdict.passed(),
                "mode": validator.config().mode,
                "nothing_to_validate": verdict.is_nothing_to_validate(),
                "messages": verdict.messages(),
                "errors": report.errors,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(if verdict.passed() {
        Outcome::Passed
    } else {
        Outcome::Failed
    })
}

fn print_text(verdict: &Verdict) {
    match verdict {
        Verdict::Boolean(passed) => println!("{}", passed),
        Verdict::NothingToValidate(Mode::Boolean) => println!("false"),
        Verdict::Messages(messages) if messages.is_empty() => println!("All checks passed"),
        _ => {
            for message in verdict.messages() {
                println!("{}", message);
            }
        }
    }
}
