mod commands;
mod loader;
mod logging;

use clap::{Parser, Subcommand};
use commands::check::{CheckArgs, OutputFormat};
use commands::{Outcome, CONFIG_ERROR};
use logging::LoggingConfig;
use rulecheck::{AbsentFieldPolicy, Mode};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rulecheck")]
#[command(about = "Validate named inputs against rule lists")]
#[command(version)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an input file against a rules file
    Check {
        /// Input values (.json, .yaml or .yml)
        #[arg(long)]
        inputs: PathBuf,

        /// Rules per field (.json, .yaml or .yml)
        #[arg(long)]
        rules: PathBuf,

        /// Report messages (strict) or a single true/false (boolean)
        #[arg(long)]
        mode: Option<Mode>,

        /// Accepted URL prefix; repeat to accept several
        #[arg(long = "url-prefix")]
        url_prefixes: Vec<String>,

        /// Treatment of fields with rules but no input (null or skip)
        #[arg(long)]
        absent_fields: Option<AbsentFieldPolicy>,

        /// Timeout for DNS-backed rules, in milliseconds
        #[arg(long)]
        dns_timeout_ms: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the built-in rules
    Rules {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn run(command: Commands) -> anyhow::Result<Outcome> {
    match command {
        Commands::Check {
            inputs,
            rules,
            mode,
            url_prefixes,
            absent_fields,
            dns_timeout_ms,
            format,
        } => commands::check::run(&CheckArgs {
            inputs,
            rules,
            mode,
            url_prefixes,
            absent_fields,
            dns_timeout_ms,
            format,
        }),
        Commands::Rules { json } => {
            commands::rules::run(json)?;
            Ok(Outcome::Passed)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = logging::init_logging(&LoggingConfig::new(&cli.log_level, cli.log_json)) {
        eprintln!("error: failed to initialize logging: {:#}", error);
        return ExitCode::from(CONFIG_ERROR);
    }

    match run(cli.command) {
        Ok(outcome) => outcome.exit_code(),
        Err(error) => {
            tracing::debug!(error = ?error, "command failed");
            eprintln!("error: {:#}", error);
            ExitCode::from(CONFIG_ERROR)
        }
    }
}
