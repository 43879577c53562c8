//! sigopt demo - print a file upper- or lower-cased, exposed as two subcommands.

use anyhow::{Context as _, Result};
use sigopt::{command, Command, Outcome, Registry, Runner, Signature, Target, Value};
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const UPPER: &str = r#"{
    "name": "upper",
    "doc": "Usage: %prog <file> [--verbose] - output file content in uppercase",
    "params": [{"name": "filename"}, {"name": "verbose", "default": false}]
}"#;

const LOWER: &str = r#"{
    "name": "lower",
    "doc": "Usage: %prog <file> [--verbose] - output file content in lowercase",
    "params": [{"name": "filename"}, {"name": "verbose", "default": false}]
}"#;

/// A command printing the content of its `filename` argument through `fold`.
fn case_command(descriptor: &str, fold: fn(&str) -> String) -> Result<impl Command> {
    let signature = Signature::from_json(descriptor).context("invalid command descriptor")?;

    Ok(command(signature, move |invocation, ctx| {
        let filename = invocation.arg(0).to_string();
        let content = std::fs::read_to_string(&filename)
            .with_context(|| format!("failed to read {}", filename))?;

        if invocation.flag("verbose") {
            writeln!(ctx.out(), "Processing {} bytes...", content.len())?;
        }
        writeln!(ctx.out(), "{}", fold(&content))?;
        Ok(Value::Null)
    }))
}

fn build_registry() -> Result<Registry> {
    let mut registry = Registry::new();
    registry
        .register(case_command(UPPER, str::to_uppercase)?)?
        .arg_help("verbose", "Print the byte count first");
    registry
        .register(case_command(LOWER, str::to_lowercase)?)?
        .arg_help("verbose", "Print the byte count first");
    Ok(registry)
}

/// Process exit status for an outcome: 1 when the command failed, 2 on usage errors.
fn exit_status(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Completed(_) | Outcome::Help => 0,
        Outcome::Failed => 1,
        Outcome::Rejected => 2,
    }
}

fn main() -> Result<ExitCode> {
    // Logs go to stderr so they never mix with command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let registry = build_registry()?;
    let outcome = Runner::stdio().run(&registry, Target::Subcommands, None);
    Ok(ExitCode::from(exit_status(&outcome)))
}
