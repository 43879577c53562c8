//! Build a Clap Command from a declared signature.

use crate::flags::{allocate, AllocationError, FlagKind, FlagName, FlagSet};
use crate::registry::Metadata;
use crate::signature::{inspect, Signature, SignatureError, Value};
use clap::{Arg, ArgAction, Command};
use thiserror::Error;

/// Id of the catch-all positional collecting leftover tokens.
pub(crate) const POSITIONAL_ID: &str = "+positional";

/// Placeholder in usage text replaced by the program name.
const PROG_PLACEHOLDER: &str = "%prog";

/// Errors that can occur while building a parser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Settings that vary per execution rather than per signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Program name shown in usage and help
    pub prog: String,
    /// Whether flags may follow positional tokens
    pub interspersed: bool,
}

impl ParserOptions {
    pub fn new(prog: impl Into<String>) -> Self {
        Self {
            prog: prog.into(),
            interspersed: true,
        }
    }

    /// Stop flag parsing at the first positional token.
    pub fn no_interspersed(mut self) -> Self {
        self.interspersed = false;
        self
    }
}

/// A ready parser plus what the resolver needs to interpret its matches.
#[derive(Debug, Clone)]
pub struct ParserSpec {
    pub command: Command,
    pub flags: FlagSet,
    pub required: Vec<String>,
    pub variadic: bool,
    pub usage: Option<String>,
}

impl ParserSpec {
    /// Render the help text the parser would print for `--help`.
    pub fn render_help(&mut self) -> String {
        self.command.render_help().to_string()
    }
}

/// Turn a doc string into usage text: strip a leading `Usage:` and fill in the program name.
pub fn usage_from_doc(doc: &str, prog: &str) -> String {
    let trimmed = doc.trim();
    let body = match trimmed.get(..6) {
        Some(head) if head.eq_ignore_ascii_case("usage:") => trimmed[6..].trim_start(),
        _ => trimmed,
    };
    body.replace(PROG_PLACEHOLDER, prog)
}

/// Inspect `signature`, allocate its flag names and register them with Clap.
pub fn build_parser(
    signature: &Signature,
    metadata: &Metadata,
    options: &ParserOptions,
) -> Result<ParserSpec, BuildError> {
    let inspected = inspect(signature)?;
    let flags = allocate(&inspected)?;

    let mut cmd = Command::new(options.prog.clone())
        .no_binary_name(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .args_override_self(true);

    let usage = inspected
        .doc
        .as_deref()
        .map(|doc| usage_from_doc(doc, &options.prog));
    if let Some(ref usage) = usage {
        cmd = cmd.override_usage(usage.clone());
    }

    for flag in &flags.flags {
        cmd = cmd.arg(build_arg(flag, metadata.help_for(&flag.param)));
    }

    let mut positional = Arg::new(POSITIONAL_ID)
        .value_name("ARGS")
        .action(ArgAction::Append)
        .num_args(1..);
    if !options.interspersed {
        positional = positional.trailing_var_arg(true);
    }
    cmd = cmd.arg(positional);

    Ok(ParserSpec {
        command: cmd,
        required: inspected.required(),
        variadic: inspected.variadic,
        flags,
        usage,
    })
}

/// Build a Clap Arg from an allocated flag.
fn build_arg(flag: &FlagName, help: Option<&str>) -> Arg {
    let mut arg = Arg::new(flag.dest.clone())
        .short(flag.short)
        .long(flag.long.clone());

    match flag.kind {
        FlagKind::Toggle => {
            arg = arg.action(ArgAction::SetTrue);
        }
        FlagKind::Value => {
            arg = arg.action(ArgAction::Set).value_name("VALUE");
            // Null defaults have nothing to show; the resolver supplies them.
            if !matches!(flag.default, Value::Null) {
                arg = arg.default_value(flag.default.to_string());
            }
        }
    }

    if let Some(help) = help {
        arg = arg.help(help.to_string());
    }

    arg
}
