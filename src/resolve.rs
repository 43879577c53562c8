//! Run a built parser against tokens and collect values and errors.

use crate::command::Invocation;
use crate::flags::{FlagKind, FlagSet};
use crate::parser::{ParserSpec, POSITIONAL_ID};
use crate::signature::Value;
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::ArgMatches;
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of resolving tokens. Resolution never fails; a non-empty
/// `errors` list is the only failure signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// At least one slot per required parameter, padded with `Null`
    pub positional: Vec<Value>,
    /// Keyword values keyed by the true parameter name
    pub keywords: BTreeMap<String, Value>,
    pub errors: Vec<String>,
    /// Rendered help text when `-h`/`--help` was given
    pub help: Option<String>,
}

impl Resolution {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.help.is_none()
    }

    /// The values to invoke the target with.
    pub fn into_invocation(self) -> Invocation {
        Invocation {
            positional: self.positional,
            keywords: self.keywords,
        }
    }
}

/// Reduce a rendered Clap error to its one-line message.
fn error_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default().trim();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// Keyword values and leftover positionals recorded in `matches`.
fn collect(flags: &FlagSet, matches: &ArgMatches) -> (BTreeMap<String, Value>, Vec<String>) {
    let mut stored = BTreeMap::new();
    for flag in &flags.flags {
        let value = match flag.kind {
            FlagKind::Toggle => {
                let declared = flag.default.as_bool().unwrap_or(false);
                // Partial matches carry no implicit `false`.
                let given = matches.get_one::<bool>(&flag.dest).copied().unwrap_or(false);
                Value::Bool(given || declared)
            }
            FlagKind::Value => {
                match (
                    matches.value_source(&flag.dest),
                    matches.get_one::<String>(&flag.dest),
                ) {
                    (Some(ValueSource::CommandLine), Some(v)) => Value::Text(v.clone()),
                    _ => flag.default.clone(),
                }
            }
        };
        stored.insert(flag.dest.clone(), value);
    }
    let leftovers = matches
        .get_many::<String>(POSITIONAL_ID)
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();
    (stored, leftovers)
}

/// Parse `tokens` with `spec` and check the positional count.
///
/// `lenient` skips the arity check for callables that opted out of it.
pub fn resolve(spec: ParserSpec, tokens: &[String], lenient: bool) -> Resolution {
    let ParserSpec {
        command,
        flags,
        required,
        variadic,
        ..
    } = spec;

    let mut resolution = Resolution::default();
    let recovery = command.clone().ignore_errors(true);

    let (stored, leftovers) = match command.try_get_matches_from(tokens) {
        Ok(matches) => collect(&flags, &matches),
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            resolution.help = Some(err.to_string());
            (BTreeMap::new(), Vec::new())
        }
        Err(err) => {
            debug!(kind = ?err.kind(), "parse failed");
            resolution.errors.push(error_message(&err));
            // Keep what was parsed before the failing token.
            match recovery.try_get_matches_from(tokens) {
                Ok(matches) => collect(&flags, &matches),
                Err(_) => (BTreeMap::new(), Vec::new()),
            }
        }
    };

    // Restore the declared names of short-prefixed parameters.
    for flag in &flags.flags {
        let value = stored
            .get(&flag.dest)
            .cloned()
            .unwrap_or_else(|| flag.default.clone());
        resolution
            .keywords
            .insert(flags.param_for(&flag.dest).to_string(), value);
    }

    if resolution.help.is_none() && !lenient {
        let expected = required.len();
        let got = leftovers.len();
        let satisfied = got == expected || (variadic && got >= expected);
        if !satisfied {
            resolution
                .errors
                .push(format!("Required {} arguments, got {}", expected, got));
        }
    }

    resolution.positional = leftovers.into_iter().map(Value::Text).collect();
    if resolution.positional.len() < required.len() {
        resolution.positional.resize(required.len(), Value::Null);
    }

    resolution
}
