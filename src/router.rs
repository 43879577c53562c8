//! Route a leading token to one of several registered commands.

use crate::command::{Command, Invocation};
use crate::dispatch::{Context, Execution, Outcome};
use crate::registry::Registry;
use crate::signature::{Param, Signature, Value};
use tracing::debug;

/// Name of the router's single required parameter.
const COMMAND_PARAM: &str = "command";

/// Quote and join names as `'a', 'b' or 'c'`.
pub fn join_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

/// Usage text listing one row per command, names right-aligned.
pub fn aggregate_usage(names: &[String]) -> String {
    let width = names.iter().map(|n| n.len()).max().unwrap_or(0);
    let mut usage = String::from("Usage: %prog COMMAND ...\n\nCommands:");
    for name in names {
        // Per-command descriptions are not extracted yet; the column stays blank.
        usage.push_str(&format!("\n  {:>width$}  ", name, width = width));
    }
    usage
}

/// A synthetic command with signature `(command, *argv)` that re-enters the
/// pipeline for the command named by its first token.
pub struct Router<'r> {
    registry: &'r Registry,
    prog: String,
}

impl<'r> Router<'r> {
    pub fn new(registry: &'r Registry, prog: impl Into<String>) -> Self {
        Self {
            registry,
            prog: prog.into(),
        }
    }
}

impl Command for Router<'_> {
    fn signature(&self) -> Signature {
        Signature::new(self.prog.clone())
            .doc(aggregate_usage(&self.registry.names()))
            .param(Param::required(COMMAND_PARAM))
            .variadic()
    }

    fn call(&self, invocation: Invocation, ctx: &mut Context<'_>) -> anyhow::Result<Value> {
        let name = invocation.arg(0).to_string();
        let rest: Vec<String> = invocation
            .rest(1)
            .iter()
            .map(|v| v.to_string())
            .collect();

        let Some(target) = self.registry.get(&name) else {
            debug!(command = %name, "unknown command");
            let message = format!("Unknown command: try {}", join_names(&self.registry.names()));
            ctx.report(None, &message);
            ctx.set_routed(Outcome::Rejected);
            return Ok(Value::Null);
        };

        debug!(command = %name, tokens = rest.len(), "routing");
        let outcome = ctx.execute(
            target,
            &rest,
            &Execution {
                prog: format!("{} {}", self.prog, name),
                interspersed: true,
                include_name_in_errors: true,
                registered: true,
            },
        );
        let value = outcome.value().cloned().unwrap_or(Value::Null);
        ctx.set_routed(outcome);
        Ok(value)
    }
}
