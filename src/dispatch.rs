//! Invoke targets with resolved values and report failures as text.

use crate::command::Command;
use crate::parser::{build_parser, ParserOptions};
use crate::registry::{Metadata, Registry};
use crate::resolve::{resolve, Resolution};
use crate::router::Router;
use crate::signature::Value;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, debug_span, warn};

/// How one execution ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The target ran and returned a value.
    Completed(Value),
    /// Help was printed; nothing was invoked.
    Help,
    /// Parse, arity or build errors were reported; nothing was invoked.
    Rejected,
    /// The target ran and returned an error, which was reported.
    Failed,
}

impl Outcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Completed(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed(_) | Outcome::Help)
    }
}

/// Per-execution settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub prog: String,
    pub interspersed: bool,
    /// Prefix reported errors with `<name>: `
    pub include_name_in_errors: bool,
    /// Target is a registered command whose metadata applies
    pub registered: bool,
}

/// Output streams and registry available while an execution runs.
pub struct Context<'a> {
    registry: &'a Registry,
    out: &'a mut dyn Write,
    err: &'a mut dyn Write,
    routed: Option<Outcome>,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry, out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self {
            registry,
            out,
            err,
            routed: None,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Stream for regular output.
    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    /// Stream for error messages.
    pub fn err(&mut self) -> &mut dyn Write {
        &mut *self.err
    }

    /// Write one message to the error stream, optionally prefixed.
    pub fn report(&mut self, prefix: Option<&str>, message: &str) {
        let written = match prefix {
            Some(name) => writeln!(self.err, "{}: {}", name, message),
            None => writeln!(self.err, "{}", message),
        };
        if let Err(e) = written {
            warn!(error = %e, "failed to write to the error stream");
        }
    }

    /// Record the outcome of a routed subcommand, which supersedes the router's own.
    pub(crate) fn set_routed(&mut self, outcome: Outcome) {
        self.routed = Some(outcome);
    }

    pub(crate) fn take_routed(&mut self) -> Option<Outcome> {
        self.routed.take()
    }

    /// Run the whole pipeline for `target` against `tokens`.
    pub fn execute(
        &mut self,
        target: &dyn Command,
        tokens: &[String],
        execution: &Execution,
    ) -> Outcome {
        let signature = target.signature();
        let _span = debug_span!("execute", command = %signature.name).entered();
        let unregistered = Metadata::default();
        let metadata = if execution.registered {
            self.registry.metadata(&signature.name)
        } else {
            &unregistered
        };
        let prefix = execution
            .include_name_in_errors
            .then_some(signature.name.as_str());

        debug!("building parser");
        let mut options = ParserOptions::new(execution.prog.clone());
        if !execution.interspersed {
            options = options.no_interspersed();
        }
        let spec = match build_parser(&signature, metadata, &options) {
            Ok(spec) => spec,
            Err(e) => {
                debug!(error = %e, "reporting build error");
                self.report(prefix, &e.to_string());
                return Outcome::Rejected;
            }
        };

        debug!(tokens = tokens.len(), "resolving");
        let resolution = resolve(spec, tokens, metadata.lenient);
        dispatch(target, resolution, prefix, self)
    }
}

/// Invoke `target` with `resolution`, or report why it cannot be invoked.
///
/// Errors returned by the target are written to the error stream and never propagate.
pub fn dispatch(
    target: &dyn Command,
    resolution: Resolution,
    prefix: Option<&str>,
    ctx: &mut Context<'_>,
) -> Outcome {
    if let Some(help) = resolution.help {
        debug!("printing help");
        if let Err(e) = ctx.out().write_all(help.as_bytes()) {
            warn!(error = %e, "failed to write help");
        }
        return Outcome::Help;
    }

    if !resolution.errors.is_empty() {
        debug!(count = resolution.errors.len(), "reporting errors");
        ctx.report(prefix, &resolution.errors.join("\n"));
        return Outcome::Rejected;
    }

    debug!("dispatching");
    match target.call(resolution.into_invocation(), ctx) {
        Ok(value) => Outcome::Completed(value),
        Err(e) => {
            debug!(error = %e, "target failed");
            ctx.report(prefix, &format!("{:#}", e));
            Outcome::Failed
        }
    }
}

/// What a [`Runner`] should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// A single registered command.
    Command(&'a str),
    /// Every registered command, selected by the leading token.
    Subcommands,
}

/// Program name from the process's own `argv[0]`.
fn default_prog() -> String {
    std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Entry point: runs a command or a set of subcommands against tokens.
pub struct Runner<O, E> {
    out: O,
    err: E,
    prog: Option<String>,
    include_name_in_errors: bool,
}

impl Runner<io::Stdout, io::Stderr> {
    /// A runner writing to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Runner::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Runner<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            prog: None,
            include_name_in_errors: false,
        }
    }

    /// Override the program name used in usage text.
    pub fn prog(mut self, prog: impl Into<String>) -> Self {
        self.prog = Some(prog.into());
        self
    }

    /// Prefix reported errors with the target's name.
    pub fn include_name_in_errors(mut self, include: bool) -> Self {
        self.include_name_in_errors = include;
        self
    }

    /// Run `target`. `tokens` defaults to the process's own arguments.
    pub fn run(
        &mut self,
        registry: &Registry,
        target: Target<'_>,
        tokens: Option<Vec<String>>,
    ) -> Outcome {
        let tokens = tokens.unwrap_or_else(|| {
            std::env::args_os()
                .skip(1)
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect()
        });
        let prog = self.prog.clone().unwrap_or_else(default_prog);
        let include_name_in_errors = self.include_name_in_errors;

        let mut ctx = Context::new(registry, &mut self.out, &mut self.err);

        let outcome = match target {
            Target::Command(name) => match registry.get(name) {
                Some(command) => ctx.execute(
                    command,
                    &tokens,
                    &Execution {
                        prog,
                        interspersed: true,
                        include_name_in_errors,
                        registered: true,
                    },
                ),
                None => {
                    ctx.report(None, &format!("Unknown command: {}", name));
                    Outcome::Rejected
                }
            },
            Target::Subcommands => {
                let router = Router::new(registry, prog.clone());
                let outcome = ctx.execute(
                    &router,
                    &tokens,
                    &Execution {
                        prog,
                        interspersed: false,
                        include_name_in_errors,
                        registered: false,
                    },
                );
                ctx.take_routed().unwrap_or(outcome)
            }
        };

        if let Err(e) = self.out.flush().and_then(|()| self.err.flush()) {
            warn!(error = %e, "failed to flush output");
        }
        outcome
    }

    /// Give back the output streams.
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}
