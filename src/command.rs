//! The target interface: a declared signature plus a body to invoke.

use crate::dispatch::Context;
use crate::signature::{Signature, Value};
use std::collections::BTreeMap;

/// Resolved values handed to a target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    /// One slot per required parameter (padded with `Null`), then any extra
    /// positionals a variadic target captured.
    pub positional: Vec<Value>,
    /// Optional parameters keyed by their declared name.
    pub keywords: BTreeMap<String, Value>,
}

static NULL: Value = Value::Null;

impl Invocation {
    /// The positional value at `index`, or `Null` past the end.
    pub fn arg(&self, index: usize) -> &Value {
        self.positional.get(index).unwrap_or(&NULL)
    }

    /// The keyword value for `name`, or `Null` if it was never declared.
    pub fn keyword(&self, name: &str) -> &Value {
        self.keywords.get(name).unwrap_or(&NULL)
    }

    /// Whether the toggle `name` resolved to `true`.
    pub fn flag(&self, name: &str) -> bool {
        self.keyword(name).as_bool().unwrap_or(false)
    }

    /// Positionals beyond the required ones.
    pub fn rest(&self, required: usize) -> &[Value] {
        self.positional.get(required..).unwrap_or(&[])
    }
}

/// Something that can be exposed on the command line.
///
/// The signature is asked for on every execution; nothing derived from it
/// is cached between runs.
pub trait Command {
    fn signature(&self) -> Signature;

    /// Run the target. Errors are reported by the dispatcher and never escape it.
    fn call(&self, invocation: Invocation, ctx: &mut Context<'_>) -> anyhow::Result<Value>;
}

/// A [`Command`] backed by a closure.
pub struct FnCommand<F> {
    signature: Signature,
    body: F,
}

impl<F> Command for FnCommand<F>
where
    F: Fn(Invocation, &mut Context<'_>) -> anyhow::Result<Value>,
{
    fn signature(&self) -> Signature {
        self.signature.clone()
    }

    fn call(&self, invocation: Invocation, ctx: &mut Context<'_>) -> anyhow::Result<Value> {
        (self.body)(invocation, ctx)
    }
}

/// Build a command from a declared signature and a closure.
pub fn command<F>(signature: Signature, body: F) -> FnCommand<F>
where
    F: Fn(Invocation, &mut Context<'_>) -> anyhow::Result<Value>,
{
    FnCommand { signature, body }
}
