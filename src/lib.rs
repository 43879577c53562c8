//! sigopt - Turn declared function signatures into command-line parsers.
//!
//! A target publishes a [`Signature`]: required parameters become positional
//! arguments, defaulted parameters become `-x`/`--long` flags (booleans become
//! toggles). Several targets registered together can be run as subcommands
//! selected by the leading token. Token parsing and help rendering are done by
//! Clap; this crate translates signatures and dispatches the results.

pub mod command;
pub mod dispatch;
pub mod flags;
pub mod parser;
pub mod registry;
pub mod resolve;
pub mod router;
pub mod signature;

pub use command::{command, Command, FnCommand, Invocation};
pub use dispatch::{dispatch, Context, Execution, Outcome, Runner, Target};
pub use flags::{allocate, AllocationError, FlagKind, FlagName, FlagSet};
pub use parser::{build_parser, BuildError, ParserOptions, ParserSpec};
pub use registry::{Metadata, Registration, Registry, RegistryError};
pub use resolve::{resolve, Resolution};
pub use router::Router;
pub use signature::{
    inspect, CallableKind, CallableSignature, Param, ParamDefault, ParamKind,
    ParameterDescriptor, Signature, SignatureError, Value,
};
