//! Registered commands and their metadata side table.

use crate::command::Command;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate command name: {0}")]
    DuplicateName(String),
}

/// Metadata declared for a command at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Help text per parameter name
    pub arg_help: HashMap<String, String>,
    /// Skip the required-argument count check
    pub lenient: bool,
}

impl Metadata {
    pub fn help_for(&self, param: &str) -> Option<&str> {
        self.arg_help.get(param).map(String::as_str)
    }
}

/// Commands in registration order, plus a name -> metadata table.
#[derive(Default)]
pub struct Registry {
    commands: Vec<Box<dyn Command>>,
    metadata: HashMap<String, Metadata>,
    fallback: Metadata,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under the name its signature declares.
    pub fn register<C>(&mut self, command: C) -> Result<Registration<'_>, RegistryError>
    where
        C: Command + 'static,
    {
        let name = command.signature().name;
        if self.metadata.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.commands.push(Box::new(command));
        let metadata = self.metadata.entry(name).or_default();
        Ok(Registration { metadata })
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|c| c.signature().name == name)
            .map(|c| c.as_ref())
    }

    /// Metadata for `name`; commands registered without any get the default.
    pub fn metadata(&self, name: &str) -> &Metadata {
        self.metadata.get(name).unwrap_or(&self.fallback)
    }

    /// Registered command names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.signature().name).collect()
    }

    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Builder for the metadata of a freshly registered command.
pub struct Registration<'a> {
    metadata: &'a mut Metadata,
}

impl Registration<'_> {
    /// Attach help text to a parameter's flag.
    pub fn arg_help(self, param: impl Into<String>, help: impl Into<String>) -> Self {
        self.metadata.arg_help.insert(param.into(), help.into());
        self
    }

    /// Accept any number of positional arguments.
    pub fn not_strict(self) -> Self {
        self.metadata.lenient = true;
        self
    }
}
