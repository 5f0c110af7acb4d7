//! Command Module
//!
//! Command handlers and how a name or id is turned into one.
//!
//! ## Architecture
//! - `Command`: the handler contract (help text, parser, error hook, executor)
//! - `CommandCatalog`: handlers compiled into this binary
//! - `PluginLoader`: handlers discovered in the plugin directory
//! - `CommandTable`: known ids and which of them are enabled
//! - `Dispatcher`: built-in first, plugin second

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::protocol::{ErrorCode, ExecutionResult, OptionList};

mod registry;
mod dispatch;
pub mod plugin;
pub mod builtin;

pub use registry::{
    CommandDescriptor, CommandTable, END_COMMAND_ID, KNOWN_COMMANDS, PLUGIN_COMMAND_ID,
};
pub use dispatch::{Dispatcher, Resolved};
pub use plugin::{PluginDirectory, PluginLoader, ProcessPlugin};

/// Shell-side state a parser may consult
pub struct ParseContext<'a> {
    /// Negotiated command table
    pub table: &'a CommandTable,

    /// Built-in handlers
    pub catalog: &'a CommandCatalog,

    /// Where parser output goes
    pub out: &'a mut dyn Write,
}

/// A command handler
///
/// `help`, `parse` and `handle_error` run in the shell; `execute` runs on the
/// server. `execute` reports failure through the error code, never by
/// panicking.
pub trait Command: Send + Sync {
    /// Command name, as used for the shell symlink
    fn name(&self) -> &str;

    /// Help text shown when the parser rejects the arguments
    fn help(&self) -> &str;

    /// Validate arguments before anything is sent
    fn parse(&self, options: &OptionList, ctx: &mut ParseContext<'_>) -> bool;

    /// Called by the shell when the server reports a failure
    fn handle_error(&self, _code: ErrorCode) {}

    /// Run the command
    fn execute(&self, options: &OptionList) -> ExecutionResult;
}

/// Handlers available in the running binary, keyed by name
#[derive(Clone, Default)]
pub struct CommandCatalog {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the handlers compiled into this crate
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        builtin::register_all(&mut catalog);
        catalog
    }

    /// Add a handler, replacing any handler of the same name
    pub fn register(&mut self, command: Arc<dyn Command>) -> Option<Arc<dyn Command>> {
        self.commands.insert(command.name().to_string(), command)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Sorted handler names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandCatalog")
            .field("commands", &self.names())
            .finish()
    }
}
