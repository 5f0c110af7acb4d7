//! Dispatcher
//!
//! Resolves commands and runs them.
//!
//! ## Resolution Order
//! 1. Built-in: the name is enabled in the table and the catalog has a handler
//! 2. Plugin: `<plugins_dir>/<name><suffix>` exists and loads
//!
//! A name that resolves both ways is always treated as a built-in.

use std::fmt;
use std::sync::Arc;

use super::{Command, CommandCatalog, CommandTable, PluginLoader, PLUGIN_COMMAND_ID};
use crate::error::DispatchError;
use crate::protocol::{CommandId, ExecutionResult, OptionList, Request, Response};

/// A command ready to be parsed and sent
#[derive(Clone)]
pub enum Resolved {
    /// Compiled-in handler, executed by id
    Builtin {
        id: CommandId,
        command: Arc<dyn Command>,
    },

    /// Plugin handler, executed by name
    Plugin { command: Arc<dyn Command> },
}

impl Resolved {
    /// Id carried in the execute request
    pub fn id(&self) -> CommandId {
        match self {
            Resolved::Builtin { id, .. } => *id,
            Resolved::Plugin { .. } => PLUGIN_COMMAND_ID,
        }
    }

    pub fn command(&self) -> &Arc<dyn Command> {
        match self {
            Resolved::Builtin { command, .. } | Resolved::Plugin { command } => command,
        }
    }

    pub fn is_plugin(&self) -> bool {
        matches!(self, Resolved::Plugin { .. })
    }

    /// Build the execute request for this command
    pub fn request(&self, options: OptionList) -> Request {
        match self {
            Resolved::Builtin { id, .. } => Request::Execute {
                command_id: *id,
                options,
            },
            Resolved::Plugin { command } => Request::ExecutePlugin {
                command_id: PLUGIN_COMMAND_ID,
                name: command.name().to_string(),
                options,
            },
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Builtin { id, command } => f
                .debug_struct("Builtin")
                .field("id", id)
                .field("name", &command.name())
                .finish(),
            Resolved::Plugin { command } => f
                .debug_struct("Plugin")
                .field("name", &command.name())
                .finish(),
        }
    }
}

/// Turns names, ids and requests into handler calls
pub struct Dispatcher {
    table: CommandTable,
    catalog: Arc<CommandCatalog>,
    plugins: Arc<dyn PluginLoader>,
}

impl Dispatcher {
    pub fn new(
        table: CommandTable,
        catalog: Arc<CommandCatalog>,
        plugins: Arc<dyn PluginLoader>,
    ) -> Self {
        Self {
            table,
            catalog,
            plugins,
        }
    }

    /// Server-side dispatcher: offers every handler in the catalog
    pub fn server(catalog: Arc<CommandCatalog>, plugins: Arc<dyn PluginLoader>) -> Self {
        let table = CommandTable::offering(&catalog);
        Self::new(table, catalog, plugins)
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve a name, built-in first
    pub fn resolve(&self, name: &str) -> Result<Resolved, DispatchError> {
        match self.resolve_builtin(name) {
            Ok(resolved) => Ok(resolved),
            Err(_) => self.resolve_plugin(name),
        }
    }

    /// Resolve an enabled, compiled-in command
    pub fn resolve_builtin(&self, name: &str) -> Result<Resolved, DispatchError> {
        let id = self
            .table
            .lookup_enabled(name)
            .ok_or_else(|| DispatchError::CommandNotFound(name.to_string()))?;
        let command = self
            .catalog
            .get(name)
            .ok_or_else(|| DispatchError::CommandNotFound(name.to_string()))?;

        Ok(Resolved::Builtin { id, command })
    }

    /// Resolve a command from the plugin directory
    pub fn resolve_plugin(&self, name: &str) -> Result<Resolved, DispatchError> {
        let command = self.plugins.load(name)?;
        Ok(Resolved::Plugin { command })
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Answer one request
    pub fn dispatch(&self, request: &Request) -> Response {
        match request {
            Request::QuerySupport => Response::QuerySupport {
                ids: self.table.supported_ids(),
            },
            Request::Execute {
                command_id,
                options,
            } => Response::Execute(self.execute(*command_id, options)),
            Request::ExecutePlugin { name, options, .. } => {
                Response::Execute(self.execute_plugin(name, options))
            }
        }
    }

    /// Run a built-in command by id
    ///
    /// An unknown id is reported as COMMAND_NOT_FOUND; the plugin directory is
    /// not consulted.
    pub fn execute(&self, id: CommandId, options: &OptionList) -> ExecutionResult {
        let command = self
            .table
            .name_of(id)
            .filter(|_| self.table.is_enabled(id))
            .and_then(|name| self.catalog.get(name));

        match command {
            Some(command) => {
                tracing::debug!("Executing built-in {} (#{})", command.name(), id);
                command.execute(options)
            }
            None => {
                tracing::warn!("No handler for command #{}", id);
                ExecutionResult::error(DispatchError::CommandNotFound(id.to_string()).error_code())
            }
        }
    }

    /// Run a plugin command by name
    pub fn execute_plugin(&self, name: &str, options: &OptionList) -> ExecutionResult {
        match self.plugins.load(name) {
            Ok(command) => {
                tracing::debug!("Executing plugin {}", name);
                command.execute(options)
            }
            Err(e) => {
                tracing::warn!("Cannot load plugin {}: {}", name, e);
                ExecutionResult::error(e.error_code())
            }
        }
    }
}
