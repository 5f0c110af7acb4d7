//! Shell flow
//!
//! The shell binary is installed once and linked under every command name;
//! the name it was invoked by selects the command.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use super::ClientSession;
use crate::command::{
    Command, CommandCatalog, CommandTable, Dispatcher, ParseContext, PluginDirectory,
    PluginLoader,
};
use crate::config::Config;
use crate::protocol::{ExecutionResult, OptionList};

/// Printed before the command list when the invoked name is unknown
pub const BANNER: &str = concat!(
    "\nSimple Remote Procedure Command Framework Shell, Version ",
    env!("CARGO_PKG_VERSION"),
    "\nCopyright (c) 2013 all rights reserved.\n\n"
);

/// Print an execution result the way the shell reports it
///
/// Failures also go through the command's error hook.
pub fn render_result(
    result: &ExecutionResult,
    command: &dyn Command,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    match &result.data {
        Some(data) if result.is_success() => {
            out.write_all(data)?;
            out.write_all(b"\n")
        }
        _ if result.is_success() => writeln!(out, "SUCCESSFUL"),
        _ => {
            command.handle_error(result.error_code);
            writeln!(out, "ERROR: {}", result.error_code)
        }
    }
}

/// Client-side command runner
pub struct Shell {
    config: Config,
    catalog: Arc<CommandCatalog>,
    plugins: Arc<dyn PluginLoader>,
}

impl Shell {
    /// Shell with the built-in catalog and the configured plugin directory
    pub fn new(config: Config) -> Self {
        let plugins = Arc::new(PluginDirectory::from_config(&config));
        Self {
            config,
            catalog: Arc::new(CommandCatalog::builtin()),
            plugins,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<CommandCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_plugins(mut self, plugins: Arc<dyn PluginLoader>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Run the command named by `program` with positional `args`
    ///
    /// Results, help text and the command list go to `out`; diagnostics go to
    /// `err`. Returns the process exit status.
    pub fn run<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> i32 {
        let mut session = match ClientSession::connect(&self.config) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!("Connect failed: {}", e);
                let _ = writeln!(err, "Internal Error: cannot connect to SRPCF server");
                return 1;
            }
        };

        let mut table = CommandTable::known();
        if let Err(e) = session.negotiate(&mut table) {
            tracing::debug!("Negotiation failed: {}", e);
            let _ = writeln!(err, "Internal Error: cannot query for supported SRPCFs");
            session.close();
            return 1;
        }

        let name = command_name(program);
        let dispatcher = Dispatcher::new(table, Arc::clone(&self.catalog), Arc::clone(&self.plugins));

        let resolved = match dispatcher.resolve(name) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::debug!("Cannot resolve {}: {}", name, e);
                session.close();
                let _ = show_commands(dispatcher.table(), out);
                return 0;
            }
        };

        let options = OptionList::from_args(args.iter().map(AsRef::as_ref));
        let command = Arc::clone(resolved.command());

        let accepted = {
            let mut ctx = ParseContext {
                table: dispatcher.table(),
                catalog: dispatcher.catalog(),
                out: &mut *out,
            };
            command.parse(&options, &mut ctx)
        };

        if !accepted {
            session.close();
            let _ = writeln!(out, "{}", command.help());
            return 0;
        }

        match session.execute(&resolved, options) {
            Ok(result) => {
                let _ = render_result(&result, command.as_ref(), out);
                0
            }
            Err(e) => {
                tracing::debug!("Execute failed: {}", e);
                let _ = writeln!(err, "Internal Error: cannot execute SRPCF");
                1
            }
        }
    }
}

/// Base filename of the invoked program
fn command_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program)
}

fn show_commands(table: &CommandTable, out: &mut dyn Write) -> std::io::Result<()> {
    out.write_all(BANNER.as_bytes())?;
    writeln!(out, "Supported SRPCF Commands:")?;
    for name in table.enabled_names() {
        writeln!(out, "\t{}", name)?;
    }
    writeln!(out)
}
