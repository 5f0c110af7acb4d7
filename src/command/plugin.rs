//! Plugin loading
//!
//! Plugins are executable modules named `<command><suffix>` inside the plugin
//! directory. A module exposes the handler contract through three entry
//! points, selected by its first argument:
//!
//! ```text
//! <module> help                 → help text on stdout, exit 0
//! <module> parse   <options…>   → exit 0 accepts the arguments
//! <module> execute <options…>   → result on stdout, exit status = error code
//! ```
//!
//! Loading runs the `help` entry point; a module that cannot provide it is
//! treated as not implementing the command.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command as Process, Output, Stdio};
use std::sync::Arc;

use super::{Command, ParseContext};
use crate::config::Config;
use crate::error::DispatchError;
use crate::protocol::{ErrorCode, ExecutionResult, OptionList};

/// Source of plugin handlers
pub trait PluginLoader: Send + Sync {
    /// Load the handler for `name`
    ///
    /// `NoDevice` when no usable module exists; `CommandNotFound` when the
    /// module exists but does not implement the contract.
    fn load(&self, name: &str) -> Result<Arc<dyn Command>, DispatchError>;
}

/// Loader for a plugin directory
#[derive(Debug, Clone)]
pub struct PluginDirectory {
    dir: PathBuf,
    suffix: String,
}

impl PluginDirectory {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.plugins_dir, &config.plugin_suffix)
    }

    /// Module path for a command name
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, self.suffix))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// A command name must stay inside the plugin directory
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\', '\0'])
        && name != "."
        && name != ".."
}

impl PluginLoader for PluginDirectory {
    fn load(&self, name: &str) -> Result<Arc<dyn Command>, DispatchError> {
        if !is_valid_name(name) {
            return Err(DispatchError::CommandNotFound(name.to_string()));
        }

        let path = self.path_for(name);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(DispatchError::NoDevice(path.display().to_string())),
        }

        let plugin = ProcessPlugin::load(name, path)?;
        Ok(Arc::new(plugin))
    }
}

/// Handler backed by an executable plugin module
#[derive(Debug)]
pub struct ProcessPlugin {
    name: String,
    path: PathBuf,
    help: String,
}

impl ProcessPlugin {
    /// Probe the module's `help` entry point
    pub fn load(name: &str, path: PathBuf) -> Result<Self, DispatchError> {
        let output = Process::new(&path)
            .arg("help")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                tracing::debug!("Cannot start plugin {}: {}", path.display(), e);
                DispatchError::NoDevice(path.display().to_string())
            })?;

        if !output.status.success() {
            return Err(DispatchError::CommandNotFound(name.to_string()));
        }

        tracing::debug!("Loaded plugin {} from {}", name, path.display());
        Ok(Self {
            name: name.to_string(),
            path,
            help: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, entry: &str, options: &OptionList) -> std::io::Result<Output> {
        let output = Process::new(&self.path)
            .arg(entry)
            .args(options.iter())
            .stdin(Stdio::null())
            .output()?;

        if !output.stderr.is_empty() {
            tracing::debug!(
                "Plugin {} {} stderr: {}",
                self.name,
                entry,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        Ok(output)
    }
}

impl Command for ProcessPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }

    fn parse(&self, options: &OptionList, ctx: &mut ParseContext<'_>) -> bool {
        match self.run("parse", options) {
            Ok(output) => {
                let _ = ctx.out.write_all(&output.stdout);
                output.status.success()
            }
            Err(e) => {
                tracing::warn!("Plugin {} parser failed to start: {}", self.name, e);
                false
            }
        }
    }

    fn execute(&self, options: &OptionList) -> ExecutionResult {
        let output = match self.run("execute", options) {
            Ok(output) => output,
            // Arguments the OS cannot pass, such as ones holding NUL
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
                tracing::warn!("Plugin {} rejected arguments: {}", self.name, e);
                return ExecutionResult::error(ErrorCode::INVALID);
            }
            Err(e) => {
                tracing::warn!("Plugin {} executor failed to start: {}", self.name, e);
                return ExecutionResult::error(ErrorCode::NO_DEVICE);
            }
        };

        // Killed by a signal: no exit status to forward
        let error_code = output
            .status
            .code()
            .map(|code| ErrorCode(code as u32))
            .unwrap_or(ErrorCode::UNKNOWN);

        let data = if output.stdout.is_empty() {
            None
        } else {
            Some(output.stdout)
        };

        ExecutionResult { error_code, data }
    }
}
