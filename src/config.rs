//! Configuration for SRPCF
//!
//! Centralized configuration with defaults matching the deployed protocol.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SrpcfError};

/// Well-known TCP port of the SRPCF server
pub const DEFAULT_PORT: u16 = 8989;

/// Directory searched for plugin modules, relative to the working directory
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// File name suffix of plugin modules
pub const PLUGIN_SUFFIX: &str = ".srpcf";

// Environment overrides read by the shell
pub const ENV_SERVER: &str = "SRPCF_SERVER";
pub const ENV_PORT: &str = "SRPCF_PORT";
pub const ENV_PLUGINS: &str = "SRPCF_PLUGINS";
pub const ENV_TIMEOUT_MS: &str = "SRPCF_TIMEOUT_MS";

/// Main configuration shared by the server and the shell
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server bind address (dotted-decimal IPv4). `None` binds all interfaces.
    pub bind_addr: Option<String>,

    /// Address the shell connects to
    pub server_addr: String,

    /// TCP port for both sides
    pub port: u16,

    // -------------------------------------------------------------------------
    // Plugin Configuration
    // -------------------------------------------------------------------------
    /// Plugin discovery directory
    ///   {plugins_dir}/
    ///     └── <command>.srpcf
    pub plugins_dir: PathBuf,

    /// Plugin file suffix
    pub plugin_suffix: String,

    // -------------------------------------------------------------------------
    // Server Behaviour
    // -------------------------------------------------------------------------
    /// Run attached to the terminal
    pub foreground: bool,

    /// Sleep between accepted connections
    pub accept_pacing: Duration,

    /// Sleep at the end of every worker iteration
    pub worker_pacing: Duration,

    /// How often a blocked worker checks for cancellation
    pub cancel_poll_interval: Duration,

    // -------------------------------------------------------------------------
    // Client Behaviour
    // -------------------------------------------------------------------------
    /// Fixed delay between sending a request and reading the response
    pub response_delay: Duration,

    /// Optional receive timeout. `None` blocks until the server answers.
    pub response_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: None,
            server_addr: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            plugins_dir: PathBuf::from(DEFAULT_PLUGINS_DIR),
            plugin_suffix: PLUGIN_SUFFIX.to_string(),
            foreground: false,
            accept_pacing: Duration::from_micros(100),
            worker_pacing: Duration::from_micros(100),
            cancel_poll_interval: Duration::from_millis(50),
            response_delay: Duration::from_micros(500),
            response_timeout: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Apply `SRPCF_*` overrides from the process environment
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by the `SRPCF_*` variable names
    ///
    /// Empty values are ignored. A port or timeout that does not parse is a
    /// configuration error.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(addr) = get(ENV_SERVER) {
            self.server_addr = addr;
        }
        if let Some(port) = get(ENV_PORT) {
            self.port = port
                .parse()
                .map_err(|_| SrpcfError::Config(format!("{}={} is not a port", ENV_PORT, port)))?;
        }
        if let Some(dir) = get(ENV_PLUGINS) {
            self.plugins_dir = PathBuf::from(dir);
        }
        if let Some(ms) = get(ENV_TIMEOUT_MS) {
            let ms: u64 = ms.parse().map_err(|_| {
                SrpcfError::Config(format!("{}={} is not a millisecond count", ENV_TIMEOUT_MS, ms))
            })?;
            self.response_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        Ok(self)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server bind address
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_addr = Some(addr.into());
        self
    }

    /// Set the address the shell connects to
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the TCP port (0 lets the OS choose when binding)
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the plugin directory
    pub fn plugins_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.plugins_dir = path.into();
        self
    }

    /// Set the plugin file suffix
    pub fn plugin_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.plugin_suffix = suffix.into();
        self
    }

    /// Run the server in the foreground
    pub fn foreground(mut self, foreground: bool) -> Self {
        self.config.foreground = foreground;
        self
    }

    /// Set the accept loop pacing interval
    pub fn accept_pacing(mut self, pacing: Duration) -> Self {
        self.config.accept_pacing = pacing;
        self
    }

    /// Set the worker loop pacing interval
    pub fn worker_pacing(mut self, pacing: Duration) -> Self {
        self.config.worker_pacing = pacing;
        self
    }

    /// Set the worker cancellation poll interval
    pub fn cancel_poll_interval(mut self, interval: Duration) -> Self {
        self.config.cancel_poll_interval = interval;
        self
    }

    /// Set the delay before the shell reads a response
    pub fn response_delay(mut self, delay: Duration) -> Self {
        self.config.response_delay = delay;
        self
    }

    /// Bound how long the shell waits for a response
    pub fn response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
