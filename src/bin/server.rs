//! SRPCF Server Binary
//!
//! Serves the built-in commands and the plugin directory over TCP.

use std::sync::Arc;
use std::thread;

use clap::{CommandFactory, Parser};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use srpcf::command::PluginDirectory;
use srpcf::network::{Server, ShutdownHandle};
use srpcf::{CommandCatalog, Config, Dispatcher};
use tracing_subscriber::{fmt, EnvFilter};

/// SRPCF Server
#[derive(Parser, Debug)]
#[command(name = "srpcf-server")]
#[command(about = "Simple Remote Procedure Command Framework server")]
#[command(version, disable_help_flag = true)]
struct Args {
    /// Run in the foreground, logging to the terminal
    #[arg(short = 'c')]
    foreground: bool,

    /// Show usage and exit
    #[arg(short = 'h', long = "help")]
    help: bool,

    /// Listen port
    #[arg(long, default_value_t = srpcf::config::DEFAULT_PORT)]
    port: u16,

    /// Bind address (dotted-decimal IPv4); all interfaces when omitted
    #[arg(long)]
    bind: Option<String>,

    /// Plugin directory
    #[arg(long, default_value = srpcf::config::DEFAULT_PLUGINS_DIR)]
    plugins_dir: String,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayVersion => {
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if args.help {
        let _ = Args::command().print_help();
        std::process::exit(1);
    }

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,srpcf=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(args.foreground)
        .init();

    tracing::info!("SRPCF Server v{}", srpcf::VERSION);

    let mut builder = Config::builder()
        .port(args.port)
        .plugins_dir(&args.plugins_dir)
        .foreground(args.foreground);
    if let Some(bind) = &args.bind {
        builder = builder.bind_addr(bind);
    }
    let config = builder.build();

    tracing::info!("Plugin directory: {}", config.plugins_dir.display());

    let catalog = Arc::new(CommandCatalog::builtin());
    let plugins = Arc::new(PluginDirectory::from_config(&config));
    let dispatcher = Arc::new(Dispatcher::server(catalog, plugins));

    let mut server = match Server::bind(config, dispatcher) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = watch_signals(server.shutdown_handle()) {
        tracing::error!("Failed to install signal handlers: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Trigger shutdown on the first termination signal
fn watch_signals(shutdown: ShutdownHandle) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])?;
    thread::Builder::new()
        .name("srpcf-signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                tracing::info!("Received signal {}, initiating shutdown...", signal);
                shutdown.shutdown();
            }
        })?;
    Ok(())
}
