//! SRPCF Shell Binary
//!
//! Install once, then link it under each command name:
//!
//! ```text
//! ln -s srpcf-shell xrCpuInfo
//! ./xrCpuInfo
//! ```
//!
//! The name it runs as selects the command; the remaining arguments are
//! comma-delimited option cells.

use std::io::{self, Write};

use srpcf::{Config, Shell};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut argv = std::env::args();
    let Some(program) = argv.next() else {
        eprintln!("Internal Error: cannot read input arguments");
        std::process::exit(1);
    };
    let args: Vec<String> = argv.collect();

    let config = match Config::default().with_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Internal Error: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut err = io::stderr();

    let status = Shell::new(config).run(&program, &args, &mut out, &mut err);
    let _ = out.flush();
    std::process::exit(status);
}
