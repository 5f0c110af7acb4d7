//! # SRPCF
//!
//! Simple Remote Procedure Command Framework: named commands typed on a
//! client run on a server, over a compact binary protocol on TCP.
//!
//! - One shell binary, linked under every command name
//! - Built-in commands compiled in, plugin commands loaded by name
//! - Thread-per-connection server with cooperative cancellation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Shell (argv[0] = command)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ QUERY_SUPPORT*, EXECUTE | EXECUTE_PLUGIN
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                (one worker per connection)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Dispatcher                              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Built-in   │          │   Plugin    │
//!   │  (catalog)  │          │ (directory) │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod command;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DispatchError, Result, SrpcfError};
pub use config::Config;
pub use command::{Command, CommandCatalog, CommandTable, Dispatcher};
pub use network::Server;
pub use client::{ClientSession, Shell};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SRPCF
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
