//! Error types for SRPCF
//!
//! Provides a unified error type for transport, framing and configuration
//! failures. Dispatch failures have their own type because they travel back
//! to the client inside a normal response frame.

use thiserror::Error;

use crate::protocol::ErrorCode;

/// Result type alias using SrpcfError
pub type Result<T> = std::result::Result<T, SrpcfError>;

/// Unified error type for SRPCF operations
#[derive(Debug, Error)]
pub enum SrpcfError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Short write: sent {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("Peer closed the connection")]
    Disconnected,

    // -------------------------------------------------------------------------
    // Framing Errors
    // -------------------------------------------------------------------------
    #[error("Frame too short for opcode {opcode}: length {length}, minimum {minimum}")]
    FrameTooShort {
        opcode: u32,
        length: usize,
        minimum: usize,
    },

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Unknown opcode: {0}")]
    UnknownOpcode(u32),

    #[error("Truncated frame: {0}")]
    Truncated(String),

    #[error("Invalid option entry: {0}")]
    InvalidOption(String),

    #[error("Invalid command name: {0}")]
    InvalidName(String),

    #[error("Unexpected response: expected {expected}, got opcode {opcode}")]
    UnexpectedResponse { expected: &'static str, opcode: u32 },

    // -------------------------------------------------------------------------
    // Dispatch Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SrpcfError {
    /// Whether this error is a receive timeout rather than a real failure
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            SrpcfError::Io(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut
        )
    }
}

/// Failure to resolve a command to a handler
///
/// These are application-level failures: the server reports them with an
/// error code in a well-formed response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("no such device: {0}")]
    NoDevice(String),
}

impl DispatchError {
    /// The wire error code reported for this failure
    pub fn error_code(&self) -> ErrorCode {
        match self {
            DispatchError::CommandNotFound(_) => ErrorCode::COMMAND_NOT_FOUND,
            DispatchError::NoDevice(_) => ErrorCode::NO_DEVICE,
        }
    }
}
