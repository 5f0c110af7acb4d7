//! Response definitions
//!
//! Represents responses to the shell, and the result a command handler
//! produces on the server.

use std::borrow::Cow;
use std::fmt;

use super::CommandId;

/// Response opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ResponseOpcode {
    QuerySupport = 1,
    Execute = 2,
}

impl TryFrom<u32> for ResponseOpcode {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(ResponseOpcode::QuerySupport),
            2 => Ok(ResponseOpcode::Execute),
            other => Err(other),
        }
    }
}

/// Command error code as carried on the wire
///
/// Handlers may report any value; the named constants are the ones the
/// framework itself produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const SUCCESSFUL: ErrorCode = ErrorCode(0);
    pub const PERMISSION: ErrorCode = ErrorCode(1);
    pub const AGAIN: ErrorCode = ErrorCode(2);
    pub const NO_MEMORY: ErrorCode = ErrorCode(3);
    pub const ACCESS: ErrorCode = ErrorCode(4);
    pub const BUSY: ErrorCode = ErrorCode(5);
    pub const NO_DEVICE: ErrorCode = ErrorCode(6);
    pub const INVALID: ErrorCode = ErrorCode(7);
    pub const UNKNOWN: ErrorCode = ErrorCode(8);
    pub const COMMAND_NOT_FOUND: ErrorCode = ErrorCode(9);

    pub fn is_success(self) -> bool {
        self == ErrorCode::SUCCESSFUL
    }

    /// Raw numeric value
    pub fn code(self) -> u32 {
        self.0
    }

    /// Short name for the framework codes
    pub fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "SUCCESSFUL",
            1 => "PERMISSION",
            2 => "AGAIN",
            3 => "NO_MEMORY",
            4 => "ACCESS",
            5 => "BUSY",
            6 => "NO_DEVICE",
            7 => "INVALID",
            8 => "UNKNOWN",
            9 => "COMMAND_NOT_FOUND",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ErrorCode {
    fn from(value: u32) -> Self {
        ErrorCode(value)
    }
}

/// Outcome of running a command handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Handler-reported status
    pub error_code: ErrorCode,

    /// Optional result text (without the wire terminator)
    pub data: Option<Vec<u8>>,
}

impl ExecutionResult {
    /// Successful execution with no data
    pub fn success() -> Self {
        Self {
            error_code: ErrorCode::SUCCESSFUL,
            data: None,
        }
    }

    /// Successful execution returning data
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            error_code: ErrorCode::SUCCESSFUL,
            data: Some(data.into()),
        }
    }

    /// Failed execution
    pub fn error(error_code: ErrorCode) -> Self {
        Self {
            error_code,
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code.is_success()
    }

    /// Result data as text
    pub fn data_str(&self) -> Option<Cow<'_, str>> {
        self.data.as_deref().map(String::from_utf8_lossy)
    }
}

/// A response to send to the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Ids of the commands the server offers, in table order
    QuerySupport { ids: Vec<CommandId> },

    /// Result of an Execute or ExecutePlugin request
    Execute(ExecutionResult),
}

impl Response {
    /// Get the response opcode
    pub fn opcode(&self) -> ResponseOpcode {
        match self {
            Response::QuerySupport { .. } => ResponseOpcode::QuerySupport,
            Response::Execute(_) => ResponseOpcode::Execute,
        }
    }
}
