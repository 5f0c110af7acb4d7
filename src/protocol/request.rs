//! Request definitions
//!
//! Requests sent from the shell to the server.

use super::options::OptionList;
use super::CommandId;

/// Request opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RequestOpcode {
    QuerySupport = 1,
    Execute = 2,
    ExecutePlugin = 3,
}

impl TryFrom<u32> for RequestOpcode {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(RequestOpcode::QuerySupport),
            2 => Ok(RequestOpcode::Execute),
            3 => Ok(RequestOpcode::ExecutePlugin),
            other => Err(other),
        }
    }
}

/// A decoded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Ask which command ids the server offers
    QuerySupport,

    /// Run a built-in command by id
    Execute {
        command_id: CommandId,
        options: OptionList,
    },

    /// Run a plugin command by name
    ExecutePlugin {
        command_id: CommandId,
        name: String,
        options: OptionList,
    },
}

impl Request {
    /// Get the request opcode
    pub fn opcode(&self) -> RequestOpcode {
        match self {
            Request::QuerySupport => RequestOpcode::QuerySupport,
            Request::Execute { .. } => RequestOpcode::Execute,
            Request::ExecutePlugin { .. } => RequestOpcode::ExecutePlugin,
        }
    }

    /// Whether the server closes the connection after answering
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Request::QuerySupport)
    }
}
