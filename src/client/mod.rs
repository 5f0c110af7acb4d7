//! Client Module
//!
//! One shell invocation talks to the server over a single connection:
//!
//! ```text
//!   connect ──▶ negotiate (QUERY_SUPPORT)* ──▶ execute (EXECUTE | EXECUTE_PLUGIN)
//! ```
//!
//! The server closes the connection after the execute response, so
//! `ClientSession::execute` consumes the session.

use std::thread;
use std::time::Duration;

use crate::command::{CommandTable, Resolved};
use crate::config::Config;
use crate::error::{Result, SrpcfError};
use crate::network::{self, Channel};
use crate::protocol::{read_response, write_request, ExecutionResult, OptionList, Request, Response};

mod shell;

pub use shell::{render_result, Shell, BANNER};

/// Connection to a server for one command
#[derive(Debug)]
pub struct ClientSession {
    channel: Channel,

    /// Pause between sending a request and reading its response
    response_delay: Duration,
}

impl ClientSession {
    /// Connect to the configured server
    pub fn connect(config: &Config) -> Result<Self> {
        let channel = network::connect(Some(&config.server_addr), config.port)?;
        channel.set_receive_timeout(config.response_timeout)?;

        Ok(Self {
            channel,
            response_delay: config.response_delay,
        })
    }

    /// Ask the server which commands it supports and enable them in `table`
    ///
    /// Returns the number of ids installed. Safe to repeat.
    pub fn negotiate(&mut self, table: &mut CommandTable) -> Result<usize> {
        write_request(&mut self.channel, &Request::QuerySupport)?;
        self.pause();

        match read_response(&mut self.channel)? {
            Response::QuerySupport { ids } => {
                tracing::debug!("Server supports {} commands: {:?}", ids.len(), ids);
                Ok(table.install(&ids))
            }
            other => Err(SrpcfError::UnexpectedResponse {
                expected: "QUERY_SUPPORT",
                opcode: other.opcode() as u32,
            }),
        }
    }

    /// Run a resolved command on the server
    pub fn execute(mut self, resolved: &Resolved, options: OptionList) -> Result<ExecutionResult> {
        let request = resolved.request(options);
        tracing::debug!("Sending {:?}", request);
        write_request(&mut self.channel, &request)?;
        self.pause();

        let response = read_response(&mut self.channel);
        self.channel.close();

        match response? {
            Response::Execute(result) => Ok(result),
            other => Err(SrpcfError::UnexpectedResponse {
                expected: "EXECUTE",
                opcode: other.opcode() as u32,
            }),
        }
    }

    fn pause(&self) {
        if !self.response_delay.is_zero() {
            thread::sleep(self.response_delay);
        }
    }

    /// Close without executing anything
    pub fn close(self) {
        self.channel.close();
    }
}
