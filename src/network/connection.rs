//! Connection Worker
//!
//! Serves one accepted connection on its own thread.
//!
//! ## State Machine
//! ```text
//!            ┌──────────── QUERY_SUPPORT ────────────┐
//!            ▼                                       │
//!       Receiving ──▶ Dispatching ──▶ Responding ────┤
//!            │                                       │
//!            └── error / cancel ──▶ Closed ◀── EXECUTE*
//! ```
//! Any number of negotiations, then at most one execute; the connection is
//! closed after its response. A frame that fails to decode closes the
//! connection without a reply.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::command::Dispatcher;
use crate::config::Config;
use crate::error::{Result, SrpcfError};
use crate::network::channel::Channel;
use crate::network::workers::{CancelToken, WorkerId, WorkerRegistry};
use crate::protocol::{read_request, write_response, Request, Response};

/// Where a worker is in its exchange
#[derive(Debug)]
enum State {
    Receiving,
    Dispatching(Request),
    Responding { response: Response, terminal: bool },
    Closed,
}

/// Handles a single shell connection
pub struct Worker {
    /// Connected stream
    channel: Channel,

    /// Shared command dispatcher
    dispatcher: Arc<Dispatcher>,

    /// Registry this worker removes itself from on exit
    registry: Arc<WorkerRegistry>,

    id: WorkerId,
    token: CancelToken,

    /// Sleep at the end of every iteration
    pacing: Duration,

    /// Read timeout used to poll the cancellation token
    poll_interval: Duration,
}

impl Worker {
    /// Create a worker and register it
    pub fn new(
        channel: Channel,
        dispatcher: Arc<Dispatcher>,
        registry: Arc<WorkerRegistry>,
        config: &Config,
    ) -> Self {
        let id = registry.add(channel.peer_addr());
        let token = registry.token();
        Self {
            channel,
            dispatcher,
            registry,
            id,
            token,
            pacing: config.worker_pacing,
            poll_interval: config.cancel_poll_interval,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn peer_addr(&self) -> &str {
        self.channel.peer_addr()
    }

    /// Close the connection and unregister without running
    ///
    /// Used when the worker thread could not be started.
    pub fn abandon(self) {
        self.channel.close();
        self.registry.remove(self.id);
    }

    /// Serve the connection until it closes
    pub fn run(mut self) {
        tracing::debug!("Connection established from {}", self.channel.peer_addr());

        if let Err(e) = self.serve() {
            tracing::warn!("Connection {} failed: {}", self.channel.peer_addr(), e);
        }

        self.channel.close();
        self.registry.remove(self.id);
        tracing::debug!("Connection {} closed", self.channel.peer_addr());
    }

    fn serve(&mut self) -> Result<()> {
        let poll = (!self.poll_interval.is_zero()).then_some(self.poll_interval);
        self.channel.set_receive_timeout(poll)?;

        let mut state = State::Receiving;
        loop {
            state = match state {
                State::Receiving => self.receive(),
                State::Dispatching(request) => {
                    let terminal = request.is_terminal();
                    let response = self.dispatcher.dispatch(&request);
                    State::Responding { response, terminal }
                }
                State::Responding { response, terminal } => self.respond(&response, terminal),
                State::Closed => return Ok(()),
            };

            if !self.pacing.is_zero() {
                thread::sleep(self.pacing);
            }
        }
    }

    /// Wait for the next request, polling for cancellation
    fn receive(&mut self) -> State {
        loop {
            if self.token.is_cancelled() {
                tracing::debug!("Worker {} cancelled", self.id);
                return State::Closed;
            }

            match read_request(&mut self.channel) {
                Ok(request) => {
                    tracing::trace!(
                        "Received request from {}: {:?}",
                        self.channel.peer_addr(),
                        request
                    );
                    return State::Dispatching(request);
                }
                Err(ref e) if e.is_timeout() => continue,
                Err(SrpcfError::Disconnected) => {
                    tracing::debug!("Client {} disconnected", self.channel.peer_addr());
                    return State::Closed;
                }
                Err(SrpcfError::Io(ref e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::ConnectionReset
                            | std::io::ErrorKind::ConnectionAborted
                    ) =>
                {
                    tracing::debug!("Connection reset by client {}", self.channel.peer_addr());
                    return State::Closed;
                }
                Err(e) => {
                    tracing::warn!(
                        "Dropping connection {}: {}",
                        self.channel.peer_addr(),
                        e
                    );
                    return State::Closed;
                }
            }
        }
    }

    fn respond(&mut self, response: &Response, terminal: bool) -> State {
        match write_response(&mut self.channel, response) {
            Ok(()) if terminal => State::Closed,
            Ok(()) => State::Receiving,
            Err(SrpcfError::FrameTooLarge { size, max }) => {
                tracing::warn!(
                    "Response to {} is {} bytes, limit is {}; closing without reply",
                    self.channel.peer_addr(),
                    size,
                    max
                );
                State::Closed
            }
            Err(e) => {
                tracing::debug!(
                    "Client {} gone before response could be sent: {}",
                    self.channel.peer_addr(),
                    e
                );
                State::Closed
            }
        }
    }
}
