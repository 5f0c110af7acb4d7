//! Network Module
//!
//! TCP transport, the server loop and its connection workers.
//!
//! ## Architecture
//! - Single acceptor loop on a non-blocking listener
//! - One thread per connection, no pool
//! - Requests routed through the `Dispatcher`

pub mod channel;
mod connection;
mod server;
mod workers;

pub use channel::{connect, listen, Channel, Listener};
pub use connection::Worker;
pub use server::{Server, ShutdownHandle};
pub use workers::{CancelToken, WorkerId, WorkerRegistry};
