//! TCP Server
//!
//! Accepts connections and hands each to its own worker thread.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::command::Dispatcher;
use crate::config::Config;
use crate::error::{Result, SrpcfError};
use crate::network::channel::{self, Listener};
use crate::network::connection::Worker;
use crate::network::workers::WorkerRegistry;

const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Sleep when no connection is pending; bounds shutdown latency
const IDLE_BACKOFF: Duration = Duration::from_millis(20);

/// Flag that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// The underlying flag, for signal registration
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Thread-per-connection command server
pub struct Server {
    config: Config,
    listener: Option<Listener>,
    dispatcher: Arc<Dispatcher>,
    workers: Arc<WorkerRegistry>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Listen on the configured address and port
    pub fn bind(config: Config, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let listener = channel::listen(config.bind_addr.as_deref(), config.port)?;
        tracing::info!(
            "Serving {} commands on {}",
            dispatcher.table().supported_ids().len(),
            listener.local_addr()
        );

        Ok(Self {
            config,
            listener: Some(listener),
            dispatcher,
            workers: Arc::new(WorkerRegistry::new()),
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(Listener::local_addr)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Live worker registry
    pub fn workers(&self) -> Arc<WorkerRegistry> {
        Arc::clone(&self.workers)
    }

    /// Accept connections until shutdown is requested (blocking)
    ///
    /// On shutdown every worker is cancelled and the listener is closed.
    /// Workers are not joined.
    pub fn run(&mut self) -> Result<()> {
        let Some(listener) = self.listener.take() else {
            return Ok(());
        };

        let mut last_error = None::<std::io::ErrorKind>;
        while !self.shutdown.is_shutdown() {
            match listener.accept() {
                Ok(Some(channel)) => {
                    last_error = None;
                    let worker = Worker::new(
                        channel,
                        Arc::clone(&self.dispatcher),
                        Arc::clone(&self.workers),
                        &self.config,
                    );
                    self.spawn_worker(worker);
                }
                Ok(None) => {
                    thread::sleep(IDLE_BACKOFF);
                    continue;
                }
                Err(e) => {
                    let kind = match &e {
                        SrpcfError::Io(io) => Some(io.kind()),
                        _ => None,
                    };
                    if kind.is_none() || last_error != kind {
                        tracing::warn!("Accept failed: {}", e);
                    }
                    last_error = kind;
                    thread::sleep(ERROR_BACKOFF);
                    continue;
                }
            }

            if !self.config.accept_pacing.is_zero() {
                thread::sleep(self.config.accept_pacing);
            }
        }

        tracing::info!("Shutting down, cancelling {} workers", self.workers.len());
        self.workers.cancel_all();
        drop(listener);
        Ok(())
    }

    fn spawn_worker(&self, worker: Worker) {
        let name = format!("srpcf-worker-{}", worker.id());
        let peer = worker.peer_addr().to_string();

        // The closure owns the worker; reclaim it if the thread never starts
        let slot = Arc::new(parking_lot::Mutex::new(Some(worker)));
        let thread_slot = Arc::clone(&slot);

        let spawned = thread::Builder::new().name(name).spawn(move || {
            let worker = thread_slot.lock().take();
            if let Some(worker) = worker {
                worker.run();
            }
        });

        if let Err(e) = spawned {
            tracing::error!("Cannot start worker for {}: {}", peer, e);
            let worker = slot.lock().take();
            if let Some(worker) = worker {
                worker.abandon();
            }
        }
    }
}
