//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::auth::AuthValidator;
use crate::config::Config;
use crate::error::Result;
use crate::handler::RequestHandler;
use crate::store::VersionedStore;

use super::Connection;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cloneable flag that stops a running server
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for VersoKV
pub struct Server<S, A> {
    config: Config,
    handler: Arc<RequestHandler<S, A>>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl<S, A> Server<S, A>
where
    S: VersionedStore + 'static,
    A: AuthValidator + 'static,
{
    /// Bind the listen address from the config
    pub fn bind(config: Config, handler: Arc<RequestHandler<S, A>>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            handler,
            listener,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Start serving (blocking until shutdown)
    ///
    /// Connections beyond `max_connections` waiting in the queue are refused
    /// by closing them immediately.
    pub fn run(self) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!(
            "Listening on {} with {} workers",
            addr,
            self.config.max_connections
        );

        let (sender, receiver) = channel::bounded::<TcpStream>(self.config.max_connections);
        let workers: Vec<JoinHandle<()>> = (0..self.config.max_connections)
            .map(|n| self.spawn_worker(n, receiver.clone()))
            .collect::<std::io::Result<_>>()?;
        drop(receiver);

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, peer)) => match sender.try_send(stream) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("Refusing {}: all workers busy", peer);
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                },
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("Shutting down, waiting for {} workers", workers.len());
        drop(sender);
        for worker in workers {
            let _ = worker.join();
        }

        Ok(())
    }

    fn spawn_worker(
        &self,
        n: usize,
        receiver: Receiver<TcpStream>,
    ) -> std::io::Result<JoinHandle<()>> {
        let handler = Arc::clone(&self.handler);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("versokv-worker-{}", n))
            .spawn(move || {
                for stream in receiver.iter() {
                    let result = Connection::new(stream, Arc::clone(&handler)).and_then(|mut conn| {
                        conn.set_timeouts(read_ms, write_ms)?;
                        conn.handle()
                    });

                    if let Err(e) = result {
                        tracing::debug!("Connection ended with error: {}", e);
                    }
                }
            })
    }
}
