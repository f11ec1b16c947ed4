//! TCP server
//!
//! Accept loop plus one worker thread per connection.
//!
//! ## Architecture
//! - The accept loop blocks on the admission semaphore before spawning a
//!   worker, so at most `max_connections` workers exist
//! - Each worker reads frames, hands them to the request handler, and
//!   writes the framed response until the first read error
//! - A shared shutdown flag stops the accept loop (the listener is
//!   non-blocking and polled) and the workers between frames

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::NetworkConfig;
use crate::error::{OrionError, Result};

use super::frame::{read_frame, write_frame};
use super::semaphore::Semaphore;

/// Turns a request payload into a response payload
pub type RequestHandler = Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Cooperative shutdown signal shared with the accept loop and workers
#[derive(Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Length-framed TCP server
pub struct TcpServer {
    listener: TcpListener,
    handler: RequestHandler,
    semaphore: Arc<Semaphore>,
    max_message_size: u64,
    idle_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl TcpServer {
    /// Bind the listener and prepare the admission pool
    pub fn bind(conf: &NetworkConfig, handler: RequestHandler) -> Result<Self> {
        let listener = TcpListener::bind(&conf.address).map_err(|e| {
            OrionError::Network(format!("failed to bind to {}: {e}", conf.address))
        })?;
        // Non-blocking so the accept loop can poll the shutdown flag
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            handler,
            semaphore: Arc::new(Semaphore::new(conf.max_connections)),
            max_message_size: conf.max_message_size_bytes()?,
            idle_timeout: conf.idle_timeout()?,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound address; useful when the config asked for port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Run the accept loop until the shutdown flag is raised (blocking)
    pub fn run(&self) -> Result<()> {
        tracing::info!("listening on {}", self.local_addr()?);

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let permit = self.semaphore.acquire();
                    tracing::debug!("accepted connection from {addr}");

                    let handler = Arc::clone(&self.handler);
                    let shutdown = Arc::clone(&self.shutdown);
                    let idle_timeout = self.idle_timeout;
                    let max_message_size = self.max_message_size;

                    let spawned = thread::Builder::new()
                        .name("orionkv-conn".to_string())
                        .spawn(move || {
                            let outcome = catch_unwind(AssertUnwindSafe(|| {
                                handle_connection(
                                    stream,
                                    &handler,
                                    &shutdown,
                                    idle_timeout,
                                    max_message_size,
                                );
                            }));
                            if let Err(panic) = outcome {
                                tracing::error!("connection worker panicked: {panic:?}");
                            }
                            drop(permit);
                        });
                    if let Err(e) = spawned {
                        tracing::error!("failed to spawn connection worker: {e}");
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        tracing::error!("failed to accept connection: {e}");
                    }
                }
            }
        }

        tracing::info!("tcp server stopped");
        Ok(())
    }
}

/// Request/response loop for one connection.
///
/// Any read error, the idle deadline included, ends the connection; a
/// handler error surfaces in the response payload, never here.
fn handle_connection(
    mut stream: TcpStream,
    handler: &RequestHandler,
    shutdown: &AtomicBool,
    idle_timeout: Duration,
    max_message_size: u64,
) {
    if !idle_timeout.is_zero() {
        if let Err(e) = stream.set_read_timeout(Some(idle_timeout)) {
            tracing::error!("failed to set read deadline: {e}");
            return;
        }
    }

    while !shutdown.load(Ordering::Relaxed) {
        let request = match read_frame(&mut stream, max_message_size) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("closing connection: {e}");
                return;
            }
        };

        let response = handler(&request);

        if let Err(e) = write_frame(&mut stream, &response) {
            tracing::error!("failed to write response: {e}");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    #[test]
    fn bind_on_ephemeral_port_reports_address() {
        let conf = NetworkConfig {
            address: "127.0.0.1:0".to_string(),
            ..NetworkConfig::default()
        };
        let server = TcpServer::bind(&conf, Arc::new(|_: &[u8]| Vec::new())).unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert!(!server.shutdown_handle().is_shutdown());
    }
}
