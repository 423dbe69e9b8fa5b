use std::sync::Arc;

use filedepot_types::{RPCCode, StatusCode};
use tokio::sync::Notify;
use tokio::task::JoinSet;

use crate::call::ServerCall;
use crate::error::NetError;
use crate::frame::{recv_frame, send_frame, Frame};
use crate::service::ServiceRegistry;
use crate::socket::{Listener, Socket};

/// RPC server that hosts registered services.
///
/// The server accepts connections from a `Listener` and serves calls on
/// each connection sequentially: a `Request` frame opens a call, the
/// handler exchanges stream frames through a `ServerCall`, and the call
/// ends with the handler's terminal frame or a server-sent `Error`.
/// Shutdown is coordinated through `stop()`.
pub struct Server {
    services: Arc<ServiceRegistry>,
    /// Signalled when `stop()` is called to cancel the accept loop.
    shutdown: Arc<Notify>,
    /// Whether the server has been started.
    running: bool,
}

impl Server {
    pub fn new() -> Self {
        Self {
            services: Arc::new(ServiceRegistry::new()),
            shutdown: Arc::new(Notify::new()),
            running: false,
        }
    }

    /// Create a server with the given pre-populated registry.
    pub fn with_registry(registry: ServiceRegistry) -> Self {
        Self {
            services: Arc::new(registry),
            shutdown: Arc::new(Notify::new()),
            running: false,
        }
    }

    /// Register a service handler with this server.
    pub fn register_service(&self, service: Box<dyn crate::service::ServiceHandler>) {
        self.services.register(service);
    }

    /// Return a reference to the service registry.
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Start accepting connections from the provided `Listener`.
    ///
    /// This spawns a background task that runs until `stop()` is called.
    /// Each accepted connection is handled in its own spawned task.
    pub fn start<L: Listener + 'static>(&mut self, listener: L) {
        if self.running {
            tracing::warn!("server already running, ignoring duplicate start");
            return;
        }
        self.running = true;

        let services = Arc::clone(&self.services);
        let shutdown = Arc::clone(&self.shutdown);
        let addr = listener.local_addr();

        tracing::info!(%addr, "server starting");

        tokio::spawn(async move {
            Self::accept_loop(listener, services, shutdown).await;
            tracing::info!(%addr, "server accept loop exited");
        });
    }

    /// Stop the server, signaling the accept loop and all active connections.
    pub fn stop(&mut self) {
        if self.running {
            tracing::info!("server stopping");
            self.shutdown.notify_waiters();
            self.running = false;
        }
    }

    /// Return whether the server is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    // -----------------------------------------------------------------------
    // Internal implementation
    // -----------------------------------------------------------------------

    async fn accept_loop<L: Listener>(
        listener: L,
        services: Arc<ServiceRegistry>,
        shutdown: Arc<Notify>,
    ) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.notified() => {
                    tracing::info!("server shutdown signal received");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok(socket) => {
                            let services = Arc::clone(&services);
                            let shutdown = Arc::clone(&shutdown);
                            tasks.spawn(async move {
                                if let Err(e) = Self::handle_connection(socket, services, shutdown).await {
                                    tracing::debug!("connection handler finished: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {}", e);
                            // Brief pause to avoid tight error loops.
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }
            }
        }

        // Wait for all active connection tasks to finish.
        tasks.shutdown().await;
    }

    async fn handle_connection<S: Socket>(
        socket: S,
        services: Arc<ServiceRegistry>,
        shutdown: Arc<Notify>,
    ) -> Result<(), NetError> {
        let peer = socket.peer_addr();
        tracing::debug!(%peer, "new connection");

        loop {
            // Check for shutdown between calls.
            let frame = tokio::select! {
                biased;

                _ = shutdown.notified() => {
                    tracing::debug!(%peer, "connection shutdown");
                    return Err(NetError::ShuttingDown);
                }

                result = recv_frame(&socket) => {
                    result?
                }
            };

            let (service_id, method_id, flags, body) = match frame {
                Frame::Request {
                    service_id,
                    method_id,
                    flags,
                    body,
                } => (service_id, method_id, flags, body),
                other => {
                    // A stray non-Request frame between calls leaves the
                    // connection out of sync; drop it.
                    tracing::warn!(%peer, kind = other.kind_name(), "stray frame between calls");
                    return Err(NetError::UnexpectedFrame {
                        expected: "Request",
                        got: other.kind_name(),
                    });
                }
            };

            tracing::debug!(
                %peer,
                service_id,
                method_id,
                flags,
                body_len = body.len(),
                "dispatching call"
            );

            let mut call = ServerCall::new(&socket, flags);

            let result = match services.get(service_id) {
                Some(handler) => handler.handle(method_id, body, &mut call).await,
                None => {
                    tracing::warn!(%peer, service_id, "service not found");
                    Err(filedepot_types::Status::new(RPCCode::INVALID_SERVICE_ID))
                }
            };

            match result {
                Ok(()) => {
                    if !call.has_replied() {
                        tracing::error!(%peer, service_id, method_id, "handler returned without a terminal frame");
                        let error = Frame::Error {
                            code: StatusCode::UNKNOWN,
                            message: "handler produced no reply".to_string(),
                        };
                        send_frame(&socket, &error).await?;
                    }
                }
                Err(status) => {
                    tracing::debug!(
                        %peer,
                        service_id,
                        method_id,
                        status = %status,
                        "handler returned error"
                    );

                    // Drain the unconsumed client stream so the next call on
                    // this connection starts at a frame boundary.
                    if call.is_client_streaming() && !call.is_half_closed() {
                        loop {
                            match call.recv_data().await {
                                Ok(Some(_)) => continue,
                                Ok(None) => break,
                                Err(_) => return Err(NetError::ConnectionClosed),
                            }
                        }
                    }

                    let error = Frame::Error {
                        code: status.code(),
                        message: status.message().unwrap_or_default().to_string(),
                    };
                    send_frame(&socket, &error).await?;
                }
            }
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}
