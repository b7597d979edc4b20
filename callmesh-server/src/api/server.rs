//! HTTP server setup and connection handling.

use super::error::ConnectionSevered;
use super::router;
use super::state::AppState;
use crate::executor::{ExecError, Executor};
use callmesh_core::{Config, ServerId};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Errors raised while serving.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The executor could not be constructed.
    #[error(transparent)]
    Executor(#[from] ExecError),

    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Accepting a connection failed.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
}

/// Handle that gracefully stops a running [`ApiServer`].
///
/// Obtained via [`ApiServer::shutdown_handle`] before the server is moved
/// onto its own task.
pub struct ShutdownHandle(oneshot::Sender<()>);

impl ShutdownHandle {
    /// Stop the server's accept loop.
    pub fn shutdown(self) {
        let _ = self.0.send(());
    }
}

/// The callmesh HTTP server.
pub struct ApiServer {
    config: Config,
    state: Arc<AppState>,
    listener: Option<TcpListener>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl ApiServer {
    /// Create a server from configuration.
    ///
    /// Generates the process-wide server instance ID and builds the executor
    /// around it.
    ///
    /// # Errors
    ///
    /// Fails if the outbound HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, ServeError> {
        let executor = Executor::new(ServerId::new(), &config)?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        Ok(Self {
            config,
            state: Arc::new(AppState::new(executor)),
            listener: None,
            shutdown_tx: Some(shutdown_tx),
            shutdown_rx: Some(shutdown_rx),
        })
    }

    /// Take the handle used to stop the server from another task.
    ///
    /// Returns `None` if the handle was already taken or [`Self::shutdown`]
    /// was called.
    pub fn shutdown_handle(&mut self) -> Option<ShutdownHandle> {
        self.shutdown_tx.take().map(ShutdownHandle)
    }

    /// Get a reference to the application state.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Bind the listen address without starting to serve.
    ///
    /// Useful to learn the actual port when configured with port 0.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be bound.
    pub async fn bind(&mut self) -> Result<SocketAddr, ServeError> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local = listener
            .local_addr()
            .map_err(|source| ServeError::Bind { addr, source })?;
        self.listener = Some(listener);
        Ok(local)
    }

    /// Run the server until a shutdown signal is received.
    ///
    /// # Errors
    ///
    /// Fails if binding or accepting connections fails.
    pub async fn run(&mut self) -> Result<(), ServeError> {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let listener = self
            .listener
            .take()
            .expect("listener present after bind");
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .expect("server can only run once");

        tracing::info!(
            server = %self.state.server_id(),
            addr = %self.config.listen_addr(),
            target = %self.config.target_url,
            "server started"
        );

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, remote_addr) = result.map_err(ServeError::Accept)?;
                    let io = TokioIo::new(stream);
                    let state = Arc::clone(&self.state);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { router::route(req, state).await }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            if severed_by_fail_tasklet(&e) {
                                tracing::info!(remote = %remote_addr, "connection severed by fail tasklet");
                            } else if !e.is_incomplete_message() {
                                tracing::warn!(remote = %remote_addr, error = %e, "HTTP connection error");
                            }
                        }
                    });
                }
                _ = &mut shutdown_rx => {
                    tracing::info!("server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Shutdown the server. No-op if the handle was already taken.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Whether a connection error was the deliberate `fail` tasklet severing.
fn severed_by_fail_tasklet(e: &hyper::Error) -> bool {
    let mut source = e.source();
    while let Some(cause) = source {
        if cause.downcast_ref::<ConnectionSevered>().is_some() {
            return true;
        }
        source = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_an_ephemeral_port() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Config::default()
        };
        let mut server = ApiServer::new(config).unwrap();
        let addr = server.bind().await.unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn shutdown_handle_stops_the_accept_loop() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Config::default()
        };
        let mut server = ApiServer::new(config).unwrap();
        server.bind().await.unwrap();
        let shutdown = server.shutdown_handle().expect("handle available once");

        let handle = tokio::spawn(async move { server.run().await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("server did not stop after shutdown")
            .expect("server task panicked");
        assert!(result.is_ok());
    }
}
