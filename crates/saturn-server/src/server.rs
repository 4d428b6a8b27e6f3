//! Job daemon: accepts local connections and serves job requests over HTTP/1.1.

use std::future::Future;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use saturn_protocol::Endpoint;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::error::{Result, ServerError};
use crate::registry::Registry;
use crate::router::{JobRouter, handle_request};

/// Configuration for the job daemon
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Where to listen
    pub endpoint: Endpoint,
    /// Remove a leftover socket file before binding
    pub remove_stale_socket: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            remove_stale_socket: true,
        }
    }
}

/// Builder for [`JobServer`]
pub struct JobServerBuilder {
    config: ServerConfig,
    registry: Option<Arc<Registry>>,
}

impl JobServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: None,
        }
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.config.endpoint = endpoint;
        self
    }

    /// Serve jobs from `registry` instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn remove_stale_socket(mut self, remove: bool) -> Self {
        self.config.remove_stale_socket = remove;
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> JobServer {
        JobServer {
            config: self.config,
            registry: self.registry.unwrap_or_else(Registry::global),
        }
    }
}

impl Default for JobServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Job daemon
pub struct JobServer {
    config: ServerConfig,
    registry: Arc<Registry>,
}

impl JobServer {
    pub fn builder() -> JobServerBuilder {
        JobServerBuilder::new()
    }

    /// Daemon on `endpoint` backed by the process-wide registry.
    pub fn new(endpoint: Endpoint) -> Self {
        Self::builder().endpoint(endpoint).build()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Bind the listener without accepting yet.
    pub async fn bind(&self) -> Result<BoundJobServer> {
        let listener = match &self.config.endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                if path.as_os_str().is_empty() {
                    return Err(ServerError::InvalidConfig("socket path is empty".to_string()));
                }
                if self.config.remove_stale_socket {
                    match std::fs::remove_file(path) {
                        Ok(()) => debug!(path = %path.display(), "Removed stale socket"),
                        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                        Err(err) => {
                            warn!(path = %path.display(), error = %err, "Failed to remove stale socket")
                        }
                    }
                }
                Listener::Unix(UnixListener::bind(path)?)
            }
            Endpoint::Tcp(addr) => Listener::Tcp(TcpListener::bind(addr).await?),
        };

        let endpoint = listener.local_endpoint()?;
        info!(endpoint = %endpoint, jobs = self.registry.len(), "Job server listening");
        Ok(BoundJobServer {
            listener,
            endpoint,
            router: JobRouter::new(Arc::clone(&self.registry)),
        })
    }

    /// Bind and serve until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.bind().await?.serve().await
    }
}

enum Listener {
    #[cfg(unix)]
    Unix(UnixListener),
    Tcp(TcpListener),
}

impl Listener {
    fn local_endpoint(&self) -> Result<Endpoint> {
        match self {
            #[cfg(unix)]
            Listener::Unix(listener) => {
                let addr = listener.local_addr()?;
                let path = addr.as_pathname().ok_or_else(|| {
                    ServerError::InvalidConfig("socket is not bound to a path".to_string())
                })?;
                Ok(Endpoint::unix(path))
            }
            Listener::Tcp(listener) => Ok(Endpoint::tcp(listener.local_addr()?)),
        }
    }
}

/// A daemon whose listener is bound and ready to accept.
pub struct BoundJobServer {
    listener: Listener,
    endpoint: Endpoint,
    router: JobRouter,
}

impl BoundJobServer {
    /// The endpoint actually bound (with the resolved port for `:0` addresses).
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Requests already in flight keep running on their own tasks.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let BoundJobServer {
            listener,
            endpoint,
            router,
        } = self;
        tokio::pin!(shutdown);

        let result = loop {
            let accepted = match &listener {
                #[cfg(unix)]
                Listener::Unix(listener) => tokio::select! {
                    _ = &mut shutdown => break Ok(()),
                    accepted = listener.accept() => accepted.map(|(stream, _)| {
                        spawn_connection(stream, router.clone());
                    }),
                },
                Listener::Tcp(listener) => tokio::select! {
                    _ = &mut shutdown => break Ok(()),
                    accepted = listener.accept() => accepted.map(|(stream, peer)| {
                        debug!("New connection from {}", peer);
                        spawn_connection(stream, router.clone());
                    }),
                },
            };
            if let Err(err) = accepted {
                break Err(ServerError::Io(err));
            }
        };

        drop(listener);
        #[cfg(unix)]
        if let Endpoint::Unix(path) = &endpoint {
            let _ = std::fs::remove_file(path);
        }
        info!(endpoint = %endpoint, "Job server stopped");
        result
    }
}

fn spawn_connection<S>(stream: S, router: JobRouter)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let service = service_fn(move |req| handle_request(req, router.clone()));

        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
            // Clients hanging up mid-request is routine
            let err_str = err.to_string();
            if err_str.contains("connection closed before message completed") {
                debug!("Client disconnected (normal): {}", err);
            } else {
                error!("Error serving connection: {}", err);
            }
        }
    });
}
