//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`; no new connections are made.
//! 2. Telling every open connection to finish the request it is serving and
//!    close. Idle keep-alive connections close at once.
//! 3. Waiting up to the drain timeout for those connections, then aborting
//!    whatever is left.
//! 4. Returning from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Keep the drain timeout below `terminationGracePeriodSeconds` so the
//! process exits on its own before the kubelet kills it.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(25);
const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

enum Listen {
    Addr(SocketAddr),
    Bound(TcpListener),
}

/// The HTTP server.
pub struct Server {
    listen: Listen,
    tls: Option<Arc<rustls::ServerConfig>>,
    drain_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use item_pdp::Server;
    /// let server = Server::bind("0.0.0.0:8080").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let parsed = addr.parse().map_err(|source| Error::Addr { addr: addr.to_owned(), source })?;
        Ok(Self::new(Listen::Addr(parsed)))
    }

    /// Serves on a listener the caller already bound, e.g. to port 0 in tests.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self::new(Listen::Bound(listener))
    }

    fn new(listen: Listen) -> Self {
        Self { listen, tls: None, drain_timeout: DEFAULT_DRAIN_TIMEOUT }
    }

    /// Terminates TLS on every accepted connection. See [`crate::tls`].
    pub fn with_tls(mut self, config: Arc<rustls::ServerConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    /// How long shutdown waits for open connections before aborting them.
    pub fn drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by the connection drain).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but shuts down when `signal` resolves
    /// instead of on SIGTERM or Ctrl-C.
    pub async fn serve_with_shutdown<F>(self, router: Router, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let Self { listen, tls, drain_timeout } = self;
        let listener = match listen {
            Listen::Addr(addr) => TcpListener::bind(addr).await?,
            Listen::Bound(listener) => listener,
        };

        // Wrap router in Arc so it can be shared across concurrent connection
        // tasks without copying the entire routing table.
        let router = Arc::new(router);
        let acceptor = tls.map(TlsAcceptor::from);

        info!(addr = %listener.local_addr()?, tls = acceptor.is_some(), "item-pdp listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        // Flipped to `true` once, when shutdown starts. Each connection task
        // holds a receiver and reacts by closing its connection gracefully.
        let (stop_tx, stop_rx) = watch::channel(false);

        // Pin the shutdown future so we can poll it in a loop.
        // Futures must not move in memory after the first poll; that is what
        // `Pin` enforces. `tokio::pin!` pins the future on the stack.
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // `biased` makes select! check arms top-to-bottom instead of
                // randomly. We check shutdown first so a SIGTERM immediately
                // stops accepting new connections, even if more are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let acceptor = acceptor.clone();
                    let stop = stop_rx.clone();

                    tasks.spawn(async move {
                        let Some(acceptor) = acceptor else {
                            return serve_connection(stream, router, remote_addr, false, stop).await;
                        };

                        // A client that opens a socket and never finishes the
                        // handshake must not pin the task forever.
                        match timeout(TLS_HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                            Ok(Ok(tls)) => serve_connection(tls, router, remote_addr, true, stop).await,
                            Ok(Err(e)) => warn!(peer = %remote_addr, "tls handshake failed: {e}"),
                            Err(_) => warn!(peer = %remote_addr, "tls handshake timed out"),
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        stop_tx.send_replace(true);

        // Drain: wait for in-flight connections, but never past the deadline.
        let drained = timeout(drain_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(remaining = tasks.len(), "drain timed out, aborting connections");
            tasks.shutdown().await;
        }

        info!("item-pdp stopped");
        Ok(())
    }
}

/// Serves one connection until the client hangs up or shutdown closes it.
async fn serve_connection<S>(
    stream: S,
    router: Arc<Router>,
    remote_addr: SocketAddr,
    secure: bool,
    mut stop: watch::Receiver<bool>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    // `service_fn` turns a plain async function into a hyper `Service`.
    // The closure is called once per request on the connection, not once
    // per connection.
    let svc = service_fn(move |req| {
        let router = Arc::clone(&router);
        async move { dispatch(router, req, secure).await }
    });

    // `auto::Builder` transparently handles both HTTP/1.1 and HTTP/2,
    // whatever the client negotiates. TokioIo adapts tokio's
    // AsyncRead/AsyncWrite to the hyper IO traits.
    let builder = ConnBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), svc);
    tokio::pin!(conn);

    let result = tokio::select! {
        res = conn.as_mut() => res,
        _ = stop.changed() => {
            // Finishes the request in progress, if any, then closes. An idle
            // keep-alive connection closes right away.
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        error!(peer = %remote_addr, "connection error: {e}");
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: collects the body and runs the request through the router.
///
/// The error type is [`Infallible`]: every failure becomes a response
/// (400 for an unreadable body, 404, 500, etc.) so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    secure: bool,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let response = router.handle(Request::from_parts(parts, body, secure)).await;
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by `kubectl` and the
/// Kubernetes control plane) and **SIGINT** (Ctrl-C, for local dev).
/// On Windows only Ctrl-C is available. If a handler cannot be installed,
/// that arm never resolves and the other still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    // `pending()` is a future that never resolves; on non-Unix platforms
    // the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
